use super::*;
use serial_test::serial;

#[test]
#[serial]
fn paint_without_colorize_returns_plain_text() {
    std::env::set_var("NO_COLOR", "1");
    assert_eq!(header("hello"), "hello");
    assert_eq!(status("running"), "running");
    std::env::remove_var("NO_COLOR");
}

#[test]
#[serial]
fn paint_with_colorize_wraps_in_escape_codes() {
    std::env::remove_var("NO_COLOR");
    std::env::set_var("COLOR", "1");
    let painted = header("hello");
    assert!(painted.contains("hello"));
    assert!(painted.starts_with("\x1b["));
    std::env::remove_var("COLOR");
}

#[test]
#[serial]
fn status_colors_distinguish_terminal_states() {
    std::env::remove_var("NO_COLOR");
    std::env::set_var("COLOR", "1");
    let running = status("running");
    let failed = status("failed");
    let completed = status("completed");
    assert_ne!(running, failed);
    assert_ne!(running, completed);
    assert_ne!(failed, completed);
    std::env::remove_var("COLOR");
}

#[test]
#[serial]
fn no_color_takes_priority_over_color() {
    std::env::set_var("NO_COLOR", "1");
    std::env::set_var("COLOR", "1");
    assert_eq!(header("hello"), "hello");
    std::env::remove_var("NO_COLOR");
    std::env::remove_var("COLOR");
}
