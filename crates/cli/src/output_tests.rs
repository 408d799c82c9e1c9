use super::*;
use oj_core::{Clock, SystemClock};

#[test]
fn time_ago_formats_seconds_minutes_hours_days() {
    let now = SystemClock.epoch_ms();
    assert_eq!(time_ago(now), "0s");
    assert_eq!(time_ago(now - 5_000), "5s");
    assert_eq!(time_ago(now - 120_000), "2m");
    assert_eq!(time_ago(now - 2 * 3_600_000), "2h");
    assert_eq!(time_ago(now - 3 * 86_400_000), "3d");
}

#[test]
fn time_ago_clamps_future_timestamps_to_zero() {
    let now = SystemClock.epoch_ms();
    assert_eq!(time_ago(now + 10_000), "0s");
}

#[test]
fn print_job_table_does_not_panic_on_empty_list() {
    print_job_table(&[]);
}
