//! Integration tests that drive the real `oj`/`ojd` binaries as
//! subprocesses. Run with `cargo test --test specs`.

#[path = "specs/prelude.rs"]
mod prelude;

mod daemon {
    #[path = "specs/daemon/lifecycle.rs"]
    mod lifecycle;
}

mod job {
    #[path = "specs/job/lifecycle.rs"]
    mod lifecycle;
}
