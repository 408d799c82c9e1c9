// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj-wire`: transport-agnostic DTOs for the Control API and Log API
//! (spec §6). These types define the JSON shapes precisely enough that
//! any host transport (an HTTP framework, the daemon's own length-prefixed
//! IPC socket, a test harness) can (de)serialize them unchanged. Routing,
//! HTTP framing, and templating are explicitly out of scope — only the
//! contracts live here, plus the one piece of framing the daemon's own
//! control socket needs (`framing`).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod framing;
mod query;
mod request;
mod response;
mod sse;
mod types;

pub use framing::{
    decode, encode, read_message, read_request, read_response, read_sse_event, write_message,
    write_request, write_response, ProtocolError, MAX_FRAME_LEN,
};
pub use query::{ListJobsQuery, LogScope, LogsQuery, Query, DEFAULT_LIST_LIMIT};
pub use request::Request;
pub use response::{ErrorStatus, Response};
pub use sse::SseEvent;
pub use types::{Cursor, JobDetail, JobGroup, JobSummary, StepLogGroup, StepRecordDetail};
