// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client for the daemon's length-prefixed Control/Log API socket
//! (spec §6). Every command opens its own connection, sends one framed
//! `Request`, and reads back either one framed `Response` or — for
//! `SubscribeLogs` — switches into a one-way stream of framed
//! `SseEvent`s.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use oj_wire::{LogsQuery, Request, Response, SseEvent};
use tokio::net::UnixStream;

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into() }
    }

    async fn connect(&self) -> Result<UnixStream> {
        UnixStream::connect(&self.socket_path).await.with_context(|| {
            format!(
                "connecting to daemon at {} (is `oj daemon start` running?)",
                self.socket_path.display()
            )
        })
    }

    /// Send one request, read back the single matching response.
    pub async fn request(&self, request: Request) -> Result<Response> {
        let mut stream = self.connect().await?;
        oj_wire::write_request(&mut stream, &request).await?;
        let response = oj_wire::read_response(&mut stream).await?;
        Ok(response)
    }

    /// Open a live log subscription (§6 `GET /logs/stream`). Returns
    /// either the rejection `Response::Error` (bad level, unknown job)
    /// or a `LogStream` the caller can poll for `SseEvent`s until the
    /// connection closes.
    pub async fn subscribe_logs(&self, query: LogsQuery) -> Result<SubscribeOutcome> {
        let mut stream = self.connect().await?;
        oj_wire::write_request(&mut stream, &Request::SubscribeLogs { query }).await?;

        let bytes = oj_wire::read_message(&mut stream).await?;
        if let Ok(response @ Response::Error { .. }) = oj_wire::decode::<Response>(&bytes) {
            return Ok(SubscribeOutcome::Rejected(response));
        }
        let first_event: SseEvent = oj_wire::decode(&bytes)
            .context("decoding first SSE event from subscribe response")?;
        Ok(SubscribeOutcome::Streaming(LogStream { stream, pending: Some(first_event) }))
    }
}

pub enum SubscribeOutcome {
    Rejected(Response),
    Streaming(LogStream),
}

/// A live `GET /logs/stream` connection.
pub struct LogStream {
    stream: UnixStream,
    pending: Option<SseEvent>,
}

impl LogStream {
    /// Next event, or `None` once the daemon closes the connection.
    pub async fn next_event(&mut self) -> Result<Option<SseEvent>> {
        if let Some(event) = self.pending.take() {
            return Ok(Some(event));
        }
        match oj_wire::read_sse_event(&mut self.stream).await {
            Ok(event) => Ok(Some(event)),
            Err(oj_wire::ProtocolError::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Resolve a `Response::Error` (or any other non-success response a
/// caller didn't expect) into an error carrying its message.
pub fn expect_ok(response: Response) -> Result<Response> {
    if let Response::Error { message, status, job_id, .. } = &response {
        let suffix = job_id.map(|id| format!(" (job {id})")).unwrap_or_default();
        bail!("{status:?}: {message}{suffix}");
    }
    Ok(response)
}

/// Default Unix socket path, mirroring `oj-daemon`'s own default/env
/// resolution so the client and daemon agree without extra config.
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var("OJ_SOCKET_PATH") {
        return PathBuf::from(path);
    }
    state_dir().join("daemon.sock")
}

pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OJ_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("oj");
    }
    dirs::state_dir().or_else(dirs::home_dir).unwrap_or_else(|| PathBuf::from(".")).join("oj")
}

pub fn is_socket_live(path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
