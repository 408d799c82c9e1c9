// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed framing for the daemon IPC socket: a 4-byte
//! big-endian length prefix followed by a JSON payload. Transport
//! agnostic beyond "something that is `AsyncRead`/`AsyncWrite`" so the
//! same framing works over a Unix domain socket or a TCP loopback
//! connection.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Request, Response, SseEvent};

/// Upper bound on a single frame's payload, guarding against a
/// corrupt/malicious length prefix turning into an unbounded allocation.
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame of {0} bytes exceeds max frame length {MAX_FRAME_LEN}")]
    FrameTooLarge(u32),
}

/// Serialize a value to JSON (no length prefix — callers that write
/// straight to a socket use `write_message`, callers that only need the
/// bytes, e.g. to embed in an SSE `data:` line, use this directly).
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write a length-prefixed frame: 4-byte big-endian length, then the
/// raw bytes.
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> Result<(), ProtocolError> {
    let len: u32 = bytes
        .len()
        .try_into()
        .map_err(|_| ProtocolError::FrameTooLarge(u32::MAX))?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a length-prefixed frame, rejecting anything over
/// `MAX_FRAME_LEN`.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Read and decode a framed `Request` (the daemon's listener side).
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Request, ProtocolError> {
    let bytes = read_message(reader).await?;
    decode(&bytes)
}

/// Encode and write a framed `Response` (the daemon's listener side).
pub async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<(), ProtocolError> {
    let bytes = encode(response)?;
    write_message(writer, &bytes).await
}

/// Encode and write a framed `Request` (the client side — CLI or any
/// other Control/Log API caller talking the same framing).
pub async fn write_request<W: AsyncWrite + Unpin>(writer: &mut W, request: &Request) -> Result<(), ProtocolError> {
    let bytes = encode(request)?;
    write_message(writer, &bytes).await
}

/// Read and decode a framed `Response` (the client side).
pub async fn read_response<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Response, ProtocolError> {
    let bytes = read_message(reader).await?;
    decode(&bytes)
}

/// Read and decode a framed `SseEvent` off a connection that has
/// switched into streaming mode via `Request::SubscribeLogs`.
pub async fn read_sse_event<R: AsyncRead + Unpin>(reader: &mut R) -> Result<SseEvent, ProtocolError> {
    let bytes = read_message(reader).await?;
    decode(&bytes)
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
