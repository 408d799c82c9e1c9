// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket listeners (spec §2 external interfaces, §6 transport): accepts
//! connections on a Unix domain socket and, if configured, a TCP port,
//! and runs each connection through the length-prefixed request/response
//! loop — except `SubscribeLogs`, which switches a connection into a
//! one-way stream of framed `SseEvent`s until the client disconnects.

use std::io;
use std::sync::Arc;

use oj_core::SystemClock;
use oj_wire::{framing, LogScope, Request, Response};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream, UnixListener};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::control;
use crate::lifecycle::{contributing_jobs, Daemon};

/// Accept loop over the Unix socket (always) and an optional TCP port
/// (spec §8: "an operator may additionally expose a TCP port for
/// container/orchestrator deployments"). Runs until `shutdown` fires.
pub async fn serve(daemon: Arc<Daemon>, shutdown: CancellationToken) -> io::Result<()> {
    let socket_path = daemon.config.socket_path.clone();
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let unix_listener = UnixListener::bind(&socket_path)?;
    info!(path = %socket_path.display(), "listening on unix socket");

    let tcp_listener = match daemon.config.tcp_port {
        Some(port) => {
            let listener = TcpListener::bind(("127.0.0.1", port)).await?;
            info!(port, "listening on tcp port");
            Some(listener)
        }
        None => None,
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            accepted = unix_listener.accept() => {
                let (stream, _) = accepted?;
                spawn_connection(Arc::clone(&daemon), stream, shutdown.clone(), None);
            }
            accepted = accept_tcp(tcp_listener.as_ref()) => {
                let (stream, _) = accepted?;
                spawn_connection(Arc::clone(&daemon), stream, shutdown.clone(), daemon.config.auth_token.clone());
            }
        }
    }
}

async fn accept_tcp(listener: Option<&TcpListener>) -> io::Result<(TcpStream, std::net::SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}

fn spawn_connection<S>(daemon: Arc<Daemon>, stream: S, shutdown: CancellationToken, auth_token: Option<String>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = handle_connection(daemon, stream, shutdown, auth_token).await {
            debug!(%err, "connection closed");
        }
    });
}

/// Serve one connection: dispatch framed `Request`s to the Control/Log
/// API until either the client disconnects or a `SubscribeLogs` request
/// switches the connection into SSE streaming mode.
async fn handle_connection<S>(
    daemon: Arc<Daemon>,
    mut stream: S,
    shutdown: CancellationToken,
    auth_token: Option<String>,
) -> Result<(), oj_wire::ProtocolError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut authenticated = auth_token.is_none();

    loop {
        let request = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            request = framing::read_request(&mut stream) => request?,
        };

        if !authenticated {
            match &request {
                Request::Hello { version } if token_matches(version, auth_token.as_deref()) => {
                    authenticated = true;
                    framing::write_response(&mut stream, &Response::Hello { version: version.clone() }).await?;
                    continue;
                }
                _ => {
                    framing::write_response(
                        &mut stream,
                        &Response::Error {
                            message: "authentication required".to_string(),
                            status: oj_wire::ErrorStatus::Validation,
                            job_id: None,
                            child_count: None,
                        },
                    )
                    .await?;
                    return Ok(());
                }
            }
        }

        if let Request::SubscribeLogs { query } = request {
            return stream_logs(&daemon, &mut stream, query, shutdown).await;
        }

        let response = control::handle(request, &daemon.control_context()).await;
        let shutting_down = matches!(response, Response::ShuttingDown);
        framing::write_response(&mut stream, &response).await?;
        if shutting_down {
            return Ok(());
        }
    }
}

/// Hold `HELLO`'s `version` field doing double duty as a bearer token on
/// TCP connections — the Unix socket skips this entirely and relies on
/// filesystem permissions (spec §8: "the Unix socket's security boundary
/// is the filesystem; a TCP listener additionally requires a token").
fn token_matches(candidate: &str, expected: Option<&str>) -> bool {
    match expected {
        Some(expected) => candidate == expected,
        None => true,
    }
}

async fn stream_logs<S>(
    daemon: &Arc<Daemon>,
    stream: &mut S,
    query: oj_wire::LogsQuery,
    shutdown: CancellationToken,
) -> Result<(), oj_wire::ProtocolError>
where
    S: AsyncWrite + Unpin,
{
    if query.scope == LogScope::Service {
        let response = Response::Error {
            message: "service-scoped log streaming is not supported".to_string(),
            status: oj_wire::ErrorStatus::Validation,
            job_id: None,
            child_count: None,
        };
        return framing::write_response(stream, &response).await;
    }

    let job_id = match query.job_id() {
        Ok(id) => *id,
        Err(e) => {
            let response = Response::Error { message: e.to_string(), status: oj_wire::ErrorStatus::Validation, job_id: None, child_count: None };
            return framing::write_response(stream, &response).await;
        }
    };
    let level = match query.level_filter() {
        Ok(level) => level,
        Err(e) => {
            let response = Response::Error { message: e.to_string(), status: oj_wire::ErrorStatus::Validation, job_id: Some(job_id), child_count: None };
            return framing::write_response(stream, &response).await;
        }
    };

    let limit = query.clamped_limit();
    let initial = match daemon.log_service.get_aggregated_logs(&job_id, query.include_children, level, limit, None, true) {
        Ok(page) => page,
        Err(err) => {
            let status = if err.is_not_found() { oj_wire::ErrorStatus::NotFound } else { oj_wire::ErrorStatus::Invariant };
            let response = Response::Error { message: err.to_string(), status, job_id: Some(job_id), child_count: None };
            return framing::write_response(stream, &response).await;
        }
    };

    let jobs = contributing_jobs(&daemon.jobs, &job_id, query.include_children);
    let mut subscription = daemon.broker.subscribe(jobs, level, initial.entries, initial.metadata);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                daemon.broker.unsubscribe(subscription.id);
                return Ok(());
            }
            event = subscription.receiver.recv() => {
                let Some(event) = event else {
                    daemon.broker.unsubscribe(subscription.id);
                    return Ok(());
                };
                if let Err(err) = framing::write_message(stream, &framing::encode(&event)?).await {
                    daemon.broker.unsubscribe(subscription.id);
                    warn!(%job_id, %err, "sse subscriber write failed, disconnecting");
                    return Err(err);
                }
            }
        }
    }
}
