//! WebSocket handler
//!
//! One lifecycle controller per accepted socket. It owns the socket for the
//! connection's whole life: it sends the welcome, registers the connection,
//! drains the outbound queue into the socket, answers heartbeats and tears
//! everything down exactly once.

use super::response::ApiError;
use crate::connection::{Connection, ConnectionId, ConnectionState, RegistryError};
use crate::handlers::{HandlerError, HeartbeatHandler, MessageDispatcher};
use crate::protocol::{CloseCode, Frame, ServerMessage};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use cctv_common::AppError;
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Why the controller stopped serving a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    /// The client sent a close frame or the stream ended
    ClientClosed,
    /// Writing to the socket failed
    WriteFailed,
    /// Someone called `Connection::request_close`
    Requested,
    /// The controller itself decided to close
    Server(CloseCode),
}

/// WebSocket events handler
///
/// Refuses the upgrade with 503 when the hub is full or shutting down, so
/// ordinary clients never complete a handshake that would be closed at once.
pub async fn gateway_handler(State(state): State<GatewayState>, ws: WebSocketUpgrade) -> Response {
    let registry = state.hub().registry();

    if registry.is_closed() {
        return ApiError(AppError::ShuttingDown).into_response();
    }

    if registry.is_full() {
        if let Some(limit) = registry.max_connections() {
            tracing::warn!(limit = limit, "Rejecting WebSocket upgrade, hub at capacity");
            return ApiError(AppError::CapacityExceeded { limit }).into_response();
        }
    }

    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let hub = state.hub().clone();
    let config = hub.config();
    let send_timeout = config.send_timeout();

    let (tx, mut rx) = mpsc::channel::<Frame>(config.outbound_buffer);
    let connection = Connection::new(hub.registry().allocate_id(), tx, send_timeout);
    let connection_id = connection.id();

    let (mut ws_sink, mut ws_stream) = socket.split();

    // The welcome goes in before registration so no event can overtake it
    let welcome = ServerMessage::connected(config.welcome_message.clone()).to_frame();
    let queued = match welcome {
        Ok(frame) => connection.send(frame).await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(error) = queued {
        tracing::error!(connection_id = %connection_id, error = %error, "Failed to queue welcome");
        close_unregistered(&connection, &mut ws_sink, CloseCode::UnknownError, send_timeout).await;
        return;
    }

    let handle = match hub.registry().register(connection.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::info!(connection_id = %connection_id, error = %e, "Connection refused");
            let code = match e {
                RegistryError::CapacityExceeded { .. } => CloseCode::CapacityExceeded,
                RegistryError::ShuttingDown => CloseCode::GoingAway,
            };
            close_unregistered(&connection, &mut ws_sink, code, send_timeout).await;
            return;
        }
    };

    connection.advance(ConnectionState::Active);

    tracing::info!(
        connection_id = %connection_id,
        total = hub.connection_count(),
        "WebSocket connection established"
    );

    let reason = tokio::select! {
        reason = write_frames(&mut ws_sink, &mut rx, connection_id) => reason,
        reason = read_frames(&connection, &mut ws_stream) => reason,
        () = connection.close_requested() => CloseReason::Requested,
        () = HeartbeatHandler::watch(&connection, config.heartbeat_timeout()) => {
            CloseReason::Server(CloseCode::HeartbeatTimeout)
        }
    };

    // Teardown runs once, whichever branch finished first
    connection.advance(ConnectionState::Closing);
    hub.registry().deregister(handle);

    let close_code = match reason {
        CloseReason::ClientClosed | CloseReason::WriteFailed => None,
        CloseReason::Requested => Some(
            connection
                .requested_close_code()
                .unwrap_or(CloseCode::UnknownError),
        ),
        CloseReason::Server(code) => {
            connection.request_close(code);
            connection.requested_close_code()
        }
    };

    if let Some(code) = close_code {
        send_close(&mut ws_sink, code, send_timeout).await;
    }

    connection.advance(ConnectionState::Closed);

    tracing::info!(
        connection_id = %connection_id,
        reason = ?reason,
        close_code = close_code.map(CloseCode::as_u16),
        age_ms = connection.age().as_millis(),
        "WebSocket connection closed"
    );
}

/// Drain the outbound queue into the socket, in order
async fn write_frames(
    sink: &mut SplitSink<WebSocket, Message>,
    rx: &mut mpsc::Receiver<Frame>,
    connection_id: ConnectionId,
) -> CloseReason {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = sink.send(Message::Text(frame.to_string())).await {
            tracing::debug!(
                connection_id = %connection_id,
                error = %e,
                "Failed to write frame to WebSocket"
            );
            return CloseReason::WriteFailed;
        }
    }

    // The connection holds the only sender, so this is unreachable while it lives
    CloseReason::WriteFailed
}

/// Read client frames until the client goes away or misbehaves
async fn read_frames(
    connection: &Arc<Connection>,
    stream: &mut SplitStream<WebSocket>,
) -> CloseReason {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(e) = MessageDispatcher::dispatch(connection, &text).await {
                    tracing::warn!(
                        connection_id = %connection.id(),
                        error = %e,
                        "Handler error"
                    );
                    return CloseReason::Server(e.to_close_code());
                }
            }
            Ok(Message::Binary(data)) => {
                tracing::trace!(
                    connection_id = %connection.id(),
                    len = data.len(),
                    "Ignoring binary message"
                );
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Transport-level control frames are answered by axum
            }
            Ok(Message::Close(frame)) => {
                tracing::debug!(
                    connection_id = %connection.id(),
                    code = frame.as_ref().map(|f| f.code),
                    "Client closed connection"
                );
                return CloseReason::ClientClosed;
            }
            Err(e) => {
                let error = HandlerError::ProtocolViolation(e.to_string());
                tracing::debug!(
                    connection_id = %connection.id(),
                    error = %error,
                    "WebSocket error"
                );
                return CloseReason::Server(error.to_close_code());
            }
        }
    }

    CloseReason::ClientClosed
}

/// Close a connection that never made it into the registry
async fn close_unregistered(
    connection: &Connection,
    sink: &mut SplitSink<WebSocket, Message>,
    code: CloseCode,
    timeout: Duration,
) {
    connection.request_close(code);
    send_close(sink, code, timeout).await;
    connection.advance(ConnectionState::Closed);
}

/// Best-effort close frame; a dead peer must not hold up teardown
async fn send_close(sink: &mut SplitSink<WebSocket, Message>, code: CloseCode, timeout: Duration) {
    let frame = Message::Close(Some(CloseFrame {
        code: code.as_u16(),
        reason: Cow::Borrowed(code.description()),
    }));

    match tokio::time::timeout(timeout, sink.send(frame)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::trace!(code = %code, error = %e, "Close frame not delivered"),
        Err(_) => tracing::trace!(code = %code, "Close frame timed out"),
    }
}
