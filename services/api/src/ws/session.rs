//! Manages the WebSocket connection lifecycle for one assistant session.

use super::{controller::SessionController, protocol::ServerMessage};
use crate::state::AppState;
use anyhow::Result;
use axum::{
    extract::{
        Request, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{Instrument, debug, error, info, instrument};

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Serves the site root: WebSocket upgrades become sessions, plain requests
/// get the client page.
pub async fn root_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Response {
    match ws {
        Ok(ws) => ws.on_upgrade(|socket| handle_socket(socket, state)),
        Err(_) => ServeFile::new(state.config.static_dir.join("index.html"))
            .oneshot(request)
            .await
            .into_response(),
    }
}

/// Main handler for an individual WebSocket connection.
///
/// Registers a new session, initializes its model, announces readiness and
/// then feeds every inbound frame to the session controller until the socket
/// closes or fails. The session is removed from the registry on the way out.
#[instrument(name = "ws_session", skip_all, fields(session_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (socket_tx, mut socket_rx) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let session = Arc::new(SessionController::new(
        state.model_provider.clone(),
        state.config.generation_timeout,
        outbound_tx,
    ));
    let session_id = state.registry.register(session.clone()).await;
    tracing::Span::current().record("session_id", &session_id.to_string());
    info!("New session connected");

    let writer = tokio::spawn(
        async move {
            if let Err(e) = forward_outbound(socket_tx, outbound_rx).await {
                debug!(error = ?e, "Stopped writing to client");
            }
        }
        .in_current_span(),
    );

    let model_ready = session.initialize_model().await;
    session.announce_ready(model_ready);

    while let Some(msg_result) = socket_rx.next().await {
        match msg_result {
            Ok(Message::Text(text)) => session.handle_frame(text.as_str()).await,
            // Some clients send JSON in binary frames.
            Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => session.handle_frame(text).await,
                Err(e) => session.reject_frame(&e),
            },
            Ok(Message::Close(_)) => {
                info!("Client sent close frame");
                break;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Err(e) => {
                error!(error = ?e, "WebSocket error");
                break;
            }
        }
    }

    session.cleanup().await;
    state.registry.remove(session_id).await;
    writer.abort();
    let active_sessions = state.registry.count().await;
    info!(
        active_sessions = active_sessions,
        "Session disconnected"
    );
}

/// Drains the session's outbound channel into the socket.
async fn forward_outbound(
    mut socket_tx: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::UnboundedReceiver<ServerMessage>,
) -> Result<()> {
    while let Some(msg) = outbound_rx.recv().await {
        send_msg(&mut socket_tx, msg).await?;
    }
    Ok(())
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
