//! Manages the WebSocket connection lifecycle for a conversation session.

use super::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use anyhow::Result;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, instrument, warn};
use yovo_core::{SessionEvent, conversation::ConnectionId, orchestrator::SessionOrchestrator};

/// Inbound events waiting behind the exchange currently in progress.
const INBOUND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 32;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// A session is opened as soon as the socket is up. Inbound frames are parsed
/// here and queued for a worker task that runs them one at a time; a writer
/// task forwards the orchestrator's events back to the client. The session is
/// torn down the moment the socket closes, so a reply still being generated
/// is dropped instead of delivered.
#[instrument(name = "ws_session", skip_all, fields(connection_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::new();
    tracing::Span::current().record("connection_id", &connection_id.to_string());
    state.orchestrator.connect(connection_id);

    let (mut socket_tx, mut socket_rx) = socket.split();
    let (event_tx, mut event_rx) = mpsc::channel::<SessionEvent>(EVENT_BUFFER);
    let (inbound_tx, inbound_rx) = mpsc::channel::<ClientMessage>(INBOUND_BUFFER);

    let writer = tokio::spawn(
        async move {
            while let Some(event) = event_rx.recv().await {
                if let Err(e) = send_msg(&mut socket_tx, event.into()).await {
                    warn!(error = %e, "Failed to send message to client");
                    break;
                }
            }
        }
        .in_current_span(),
    );
    let worker = tokio::spawn(
        run_worker(
            state.orchestrator.clone(),
            connection_id,
            inbound_rx,
            event_tx,
        )
        .in_current_span(),
    );

    while let Some(msg_result) = socket_rx.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => {
                    if inbound_tx.send(msg).await.is_err() {
                        error!("Session worker stopped unexpectedly.");
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Ignoring malformed client message"),
            },
            Ok(Message::Binary(_)) => warn!("Ignoring binary frame from client"),
            Ok(Message::Close(_)) => {
                info!("Client sent close frame.");
                break;
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                error!("Error receiving from client WebSocket: {:?}", e);
                break;
            }
        }
    }

    state.orchestrator.disconnect(connection_id);
    drop(inbound_tx);

    if let Err(e) = worker.await {
        error!(error = %e, "Session worker panicked");
    }
    if let Err(e) = writer.await {
        error!(error = %e, "Session writer panicked");
    }
    info!("WebSocket connection closed.");
}

/// Runs queued client messages strictly in arrival order until the queue
/// closes.
async fn run_worker(
    orchestrator: Arc<SessionOrchestrator>,
    connection_id: ConnectionId,
    mut inbound_rx: mpsc::Receiver<ClientMessage>,
    events: mpsc::Sender<SessionEvent>,
) {
    while let Some(msg) = inbound_rx.recv().await {
        match msg {
            ClientMessage::Speech { text } => {
                orchestrator
                    .handle_speech(connection_id, &text, &events)
                    .await
            }
            ClientMessage::ChangeTopic { topic } => {
                orchestrator
                    .handle_topic_change(connection_id, &topic, &events)
                    .await
            }
        }
    }
    debug!("Inbound queue closed; worker exiting.");
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
