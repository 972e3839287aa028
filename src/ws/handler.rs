//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::WorldHandle;
use crate::util::rate_limit::SessionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Per-session outbound queue length
const OUTBOX_CAPACITY: usize = 256;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let session = Uuid::new_v4();
    info!(session = %session, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, session, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, session: Uuid, state: AppState) {
    info!(session = %session, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();
    let (outbox_tx, outbox_rx) = mpsc::channel(OUTBOX_CAPACITY);

    if !state.world.connect(session, outbox_tx.clone()).await {
        error!(session = %session, "World is not running");
        return;
    }

    let rate_limiter = SessionRateLimiter::new(state.config.input_rate_limit);
    run_session(
        session,
        ws_sink,
        ws_stream,
        &state.world,
        outbox_tx,
        outbox_rx,
        rate_limiter,
    )
    .await;

    // Cleanup on disconnect, exactly once per connection
    state.world.disconnect(session).await;

    info!(session = %session, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    session: Uuid,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    world: &WorldHandle,
    outbox_tx: mpsc::Sender<ServerMsg>,
    mut outbox_rx: mpsc::Receiver<ServerMsg>,
    rate_limiter: SessionRateLimiter,
) {
    // Spawn writer task: outbox -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(session = %session, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> world
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(client_msg) => {
                        if !rate_limiter.admit(&client_msg) {
                            debug!(session = %session, "Rate limited movement report");
                            continue;
                        }
                        if !world.send(session, client_msg).await {
                            debug!(session = %session, "World channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        // Malformed frames share the movement quota
                        if !rate_limiter.check_input() {
                            continue;
                        }
                        warn!(session = %session, error = %e, "Failed to parse client message");
                        let _ = outbox_tx.try_send(ServerMsg::Error {
                            code: "bad_message".to_string(),
                            message: e.to_string(),
                        });
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(session = %session, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(session = %session, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(session = %session, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(session = %session, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session = %session, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Abort writer task
    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
