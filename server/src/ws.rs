use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::broadcast::{Frame, SessionHandle};
use crate::game_loop::GameCommand;
use crate::protocol::{ClientMsg, ServerMsg};
use crate::world::SessionId;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub next_session_id: Arc<AtomicU64>,
    /// Depth of each session's outbound frame queue
    pub outbound_queue: usize,
}

impl AppState {
    pub fn new(game_tx: mpsc::Sender<GameCommand>, outbound_queue: usize) -> Self {
        Self {
            game_tx,
            next_session_id: Arc::new(AtomicU64::new(1)),
            outbound_queue,
        }
    }
}

/// `/stream` for sessions, `/static` for the client, `/` redirects to it.
pub fn router(app_state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/stream", get(ws_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn index_handler() -> Redirect {
    Redirect::to("/static/index.html")
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, app_state))
}

/// What the connection registered as
enum Role {
    Player(String),
    Watcher,
}

enum Reply {
    Nothing,
    Error(String),
    /// The game loop is gone
    Closed,
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let session_id = SessionId(app_state.next_session_id.fetch_add(1, Ordering::Relaxed));
    let (mut sink, mut stream) = socket.split();

    // Snapshots and error replies both go through this queue
    let (out_tx, mut out_rx) = mpsc::channel::<Frame>(app_state.outbound_queue);
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });
    let handle = SessionHandle::new(session_id, out_tx.clone());

    tracing::info!("Session {} connected", session_id);

    let mut role: Option<Role> = None;
    while let Some(msg) = stream.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue, // Ignore ping/pong/binary
        };

        match handle_text(&app_state, &handle, &mut role, text.as_str()).await {
            Reply::Nothing => {}
            Reply::Error(message) => {
                let Ok(json) = serde_json::to_string(&ServerMsg::error(message)) else {
                    continue;
                };
                if out_tx.send(Frame::from(json)).await.is_err() {
                    break;
                }
            }
            Reply::Closed => break,
        }

        if writer.is_finished() {
            break;
        }
    }

    // Cleanup on disconnect
    if role.is_some() {
        let _ = app_state
            .game_tx
            .send(GameCommand::Unregister {
                session: session_id,
            })
            .await;
    }
    writer.abort();
    tracing::info!("Session {} disconnected", session_id);
}

async fn handle_text(
    app_state: &AppState,
    handle: &SessionHandle,
    role: &mut Option<Role>,
    text: &str,
) -> Reply {
    let Ok(client_msg) = serde_json::from_str::<ClientMsg>(text) else {
        return Reply::Error("unrecognized command".to_string());
    };

    match client_msg {
        ClientMsg::RegisterPlayer { name } if role.is_none() => {
            let (resp_tx, resp_rx) = oneshot::channel();
            let cmd = GameCommand::RegisterPlayer {
                name: name.clone(),
                session: handle.clone(),
                response: resp_tx,
            };
            if app_state.game_tx.send(cmd).await.is_err() {
                return Reply::Closed;
            }
            match resp_rx.await {
                Ok(Ok(())) => {
                    // No reply; the next snapshot brings the player online
                    *role = Some(Role::Player(name.trim().to_string()));
                    Reply::Nothing
                }
                Ok(Err(e)) => Reply::Error(e.to_string()),
                Err(_) => Reply::Closed,
            }
        }
        ClientMsg::RegisterWatcher if role.is_none() => {
            let cmd = GameCommand::RegisterWatcher {
                session: handle.clone(),
            };
            if app_state.game_tx.send(cmd).await.is_err() {
                return Reply::Closed;
            }
            *role = Some(Role::Watcher);
            Reply::Nothing
        }
        ClientMsg::PlayerMove { x, y } => {
            let Some(Role::Player(name)) = role.as_ref() else {
                return Reply::Error("unrecognized command".to_string());
            };
            if !x.is_finite() || !y.is_finite() {
                return Reply::Error("invalid coordinates".to_string());
            }
            let cmd = GameCommand::Move {
                name: name.clone(),
                x,
                y,
            };
            if app_state.game_tx.send(cmd).await.is_err() {
                return Reply::Closed;
            }
            Reply::Nothing
        }
        _ => Reply::Error("unrecognized command".to_string()),
    }
}
