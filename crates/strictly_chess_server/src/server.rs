//! WebSocket transport and room directory.

use crate::config::ServerConfig;
use crate::identity::IdentityValidator;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::reporter::ResultReporter;
use crate::room::{RoomHandle, WeakRoomHandle};
use axum::{
    Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Name to room lookup, creating rooms on first use.
///
/// Only connections hold strong handles. A room whose last connection has
/// closed stops, and its entry is pruned on the next lookup.
#[derive(Clone)]
pub struct RoomDirectory {
    rooms: Arc<Mutex<HashMap<String, WeakRoomHandle>>>,
    validator: Arc<dyn IdentityValidator>,
    reporter: Arc<dyn ResultReporter>,
}

impl std::fmt::Debug for RoomDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomDirectory").finish_non_exhaustive()
    }
}

impl RoomDirectory {
    /// Creates an empty directory whose rooms share the given collaborators.
    pub fn new(validator: Arc<dyn IdentityValidator>, reporter: Arc<dyn ResultReporter>) -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            validator,
            reporter,
        }
    }

    /// Returns the room called `name`, starting it if needed.
    #[instrument(skip(self))]
    pub fn room(&self, name: &str) -> RoomHandle {
        let mut rooms = self.lock();
        if let Some(handle) = rooms.get(name).and_then(WeakRoomHandle::upgrade) {
            return handle;
        }
        prune(&mut rooms);
        info!(room = name, "Creating room");
        let handle = RoomHandle::spawn(
            name.to_string(),
            Arc::clone(&self.validator),
            Arc::clone(&self.reporter),
        );
        rooms.insert(name.to_string(), handle.downgrade());
        handle
    }

    /// Number of rooms with at least one connection.
    pub fn len(&self) -> usize {
        let mut rooms = self.lock();
        prune(&mut rooms);
        rooms.len()
    }

    /// Whether no room is running.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, WeakRoomHandle>> {
        match self.rooms.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Drops entries for rooms that have stopped.
fn prune(rooms: &mut HashMap<String, WeakRoomHandle>) {
    rooms.retain(|name, handle| {
        let live = handle.upgrade().is_some();
        if !live {
            debug!(room = %name, "Evicting idle room");
        }
        live
    });
}

/// Shared state for request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    directory: RoomDirectory,
    default_room: String,
}

impl AppState {
    /// Creates handler state.
    pub fn new(directory: RoomDirectory, default_room: String) -> Self {
        Self {
            directory,
            default_room,
        }
    }
}

/// Builds the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(default_room_socket))
        .route("/ws/{room}", get(named_room_socket))
        .with_state(state)
}

/// Binds and serves until the listener fails.
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let directory = RoomDirectory::new(config.identity_validator(), config.result_reporter());
    let app = router(AppState::new(directory, config.default_room().clone()));

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!("Server ready at ws://{}:{}/ws", config.host(), config.port());
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn default_room_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let room = state.directory.room(&state.default_room);
    ws.on_upgrade(move |socket| handle_socket(socket, room))
}

async fn named_room_socket(
    ws: WebSocketUpgrade,
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let room = state.directory.room(&name);
    ws.on_upgrade(move |socket| handle_socket(socket, room))
}

/// Pumps one connection: frames in to the room, outbox out to the socket.
#[instrument(skip_all, fields(room = %room.name()))]
async fn handle_socket(socket: WebSocket, room: RoomHandle) {
    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut outbound) = mpsc::unbounded_channel::<ServerMessage>();
    let session_id = room.connect(outbox.clone());
    info!(%session_id, "Connection opened");

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode message");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "Socket read failed");
                break;
            }
        };
        match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(message) => room.message(&session_id, message),
            Err(e) => {
                debug!(error = %e, "Undecodable frame");
                if outbox
                    .send(ServerMessage::error(format!("Invalid message: {}", e)))
                    .is_err()
                {
                    break;
                }
            }
        }
    }

    room.disconnect(&session_id);
    drop(outbox);
    info!(%session_id, "Connection closed");
    if let Err(e) = writer.await {
        debug!(error = %e, "Writer task ended abnormally");
    }
}
