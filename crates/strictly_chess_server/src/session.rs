//! Per-connection session records.

use crate::identity::Identity;
use crate::protocol::ServerMessage;
use std::collections::HashMap;
use strictly_chess::Color;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

/// Unique identifier for a connection's session.
pub type SessionId = String;

/// Unique identifier for a game.
pub type GameId = String;

/// Channel delivering outbound messages to one connection.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// What a session is currently doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Connected; may be in the waiting slot.
    Idle,
    /// Playing a game.
    Playing {
        /// Game being played.
        game_id: GameId,
        /// Side this session plays.
        color: Color,
    },
    /// Watching a game.
    Spectating {
        /// Game being watched.
        game_id: GameId,
    },
}

/// A connected client.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session ID.
    pub id: SessionId,
    /// Outbound channel.
    pub outbox: Outbox,
    /// Name shown to opponents and spectators.
    pub display_name: String,
    /// Validated identity, if any.
    pub identity: Option<Identity>,
    /// Identity validation is in flight.
    pub pending_validation: bool,
    /// Current activity.
    pub role: Role,
}

impl Session {
    /// Creates an idle guest session.
    #[instrument(skip(outbox))]
    pub fn new(id: SessionId, outbox: Outbox) -> Self {
        let display_name = guest_name(&id);
        Self {
            id,
            outbox,
            display_name,
            identity: None,
            pending_validation: false,
            role: Role::Idle,
        }
    }

    /// Whether a valid identity is attached.
    pub fn is_authenticated(&self) -> bool {
        self.identity.as_ref().is_some_and(|i| i.valid)
    }

    /// Account type: the identity service's type, or `guest`.
    pub fn account_type(&self) -> String {
        match &self.identity {
            Some(identity) if identity.valid => identity.account_type.clone(),
            _ => "guest".to_string(),
        }
    }

    /// Game this session plays or watches.
    pub fn game_id(&self) -> Option<&GameId> {
        match &self.role {
            Role::Idle => None,
            Role::Playing { game_id, .. } | Role::Spectating { game_id } => Some(game_id),
        }
    }
}

/// Default display name derived from a session ID.
pub fn guest_name(id: &str) -> String {
    let suffix: String = id.chars().filter(|c| c.is_ascii_alphanumeric()).take(6).collect();
    format!("Guest-{}", suffix)
}

/// All sessions connected to one room.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[instrument]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session, replacing any previous record with the same ID.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn register(&mut self, session: Session) {
        info!("Session registered");
        self.sessions.insert(session.id.clone(), session);
    }

    /// Gets a session by ID.
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Gets a mutable session by ID.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Removes a session, returning it if it existed.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: &str) -> Option<Session> {
        let removed = self.sessions.remove(id);
        if removed.is_some() {
            info!("Session removed");
        }
        removed
    }

    /// Number of connected sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Display name of a session, or a placeholder if it has gone.
    pub fn display_name(&self, id: &str) -> String {
        self.sessions
            .get(id)
            .map(|s| s.display_name.clone())
            .unwrap_or_else(|| guest_name(id))
    }

    /// Sets a session's role. Unknown sessions are ignored.
    pub fn set_role(&mut self, id: &str, role: Role) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.role = role;
        }
    }

    /// Queues a message for a session.
    ///
    /// Unknown sessions and closed connections are skipped; the disconnect
    /// notification cleans those up.
    pub fn send(&self, id: &str, message: ServerMessage) {
        match self.sessions.get(id) {
            Some(session) => {
                if session.outbox.send(message).is_err() {
                    debug!(session_id = id, "Outbox closed, dropping message");
                }
            }
            None => debug!(session_id = id, "No such session, dropping message"),
        }
    }
}
