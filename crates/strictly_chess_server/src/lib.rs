//! Strictly Chess server - rooms, matchmaking and the WebSocket protocol
//!
//! Each room is a tokio task owning its sessions, its waiting slot and its
//! games. Connections talk to a room through a [`RoomHandle`]; the room
//! answers through each session's outbox.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
mod config;
mod error;
mod identity;
mod matchmaker;
mod protocol;
mod reporter;
mod room;
mod server;
mod session;

// Crate-level exports - Protocol
pub use protocol::{ClientMessage, GameResult, ServerMessage, StateView};

// Crate-level exports - Sessions and matchmaking
pub use matchmaker::{JoinOutcome, Matchmaker};
pub use session::{GameId, Outbox, Role, Session, SessionId, SessionRegistry, guest_name};

// Crate-level exports - Rooms
pub use room::{MAX_NAME_LEN, Room, RoomCommand, RoomHandle, WeakRoomHandle, sanitize_name};

// Crate-level exports - Collaborators
pub use identity::{
    Credentials, GuestOnly, HttpIdentityValidator, Identity, IdentityError, IdentityValidator,
    resolve,
};
pub use reporter::{
    DisabledReporter, GameReport, HttpResultReporter, Outcome, ParticipantRecord, PointScale,
    ReportError, ResultReporter, spawn_report,
};

// Crate-level exports - Configuration and transport
pub use config::{
    ConfigError, ENV_IDENTITY_URL, ENV_SCORE_API_KEY, ENV_SCORE_URL, ENV_TOURNAMENT_ID,
    ServerConfig,
};
pub use server::{AppState, RoomDirectory, router, serve};

// Crate-level exports - Errors
pub use error::RoomError;
