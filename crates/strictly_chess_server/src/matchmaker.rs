//! Single-slot matchmaking queue.
//!
//! Every decision here is synchronous. The room calls [`Matchmaker::join`]
//! before any identity lookup is started, so two joins can never both see
//! an empty slot.

use crate::error::RoomError;
use crate::session::SessionId;
use tracing::{info, instrument};

/// Outcome of entering matchmaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The session now holds the waiting slot.
    Waiting,
    /// The session was paired with the previous waiter.
    Paired {
        /// Session playing White.
        white: SessionId,
        /// Session playing Black.
        black: SessionId,
    },
}

/// Holds at most one waiting session.
#[derive(Debug)]
pub struct Matchmaker {
    waiting: Option<SessionId>,
    coin: fn() -> bool,
}

impl Matchmaker {
    /// Creates a matchmaker that assigns colors at random.
    #[instrument]
    pub fn new() -> Self {
        Self::with_coin(rand::random::<bool>)
    }

    /// Creates a matchmaker with a custom color coin.
    ///
    /// When the coin returns `true` the waiting session plays White.
    pub fn with_coin(coin: fn() -> bool) -> Self {
        Self {
            waiting: None,
            coin,
        }
    }

    /// Session currently holding the slot.
    pub fn waiting(&self) -> Option<&SessionId> {
        self.waiting.as_ref()
    }

    /// Whether `id` holds the slot.
    pub fn is_waiting(&self, id: &str) -> bool {
        self.waiting.as_deref() == Some(id)
    }

    /// Claims the slot or pairs with whoever holds it.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::AlreadyWaiting`] if `id` already holds the slot.
    #[instrument(skip(self))]
    pub fn join(&mut self, id: &str) -> Result<JoinOutcome, RoomError> {
        match self.waiting.take() {
            None => {
                info!("Session waiting for opponent");
                self.waiting = Some(id.to_string());
                Ok(JoinOutcome::Waiting)
            }
            Some(waiter) if waiter == id => {
                self.waiting = Some(waiter);
                Err(RoomError::AlreadyWaiting)
            }
            Some(waiter) => {
                let (white, black) = if (self.coin)() {
                    (waiter, id.to_string())
                } else {
                    (id.to_string(), waiter)
                };
                info!(%white, %black, "Sessions paired");
                Ok(JoinOutcome::Paired { white, black })
            }
        }
    }

    /// Vacates the slot if `id` holds it. Returns whether it did.
    #[instrument(skip(self))]
    pub fn leave(&mut self, id: &str) -> bool {
        if self.is_waiting(id) {
            info!("Session left matchmaking");
            self.waiting = None;
            true
        } else {
            false
        }
    }
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::new()
    }
}
