//! Wire messages exchanged with clients, one JSON object per frame.

use serde::{Deserialize, Serialize};
use strictly_chess::{Color, EndReason};

/// Message sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Enter matchmaking.
    Join {
        /// Requested display name.
        #[serde(default)]
        name: Option<String>,
        /// Bearer token for identity validation.
        #[serde(default)]
        token: Option<String>,
        /// API key for identity validation.
        #[serde(default)]
        api_key: Option<String>,
    },
    /// Play a move in the current game.
    Move {
        /// UCI move text.
        #[serde(rename = "move")]
        uci: String,
    },
    /// Watch a game.
    Spectate {
        /// Game to watch; any active game when absent.
        #[serde(default)]
        game_id: Option<String>,
    },
    /// Give up the current game.
    Resign,
    /// Keepalive.
    Ping,
}

/// Final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    /// White won.
    White,
    /// Black won.
    Black,
    /// Nobody won.
    Draw,
}

impl GameResult {
    /// Result with `winner` as the winning side, or a draw.
    pub fn from_winner(winner: Option<Color>) -> Self {
        match winner {
            Some(Color::White) => GameResult::White,
            Some(Color::Black) => GameResult::Black,
            None => GameResult::Draw,
        }
    }

    /// The winning side, if any.
    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::White => Some(Color::White),
            GameResult::Black => Some(Color::Black),
            GameResult::Draw => None,
        }
    }
}

/// Per-recipient game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    /// Position as FEN.
    pub fen: String,
    /// Board rows in FEN order.
    pub board: [[Option<char>; 8]; 8],
    /// Side to move.
    pub turn: Color,
    /// Recipient's color; `None` for spectators.
    pub you: Option<Color>,
    /// Legal moves, only populated for the player to move.
    pub legal_moves: Vec<String>,
    /// Side to move is in check.
    pub check: bool,
    /// Side to move is mated.
    pub checkmate: bool,
    /// Side to move is stalemated.
    pub stalemate: bool,
    /// Most recent move as UCI text.
    pub last_move: Option<String>,
    /// White player's display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_name: Option<String>,
    /// Black player's display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black_name: Option<String>,
}

/// Message sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Connection accepted.
    Welcome {
        /// Identifier of the new session.
        session_id: String,
    },
    /// Waiting for an opponent.
    Waiting {
        /// Identity was validated.
        authenticated: bool,
        /// Account type reported by the identity service, or `guest`.
        account_type: String,
    },
    /// Paired into a new game.
    GameStart {
        /// New game's identifier.
        game_id: String,
        /// Recipient's color.
        you: Color,
        /// Opponent's display name.
        opponent: String,
        /// Opponent's account type.
        opponent_type: String,
    },
    /// Current game state.
    State(StateView),
    /// Now watching a game.
    Spectating {
        /// Watched game's identifier.
        game_id: String,
        /// White player's display name.
        white_name: String,
        /// Black player's display name.
        black_name: String,
    },
    /// The other player left.
    OpponentDisconnected {
        /// Human-readable explanation.
        message: String,
    },
    /// The game is over.
    GameEnd {
        /// Winning side or draw.
        result: GameResult,
        /// Why the game ended.
        reason: EndReason,
        /// Winner's display name.
        winner: Option<String>,
    },
    /// A request was rejected.
    Error {
        /// Human-readable explanation.
        message: String,
    },
    /// Reply to `ping`.
    Pong {
        /// Server time in milliseconds since the Unix epoch.
        timestamp: i64,
    },
}

impl ServerMessage {
    /// Builds an error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
