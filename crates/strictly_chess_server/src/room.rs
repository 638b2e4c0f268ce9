//! Room actor: matchmaking, games and spectators for one room.
//!
//! A room is a single tokio task that owns all of its state and drains a
//! command mailbox. Nothing in [`Room::handle`] awaits, so a pairing decision
//! is complete before the next command is looked at. Identity lookups run on
//! their own tasks and come back through the mailbox as
//! [`RoomCommand::IdentityResolved`].

use crate::error::RoomError;
use crate::identity::{self, Credentials, Identity, IdentityValidator};
use crate::matchmaker::{JoinOutcome, Matchmaker};
use crate::protocol::{ClientMessage, GameResult, ServerMessage, StateView};
use crate::reporter::{GameReport, ParticipantRecord, ResultReporter, spawn_report};
use crate::session::{GameId, Outbox, Role, Session, SessionId, SessionRegistry, guest_name};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use strictly_chess::{Color, EndReason, GameEngine};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Longest display name kept, in characters.
pub const MAX_NAME_LEN: usize = 32;

/// Input to a room's mailbox.
#[derive(Debug)]
pub enum RoomCommand {
    /// A connection opened.
    Connect {
        /// New session's ID.
        session_id: SessionId,
        /// Channel back to the connection.
        outbox: Outbox,
    },
    /// A decoded client message arrived.
    Message {
        /// Sender.
        session_id: SessionId,
        /// Decoded message.
        message: ClientMessage,
    },
    /// A connection closed.
    Disconnect {
        /// Closed session.
        session_id: SessionId,
    },
    /// An identity lookup finished.
    IdentityResolved {
        /// Session the lookup was for.
        session_id: SessionId,
        /// Lookup result; a guest on any failure.
        identity: Identity,
    },
}

/// Trims a requested name, falling back to the session's guest name.
pub fn sanitize_name(requested: Option<&str>, session_id: &str) -> String {
    let trimmed = requested.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        guest_name(session_id)
    } else {
        trimmed.chars().take(MAX_NAME_LEN).collect()
    }
}

/// Two paired sessions and their engine.
#[derive(Debug)]
struct Game {
    id: GameId,
    white: SessionId,
    black: SessionId,
    white_name: String,
    black_name: String,
    white_type: String,
    black_type: String,
    engine: GameEngine,
    started_at: DateTime<Utc>,
}

impl Game {
    fn player(&self, color: Color) -> &SessionId {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn name(&self, color: Color) -> &str {
        match color {
            Color::White => &self.white_name,
            Color::Black => &self.black_name,
        }
    }

    fn account_type(&self, color: Color) -> &str {
        match color {
            Color::White => &self.white_type,
            Color::Black => &self.black_type,
        }
    }

    fn set_player_info(&mut self, color: Color, name: String, account_type: String) {
        match color {
            Color::White => {
                self.white_name = name;
                self.white_type = account_type;
            }
            Color::Black => {
                self.black_name = name;
                self.black_type = account_type;
            }
        }
    }

    /// State as seen by the player of `you`, or by a spectator.
    fn view(&self, you: Option<Color>) -> StateView {
        let snapshot = self.engine.state();
        let legal_moves = if you == Some(snapshot.turn) {
            snapshot.legal_moves
        } else {
            Vec::new()
        };
        StateView {
            fen: snapshot.fen,
            board: snapshot.board,
            turn: snapshot.turn,
            you,
            legal_moves,
            check: snapshot.check,
            checkmate: snapshot.checkmate,
            stalemate: snapshot.stalemate,
            last_move: snapshot.last_move,
            white_name: Some(self.white_name.clone()),
            black_name: Some(self.black_name.clone()),
        }
    }
}

/// State of one room. Driven by [`Room::handle`].
pub struct Room {
    name: String,
    sessions: SessionRegistry,
    matchmaker: Matchmaker,
    games: HashMap<GameId, Game>,
    spectators: HashMap<GameId, HashSet<SessionId>>,
    validator: Arc<dyn IdentityValidator>,
    reporter: Arc<dyn ResultReporter>,
    loopback: mpsc::WeakUnboundedSender<RoomCommand>,
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("name", &self.name)
            .field("sessions", &self.sessions.len())
            .field("waiting", &self.matchmaker.waiting())
            .field("games", &self.games.len())
            .finish()
    }
}

impl Room {
    /// Creates an empty room.
    ///
    /// `loopback` is a weak sender into the room's own mailbox, used to
    /// deliver identity lookups.
    #[instrument(skip(validator, reporter, matchmaker, loopback))]
    pub fn new(
        name: String,
        validator: Arc<dyn IdentityValidator>,
        reporter: Arc<dyn ResultReporter>,
        matchmaker: Matchmaker,
        loopback: mpsc::WeakUnboundedSender<RoomCommand>,
    ) -> Self {
        Self {
            name,
            sessions: SessionRegistry::new(),
            matchmaker,
            games: HashMap::new(),
            spectators: HashMap::new(),
            validator,
            reporter,
            loopback,
        }
    }

    /// Room name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of games in progress.
    pub fn active_games(&self) -> usize {
        self.games.len()
    }

    /// Connected sessions.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Processes one command to completion.
    #[instrument(skip(self, command), fields(room = %self.name))]
    pub fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Connect { session_id, outbox } => self.on_connect(session_id, outbox),
            RoomCommand::Message {
                session_id,
                message,
            } => self.on_message(&session_id, message),
            RoomCommand::Disconnect { session_id } => self.on_disconnect(&session_id),
            RoomCommand::IdentityResolved {
                session_id,
                identity,
            } => self.on_identity_resolved(&session_id, identity),
        }
    }

    /// Drains the mailbox until every sender is gone.
    #[instrument(skip_all, fields(room = %self.name))]
    pub async fn run(mut self, mut mailbox: mpsc::UnboundedReceiver<RoomCommand>) {
        info!("Room started");
        while let Some(command) = mailbox.recv().await {
            self.handle(command);
        }
        info!("Room stopped");
    }

    fn on_connect(&mut self, session_id: SessionId, outbox: Outbox) {
        let session = Session::new(session_id.clone(), outbox);
        self.sessions.register(session);
        self.sessions.send(
            &session_id,
            ServerMessage::Welcome {
                session_id: session_id.clone(),
            },
        );
    }

    #[instrument(skip(self, message), fields(room = %self.name))]
    fn on_message(&mut self, session_id: &str, message: ClientMessage) {
        if self.sessions.get(session_id).is_none() {
            debug!("Message from unknown session ignored");
            return;
        }

        let result = match message {
            ClientMessage::Join {
                name,
                token,
                api_key,
            } => self.join(session_id, name.as_deref(), Credentials { token, api_key }),
            ClientMessage::Move { uci } => self.play(session_id, &uci),
            ClientMessage::Spectate { game_id } => self.spectate(session_id, game_id.as_deref()),
            ClientMessage::Resign => self.resign(session_id),
            ClientMessage::Ping => {
                self.sessions.send(
                    session_id,
                    ServerMessage::Pong {
                        timestamp: Utc::now().timestamp_millis(),
                    },
                );
                Ok(())
            }
        };

        if let Err(e) = result {
            debug!(error = %e, "Request rejected");
            self.sessions.send(session_id, ServerMessage::error(e.to_string()));
        }
    }

    fn join(
        &mut self,
        session_id: &str,
        name: Option<&str>,
        credentials: Credentials,
    ) -> Result<(), RoomError> {
        let role = self
            .sessions
            .get(session_id)
            .map(|s| s.role.clone())
            .ok_or(RoomError::SessionNotInGame)?;
        if matches!(role, Role::Playing { .. }) {
            return Err(RoomError::AlreadyInGame);
        }
        if self.matchmaker.is_waiting(session_id) {
            return Err(RoomError::AlreadyWaiting);
        }

        if let Role::Spectating { game_id } = &role {
            self.detach_spectator(session_id, game_id);
        }

        let display_name = sanitize_name(name, session_id);
        let validate = credentials.is_present();
        if let Some(session) = self.sessions.get_mut(session_id) {
            session.display_name = display_name;
            session.pending_validation = validate;
        }

        let outcome = self.matchmaker.join(session_id)?;

        if validate {
            self.spawn_validation(session_id.to_string(), credentials);
        }

        match outcome {
            JoinOutcome::Waiting => self.send_waiting(session_id),
            JoinOutcome::Paired { white, black } => self.start_game(white, black),
        }
        Ok(())
    }

    fn spawn_validation(&self, session_id: SessionId, credentials: Credentials) {
        let validator = Arc::clone(&self.validator);
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let identity = identity::resolve(validator.as_ref(), &credentials).await;
            match loopback.upgrade() {
                Some(mailbox) => {
                    if mailbox
                        .send(RoomCommand::IdentityResolved {
                            session_id,
                            identity,
                        })
                        .is_err()
                    {
                        debug!("Room closed before identity resolved");
                    }
                }
                None => debug!("Room closed before identity resolved"),
            }
        });
    }

    fn send_waiting(&self, session_id: &str) {
        if let Some(session) = self.sessions.get(session_id) {
            self.sessions.send(
                session_id,
                ServerMessage::Waiting {
                    authenticated: session.is_authenticated(),
                    account_type: session.account_type(),
                },
            );
        }
    }

    #[instrument(skip(self), fields(room = %self.name))]
    fn start_game(&mut self, white: SessionId, black: SessionId) {
        let game_id = Uuid::new_v4().to_string();
        let info = |id: &str| {
            self.sessions
                .get(id)
                .map(|s| (s.display_name.clone(), s.account_type()))
                .unwrap_or_else(|| (guest_name(id), "guest".to_string()))
        };
        let (white_name, white_type) = info(&white);
        let (black_name, black_type) = info(&black);

        let game = Game {
            id: game_id.clone(),
            white,
            black,
            white_name,
            black_name,
            white_type,
            black_type,
            engine: GameEngine::new(),
            started_at: Utc::now(),
        };
        info!(game_id = %game.id, white = %game.white_name, black = %game.black_name, "Game started");

        for color in [Color::White, Color::Black] {
            let player = game.player(color);
            self.sessions.set_role(
                player,
                Role::Playing {
                    game_id: game_id.clone(),
                    color,
                },
            );
            self.sessions.send(
                player,
                ServerMessage::GameStart {
                    game_id: game_id.clone(),
                    you: color,
                    opponent: game.name(color.opponent()).to_string(),
                    opponent_type: game.account_type(color.opponent()).to_string(),
                },
            );
        }

        self.games.insert(game_id.clone(), game);
        self.spectators.insert(game_id.clone(), HashSet::new());
        self.broadcast_state(&game_id);
    }

    fn broadcast_state(&self, game_id: &str) {
        let Some(game) = self.games.get(game_id) else {
            return;
        };
        for color in [Color::White, Color::Black] {
            self.sessions
                .send(game.player(color), ServerMessage::State(game.view(Some(color))));
        }
        if let Some(watchers) = self.spectators.get(game_id) {
            let view = game.view(None);
            for watcher in watchers {
                self.sessions.send(watcher, ServerMessage::State(view.clone()));
            }
        }
    }

    fn playing(&self, session_id: &str) -> Result<(GameId, Color), RoomError> {
        match self.sessions.get(session_id).map(|s| &s.role) {
            Some(Role::Playing { game_id, color }) => Ok((game_id.clone(), *color)),
            _ => Err(RoomError::SessionNotInGame),
        }
    }

    #[instrument(skip(self), fields(room = %self.name))]
    fn play(&mut self, session_id: &str, uci: &str) -> Result<(), RoomError> {
        let (game_id, color) = self.playing(session_id)?;
        let Some(game) = self.games.get_mut(&game_id) else {
            self.sessions.set_role(session_id, Role::Idle);
            return Err(RoomError::GameNotFound(game_id));
        };
        if game.engine.turn() != color {
            return Err(RoomError::NotYourTurn);
        }

        let outcome = game.engine.apply_move(uci)?;
        info!(game_id = %game_id, mv = %outcome.mv, check = outcome.check, "Move played");

        self.broadcast_state(&game_id);

        if outcome.checkmate {
            self.end_game(&game_id, EndReason::Checkmate, Some(color));
        } else if outcome.stalemate {
            self.end_game(&game_id, EndReason::Stalemate, None);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(room = %self.name))]
    fn spectate(&mut self, session_id: &str, requested: Option<&str>) -> Result<(), RoomError> {
        let role = self
            .sessions
            .get(session_id)
            .map(|s| s.role.clone())
            .ok_or(RoomError::SessionNotInGame)?;
        if matches!(role, Role::Playing { .. }) {
            return Err(RoomError::AlreadyInGame);
        }

        let game_id = match requested {
            Some(id) if self.games.contains_key(id) => id.to_string(),
            Some(id) => return Err(RoomError::GameNotFound(id.to_string())),
            None => self
                .games
                .keys()
                .next()
                .cloned()
                .ok_or(RoomError::NoActiveGames)?,
        };

        self.matchmaker.leave(session_id);
        if let Role::Spectating { game_id: previous } = &role {
            self.detach_spectator(session_id, previous);
        }

        self.spectators
            .entry(game_id.clone())
            .or_default()
            .insert(session_id.to_string());
        self.sessions.set_role(
            session_id,
            Role::Spectating {
                game_id: game_id.clone(),
            },
        );

        if let Some(game) = self.games.get(&game_id) {
            info!(game_id = %game_id, "Spectator attached");
            self.sessions.send(
                session_id,
                ServerMessage::Spectating {
                    game_id: game_id.clone(),
                    white_name: game.white_name.clone(),
                    black_name: game.black_name.clone(),
                },
            );
            self.sessions
                .send(session_id, ServerMessage::State(game.view(None)));
        }
        Ok(())
    }

    fn detach_spectator(&mut self, session_id: &str, game_id: &str) {
        if let Some(watchers) = self.spectators.get_mut(game_id) {
            watchers.remove(session_id);
        }
        self.sessions.set_role(session_id, Role::Idle);
    }

    #[instrument(skip(self), fields(room = %self.name))]
    fn resign(&mut self, session_id: &str) -> Result<(), RoomError> {
        let (game_id, color) = self.playing(session_id)?;
        if !self.games.contains_key(&game_id) {
            self.sessions.set_role(session_id, Role::Idle);
            return Err(RoomError::GameNotFound(game_id));
        }
        info!(game_id = %game_id, %color, "Player resigned");
        self.end_game(&game_id, EndReason::Resignation, Some(color.opponent()));
        Ok(())
    }

    /// Finishes a game: notifies everyone, frees its sessions, reports it.
    #[instrument(skip(self), fields(room = %self.name))]
    fn end_game(&mut self, game_id: &str, reason: EndReason, winner: Option<Color>) {
        let Some(mut game) = self.games.remove(game_id) else {
            debug!("Game already ended");
            return;
        };
        let watchers = self.spectators.remove(game_id).unwrap_or_default();
        game.engine.end(reason);

        let result = GameResult::from_winner(winner);
        let message = ServerMessage::GameEnd {
            result,
            reason,
            winner: winner.map(|color| game.name(color).to_string()),
        };
        info!(?result, %reason, "Game ended");

        for player in [&game.white, &game.black] {
            self.sessions.send(player, message.clone());
            self.sessions.set_role(player, Role::Idle);
        }
        for watcher in &watchers {
            self.sessions.send(watcher, message.clone());
            self.sessions.set_role(watcher, Role::Idle);
        }

        let participant = |color: Color| {
            let player_id = self
                .sessions
                .get(game.player(color))
                .and_then(|s| s.identity.as_ref())
                .filter(|identity| identity.valid)
                .and_then(|identity| identity.player_id.clone());
            ParticipantRecord::new(game.name(color).to_string(), player_id)
        };
        let report = GameReport {
            game_id: game.id.clone(),
            white: participant(Color::White),
            black: participant(Color::Black),
            result,
            reason,
            moves: game.engine.history().iter().map(ToString::to_string).collect(),
            started_at: game.started_at,
            ended_at: Utc::now(),
        };
        spawn_report(Arc::clone(&self.reporter), report);
    }

    #[instrument(skip(self), fields(room = %self.name))]
    fn on_disconnect(&mut self, session_id: &str) {
        let Some(session) = self.sessions.remove(session_id) else {
            debug!("Disconnect for unknown session ignored");
            return;
        };

        self.matchmaker.leave(session_id);

        match session.role {
            Role::Idle => {}
            Role::Spectating { game_id } => {
                if let Some(watchers) = self.spectators.get_mut(&game_id) {
                    watchers.remove(session_id);
                }
            }
            Role::Playing { game_id, color } => {
                let Some(game) = self.games.get(&game_id) else {
                    return;
                };
                let opponent = game.player(color.opponent()).clone();
                info!(game_id = %game_id, %color, "Player disconnected mid-game");
                self.sessions.send(
                    &opponent,
                    ServerMessage::OpponentDisconnected {
                        message: format!("{} disconnected", session.display_name),
                    },
                );
                self.end_game(&game_id, EndReason::Disconnection, Some(color.opponent()));
            }
        }
    }

    #[instrument(skip(self, identity), fields(room = %self.name, valid = identity.valid))]
    fn on_identity_resolved(&mut self, session_id: &str, identity: Identity) {
        let Some(session) = self.sessions.get_mut(session_id) else {
            debug!("Identity resolved for departed session");
            return;
        };
        session.pending_validation = false;
        if identity.valid {
            if let Some(name) = identity.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
                session.display_name = sanitize_name(Some(name), session_id);
            }
            session.identity = Some(identity);
        }
        let display_name = session.display_name.clone();
        let account_type = session.account_type();
        let role = session.role.clone();

        if self.matchmaker.is_waiting(session_id) {
            self.send_waiting(session_id);
            return;
        }

        if let Role::Playing { game_id, color } = role
            && let Some(game) = self.games.get_mut(&game_id)
        {
            game.set_player_info(color, display_name, account_type);
            self.broadcast_state(&game_id);
        }
    }
}

/// Cloneable address of a running room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    name: String,
    mailbox: mpsc::UnboundedSender<RoomCommand>,
}

/// Address of a room that lets it stop once every [`RoomHandle`] is gone.
#[derive(Debug, Clone)]
pub struct WeakRoomHandle {
    name: String,
    mailbox: mpsc::WeakUnboundedSender<RoomCommand>,
}

impl WeakRoomHandle {
    /// A strong handle, if the room still has one elsewhere.
    pub fn upgrade(&self) -> Option<RoomHandle> {
        self.mailbox.upgrade().map(|mailbox| RoomHandle {
            name: self.name.clone(),
            mailbox,
        })
    }
}

impl RoomHandle {
    /// Starts a room task with random color assignment.
    pub fn spawn(
        name: String,
        validator: Arc<dyn IdentityValidator>,
        reporter: Arc<dyn ResultReporter>,
    ) -> Self {
        Self::spawn_with_matchmaker(name, validator, reporter, Matchmaker::new())
    }

    /// Starts a room task using `matchmaker` for pairing.
    #[instrument(skip(validator, reporter, matchmaker))]
    pub fn spawn_with_matchmaker(
        name: String,
        validator: Arc<dyn IdentityValidator>,
        reporter: Arc<dyn ResultReporter>,
        matchmaker: Matchmaker,
    ) -> Self {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let room = Room::new(
            name.clone(),
            validator,
            reporter,
            matchmaker,
            mailbox.downgrade(),
        );
        tokio::spawn(room.run(inbox));
        Self { name, mailbox }
    }

    /// Room name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `other` addresses the same room task.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.mailbox.same_channel(&other.mailbox)
    }

    /// Reference that does not keep the room running.
    pub fn downgrade(&self) -> WeakRoomHandle {
        WeakRoomHandle {
            name: self.name.clone(),
            mailbox: self.mailbox.downgrade(),
        }
    }

    /// Registers a new connection and returns its session ID.
    #[instrument(skip(self, outbox), fields(room = %self.name))]
    pub fn connect(&self, outbox: Outbox) -> SessionId {
        let session_id = Uuid::new_v4().to_string();
        self.send(RoomCommand::Connect {
            session_id: session_id.clone(),
            outbox,
        });
        session_id
    }

    /// Forwards a decoded client message.
    pub fn message(&self, session_id: &str, message: ClientMessage) {
        self.send(RoomCommand::Message {
            session_id: session_id.to_string(),
            message,
        });
    }

    /// Reports a closed connection.
    pub fn disconnect(&self, session_id: &str) {
        self.send(RoomCommand::Disconnect {
            session_id: session_id.to_string(),
        });
    }

    fn send(&self, command: RoomCommand) {
        if self.mailbox.send(command).is_err() {
            warn!(room = %self.name, "Room task has stopped, command dropped");
        }
    }
}
