//! Best-effort submission of finished games to a scoring service.

use crate::protocol::GameResult;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strictly_chess::{Color, EndReason};
use tracing::{debug, info, instrument, warn};

/// Result of a game from one participant's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Participant won.
    Win,
    /// Participant lost.
    Loss,
    /// Nobody won.
    Draw,
}

impl Outcome {
    /// Outcome for the side `color` given the game result.
    pub fn for_color(result: GameResult, color: Color) -> Self {
        match result.winner() {
            None => Outcome::Draw,
            Some(winner) if winner == color => Outcome::Win,
            Some(_) => Outcome::Loss,
        }
    }

    /// Tournament score: 1, 0.5 or 0.
    pub fn tournament_score(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }
}

/// One side of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct ParticipantRecord {
    /// Display name at the end of the game.
    pub name: String,
    /// Account identifier, if the player was authenticated.
    pub player_id: Option<String>,
}

/// Everything known about a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    /// Game identifier.
    pub game_id: String,
    /// White player.
    pub white: ParticipantRecord,
    /// Black player.
    pub black: ParticipantRecord,
    /// Final result.
    pub result: GameResult,
    /// Why the game ended.
    pub reason: EndReason,
    /// Moves in play order as UCI text.
    pub moves: Vec<String>,
    /// When the game started.
    pub started_at: DateTime<Utc>,
    /// When the game ended.
    pub ended_at: DateTime<Utc>,
}

impl GameReport {
    /// Participant playing `color`.
    pub fn participant(&self, color: Color) -> &ParticipantRecord {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// Result reporting failure.
#[derive(Debug, Clone, Display, Error)]
#[display("Report error: {} at {}:{}", message, file, line)]
pub struct ReportError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ReportError {
    /// Creates a new report error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Receives finished games.
#[async_trait::async_trait]
pub trait ResultReporter: Send + Sync {
    /// Submits one finished game.
    async fn report(&self, report: &GameReport) -> Result<(), ReportError>;
}

/// Submits `report` on a detached task. Failures are logged and dropped.
#[instrument(skip_all, fields(game_id = %report.game_id))]
pub fn spawn_report(reporter: Arc<dyn ResultReporter>, report: GameReport) {
    tokio::spawn(async move {
        match reporter.report(&report).await {
            Ok(()) => debug!(game_id = %report.game_id, "Game reported"),
            Err(e) => warn!(game_id = %report.game_id, error = %e, "Failed to report game"),
        }
    });
}

/// Reporter used when no scoring service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledReporter;

#[async_trait::async_trait]
impl ResultReporter for DisabledReporter {
    async fn report(&self, report: &GameReport) -> Result<(), ReportError> {
        debug!(game_id = %report.game_id, "Result reporting disabled");
        Ok(())
    }
}

/// Points awarded per outcome outside tournaments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct PointScale {
    /// Points for a win.
    #[serde(default = "default_win_points")]
    win: i32,
    /// Points for a draw.
    #[serde(default = "default_draw_points")]
    draw: i32,
    /// Points for a loss.
    #[serde(default)]
    loss: i32,
}

fn default_win_points() -> i32 {
    3
}

fn default_draw_points() -> i32 {
    1
}

impl PointScale {
    /// Creates a custom scale.
    pub fn new(win: i32, draw: i32, loss: i32) -> Self {
        Self { win, draw, loss }
    }

    /// Points for `outcome`.
    pub fn points(&self, outcome: Outcome) -> i32 {
        match outcome {
            Outcome::Win => self.win,
            Outcome::Draw => self.draw,
            Outcome::Loss => self.loss,
        }
    }
}

impl Default for PointScale {
    fn default() -> Self {
        Self::new(default_win_points(), default_draw_points(), 0)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreRecord<'a> {
    player_id: &'a str,
    game_id: &'a str,
    opponent_name: &'a str,
    outcome: Outcome,
    points: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TournamentRecord<'a> {
    player_id: &'a str,
    game_id: &'a str,
    opponent_name: &'a str,
    outcome: Outcome,
    score: f64,
}

/// Reporter posting one record per authenticated participant.
#[derive(Debug, Clone)]
pub struct HttpResultReporter {
    base_url: String,
    api_key: Option<String>,
    tournament_id: Option<String>,
    points: PointScale,
    client: reqwest::Client,
}

impl HttpResultReporter {
    /// Creates a reporter for the service at `base_url`.
    #[instrument(skip_all, fields(base_url = %base_url))]
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        tournament_id: Option<String>,
        points: PointScale,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            tournament_id,
            points,
            client: reqwest::Client::new(),
        }
    }

    async fn post<T: Serialize + Sync>(&self, url: &str, body: &T) -> Result<(), ReportError> {
        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ReportError::new(format!("Request to {} failed: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::new(format!("{} returned {}", url, status)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ResultReporter for HttpResultReporter {
    #[instrument(skip_all, fields(game_id = %report.game_id, tournament = ?self.tournament_id))]
    async fn report(&self, report: &GameReport) -> Result<(), ReportError> {
        let mut failures = Vec::new();

        for color in [Color::White, Color::Black] {
            let participant = report.participant(color);
            let Some(player_id) = participant.player_id.as_deref() else {
                debug!(%color, "Guest participant, skipping");
                continue;
            };
            let opponent_name = report.participant(color.opponent()).name.as_str();
            let outcome = Outcome::for_color(report.result, color);

            let sent = match &self.tournament_id {
                Some(tournament) => {
                    let url = format!("{}/tournaments/{}/results", self.base_url, tournament);
                    let record = TournamentRecord {
                        player_id,
                        game_id: &report.game_id,
                        opponent_name,
                        outcome,
                        score: outcome.tournament_score(),
                    };
                    self.post(&url, &record).await
                }
                None => {
                    let url = format!("{}/scores", self.base_url);
                    let record = ScoreRecord {
                        player_id,
                        game_id: &report.game_id,
                        opponent_name,
                        outcome,
                        points: self.points.points(outcome),
                    };
                    self.post(&url, &record).await
                }
            };

            match sent {
                Ok(()) => info!(player_id, ?outcome, "Score submitted"),
                Err(e) => failures.push(e.message),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ReportError::new(failures.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_per_color() {
        assert_eq!(Outcome::for_color(GameResult::White, Color::White), Outcome::Win);
        assert_eq!(Outcome::for_color(GameResult::White, Color::Black), Outcome::Loss);
        assert_eq!(Outcome::for_color(GameResult::Draw, Color::Black), Outcome::Draw);
    }

    #[test]
    fn test_default_point_scale() {
        let scale = PointScale::default();
        assert_eq!(scale.points(Outcome::Win), 3);
        assert_eq!(scale.points(Outcome::Draw), 1);
        assert_eq!(scale.points(Outcome::Loss), 0);
    }

    #[test]
    fn test_tournament_scores() {
        assert_eq!(Outcome::Win.tournament_score(), 1.0);
        assert_eq!(Outcome::Draw.tournament_score(), 0.5);
        assert_eq!(Outcome::Loss.tournament_score(), 0.0);
    }

    #[test]
    fn test_score_record_shape() {
        let record = ScoreRecord {
            player_id: "p1",
            game_id: "g1",
            opponent_name: "Bob",
            outcome: Outcome::Win,
            points: 3,
        };
        let json = serde_json::to_value(&record).expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({
                "playerId": "p1",
                "gameId": "g1",
                "opponentName": "Bob",
                "outcome": "win",
                "points": 3,
            })
        );
    }
}
