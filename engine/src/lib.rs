pub mod aggregate;
pub mod boundary;
pub mod boxscore;
pub mod coded;
pub mod config;
pub mod described;
pub mod game;
pub mod gap_fill;
pub mod lineup;
pub mod normalize;
pub mod text;

pub use config::{EngineConfig, League};
pub use game::{EngineError, EngineResult, GameOutput, RawGame, StarterSource, process_game};
pub use lineup::StartingLineups;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type TeamId = String;
pub type PlayerId = String;

/// Players on court per team.
pub const LINEUP_SIZE: usize = 5;

/// Always five slots; unknown slots are `None` and sort after known ids.
pub type Lineup = [Option<PlayerId>; LINEUP_SIZE];

// ---------------------------------------------------------------------------
// Canonical events, independent of provider wire format
// ---------------------------------------------------------------------------

/// Which provider schema an event was normalized from. Decided once per game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    Described,
    Coded,
}

/// The provider's own classification, kept verbatim for diagnostics.
/// Rules never look at this; they read `EventKind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawClass {
    Description(String),
    Coded { action_type: i32, subtype: i32 },
}

impl RawClass {
    pub fn schema(&self) -> Schema {
        match self {
            RawClass::Description(_) => Schema::Described,
            RawClass::Coded { .. } => Schema::Coded,
        }
    }
}

/// Position of a free throw inside its "N of M" trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeThrowSequence {
    pub number: u8,
    pub total: u8,
}

impl FreeThrowSequence {
    pub fn is_last(&self) -> bool {
        self.number >= self.total
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventKind {
    FieldGoal { made: bool, points: u8 },
    /// `sequence` is `None` for untagged trips (technicals), which count as last-of-sequence.
    FreeThrow { made: bool, sequence: Option<FreeThrowSequence> },
    /// `team` marks a team (deadball) rebound rather than a player rebound.
    Rebound { offensive: bool, team: bool },
    Turnover,
    Foul,
    Substitution,
    Timeout,
    JumpBall,
    PeriodStart,
    PeriodEnd,
    #[default]
    Other,
}

impl EventKind {
    pub fn is_made_field_goal(&self) -> bool {
        matches!(self, EventKind::FieldGoal { made: true, .. })
    }

    pub fn is_free_throw(&self) -> bool {
        matches!(self, EventKind::FreeThrow { .. })
    }

    pub fn is_last_free_throw(&self) -> bool {
        match self {
            EventKind::FreeThrow { sequence, .. } => sequence.is_none_or(|s| s.is_last()),
            _ => false,
        }
    }

    pub fn is_offensive_rebound(&self) -> bool {
        matches!(self, EventKind::Rebound { offensive: true, .. })
    }

    pub fn is_missed_shot(&self) -> bool {
        matches!(
            self,
            EventKind::FieldGoal { made: false, .. } | EventKind::FreeThrow { made: false, .. }
        )
    }

    /// Dead-ball bookkeeping that never identifies who has the ball.
    pub fn is_administrative(&self) -> bool {
        matches!(
            self,
            EventKind::Substitution
                | EventKind::Timeout
                | EventKind::JumpBall
                | EventKind::PeriodStart
                | EventKind::PeriodEnd
        )
    }
}

/// Cumulative score. Side `a` belongs to `GameContext::teams[0]`, side `b` to `teams[1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub a: u16,
    pub b: u16,
}

impl Score {
    pub fn new(a: u16, b: u16) -> Self {
        Self { a, b }
    }

    pub fn side(&self, side: usize) -> u16 {
        if side == 0 { self.a } else { self.b }
    }

    pub fn add(&mut self, side: usize, points: u16) {
        if side == 0 {
            self.a = self.a.saturating_add(points);
        } else {
            self.b = self.b.saturating_add(points);
        }
    }
}

/// A player participating in an action. `team` is set only when the provider ties them to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub team: Option<TeamId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    pub team: Option<TeamId>,
    pub player_out: Option<PlayerId>,
    pub player_in: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Position in the game's normalized event list.
    pub index: usize,
    pub team: Option<TeamId>,
    pub period: u8,
    /// Seconds remaining in the period.
    pub clock: u32,
    pub kind: EventKind,
    pub raw: RawClass,
    pub score: Score,
    pub substitution: Option<Substitution>,
    pub players: Vec<PlayerRef>,
}

impl Event {
    pub fn schema(&self) -> Schema {
        self.raw.schema()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    pub game_id: String,
    /// Order matches the sides of `Score`.
    pub teams: [TeamId; 2],
    pub season: Option<String>,
    pub date: Option<NaiveDate>,
}

impl GameContext {
    pub fn side_of(&self, team: &str) -> Option<usize> {
        self.teams.iter().position(|t| t == team)
    }

    pub fn opponent(&self, team: &str) -> Option<&TeamId> {
        self.side_of(team).map(|side| &self.teams[1 - side])
    }
}

// ---------------------------------------------------------------------------
// Finalized possessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PossessionResult {
    MadeFg,
    Miss,
    Turnover,
    Other,
}

/// Scoreboard situation at the start of a possession, from the offense's view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub score_differential: i32,
    pub is_clutch: bool,
    pub is_close_game: bool,
    pub is_blowout: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Possession {
    pub game_id: String,
    /// 1-based within the game.
    pub sequence: u32,
    pub period: u8,
    pub clock_remaining: u32,
    pub elapsed_seconds: u32,
    pub offense_team_id: TeamId,
    pub defense_team_id: TeamId,
    pub offense_lineup: Lineup,
    pub defense_lineup: Lineup,
    pub offense_lineup_hash: Option<String>,
    pub defense_lineup_hash: Option<String>,
    pub points_scored: u16,
    pub result: PossessionResult,
    pub duration_seconds: u32,
    pub shot_attempted: bool,
    pub shot_made: bool,
    pub turnover: bool,
    pub foul_drawn: bool,
    pub offensive_rebound: bool,
    #[serde(flatten)]
    pub state: GameState,
    /// Index of the possession's first event in the normalized event list.
    pub first_event: usize,
    pub event_count: usize,
}

impl Possession {
    pub fn possession_id(&self) -> String {
        format!("{}:{}", self.game_id, self.sequence)
    }

    /// Whether the normalized event at `index` belongs to this possession.
    pub fn owns_event(&self, index: usize) -> bool {
        (self.first_event..self.first_event + self.event_count).contains(&index)
    }

    pub fn has_complete_lineups(&self) -> bool {
        lineup::is_complete(&self.offense_lineup) && lineup::is_complete(&self.defense_lineup)
    }
}
