use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::aggregate::PossessionAggregator;
use crate::coded::CodedGame;
use crate::described::DescribedGame;
use crate::gap_fill::fill_lineup_gaps;
use crate::lineup::{LineupTracker, StarterResolver, StartingLineups};
use crate::normalize::{self, NormalizedGame};
use crate::{EngineConfig, GameContext, Possession, Score};

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures are per game; callers skip the game and move on.
#[derive(Debug)]
pub enum EngineError {
    EmptyGame(String),
    UnresolvedTeams(String),
    OutOfOrder { game_id: String, index: usize },
    Parsing(String),
    Io(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::EmptyGame(id) => write!(f, "Game {id} has no events"),
            EngineError::UnresolvedTeams(id) => write!(f, "Could not resolve two teams for game {id}"),
            EngineError::OutOfOrder { game_id, index } => {
                write!(f, "Game {game_id}: event {index} is out of chronological order")
            }
            EngineError::Parsing(msg) => write!(f, "Parse error: {msg}"),
            EngineError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One game's raw feed. The `schema` tag picks the provider variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum RawGame {
    Described(DescribedGame),
    Coded(CodedGame),
}

impl RawGame {
    pub fn game_id(&self) -> &str {
        match self {
            RawGame::Described(g) => &g.game_id,
            RawGame::Coded(g) => &g.game_id,
        }
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::Parsing(e.to_string()))
    }

    pub fn from_path(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Io(format!("could not read {}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| EngineError::Parsing(format!("{}: {e}", path.display())))
    }

    fn normalize(self, config: &EngineConfig) -> EngineResult<NormalizedGame> {
        match self {
            RawGame::Described(g) => normalize::normalize_described(g, config),
            RawGame::Coded(g) => normalize::normalize_coded(g, config),
        }
    }
}

/// Lookup of authoritative starters, consulted once per game.
pub trait StarterSource {
    fn starters(&self, game_id: &str) -> Option<StartingLineups>;
}

impl StarterSource for HashMap<String, StartingLineups> {
    fn starters(&self, game_id: &str) -> Option<StartingLineups> {
        self.get(game_id).cloned()
    }
}

/// No source: every lineup is inferred.
impl StarterSource for () {
    fn starters(&self, _game_id: &str) -> Option<StartingLineups> {
        None
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GameOutput {
    pub context: GameContext,
    pub possessions: Vec<Possession>,
    pub final_score: Score,
    /// Whether each team's possession points add up to its final score.
    pub conservation_ok: bool,
    /// Possessions whose lineups gap-fill changed.
    pub gap_filled: usize,
}

/// Run one game end to end: normalize, aggregate, gap-fill, check conservation.
///
/// Nothing is returned until the whole game is done, so a failed game leaves no
/// partial possessions behind.
pub fn process_game(
    raw: RawGame,
    starters: &dyn StarterSource,
    config: &EngineConfig,
) -> EngineResult<GameOutput> {
    let source = starters.starters(raw.game_id());
    let game = raw.normalize(config)?;
    let context = &game.context;
    debug!(
        "{}: {} events, {} vs {}, box-score starters: {}",
        context.game_id,
        game.events.len(),
        context.teams[0],
        context.teams[1],
        source.is_some()
    );

    let mut resolver =
        StarterResolver::new(source.as_ref(), &game.events, context, config.starter_scan_events);
    let mut aggregator = PossessionAggregator::new(context, config, LineupTracker::new(context));

    let mut period = None;
    let mut events = game.events.iter().peekable();
    while let Some(event) = events.next() {
        if period != Some(event.period) {
            period = Some(event.period);
            aggregator.start_period(event.period, resolver.for_period(event.period));
        }
        aggregator.push(event, events.peek().copied());
    }

    let mut possessions = aggregator.finish();
    let gap_filled = fill_lineup_gaps(&mut possessions);
    let final_score = game.final_score();
    let conservation_ok = check_conservation(context, &possessions, final_score);

    info!(
        "{}: {} possessions, final {}-{}, {} gap-filled",
        context.game_id,
        possessions.len(),
        final_score.a,
        final_score.b,
        gap_filled
    );

    Ok(GameOutput {
        context: game.context.clone(),
        possessions,
        final_score,
        conservation_ok,
        gap_filled,
    })
}

/// Sum possession points per offense team and compare with the final score.
pub fn check_conservation(context: &GameContext, possessions: &[Possession], final_score: Score) -> bool {
    let mut totals = Score::default();
    for p in possessions {
        if let Some(side) = context.side_of(&p.offense_team_id) {
            totals.add(side, p.points_scored);
        }
    }
    if totals != final_score {
        warn!(
            "{}: possession points {}-{} do not match final score {}-{}",
            context.game_id, totals.a, totals.b, final_score.a, final_score.b
        );
        return false;
    }
    true
}
