//! On-court lineup tracking.
//!
//! One tracker per game, owned by that game's aggregator. Substitutions move
//! players in and out; every period start hard-resets both teams to that
//! period's starters, which corrects drift from substitutions the feed missed.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::{Event, EventKind, GameContext, LINEUP_SIZE, Lineup, PlayerId, TeamId};

#[derive(Debug, Clone, Default)]
pub struct LineupTracker {
    on_court: HashMap<TeamId, BTreeSet<PlayerId>>,
}

impl LineupTracker {
    pub fn new(context: &GameContext) -> Self {
        let on_court = context.teams.iter().map(|t| (t.clone(), BTreeSet::new())).collect();
        Self { on_court }
    }

    /// Swap the outgoing player for the incoming one. Malformed substitutions
    /// (missing team or either id) leave the lineup alone, and a team never
    /// grows past five.
    pub fn process_substitution(&mut self, event: &Event) {
        let Some(sub) = &event.substitution else {
            return;
        };
        let (Some(team), Some(player_out), Some(player_in)) = (&sub.team, &sub.player_out, &sub.player_in)
        else {
            debug!("malformed substitution at event {}, ignored", event.index);
            return;
        };

        let on_court = self.on_court.entry(team.clone()).or_default();
        on_court.remove(player_out);
        if on_court.contains(player_in) {
            return;
        }
        if on_court.len() >= LINEUP_SIZE {
            warn!(
                "team {team}: {player_in} subbed in for {player_out} who was not on court; lineup already full"
            );
            return;
        }
        on_court.insert(player_in.clone());
    }

    /// Replace a team's lineup with the given starters (first five distinct ids).
    pub fn set_starting_lineup(&mut self, team: &str, starters: &[PlayerId]) {
        let on_court: BTreeSet<PlayerId> = starters.iter().take(LINEUP_SIZE).cloned().collect();
        if on_court.len() != LINEUP_SIZE {
            debug!("team {team}: starting lineup has {} known players", on_court.len());
        }
        self.on_court.insert(team.to_owned(), on_court);
    }

    pub fn get_lineup(&self, team: &str) -> Lineup {
        to_lineup(self.on_court.get(team).into_iter().flatten().cloned())
    }

    pub fn get_lineup_hash(&self, team: &str) -> Option<String> {
        lineup_hash(&self.get_lineup(team))
    }
}

// ---------------------------------------------------------------------------
// Lineup helpers
// ---------------------------------------------------------------------------

/// Sorted, de-duplicated, padded to exactly five slots. Extra ids are dropped.
pub fn to_lineup(ids: impl IntoIterator<Item = PlayerId>) -> Lineup {
    let sorted: BTreeSet<PlayerId> = ids.into_iter().collect();
    let mut lineup: Lineup = Default::default();
    for (slot, id) in lineup.iter_mut().zip(sorted) {
        *slot = Some(id);
    }
    lineup
}

/// Known ids joined with `-`; `None` when no slot is known.
pub fn lineup_hash(lineup: &Lineup) -> Option<String> {
    let ids: Vec<&str> = lineup.iter().flatten().map(String::as_str).collect();
    (!ids.is_empty()).then(|| ids.join("-"))
}

pub fn known_count(lineup: &Lineup) -> usize {
    lineup.iter().flatten().count()
}

pub fn is_complete(lineup: &Lineup) -> bool {
    known_count(lineup) == LINEUP_SIZE
}

// ---------------------------------------------------------------------------
// Starting lineups
// ---------------------------------------------------------------------------

/// Authoritative starters for one game, typically from a box score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingLineups {
    /// Game starters per team.
    #[serde(default)]
    pub game: HashMap<TeamId, Vec<PlayerId>>,
    /// Per-period starters, when the source records them.
    #[serde(default)]
    pub periods: BTreeMap<u8, HashMap<TeamId, Vec<PlayerId>>>,
}

/// Infer each team's starters for `period` from its opening events.
///
/// Scans up to `limit` non-administrative events. Any player acting for a team
/// counts until the team has five; players subbed out before acting count too,
/// and players subbed in are never starters.
pub fn infer_starters(events: &[Event], period: u8, limit: usize) -> HashMap<TeamId, Vec<PlayerId>> {
    let mut starters: HashMap<TeamId, Vec<PlayerId>> = HashMap::new();
    let mut subbed_in: HashSet<&str> = HashSet::new();
    let mut scanned = 0;

    let record = |starters: &mut HashMap<TeamId, Vec<PlayerId>>, team: &TeamId, id: &PlayerId| {
        let list = starters.entry(team.clone()).or_default();
        if list.len() < LINEUP_SIZE && !list.contains(id) {
            list.push(id.clone());
        }
    };

    for event in events.iter().filter(|e| e.period == period) {
        if scanned >= limit {
            break;
        }
        if event.kind == EventKind::Substitution {
            if let Some(sub) = &event.substitution {
                if let (Some(team), Some(out)) = (&sub.team, &sub.player_out)
                    && !subbed_in.contains(out.as_str())
                {
                    record(&mut starters, team, out);
                }
                if let Some(player_in) = &sub.player_in {
                    subbed_in.insert(player_in.as_str());
                }
            }
            continue;
        }
        if event.kind.is_administrative() {
            continue;
        }
        scanned += 1;

        for player in &event.players {
            if let Some(team) = &player.team
                && !subbed_in.contains(player.id.as_str())
            {
                record(&mut starters, team, &player.id);
            }
        }
    }
    starters
}

/// Picks the lineup applied at each period start.
///
/// Order per team: the source's period override, the source's game starters
/// (opening period only), inference over the period's own events, and finally
/// whatever the opening period used.
#[derive(Debug)]
pub struct StarterResolver<'a> {
    source: Option<&'a StartingLineups>,
    events: &'a [Event],
    teams: &'a [TeamId; 2],
    scan_limit: usize,
    opening: Option<HashMap<TeamId, Vec<PlayerId>>>,
}

impl<'a> StarterResolver<'a> {
    pub fn new(
        source: Option<&'a StartingLineups>,
        events: &'a [Event],
        context: &'a GameContext,
        scan_limit: usize,
    ) -> Self {
        Self { source, events, teams: &context.teams, scan_limit, opening: None }
    }

    pub fn for_period(&mut self, period: u8) -> Vec<(TeamId, Vec<PlayerId>)> {
        let is_opening = self.opening.is_none();
        let inferred = infer_starters(self.events, period, self.scan_limit);

        let resolved: Vec<(TeamId, Vec<PlayerId>)> = self
            .teams
            .iter()
            .map(|team| {
                let from_source = self.source.and_then(|s| {
                    s.periods
                        .get(&period)
                        .and_then(|p| p.get(team))
                        .or_else(|| if is_opening { s.game.get(team) } else { None })
                });
                let starters = from_source
                    .filter(|ids| !ids.is_empty())
                    .cloned()
                    .or_else(|| inferred.get(team).filter(|ids| !ids.is_empty()).cloned())
                    .or_else(|| self.opening.as_ref().and_then(|o| o.get(team)).cloned())
                    .unwrap_or_default();
                (team.clone(), starters)
            })
            .collect();

        if is_opening {
            self.opening = Some(resolved.iter().cloned().collect());
        }
        resolved
    }
}
