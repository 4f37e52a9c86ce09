//! Provider rows → canonical `Event`s.
//!
//! Each schema variant is handled once here; nothing downstream branches on
//! the provider. Unparseable clocks and scores carry the last known value
//! forward instead of failing the game.

use chrono::NaiveDate;
use log::{debug, warn};

use crate::coded::{self, CodedGame, CodedRow, WireId};
use crate::described::{DescribedGame, DescribedRow};
use crate::game::{EngineError, EngineResult};
use crate::{
    EngineConfig, Event, EventKind, GameContext, PlayerRef, RawClass, Score, Substitution, TeamId, text,
};

/// A game's context plus its events in chronological order.
#[derive(Debug, Clone)]
pub struct NormalizedGame {
    pub context: GameContext,
    pub events: Vec<Event>,
}

impl NormalizedGame {
    pub fn final_score(&self) -> Score {
        self.events.last().map(|e| e.score).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Variant A: descriptive text
// ---------------------------------------------------------------------------

pub fn normalize_described(game: DescribedGame, config: &EngineConfig) -> EngineResult<NormalizedGame> {
    if game.events.is_empty() {
        return Err(EngineError::EmptyGame(game.game_id));
    }
    let teams = described_teams(&game)
        .ok_or_else(|| EngineError::UnresolvedTeams(game.game_id.clone()))?;
    let context = GameContext {
        teams,
        season: game.season,
        date: game.date.as_deref().and_then(parse_date),
        game_id: game.game_id,
    };

    let mut cursor = Cursor::default();
    let mut events = Vec::with_capacity(game.events.len());

    for (index, row) in game.events.into_iter().enumerate() {
        let (period, clock) = cursor.advance_clock(row.period, row.clock.as_deref(), config);

        let previous = cursor.score;
        if let Some(raw) = row.score.as_deref() {
            match parse_score(raw) {
                Some(score) => cursor.score = score,
                None => warn!("{}: unparseable score {raw:?} at event {index}, carrying forward", context.game_id),
            }
        }

        let team = resolve_described_team(&context, &row, previous, cursor.score, index);
        let description = row.description.unwrap_or_default();
        let kind = text::classify(&description);
        let ids: Vec<String> = row.player_ids.iter().filter_map(WireId::to_id).collect();

        let substitution = (kind == EventKind::Substitution).then(|| Substitution {
            team: team.clone(),
            player_in: ids.first().cloned(),
            player_out: ids.get(1).cloned(),
        });

        // Only the acting player is tied to the row's team, except on substitutions.
        let players = ids
            .into_iter()
            .enumerate()
            .map(|(slot, id)| PlayerRef {
                id,
                team: (slot == 0 || substitution.is_some()).then(|| team.clone()).flatten(),
            })
            .collect();

        events.push(Event {
            index,
            team,
            period,
            clock,
            kind,
            raw: RawClass::Description(description),
            score: cursor.score,
            substitution,
            players,
        });
    }

    check_order(&context.game_id, &events)?;
    Ok(NormalizedGame { context, events })
}

/// Teams as `[away, home]`, matching the "away - home" score string.
fn described_teams(game: &DescribedGame) -> Option<[TeamId; 2]> {
    let away = game.away_team_id.as_ref().and_then(WireId::to_id);
    let home = game.home_team_id.as_ref().and_then(WireId::to_id);
    if let (Some(away), Some(home)) = (&away, &home) {
        return Some([away.clone(), home.clone()]);
    }

    let mut seen: Vec<TeamId> = Vec::with_capacity(2);
    for id in away.iter().chain(home.iter()).cloned().chain(
        game.events.iter().filter_map(|r| r.team_id.as_ref().and_then(WireId::to_id)),
    ) {
        if !seen.contains(&id) {
            seen.push(id);
        }
        if seen.len() == 2 {
            break;
        }
    }
    if seen.len() < 2 {
        return None;
    }

    if away.is_some() {
        return Some([seen[0].clone(), seen[1].clone()]);
    }
    if home.is_some() {
        return Some([seen[1].clone(), seen[0].clone()]);
    }

    // No header: the first scoring row tells us which side each team owns.
    let mut previous = Score::default();
    for row in &game.events {
        let Some(score) = row.score.as_deref().and_then(parse_score) else {
            continue;
        };
        if score == previous {
            continue;
        }
        if let Some(team) = row.team_id.as_ref().and_then(WireId::to_id)
            && let Some(pos) = seen.iter().position(|t| *t == team)
        {
            let away_idx = if score.a != previous.a { pos } else { 1 - pos };
            return Some([seen[away_idx].clone(), seen[1 - away_idx].clone()]);
        }
        previous = score;
    }
    Some([seen[0].clone(), seen[1].clone()])
}

fn resolve_described_team(
    context: &GameContext,
    row: &DescribedRow,
    previous: Score,
    current: Score,
    index: usize,
) -> Option<TeamId> {
    if let Some(team) = row.team_id.as_ref().and_then(WireId::to_id) {
        if context.side_of(&team).is_some() {
            return Some(team);
        }
        warn!("{}: event {index} references unknown team {team}", context.game_id);
    }

    // Exactly one side moving pins the scorer.
    match (current.a != previous.a, current.b != previous.b) {
        (true, false) => Some(context.teams[0].clone()),
        (false, true) => Some(context.teams[1].clone()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Variant B: integer codes
// ---------------------------------------------------------------------------

pub fn normalize_coded(game: CodedGame, config: &EngineConfig) -> EngineResult<NormalizedGame> {
    if game.events.is_empty() {
        return Err(EngineError::EmptyGame(game.game_id));
    }
    let teams = scan_coded_teams(&game.events, config.team_scan_events)
        .ok_or_else(|| EngineError::UnresolvedTeams(game.game_id.clone()))?;
    debug!("{}: inferred teams {} and {}", game.game_id, teams[0], teams[1]);
    let context = GameContext {
        teams,
        season: game.season,
        date: game.date.as_deref().and_then(parse_date),
        game_id: game.game_id,
    };

    let mut cursor = Cursor::default();
    let mut events = Vec::with_capacity(game.events.len());

    for (index, row) in game.events.into_iter().enumerate() {
        let (period, clock) = cursor.advance_clock(row.period, row.clock.as_deref(), config);
        let refs = row.player_refs();
        let kind = classify_code(&row);

        let known = |team: &Option<String>| team.clone().filter(|t| context.side_of(t).is_some());
        let team = known(&refs[0].1).or_else(|| {
            (kind == EventKind::Substitution).then(|| known(&refs[1].1)).flatten()
        });

        let awarded = awarded_points(&row, kind);
        if awarded > 0 {
            match team.as_deref().and_then(|t| context.side_of(t)) {
                Some(side) => cursor.score.add(side, awarded),
                None => warn!(
                    "{}: {awarded} points on event {index} with no resolvable team, dropped",
                    context.game_id
                ),
            }
        }

        let substitution = (kind == EventKind::Substitution).then(|| Substitution {
            team: team.clone(),
            player_out: refs[0].0.clone(),
            player_in: refs[1].0.clone(),
        });

        events.push(Event {
            index,
            team,
            period,
            clock,
            kind,
            raw: RawClass::Coded { action_type: row.action_type, subtype: row.subtype },
            score: cursor.score,
            substitution,
            players: refs
                .into_iter()
                .filter_map(|(id, team)| Some(PlayerRef { id: id?, team: known(&team) }))
                .collect(),
        });
    }

    check_order(&context.game_id, &events)?;
    Ok(NormalizedGame { context, events })
}

/// Distinct team ids on player-action fields, in order of first appearance.
fn scan_coded_teams(rows: &[CodedRow], limit: usize) -> Option<[TeamId; 2]> {
    let mut seen: Vec<TeamId> = Vec::with_capacity(2);
    for row in rows.iter().take(limit) {
        for (_, team) in row.player_refs() {
            if let Some(team) = team
                && !seen.contains(&team)
            {
                seen.push(team);
            }
        }
    }
    match seen.as_slice() {
        [first, second, ..] => Some([first.clone(), second.clone()]),
        _ => None,
    }
}

pub fn classify_code(row: &CodedRow) -> EventKind {
    let team_rebound = row.subtype != coded::PLAYER_REBOUND;
    match row.action_type {
        coded::MADE_SHOT => EventKind::FieldGoal {
            made: true,
            points: row.points.map_or(2, |p| p.min(3) as u8),
        },
        // Value of a miss isn't carried by this schema.
        coded::MISSED_SHOT => EventKind::FieldGoal { made: false, points: 2 },
        coded::FREE_THROW => EventKind::FreeThrow {
            made: row.points.is_some_and(|p| p > 0),
            sequence: coded::free_throw_sequence(row.subtype),
        },
        coded::OFFENSIVE_REBOUND => EventKind::Rebound { offensive: true, team: team_rebound },
        coded::DEFENSIVE_REBOUND => EventKind::Rebound { offensive: false, team: team_rebound },
        coded::TURNOVER => EventKind::Turnover,
        coded::FOUL => EventKind::Foul,
        coded::SUBSTITUTION => EventKind::Substitution,
        coded::TIMEOUT => EventKind::Timeout,
        coded::JUMP_BALL => EventKind::JumpBall,
        coded::PERIOD_START => EventKind::PeriodStart,
        coded::PERIOD_END => EventKind::PeriodEnd,
        _ => EventKind::Other,
    }
}

fn awarded_points(row: &CodedRow, kind: EventKind) -> u16 {
    match (row.points, kind) {
        (Some(points), _) => points,
        (None, EventKind::FieldGoal { made: true, points }) => u16::from(points),
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Shared field recovery
// ---------------------------------------------------------------------------

/// Last known period/clock/score while walking a game's rows.
#[derive(Debug, Default)]
struct Cursor {
    period: Option<u8>,
    clock: u32,
    score: Score,
}

impl Cursor {
    fn advance_clock(&mut self, period: Option<u8>, clock: Option<&str>, config: &EngineConfig) -> (u8, u32) {
        let period = period.or(self.period).unwrap_or(1);
        let new_period = self.period != Some(period);
        let parsed = clock.and_then(parse_clock);

        self.clock = match parsed {
            Some(seconds) => seconds,
            None if new_period => config.period_length(period),
            None => self.clock,
        };
        if parsed.is_none() && clock.is_some() {
            debug!("unparseable clock {clock:?} in period {period}, carrying forward");
        }
        self.period = Some(period);
        (period, self.clock)
    }
}

/// Seconds remaining from "11:32", "4:05.7", "45.3", "PT11M32.00S" or "692".
pub fn parse_clock(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if let Some(iso) = s.strip_prefix("PT") {
        let (minutes, rest) = match iso.split_once('M') {
            Some((m, rest)) => (m.parse::<u32>().ok()?, rest),
            None => (0, iso),
        };
        let seconds = match rest.strip_suffix('S') {
            Some(secs) => whole_seconds(secs)?,
            None if rest.is_empty() => 0,
            None => return None,
        };
        return minutes.checked_mul(60)?.checked_add(seconds);
    }

    match s.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes = minutes.trim().parse::<u32>().ok()?;
            let seconds = whole_seconds(seconds.trim())?;
            if seconds >= 60 {
                return None;
            }
            minutes.checked_mul(60)?.checked_add(seconds)
        }
        None => whole_seconds(s),
    }
}

fn whole_seconds(s: &str) -> Option<u32> {
    let whole = s.split('.').next()?;
    if whole.is_empty() {
        return None;
    }
    whole.parse::<u32>().ok()
}

/// "away - home" → `Score { a: away, b: home }`.
pub fn parse_score(raw: &str) -> Option<Score> {
    let (away, home) = raw.split_once('-')?;
    Some(Score::new(away.trim().parse().ok()?, home.trim().parse().ok()?))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

/// Period ascending, clock non-increasing within a period.
fn check_order(game_id: &str, events: &[Event]) -> EngineResult<()> {
    for pair in events.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let backwards = next.period < prev.period || (next.period == prev.period && next.clock > prev.clock);
        if backwards {
            return Err(EngineError::OutOfOrder {
                game_id: game_id.to_owned(),
                index: next.index,
            });
        }
    }
    Ok(())
}
