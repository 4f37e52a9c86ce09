//! Buffers a game's events into possessions.

use log::debug;

use crate::boundary::{self, Decision};
use crate::lineup::{self, LineupTracker};
use crate::{
    EngineConfig, Event, EventKind, GameContext, GameState, PlayerId, Possession, PossessionResult, Score,
    TeamId,
};

/// Events since the last boundary.
#[derive(Debug, Default)]
struct OpenPossession<'a> {
    events: Vec<&'a Event>,
    offense: Option<TeamId>,
    /// Offense came from a foul and yields to the first shot, free throw, rebound or turnover.
    provisional: bool,
    start_score: Score,
}

/// One per game. Owns that game's lineup tracker.
#[derive(Debug)]
pub struct PossessionAggregator<'a> {
    context: &'a GameContext,
    config: &'a EngineConfig,
    lineups: LineupTracker,
    open: OpenPossession<'a>,
    /// `None` until the first event, which seeds it with the score before that event.
    last_score: Option<Score>,
    emitted: Vec<Possession>,
}

impl<'a> PossessionAggregator<'a> {
    pub fn new(context: &'a GameContext, config: &'a EngineConfig, lineups: LineupTracker) -> Self {
        Self {
            context,
            config,
            lineups,
            open: OpenPossession::default(),
            last_score: None,
            emitted: Vec::new(),
        }
    }

    /// Close anything still open from the previous period, then hard-reset
    /// both teams to the new period's starters.
    pub fn start_period(&mut self, period: u8, starters: Vec<(TeamId, Vec<PlayerId>)>) {
        if !self.open.events.is_empty() {
            debug!(
                "{}: possession still open at start of period {period}, closing it",
                self.context.game_id
            );
            self.close();
        }
        for (team, ids) in starters {
            self.lineups.set_starting_lineup(&team, &ids);
        }
    }

    /// Feed the next event in chronological order, with one event of lookahead.
    pub fn push(&mut self, event: &'a Event, next: Option<&Event>) -> Decision {
        if event.substitution.is_some() {
            self.lineups.process_substitution(event);
        }

        let last_score = match self.last_score {
            Some(score) => score,
            None => self.score_before(event),
        };
        if self.open.events.is_empty() {
            self.open.start_score = last_score;
        }
        self.open.events.push(event);
        if (self.open.offense.is_none() || self.open.provisional)
            && let Some((team, provisional)) = self.offense_from(event)
            && (self.open.offense.is_none() || !provisional)
        {
            self.open.offense = Some(team);
            self.open.provisional = provisional;
        }

        let decision = boundary::decide(event, next, self.open.start_score);
        self.last_score = Some(event.score);
        if decision.closes() {
            debug!(
                "{}: possession closed at event {} by {:?}",
                self.context.game_id,
                event.index,
                decision.rule()
            );
            self.close();
        }
        decision
    }

    /// Flush the trailing buffer (truncated feeds) and hand back every possession.
    pub fn finish(mut self) -> Vec<Possession> {
        if !self.open.events.is_empty() {
            debug!("{}: flushing terminal possession", self.context.game_id);
            self.close();
        }
        self.emitted
    }

    /// Which team an event puts on offense, if it says at all, and whether
    /// that is only a guess from a foul.
    fn offense_from(&self, event: &Event) -> Option<(TeamId, bool)> {
        let team = event.team.as_deref()?;
        match event.kind {
            EventKind::FieldGoal { .. }
            | EventKind::FreeThrow { .. }
            | EventKind::Rebound { .. }
            | EventKind::Turnover => Some((team.to_owned(), false)),
            EventKind::Foul => self.context.opponent(team).map(|t| (t.clone(), true)),
            _ => None,
        }
    }

    /// Scoreboard before the feed's first event. A feed may start mid-game, so
    /// only the first event's own points are taken back off.
    fn score_before(&self, event: &Event) -> Score {
        let points = match event.kind {
            EventKind::FieldGoal { made: true, points } => u16::from(points),
            EventKind::FreeThrow { made: true, .. } => 1,
            _ => 0,
        };
        let mut score = event.score;
        if let Some(side) = event.team.as_deref().and_then(|t| self.context.side_of(t)) {
            let before = score.side(side).saturating_sub(points);
            score = if side == 0 { Score::new(before, score.b) } else { Score::new(score.a, before) };
        }
        score
    }

    fn close(&mut self) {
        let open = std::mem::take(&mut self.open);
        let (Some(first), Some(last)) = (open.events.first(), open.events.last()) else {
            return;
        };
        let Some(offense) = open.offense else {
            debug!(
                "{}: dropping {} unattributed event(s) at {}",
                self.context.game_id,
                open.events.len(),
                first.index
            );
            return;
        };
        let (Some(side), Some(defense)) =
            (self.context.side_of(&offense), self.context.opponent(&offense).cloned())
        else {
            return;
        };

        let start = open.start_score;
        let points_scored = last.score.side(side).saturating_sub(start.side(side));
        let by = |e: &&Event, team: &str| e.team.as_deref() == Some(team);

        let shot_attempted = open
            .events
            .iter()
            .any(|e| matches!(e.kind, EventKind::FieldGoal { .. }) && by(e, offense.as_str()));
        let shot_made = open.events.iter().any(|e| e.kind.is_made_field_goal() && by(e, offense.as_str()));
        let turnover = open
            .events
            .iter()
            .any(|e| e.kind == EventKind::Turnover && !by(e, defense.as_str()));
        let foul_drawn = open.events.iter().any(|e| e.kind == EventKind::Foul && by(e, defense.as_str()));
        let offensive_rebound = open.events.iter().any(|e| e.kind.is_offensive_rebound());

        let duration_seconds = if first.period == last.period {
            first.clock.saturating_sub(last.clock)
        } else {
            0
        };

        let score_differential = i32::from(start.side(side)) - i32::from(start.side(1 - side));
        let margin = score_differential.unsigned_abs();
        let state = GameState {
            score_differential,
            is_clutch: self.config.is_clutch(first.period, first.clock, score_differential),
            is_close_game: margin <= u32::from(self.config.close_margin),
            is_blowout: margin >= u32::from(self.config.blowout_margin),
        };

        let offense_lineup = self.lineups.get_lineup(&offense);
        let defense_lineup = self.lineups.get_lineup(&defense);

        self.emitted.push(Possession {
            game_id: self.context.game_id.clone(),
            sequence: self.emitted.len() as u32 + 1,
            period: first.period,
            clock_remaining: first.clock,
            elapsed_seconds: self.config.elapsed_seconds(first.period, first.clock),
            offense_lineup_hash: lineup::lineup_hash(&offense_lineup),
            defense_lineup_hash: lineup::lineup_hash(&defense_lineup),
            offense_lineup,
            defense_lineup,
            offense_team_id: offense,
            defense_team_id: defense,
            points_scored,
            result: classify_result(points_scored, last.kind),
            duration_seconds,
            shot_attempted,
            shot_made,
            turnover,
            foul_drawn,
            offensive_rebound,
            state,
            first_event: first.index,
            event_count: open.events.len(),
        });
    }
}

fn classify_result(points: u16, last: EventKind) -> PossessionResult {
    if points > 0 {
        return PossessionResult::MadeFg;
    }
    match last {
        EventKind::Turnover => PossessionResult::Turnover,
        EventKind::Rebound { offensive: false, .. } => PossessionResult::Miss,
        kind if kind.is_missed_shot() => PossessionResult::Miss,
        _ => PossessionResult::Other,
    }
}
