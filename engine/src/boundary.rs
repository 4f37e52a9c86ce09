//! Possession boundary rules.
//!
//! Evaluated once per event in strict precedence order. The only inputs are
//! the event, the score at possession start, and a single event of lookahead.

use crate::{Event, EventKind, Score};

/// Which precedence row decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    OffensiveRebound,
    DefensiveRebound,
    Turnover,
    PeriodEnd,
    FreeThrow,
    AndOne,
    ScoreChange,
    NoChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue(Rule),
    Close(Rule),
}

impl Decision {
    pub fn closes(&self) -> bool {
        matches!(self, Decision::Close(_))
    }

    pub fn rule(&self) -> Rule {
        match self {
            Decision::Continue(rule) | Decision::Close(rule) => *rule,
        }
    }
}

pub fn decide(event: &Event, next: Option<&Event>, start_score: Score) -> Decision {
    let kind = event.kind;
    match kind {
        // Must win over any score change on the same event.
        EventKind::Rebound { offensive: true, .. } => Decision::Continue(Rule::OffensiveRebound),
        // Team deadball rebounds fall through: they don't hand over the ball.
        EventKind::Rebound { offensive: false, team: false } => Decision::Close(Rule::DefensiveRebound),
        EventKind::Turnover => Decision::Close(Rule::Turnover),
        EventKind::PeriodEnd => Decision::Close(Rule::PeriodEnd),
        EventKind::FreeThrow { .. } if kind.is_last_free_throw() => Decision::Close(Rule::FreeThrow),
        EventKind::FreeThrow { .. } => Decision::Continue(Rule::FreeThrow),
        EventKind::FieldGoal { made: true, .. } if next.is_some_and(|n| n.kind.is_free_throw()) => {
            Decision::Continue(Rule::AndOne)
        }
        _ if event.score != start_score => Decision::Close(Rule::ScoreChange),
        _ => Decision::Continue(Rule::NoChange),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FreeThrowSequence, RawClass};

    fn event(kind: EventKind, score: Score) -> Event {
        Event {
            index: 0,
            team: Some("A".into()),
            period: 1,
            clock: 600,
            kind,
            raw: RawClass::Description(String::new()),
            score,
            substitution: None,
            players: vec![],
        }
    }

    fn ft(number: u8, total: u8) -> EventKind {
        EventKind::FreeThrow {
            made: true,
            sequence: Some(FreeThrowSequence { number, total }),
        }
    }

    #[test]
    fn offensive_rebound_never_closes_even_with_score_change() {
        let oreb = event(EventKind::Rebound { offensive: true, team: false }, Score::new(2, 0));
        assert_eq!(decide(&oreb, None, Score::new(0, 0)), Decision::Continue(Rule::OffensiveRebound));
    }

    #[test]
    fn defensive_player_rebound_closes_team_rebound_does_not() {
        let dreb = event(EventKind::Rebound { offensive: false, team: false }, Score::default());
        assert_eq!(decide(&dreb, None, Score::default()), Decision::Close(Rule::DefensiveRebound));

        let team_dreb = event(EventKind::Rebound { offensive: false, team: true }, Score::default());
        assert_eq!(decide(&team_dreb, None, Score::default()), Decision::Continue(Rule::NoChange));
    }

    #[test]
    fn turnover_and_period_end_always_close() {
        let start = Score::new(10, 10);
        assert!(decide(&event(EventKind::Turnover, start), None, start).closes());
        assert_eq!(
            decide(&event(EventKind::PeriodEnd, start), None, start),
            Decision::Close(Rule::PeriodEnd)
        );
    }

    #[test]
    fn free_throws_close_only_on_last_of_trip() {
        let start = Score::new(44, 44);
        let first = event(ft(1, 2), Score::new(45, 44));
        let last = event(ft(2, 2), Score::new(46, 44));
        assert_eq!(decide(&first, Some(&last), start), Decision::Continue(Rule::FreeThrow));
        assert_eq!(decide(&last, None, start), Decision::Close(Rule::FreeThrow));

        let technical = event(EventKind::FreeThrow { made: true, sequence: None }, Score::new(47, 44));
        assert_eq!(decide(&technical, None, Score::new(46, 44)), Decision::Close(Rule::FreeThrow));
    }

    #[test]
    fn made_basket_followed_by_free_throw_defers() {
        let start = Score::new(0, 0);
        let basket = event(EventKind::FieldGoal { made: true, points: 2 }, Score::new(2, 0));
        let and_one = event(ft(1, 1), Score::new(3, 0));
        assert_eq!(decide(&basket, Some(&and_one), start), Decision::Continue(Rule::AndOne));

        let foul = event(EventKind::Foul, Score::new(2, 0));
        assert_eq!(decide(&basket, Some(&foul), start), Decision::Close(Rule::ScoreChange));
        assert_eq!(decide(&basket, None, start), Decision::Close(Rule::ScoreChange));
    }

    #[test]
    fn quiet_events_continue() {
        let start = Score::new(5, 3);
        let miss = event(EventKind::FieldGoal { made: false, points: 3 }, start);
        assert_eq!(decide(&miss, None, start), Decision::Continue(Rule::NoChange));
        assert_eq!(decide(&event(EventKind::Timeout, start), None, start).rule(), Rule::NoChange);
    }
}
