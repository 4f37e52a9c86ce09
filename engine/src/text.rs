//! Free-text description parser for the descriptive schema.
//!
//! All substring matching over provider text lives here. The boundary rules
//! only ever see the `EventKind` this returns. Phrasing outside the patterns
//! below falls through to `EventKind::Other`.

use crate::{EventKind, FreeThrowSequence};

pub fn classify(description: &str) -> EventKind {
    let text = description.trim().to_lowercase();

    if text.contains("free throw") {
        return EventKind::FreeThrow {
            made: !is_miss(&text),
            sequence: parse_sequence(&text),
        };
    }

    if text.contains("rebound") {
        if text.contains("offensive") {
            return EventKind::Rebound { offensive: true, team: false };
        }
        if text.contains("defensive") {
            return EventKind::Rebound { offensive: false, team: false };
        }
        return EventKind::Other;
    }

    if text.contains("turnover") {
        return EventKind::Turnover;
    }
    if text.starts_with("end of") {
        return EventKind::PeriodEnd;
    }
    if text.starts_with("start of") || text.starts_with("beginning of") {
        return EventKind::PeriodStart;
    }
    if text.contains("enters the game") || text.contains("substitution") {
        return EventKind::Substitution;
    }
    if text.contains("timeout") {
        return EventKind::Timeout;
    }
    if text.contains("jump ball") {
        return EventKind::JumpBall;
    }

    if is_miss(&text) {
        return EventKind::FieldGoal { made: false, points: shot_value(&text) };
    }
    if text.contains("makes") || text.contains("made") {
        return EventKind::FieldGoal { made: true, points: shot_value(&text) };
    }

    if text.contains("foul") {
        return EventKind::Foul;
    }
    EventKind::Other
}

/// First "N of M" in the text, e.g. "free throw 2 of 3" → 2 of 3.
pub fn parse_sequence(text: &str) -> Option<FreeThrowSequence> {
    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    tokens.windows(3).find_map(|w| {
        if !w[1].eq_ignore_ascii_case("of") {
            return None;
        }
        let number = w[0].parse::<u8>().ok()?;
        let total = w[2].parse::<u8>().ok()?;
        (number >= 1 && number <= total).then_some(FreeThrowSequence { number, total })
    })
}

fn is_miss(text: &str) -> bool {
    text.contains("miss")
}

fn shot_value(text: &str) -> u8 {
    if text.contains("three point") || text.contains("3-pt") || text.contains("3pt") {
        3
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_throws_carry_sequence_position() {
        assert_eq!(
            classify("Jalen Brunson makes free throw 2 of 2"),
            EventKind::FreeThrow {
                made: true,
                sequence: Some(FreeThrowSequence { number: 2, total: 2 })
            }
        );
        assert_eq!(
            classify("Jalen Brunson misses free throw 1 of 3"),
            EventKind::FreeThrow {
                made: false,
                sequence: Some(FreeThrowSequence { number: 1, total: 3 })
            }
        );
    }

    #[test]
    fn technical_free_throw_is_untagged() {
        let kind = classify("Luka Doncic makes technical free throw");
        assert_eq!(kind, EventKind::FreeThrow { made: true, sequence: None });
        assert!(kind.is_last_free_throw());
    }

    #[test]
    fn rebounds_split_by_side() {
        assert!(classify("Mitchell Robinson Offensive Rebound.").is_offensive_rebound());
        assert_eq!(
            classify("Defensive Rebound by Zach Edey"),
            EventKind::Rebound { offensive: false, team: false }
        );
        assert_eq!(classify("Rebound"), EventKind::Other);
    }

    #[test]
    fn field_goals_read_make_miss_and_value() {
        assert_eq!(
            classify("Stephen Curry makes 26-foot three point jumper (Draymond Green assists)"),
            EventKind::FieldGoal { made: true, points: 3 }
        );
        assert_eq!(
            classify("Jayson Tatum misses 12-foot pullup jump shot"),
            EventKind::FieldGoal { made: false, points: 2 }
        );
    }

    #[test]
    fn administrative_markers() {
        assert_eq!(classify("End of the 1st Quarter"), EventKind::PeriodEnd);
        assert_eq!(classify("Start of the 2nd Half"), EventKind::PeriodStart);
        assert_eq!(classify("Josh Hart enters the game for OG Anunoby"), EventKind::Substitution);
        assert_eq!(classify("Knicks Full timeout"), EventKind::Timeout);
        assert_eq!(classify("Jump Ball won by Boston"), EventKind::JumpBall);
        assert_eq!(classify("Al Horford shooting foul"), EventKind::Foul);
        assert_eq!(classify("Derrick White bad pass turnover"), EventKind::Turnover);
    }

    #[test]
    fn sequence_requires_ordered_numbers() {
        assert_eq!(parse_sequence("free throw 3 of 2"), None);
        assert_eq!(parse_sequence("free throw"), None);
        assert_eq!(
            parse_sequence("(Flagrant) free throw 1 of 2"),
            Some(FreeThrowSequence { number: 1, total: 2 })
        );
    }
}
