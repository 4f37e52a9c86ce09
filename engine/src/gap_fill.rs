//! Batch lineup correction over a finished game's possessions.
//!
//! A lineup with unknown slots borrows from the first possession in which the
//! same team, in the same role, had all five players resolved. Known ids are
//! never replaced; only empty slots are filled.

use std::collections::HashMap;

use log::debug;

use crate::lineup::{is_complete, lineup_hash, to_lineup};
use crate::{LINEUP_SIZE, Lineup, PlayerId, Possession, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Role {
    Offense,
    Defense,
}

const ROLES: [Role; 2] = [Role::Offense, Role::Defense];

impl Role {
    fn team(self, p: &Possession) -> &TeamId {
        match self {
            Role::Offense => &p.offense_team_id,
            Role::Defense => &p.defense_team_id,
        }
    }

    fn lineup(self, p: &Possession) -> &Lineup {
        match self {
            Role::Offense => &p.offense_lineup,
            Role::Defense => &p.defense_lineup,
        }
    }

    fn lineup_mut(self, p: &mut Possession) -> (&mut Lineup, &mut Option<String>) {
        match self {
            Role::Offense => (&mut p.offense_lineup, &mut p.offense_lineup_hash),
            Role::Defense => (&mut p.defense_lineup, &mut p.defense_lineup_hash),
        }
    }
}

/// Fill unknown lineup slots in place. Returns how many possessions changed.
pub fn fill_lineup_gaps(possessions: &mut [Possession]) -> usize {
    let mut donors: HashMap<(Role, TeamId), Lineup> = HashMap::new();
    for p in possessions.iter() {
        for role in ROLES {
            let lineup = role.lineup(p);
            if is_complete(lineup) {
                donors
                    .entry((role, role.team(p).clone()))
                    .or_insert_with(|| lineup.clone());
            }
        }
    }

    let mut changed = 0;
    for p in possessions.iter_mut() {
        let mut touched = false;
        for role in ROLES {
            let Some(donor) = donors.get(&(role, role.team(p).clone())) else {
                continue;
            };
            let (lineup, hash) = role.lineup_mut(p);
            if is_complete(lineup) {
                continue;
            }
            let merged = merge(lineup, donor);
            if merged != *lineup {
                *lineup = merged;
                *hash = lineup_hash(lineup);
                touched = true;
            }
        }
        if touched {
            debug!("{}: filled lineup gaps", p.possession_id());
            changed += 1;
        }
    }
    changed
}

/// Known ids first, then donor ids not already present, up to five.
fn merge(known: &Lineup, donor: &Lineup) -> Lineup {
    let mut ids: Vec<PlayerId> = known.iter().flatten().cloned().collect();
    for id in donor.iter().flatten() {
        if ids.len() >= LINEUP_SIZE {
            break;
        }
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    to_lineup(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameState, PossessionResult};

    fn lineup(ids: &[&str]) -> Lineup {
        to_lineup(ids.iter().map(|s| s.to_string()))
    }

    fn possession(sequence: u32, offense: &str, defense: &str, off: Lineup, def: Lineup) -> Possession {
        Possession {
            game_id: "g".into(),
            sequence,
            period: 1,
            clock_remaining: 700,
            elapsed_seconds: 20,
            offense_team_id: offense.into(),
            defense_team_id: defense.into(),
            offense_lineup_hash: lineup_hash(&off),
            defense_lineup_hash: lineup_hash(&def),
            offense_lineup: off,
            defense_lineup: def,
            points_scored: 0,
            result: PossessionResult::Other,
            duration_seconds: 0,
            shot_attempted: false,
            shot_made: false,
            turnover: false,
            foul_drawn: false,
            offensive_rebound: false,
            state: GameState::default(),
            first_event: sequence as usize,
            event_count: 1,
        }
    }

    #[test]
    fn fills_from_first_complete_lineup_of_same_team_and_role() {
        let full_a = lineup(&["1", "2", "3", "4", "5"]);
        let later_a = lineup(&["1", "2", "3", "4", "6"]);
        let full_b = lineup(&["11", "12", "13", "14", "15"]);
        let mut possessions = vec![
            possession(1, "A", "B", lineup(&["2"]), Lineup::default()),
            possession(2, "B", "A", full_b.clone(), later_a.clone()),
            possession(3, "A", "B", full_a.clone(), full_b.clone()),
            possession(4, "A", "B", later_a.clone(), full_b.clone()),
        ];

        assert_eq!(fill_lineup_gaps(&mut possessions), 1);
        assert_eq!(possessions[0].offense_lineup, full_a, "offense donor is possession 3, not 2");
        assert_eq!(possessions[0].defense_lineup, full_b);
        assert_eq!(possessions[0].offense_lineup_hash.as_deref(), Some("1-2-3-4-5"));
    }

    #[test]
    fn known_ids_survive_the_merge() {
        let mut possessions = vec![
            possession(1, "A", "B", lineup(&["9", "1"]), lineup(&["11", "12", "13", "14", "15"])),
            possession(2, "A", "B", lineup(&["1", "2", "3", "4", "5"]), lineup(&["11", "12", "13", "14", "15"])),
        ];
        fill_lineup_gaps(&mut possessions);
        assert_eq!(possessions[0].offense_lineup, lineup(&["1", "2", "3", "4", "9"]));
    }

    #[test]
    fn complete_lineups_are_untouched() {
        let original = vec![
            possession(1, "A", "B", lineup(&["1", "2", "3", "4", "5"]), lineup(&["11", "12", "13", "14", "15"])),
            possession(2, "B", "A", lineup(&["11", "12", "13", "14", "16"]), lineup(&["1", "2", "3", "4", "6"])),
        ];
        let mut possessions = original.clone();
        assert_eq!(fill_lineup_gaps(&mut possessions), 0);
        assert_eq!(possessions, original);
    }

    #[test]
    fn no_donor_leaves_gaps() {
        let mut possessions = vec![possession(1, "A", "B", lineup(&["1"]), Lineup::default())];
        assert_eq!(fill_lineup_gaps(&mut possessions), 0);
        assert_eq!(possessions[0].defense_lineup_hash, None);
    }
}
