use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum League {
    #[default]
    Nba,
    Wnba,
    Ncaa,
}

impl League {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nba" => Some(League::Nba),
            "wnba" => Some(League::Wnba),
            "ncaa" | "ncaab" | "college" => Some(League::Ncaa),
            _ => None,
        }
    }

    /// (regulation periods, seconds per regulation period, seconds per overtime)
    fn clock_layout(self) -> (u8, u32, u32) {
        match self {
            League::Nba => (4, 720, 300),
            League::Wnba => (4, 600, 300),
            League::Ncaa => (2, 1200, 300),
        }
    }
}

/// Tunables for one engine run. Shared read-only by every game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub league: League,
    pub regulation_periods: u8,
    pub period_seconds: u32,
    pub overtime_seconds: u32,
    /// Coded-schema rows scanned for team identity.
    pub team_scan_events: usize,
    /// Non-administrative events scanned per period when inferring starters.
    pub starter_scan_events: usize,
    pub clutch_seconds: u32,
    pub clutch_margin: u16,
    pub close_margin: u16,
    pub blowout_margin: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_league(League::Nba)
    }
}

impl EngineConfig {
    pub fn for_league(league: League) -> Self {
        let (regulation_periods, period_seconds, overtime_seconds) = league.clock_layout();
        Self {
            league,
            regulation_periods,
            period_seconds,
            overtime_seconds,
            team_scan_events: 50,
            starter_scan_events: 20,
            clutch_seconds: 300,
            clutch_margin: 5,
            close_margin: 10,
            blowout_margin: 20,
        }
    }

    pub fn period_length(&self, period: u8) -> u32 {
        if period <= self.regulation_periods {
            self.period_seconds
        } else {
            self.overtime_seconds
        }
    }

    /// Game seconds elapsed when `clock` seconds remain in `period`.
    pub fn elapsed_seconds(&self, period: u8, clock: u32) -> u32 {
        let before: u32 = (1..period).map(|p| self.period_length(p)).sum();
        before + self.period_length(period).saturating_sub(clock)
    }

    pub fn is_clutch(&self, period: u8, clock: u32, differential: i32) -> bool {
        period >= self.regulation_periods
            && clock <= self.clutch_seconds
            && differential.unsigned_abs() <= u32::from(self.clutch_margin)
    }
}
