use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_HOME: &str = "HOME";
pub const PLACEHOLDER_AWAY: &str = "AWAY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodType {
    Regular,
    Overtime,
    Shootout,
}

impl PeriodType {
    // Legacy feed spells these out, the edge feed abbreviates.
    pub fn from_feed(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "REGULAR" | "REG" => Some(Self::Regular),
            "OVERTIME" | "OT" => Some(Self::Overtime),
            "SHOOTOUT" | "SO" => Some(Self::Shootout),
            _ => None,
        }
    }

    pub fn is_shootout(self) -> bool {
        self == Self::Shootout
    }
}

/// One play as read from the upstream feed.
///
/// Everything the feed supplies is optional so a single broken play can be
/// skipped without rejecting the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub sequence: usize,
    pub label: Option<String>,
    pub team: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub period_type: Option<PeriodType>,
    pub period: Option<u8>,
    pub period_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFeed {
    pub game_id: String,
    pub home: String,
    pub away: String,
    pub start_time_utc: Option<String>,
    pub period_time_remaining: Option<String>,
    pub period_ordinal: Option<String>,
    pub events: Vec<RawEvent>,
}

impl GameFeed {
    // Stand-in used when the feed cannot be loaded; renders as a blank chart.
    pub fn placeholder(game_id: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            home: PLACEHOLDER_HOME.to_string(),
            away: PLACEHOLDER_AWAY.to_string(),
            start_time_utc: None,
            period_time_remaining: None,
            period_ordinal: None,
            events: Vec::new(),
        }
    }
}

pub fn period_ordinal(number: u8, period_type: Option<PeriodType>) -> String {
    match period_type {
        Some(PeriodType::Shootout) => "SO".to_string(),
        Some(PeriodType::Overtime) if number <= 4 => "OT".to_string(),
        Some(PeriodType::Overtime) => format!("{}OT", number.saturating_sub(3)),
        _ => match number {
            1 => "1st".to_string(),
            2 => "2nd".to_string(),
            3 => "3rd".to_string(),
            n => format!("{n}th"),
        },
    }
}
