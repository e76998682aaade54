use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{PeriodType, RawEvent};
use crate::rink::truncate_coord;

pub const LABEL_GOAL: &str = "Goal";
pub const LABEL_SHOT: &str = "Shot";
pub const LABEL_MISSED_SHOT: &str = "Missed Shot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotCategory {
    Goal,
    ShotOnGoal,
    MissedShot,
}

impl ShotCategory {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            LABEL_GOAL => Some(Self::Goal),
            LABEL_SHOT => Some(Self::ShotOnGoal),
            LABEL_MISSED_SHOT => Some(Self::MissedShot),
            _ => None,
        }
    }

    pub fn is_goal(self) -> bool {
        self == Self::Goal
    }

    pub fn is_on_goal(self) -> bool {
        matches!(self, Self::Goal | Self::ShotOnGoal)
    }

    // Every category is an attempt; kept as a method so the counter update
    // reads the same for all three flags.
    pub fn is_attempt(self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedShot {
    pub category: ShotCategory,
    pub team: String,
    pub is_home: bool,
    pub period_type: PeriodType,
    pub x: i32,
    pub y: i32,
}

impl ClassifiedShot {
    pub fn counts_toward_totals(&self) -> bool {
        !self.period_type.is_shootout()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Shot(ClassifiedShot),
    ShootoutGoal { team: String, is_home: bool },
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingLabel,
    MissingTeam,
    MissingCoordinates,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::MissingLabel => "missing event label",
            SkipReason::MissingTeam => "missing team",
            SkipReason::MissingCoordinates => "missing coordinates",
        };
        f.write_str(text)
    }
}

/// Decides what a single play contributes to the chart.
///
/// Unknown labels are `Ignored`; a play that should count but lacks the team
/// or its coordinates is rejected with a `SkipReason`. A shootout goal needs
/// only its team since it is never plotted.
pub fn classify(event: &RawEvent, home_team: &str) -> Result<Classification, SkipReason> {
    let label = event
        .label
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SkipReason::MissingLabel)?;
    let Some(category) = ShotCategory::from_label(label) else {
        return Ok(Classification::Ignored);
    };

    let team = event
        .team
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SkipReason::MissingTeam)?;
    let is_home = team == home_team;
    let period_type = event.period_type.unwrap_or(PeriodType::Regular);

    if category.is_goal() && period_type.is_shootout() {
        return Ok(Classification::ShootoutGoal {
            team: team.to_string(),
            is_home,
        });
    }

    let x = event.x.and_then(truncate_coord);
    let y = event.y.and_then(truncate_coord);
    let (Some(x), Some(y)) = (x, y) else {
        return Err(SkipReason::MissingCoordinates);
    };

    Ok(Classification::Shot(ClassifiedShot {
        category,
        team: team.to_string(),
        is_home,
        period_type,
        x,
        y,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(label: &str, team: &str, period_type: PeriodType) -> RawEvent {
        RawEvent {
            sequence: 0,
            label: Some(label.to_string()),
            team: Some(team.to_string()),
            x: Some(-60.0),
            y: Some(12.0),
            period_type: Some(period_type),
            period: Some(1),
            period_time: None,
        }
    }

    #[test]
    fn category_flags_follow_label_table() {
        let goal = ShotCategory::from_label("Goal").unwrap();
        assert!(goal.is_goal() && goal.is_on_goal() && goal.is_attempt());
        let shot = ShotCategory::from_label("Shot").unwrap();
        assert!(!shot.is_goal() && shot.is_on_goal() && shot.is_attempt());
        let missed = ShotCategory::from_label("Missed Shot").unwrap();
        assert!(!missed.is_goal() && !missed.is_on_goal() && missed.is_attempt());
        assert!(ShotCategory::from_label("Blocked Shot").is_none());
    }

    #[test]
    fn other_labels_are_ignored_even_without_team() {
        let mut e = event("Faceoff", "SEA", PeriodType::Regular);
        e.team = None;
        assert_eq!(classify(&e, "SEA"), Ok(Classification::Ignored));
    }

    #[test]
    fn team_attribution_compares_with_home_code() {
        let Ok(Classification::Shot(home)) = classify(&event("Shot", "SEA", PeriodType::Regular), "SEA") else {
            panic!("expected a shot");
        };
        assert!(home.is_home);
        let Ok(Classification::Shot(away)) = classify(&event("Shot", "NYI", PeriodType::Regular), "SEA") else {
            panic!("expected a shot");
        };
        assert!(!away.is_home);
        assert_eq!((away.x, away.y), (-60, 12));
    }

    #[test]
    fn shootout_goal_goes_to_separate_tally() {
        let mut e = event("Goal", "NYI", PeriodType::Shootout);
        e.x = None;
        assert_eq!(
            classify(&e, "SEA"),
            Ok(Classification::ShootoutGoal {
                team: "NYI".to_string(),
                is_home: false
            })
        );
    }

    #[test]
    fn shootout_shot_is_still_classified_but_not_counted() {
        // Only goals are pulled out of the shootout; saved attempts still plot.
        let Ok(Classification::Shot(shot)) = classify(&event("Shot", "SEA", PeriodType::Shootout), "SEA") else {
            panic!("expected a shot");
        };
        assert_eq!(shot.category, ShotCategory::ShotOnGoal);
        assert!(!shot.counts_toward_totals());
    }

    #[test]
    fn malformed_events_report_reason() {
        let mut no_label = event("Shot", "SEA", PeriodType::Regular);
        no_label.label = None;
        assert_eq!(classify(&no_label, "SEA"), Err(SkipReason::MissingLabel));

        let mut no_team = event("Shot", "SEA", PeriodType::Regular);
        no_team.team = Some("  ".to_string());
        assert_eq!(classify(&no_team, "SEA"), Err(SkipReason::MissingTeam));

        let mut no_coords = event("Missed Shot", "SEA", PeriodType::Regular);
        no_coords.y = None;
        assert_eq!(classify(&no_coords, "SEA"), Err(SkipReason::MissingCoordinates));
    }

    #[test]
    fn missing_period_type_counts_as_regular() {
        let mut e = event("Goal", "SEA", PeriodType::Regular);
        e.period_type = None;
        let Ok(Classification::Shot(shot)) = classify(&e, "SEA") else {
            panic!("expected a shot");
        };
        assert_eq!(shot.period_type, PeriodType::Regular);
        assert!(shot.counts_toward_totals());
    }
}
