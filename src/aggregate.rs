use serde::{Deserialize, Serialize};

use crate::classify::{Classification, ClassifiedShot, ShotCategory, classify};
use crate::game::RawEvent;
use crate::rink::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub show_goals: bool,
    pub show_shots_on_goal: bool,
    pub show_shot_attempts: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            show_goals: true,
            show_shots_on_goal: true,
            show_shot_attempts: true,
        }
    }
}

impl Visibility {
    pub fn shows(&self, category: ShotCategory) -> bool {
        match category {
            ShotCategory::Goal => self.show_goals,
            ShotCategory::ShotOnGoal => self.show_shots_on_goal,
            ShotCategory::MissedShot => self.show_shot_attempts,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTotals {
    pub shot_attempts: u32,
    pub shots_on_goal: u32,
    pub goals: u32,
    pub shootout_goals: u32,
}

impl GameTotals {
    fn record(&mut self, category: ShotCategory) {
        if category.is_attempt() {
            self.shot_attempts = self.shot_attempts.saturating_add(1);
        }
        if category.is_on_goal() {
            self.shots_on_goal = self.shots_on_goal.saturating_add(1);
        }
        if category.is_goal() {
            self.goals = self.goals.saturating_add(1);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub x: i32,
    pub y: i32,
    pub category: ShotCategory,
    pub team: String,
    pub is_home: bool,
    // Team's attempt count before this event was added.
    pub attempts_before: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameTally {
    pub home: GameTotals,
    pub away: GameTotals,
    pub markers: Vec<Marker>,
    pub skipped: usize,
}

impl GameTally {
    fn side_mut(&mut self, is_home: bool) -> &mut GameTotals {
        if is_home { &mut self.home } else { &mut self.away }
    }
}

/// Folds one play into the running tally.
///
/// Kept free of side effects other than a debug log for skipped plays so a
/// single event can be checked in isolation.
pub fn step(mut tally: GameTally, event: &RawEvent, home_team: &str, visibility: Visibility) -> GameTally {
    match classify(event, home_team) {
        Err(reason) => {
            tracing::debug!(sequence = event.sequence, %reason, "skipping malformed play");
            tally.skipped += 1;
        }
        Ok(Classification::Ignored) => {}
        Ok(Classification::ShootoutGoal { is_home, .. }) => {
            let side = tally.side_mut(is_home);
            side.shootout_goals = side.shootout_goals.saturating_add(1);
        }
        Ok(Classification::Shot(shot)) => {
            let marker = build_marker(&shot, tally.side_mut(shot.is_home).shot_attempts);
            if visibility.shows(shot.category) {
                tally.markers.push(marker);
            }
            if shot.counts_toward_totals() {
                tally.side_mut(shot.is_home).record(shot.category);
            }
        }
    }
    tally
}

fn build_marker(shot: &ClassifiedShot, attempts_before: u32) -> Marker {
    let (x, y) = normalize(shot.x, shot.y, shot.is_home);
    Marker {
        x,
        y,
        category: shot.category,
        team: shot.team.clone(),
        is_home: shot.is_home,
        attempts_before,
    }
}

/// The team with strictly more shootout goals is credited one goal.
pub fn resolve_shootout(mut tally: GameTally) -> GameTally {
    let (home, away) = (tally.home.shootout_goals, tally.away.shootout_goals);
    if home > away {
        tally.home.goals = tally.home.goals.saturating_add(1);
    } else if away > home {
        tally.away.goals = tally.away.goals.saturating_add(1);
    }
    tally
}

pub fn aggregate(events: &[RawEvent], home_team: &str, visibility: Visibility) -> GameTally {
    let tally = events
        .iter()
        .fold(GameTally::default(), |acc, event| step(acc, event, home_team, visibility));
    if tally.skipped > 0 {
        tracing::warn!(skipped = tally.skipped, total = events.len(), "plays skipped during aggregation");
    }
    resolve_shootout(tally)
}
