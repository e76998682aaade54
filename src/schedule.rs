use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::Value;

use crate::config::{AppConfig, FeedSource};
use crate::game_feed::{pick_str, value_to_string};
use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleTeam {
    // Numeric id for the legacy API, tri-code for the current one.
    pub key: String,
    pub name: String,
    pub score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub date: String,
    pub game_id: String,
    pub start_time_utc: String,
    pub away: ScheduleTeam,
    pub home: ScheduleTeam,
}

pub fn schedule_url(config: &AppConfig, team_id: &str, season_id: &str) -> String {
    match config.feed_source {
        FeedSource::Edge => format!(
            "{}/club-schedule-season/{team_id}/{season_id}",
            config.edge_api_base_url
        ),
        FeedSource::StatsApi => format!(
            "{}/schedule?teamId={team_id}&season={season_id}",
            config.statsapi_base_url
        ),
    }
}

pub fn fetch_team_schedule(config: &AppConfig, team_id: &str, season_id: &str) -> Result<Vec<ScheduleRow>> {
    let client = http_client()?;
    let url = schedule_url(config, team_id, season_id);
    let body = fetch_json_cached(client, &url, &[]).context("schedule request failed")?;
    parse_schedule_json(&body)
}

/// Reads a season schedule in either the legacy `dates[].games[]` layout or
/// the current flat `games[]` layout. Games missing an id are dropped.
pub fn parse_schedule_json(raw: &str) -> Result<Vec<ScheduleRow>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid schedule json")?;

    if let Some(dates) = root.get("dates").and_then(|d| d.as_array()) {
        let mut rows = Vec::new();
        for day in dates {
            let date = pick_str(day, &["date"]).unwrap_or_default();
            let Some(games) = day.get("games").and_then(|g| g.as_array()) else {
                continue;
            };
            rows.extend(games.iter().filter_map(|g| parse_statsapi_game(&date, g)));
        }
        return Ok(rows);
    }
    if let Some(games) = root.get("games").and_then(|g| g.as_array()) {
        return Ok(games.iter().filter_map(parse_edge_game).collect());
    }
    Err(anyhow!("unrecognized schedule shape"))
}

fn parse_statsapi_game(date: &str, game: &Value) -> Option<ScheduleRow> {
    let game_id = game.get("gamePk").map(value_to_string)?;
    let teams = game.get("teams")?;
    let side = |key: &str| -> Option<ScheduleTeam> {
        let entry = teams.get(key)?;
        let team = entry.get("team")?;
        Some(ScheduleTeam {
            key: team.get("id").map(value_to_string)?,
            name: pick_str(team, &["name", "abbreviation"]).unwrap_or_default(),
            score: entry.get("score").and_then(|v| v.as_u64()).map(|v| v as u32),
        })
    };
    Some(ScheduleRow {
        date: date.to_string(),
        game_id,
        start_time_utc: pick_str(game, &["gameDate"]).unwrap_or_default(),
        away: side("away")?,
        home: side("home")?,
    })
}

fn parse_edge_game(game: &Value) -> Option<ScheduleRow> {
    let game_id = game.get("id").map(value_to_string)?;
    let side = |key: &str| -> Option<ScheduleTeam> {
        let team = game.get(key)?;
        let abbrev = team
            .get("abbrev")
            .and_then(|a| a.as_str().or_else(|| a.get("default").and_then(|v| v.as_str())))?
            .to_string();
        let place = team
            .get("placeName")
            .and_then(|p| p.get("default"))
            .and_then(|v| v.as_str());
        let common = team
            .get("commonName")
            .and_then(|p| p.get("default"))
            .and_then(|v| v.as_str());
        let name = match (place, common) {
            (Some(p), Some(c)) => format!("{p} {c}"),
            (Some(p), None) => p.to_string(),
            _ => abbrev.clone(),
        };
        Some(ScheduleTeam {
            key: abbrev,
            name,
            score: team.get("score").and_then(|v| v.as_u64()).map(|v| v as u32),
        })
    };
    Some(ScheduleRow {
        date: pick_str(game, &["gameDate"]).unwrap_or_default(),
        game_id,
        start_time_utc: pick_str(game, &["startTimeUTC"]).unwrap_or_default(),
        away: side("awayTeam")?,
        home: side("homeTeam")?,
    })
}
