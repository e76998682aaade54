use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::classify::{LABEL_GOAL, LABEL_MISSED_SHOT, LABEL_SHOT};
use crate::config::{AppConfig, FeedSource};
use crate::game::{GameFeed, PeriodType, RawEvent, period_ordinal};
use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;

pub fn game_feed_url(config: &AppConfig, game_id: &str) -> String {
    match config.feed_source {
        FeedSource::Edge => format!("{}/gamecenter/{game_id}/play-by-play", config.edge_api_base_url),
        FeedSource::StatsApi => format!("{}/game/{game_id}/feed/live", config.statsapi_base_url),
    }
}

pub fn fetch_game_feed(config: &AppConfig, game_id: &str) -> Result<GameFeed> {
    let client = http_client()?;
    let url = game_feed_url(config, game_id);
    let body = fetch_json_cached(client, &url, &[]).context("game feed request failed")?;
    parse_game_feed_json(&body, game_id)
}

/// Parses either the current play-by-play document or the legacy live feed.
///
/// The shape is detected from the document itself: the legacy feed nests
/// everything under `gameData` / `liveData`, the current one has top-level
/// `homeTeam` and `plays`. Plays come back ordered by their sequence index.
pub fn parse_game_feed_json(raw: &str, game_id: &str) -> Result<GameFeed> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty game feed"));
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid game feed json")?;

    let mut feed = if root.get("gameData").is_some() || root.get("liveData").is_some() {
        parse_statsapi_feed(&root, game_id)?
    } else if root.get("homeTeam").is_some() || root.get("plays").is_some() {
        parse_edge_feed(&root, game_id)?
    } else {
        return Err(anyhow!("unrecognized game feed shape"));
    };
    feed.events.sort_by_key(|e| e.sequence);
    Ok(feed)
}

fn parse_statsapi_feed(root: &Value, game_id: &str) -> Result<GameFeed> {
    let game_data = root.get("gameData").unwrap_or(&Value::Null);
    let teams = game_data.get("teams").unwrap_or(&Value::Null);
    let home = teams
        .get("home")
        .and_then(|t| pick_str(t, &["abbreviation", "triCode"]))
        .ok_or_else(|| anyhow!("legacy feed missing home team"))?;
    let away = teams
        .get("away")
        .and_then(|t| pick_str(t, &["abbreviation", "triCode"]))
        .ok_or_else(|| anyhow!("legacy feed missing away team"))?;

    let id = game_data
        .get("game")
        .and_then(|g| g.get("pk"))
        .or_else(|| root.get("gamePk"))
        .map(value_to_string)
        .unwrap_or_else(|| game_id.to_string());
    let start_time_utc = game_data
        .get("datetime")
        .and_then(|d| pick_str(d, &["dateTime"]));

    let live = root.get("liveData").unwrap_or(&Value::Null);
    let linescore = live.get("linescore").unwrap_or(&Value::Null);
    let period_time_remaining = pick_str(linescore, &["currentPeriodTimeRemaining"]);
    let period_ordinal = pick_str(linescore, &["currentPeriodOrdinal"]);

    let events = live
        .get("plays")
        .and_then(|p| p.get("allPlays"))
        .and_then(|p| p.as_array())
        .map(|plays| {
            plays
                .iter()
                .enumerate()
                .map(|(idx, play)| parse_statsapi_play(idx, play))
                .collect()
        })
        .unwrap_or_default();

    Ok(GameFeed {
        game_id: id,
        home,
        away,
        start_time_utc,
        period_time_remaining,
        period_ordinal,
        events,
    })
}

fn parse_statsapi_play(idx: usize, play: &Value) -> RawEvent {
    let about = play.get("about").unwrap_or(&Value::Null);
    let coords = play.get("coordinates").unwrap_or(&Value::Null);
    RawEvent {
        sequence: about
            .get("eventIdx")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(idx),
        label: play
            .get("result")
            .and_then(|r| pick_str(r, &["event"])),
        team: play.get("team").and_then(|t| pick_str(t, &["triCode", "abbreviation"])),
        x: coords.get("x").and_then(|v| v.as_f64()),
        y: coords.get("y").and_then(|v| v.as_f64()),
        period_type: about
            .get("periodType")
            .and_then(|v| v.as_str())
            .and_then(PeriodType::from_feed),
        period: about.get("period").and_then(period_number),
        period_time: pick_str(about, &["periodTime"]),
    }
}

fn parse_edge_feed(root: &Value, game_id: &str) -> Result<GameFeed> {
    let home_team = root.get("homeTeam").unwrap_or(&Value::Null);
    let away_team = root.get("awayTeam").unwrap_or(&Value::Null);
    let home = edge_abbrev(home_team).ok_or_else(|| anyhow!("play-by-play missing home team"))?;
    let away = edge_abbrev(away_team).ok_or_else(|| anyhow!("play-by-play missing away team"))?;

    let mut team_codes: HashMap<u64, String> = HashMap::new();
    if let Some(id) = home_team.get("id").and_then(|v| v.as_u64()) {
        team_codes.insert(id, home.clone());
    }
    if let Some(id) = away_team.get("id").and_then(|v| v.as_u64()) {
        team_codes.insert(id, away.clone());
    }

    let id = root
        .get("id")
        .map(value_to_string)
        .unwrap_or_else(|| game_id.to_string());
    let start_time_utc = pick_str(root, &["startTimeUTC"]);

    let finished = root
        .get("gameState")
        .and_then(|v| v.as_str())
        .is_some_and(|s| matches!(s, "FINAL" | "OFF"));
    let period_time_remaining = if finished {
        Some("Final".to_string())
    } else {
        root.get("clock").and_then(|c| pick_str(c, &["timeRemaining"]))
    };
    let descriptor = root.get("periodDescriptor").unwrap_or(&Value::Null);
    let period_ordinal = descriptor
        .get("number")
        .and_then(period_number)
        .map(|n| {
            let period_type = descriptor
                .get("periodType")
                .and_then(|v| v.as_str())
                .and_then(PeriodType::from_feed);
            period_ordinal(n, period_type)
        });

    let events = root
        .get("plays")
        .and_then(|p| p.as_array())
        .map(|plays| {
            plays
                .iter()
                .enumerate()
                .map(|(idx, play)| parse_edge_play(idx, play, &team_codes))
                .collect()
        })
        .unwrap_or_default();

    Ok(GameFeed {
        game_id: id,
        home,
        away,
        start_time_utc,
        period_time_remaining,
        period_ordinal,
        events,
    })
}

fn parse_edge_play(idx: usize, play: &Value, team_codes: &HashMap<u64, String>) -> RawEvent {
    let details = play.get("details").unwrap_or(&Value::Null);
    let descriptor = play.get("periodDescriptor").unwrap_or(&Value::Null);
    RawEvent {
        sequence: play
            .get("sortOrder")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(idx),
        label: pick_str(play, &["typeDescKey"]).map(|key| edge_label(&key)),
        team: details
            .get("eventOwnerTeamId")
            .and_then(|v| v.as_u64())
            .and_then(|id| team_codes.get(&id).cloned()),
        x: details.get("xCoord").and_then(|v| v.as_f64()),
        y: details.get("yCoord").and_then(|v| v.as_f64()),
        period_type: descriptor
            .get("periodType")
            .and_then(|v| v.as_str())
            .and_then(PeriodType::from_feed),
        period: descriptor.get("number").and_then(period_number),
        period_time: pick_str(play, &["timeInPeriod"]),
    }
}

// Map the kebab-case event keys onto the labels the classifier understands.
fn edge_label(key: &str) -> String {
    match key {
        "goal" => LABEL_GOAL.to_string(),
        "shot-on-goal" => LABEL_SHOT.to_string(),
        "missed-shot" => LABEL_MISSED_SHOT.to_string(),
        other => other.to_string(),
    }
}

// `abbrev` is a plain string in play-by-play but `{ "default": .. }` elsewhere.
fn edge_abbrev(team: &Value) -> Option<String> {
    let abbrev = team.get("abbrev")?;
    abbrev
        .as_str()
        .or_else(|| abbrev.get("default").and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// Out-of-range period numbers are dropped rather than wrapped.
fn period_number(value: &Value) -> Option<u8> {
    value.as_u64().and_then(|n| u8::try_from(n).ok())
}

pub(crate) fn pick_str(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = value.get(*key).and_then(|v| v.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_url_follows_source() {
        let mut cfg = AppConfig::default();
        assert_eq!(
            game_feed_url(&cfg, "2023020248"),
            "https://api-web.nhle.com/v1/gamecenter/2023020248/play-by-play"
        );
        cfg.feed_source = FeedSource::StatsApi;
        assert_eq!(
            game_feed_url(&cfg, "2023020248"),
            "https://statsapi.web.nhl.com/api/v1/game/2023020248/feed/live"
        );
    }

    #[test]
    fn edge_labels_are_mapped() {
        assert_eq!(edge_label("goal"), "Goal");
        assert_eq!(edge_label("shot-on-goal"), "Shot");
        assert_eq!(edge_label("missed-shot"), "Missed Shot");
        assert_eq!(edge_label("blocked-shot"), "blocked-shot");
    }

    #[test]
    fn unknown_shape_is_rejected() {
        assert!(parse_game_feed_json(r#"{"foo": 1}"#, "1").is_err());
        assert!(parse_game_feed_json("null", "1").is_err());
        assert!(parse_game_feed_json("  ", "1").is_err());
    }

    #[test]
    fn plays_are_sorted_by_sequence() {
        let raw = r#"{
            "id": 7,
            "homeTeam": {"id": 1, "abbrev": "SEA"},
            "awayTeam": {"id": 2, "abbrev": {"default": "NYI"}},
            "plays": [
                {"sortOrder": 20, "typeDescKey": "goal", "details": {"eventOwnerTeamId": 1, "xCoord": 80, "yCoord": 1}},
                {"sortOrder": 10, "typeDescKey": "shot-on-goal", "details": {"eventOwnerTeamId": 2, "xCoord": -70, "yCoord": -3}}
            ]
        }"#;
        let feed = parse_game_feed_json(raw, "fallback").expect("edge feed should parse");
        assert_eq!(feed.game_id, "7");
        assert_eq!(feed.away, "NYI");
        assert_eq!(feed.events[0].sequence, 10);
        assert_eq!(feed.events[0].team.as_deref(), Some("NYI"));
        assert_eq!(feed.events[1].label.as_deref(), Some("Goal"));
    }

    #[test]
    fn oversized_period_numbers_are_dropped() {
        let raw = r#"{
            "homeTeam": {"id": 1, "abbrev": "SEA"},
            "awayTeam": {"id": 2, "abbrev": "NYI"},
            "periodDescriptor": {"number": 300, "periodType": "OT"},
            "plays": [
                {"sortOrder": 1, "typeDescKey": "shot-on-goal",
                 "periodDescriptor": {"number": 300, "periodType": "OT"},
                 "details": {"eventOwnerTeamId": 1, "xCoord": 50, "yCoord": 2}}
            ]
        }"#;
        let feed = parse_game_feed_json(raw, "1").expect("edge feed should parse");
        assert_eq!(feed.period_ordinal, None);
        assert_eq!(feed.events[0].period, None);
        assert_eq!(feed.events[0].period_type, Some(PeriodType::Overtime));
    }
}
