use std::env;

use serde::Serialize;

use crate::aggregate::Visibility;

pub const DEFAULT_GAME_ID: &str = "2023020248";
pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";
const DEFAULT_EDGE_API_BASE_URL: &str = "https://api-web.nhle.com/v1";
const DEFAULT_STATSAPI_BASE_URL: &str = "https://statsapi.web.nhl.com/api/v1";
const DEFAULT_GAMECENTER_BASE_URL: &str = "https://www.nhl.com/gamecenter";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedSource {
    Edge,
    StatsApi,
}

impl FeedSource {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "edge" | "api-web" => Some(Self::Edge),
            "statsapi" | "legacy" => Some(Self::StatsApi),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub feed_source: FeedSource,
    pub edge_api_base_url: String,
    pub statsapi_base_url: String,
    pub gamecenter_base_url: String,
    pub public_url: String,
    pub default_game_id: String,
    pub default_timezone: String,
    pub visibility: Visibility,
    pub annotate_attempts: bool,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let string_or = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let flag_or = |key: &str, default: bool| lookup(key).and_then(|v| parse_flag(&v)).unwrap_or(default);

        let port = lookup("PORT")
            .and_then(|val| val.trim().parse::<u16>().ok())
            .unwrap_or(8080);
        let feed_source = lookup("NHL_FEED_SOURCE")
            .and_then(|val| FeedSource::parse(&val))
            .unwrap_or(FeedSource::Edge);
        let chart_width = lookup("CHART_WIDTH")
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(1000)
            .clamp(400, 3000);
        let chart_height = lookup("CHART_HEIGHT")
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(1000)
            .clamp(300, 3000);

        Self {
            host: string_or("HOST", "0.0.0.0"),
            port,
            feed_source,
            edge_api_base_url: trim_slash(string_or("NHL_EDGE_API_BASE_URL", DEFAULT_EDGE_API_BASE_URL)),
            statsapi_base_url: trim_slash(string_or("NHL_STATSAPI_BASE_URL", DEFAULT_STATSAPI_BASE_URL)),
            gamecenter_base_url: trim_slash(string_or("NHL_GAMECENTER_BASE_URL", DEFAULT_GAMECENTER_BASE_URL)),
            public_url: string_or("SHOT_CHART_PUBLIC_URL", DEFAULT_PUBLIC_URL),
            default_game_id: string_or("DEFAULT_GAME_ID", DEFAULT_GAME_ID),
            default_timezone: string_or("DEFAULT_TIMEZONE", DEFAULT_TIMEZONE),
            visibility: Visibility {
                show_goals: flag_or("SHOW_GOALS", true),
                show_shots_on_goal: flag_or("SHOW_SHOTS_ON_GOAL", true),
                show_shot_attempts: flag_or("SHOW_SHOT_ATTEMPTS", true),
            },
            annotate_attempts: flag_or("SHOW_SHOT_ATTEMPTS_ANNOTATION", false),
            chart_width,
            chart_height,
        }
    }

    pub fn gamecenter_url(&self, game_id: &str) -> String {
        format!("{}/{game_id}", self.gamecenter_base_url)
    }
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn trim_slash(value: String) -> String {
    value.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_with(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_show_everything_but_annotations() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.visibility, Visibility::default());
        assert!(!cfg.annotate_attempts);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.feed_source, FeedSource::Edge);
        assert_eq!(cfg.default_game_id, DEFAULT_GAME_ID);
    }

    #[test]
    fn flags_and_numbers_are_parsed_and_clamped() {
        let cfg = config_with(&[
            ("SHOW_SHOTS_ON_GOAL", "false"),
            ("SHOW_SHOT_ATTEMPTS_ANNOTATION", "1"),
            ("CHART_WIDTH", "50"),
            ("PORT", "not-a-port"),
            ("NHL_FEED_SOURCE", "statsapi"),
            ("NHL_GAMECENTER_BASE_URL", "https://example.test/gc/"),
        ]);
        assert!(!cfg.visibility.show_shots_on_goal);
        assert!(cfg.visibility.show_goals);
        assert!(cfg.annotate_attempts);
        assert_eq!(cfg.chart_width, 400);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.feed_source, FeedSource::StatsApi);
        assert_eq!(cfg.gamecenter_url("42"), "https://example.test/gc/42");
    }

    #[test]
    fn unknown_flag_text_keeps_default() {
        let cfg = config_with(&[("SHOW_GOALS", "maybe")]);
        assert!(cfg.visibility.show_goals);
    }
}
