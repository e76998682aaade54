use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;

pub const GAME_DOCUMENTS: [&str; 3] = ["landing", "boxscore", "play-by-play"];

#[derive(Debug, Clone, Serialize)]
pub struct GameData {
    #[serde(rename = "landing_data")]
    pub landing: Value,
    #[serde(rename = "boxscore_data")]
    pub boxscore: Value,
    #[serde(rename = "play_by_play_data")]
    pub play_by_play: Value,
}

pub fn game_document_url(config: &AppConfig, game_id: &str, document: &str) -> String {
    format!("{}/gamecenter/{game_id}/{document}", config.edge_api_base_url)
}

/// Fetches the three gamecenter documents for one game in parallel.
pub fn load_game_data(config: &AppConfig, game_id: &str) -> Result<GameData> {
    let fetch = |document: &str| fetch_document(config, game_id, document);
    let (landing, (boxscore, play_by_play)) =
        rayon::join(|| fetch("landing"), || rayon::join(|| fetch("boxscore"), || fetch("play-by-play")));
    Ok(GameData {
        landing: landing?,
        boxscore: boxscore?,
        play_by_play: play_by_play?,
    })
}

fn fetch_document(config: &AppConfig, game_id: &str, document: &str) -> Result<Value> {
    let client = http_client()?;
    let url = game_document_url(config, game_id, document);
    let body = fetch_json_cached(client, &url, &[]).with_context(|| format!("{document} request failed"))?;
    parse_document_json(&body).with_context(|| format!("invalid {document} json"))
}

pub fn parse_document_json(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(trimmed)?)
}
