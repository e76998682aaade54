use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "nhl_shot_chart";
const CACHE_FILE: &str = "http_cache.json";
// Play-by-play documents are large; keep only the most recent ones on disk.
const MAX_ENTRIES: usize = 12;
const MAX_CACHED_BODY_BYTES: usize = 2 * 1024 * 1024;

static CACHE: Mutex<Option<HttpCacheFile>> = Mutex::new(None);
// Generation of the snapshot last written to disk.
static PERSISTED: Mutex<u64> = Mutex::new(0);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct HttpCacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
    #[serde(skip)]
    generation: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

/// GET `url` and return the body, revalidating against the on-disk copy with
/// `If-None-Match` / `If-Modified-Since` when one exists.
pub fn fetch_json_cached(client: &Client, url: &str, extra_headers: &[(&str, &str)]) -> Result<String> {
    let cached_entry = if cache_enabled() {
        let mut guard = lock_cache();
        let cache = guard.get_or_insert_with(load_cache_file);
        cache.entries.get(url).cloned()
    } else {
        None
    };

    let mut req = client.get(url).header(USER_AGENT, "Mozilla/5.0");
    for (name, value) in extra_headers {
        req = req.header(*name, *value);
    }
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    tracing::debug!(%url, revalidate = cached_entry.is_some(), "upstream request");
    let resp = req.send().with_context(|| format!("request failed: {url}"))?;
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED {
        if let Some(entry) = cached_entry {
            refresh_cache_entry(url, entry.clone());
            return Ok(entry.body);
        }
        return Err(anyhow::anyhow!("received 304 without cache body"));
    }

    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, truncate_for_error(&body)));
    }

    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let last_modified = headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    if cache_enabled() && cacheable(&body, etag.is_some() || last_modified.is_some()) {
        let entry = CacheEntry {
            body: body.clone(),
            etag,
            last_modified,
            fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
        };
        refresh_cache_entry(url, entry);
    }
    Ok(body)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn cache_enabled() -> bool {
    !std::env::var("HTTP_CACHE_DISABLED")
        .ok()
        .and_then(|v| crate::config::parse_flag(&v))
        .unwrap_or(false)
}

fn lock_cache() -> MutexGuard<'static, Option<HttpCacheFile>> {
    CACHE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn cacheable(body: &str, has_validator: bool) -> bool {
    has_validator && body.len() <= MAX_CACHED_BODY_BYTES
}

fn refresh_cache_entry(key: &str, entry: CacheEntry) {
    // Serialize under the map lock; the disk write happens after it is released.
    let (generation, snapshot) = {
        let mut guard = lock_cache();
        let cache = guard.get_or_insert_with(load_cache_file);
        cache.version = CACHE_VERSION;
        cache.generation += 1;
        cache.entries.insert(key.to_string(), entry);
        prune_entries(cache, MAX_ENTRIES);
        (cache.generation, serde_json::to_string(cache))
    };
    let Some(path) = cache_path() else {
        return;
    };
    let result = snapshot
        .context("serialize http cache")
        .and_then(|json| persist_snapshot(&PERSISTED, &path, generation, &json));
    if let Err(err) = result {
        tracing::warn!(error = %format!("{err:#}"), "http cache not persisted");
    }
}

fn prune_entries(cache: &mut HttpCacheFile, max: usize) {
    if cache.entries.len() <= max {
        return;
    }
    let mut by_age: Vec<(String, u64)> = cache
        .entries
        .iter()
        .map(|(k, v)| (k.clone(), v.fetched_at))
        .collect();
    by_age.sort_by_key(|(_, at)| *at);
    let excess = cache.entries.len() - max;
    for (key, _) in by_age.into_iter().take(excess) {
        cache.entries.remove(&key);
    }
}

fn load_cache_file() -> HttpCacheFile {
    let Some(path) = cache_path() else {
        return HttpCacheFile::default();
    };
    let Ok(raw) = fs::read_to_string(path) else {
        return HttpCacheFile::default();
    };
    let cache = serde_json::from_str::<HttpCacheFile>(&raw).unwrap_or_default();
    if cache.version != CACHE_VERSION {
        return HttpCacheFile::default();
    }
    cache
}

/// Writes `json` to `path` unless a newer snapshot already landed there.
/// Returns whether the file was written.
fn persist_snapshot(persisted: &Mutex<u64>, path: &Path, generation: u64, json: &str) -> Result<bool> {
    let mut last = persisted.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if generation <= *last {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok();
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, path).context("swap http cache")?;
    *last = generation;
    Ok(true)
}

fn cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}

fn truncate_for_error(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
