use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use nhl_shot_chart::config::AppConfig;
use nhl_shot_chart::game_feed::parse_game_feed_json;
use nhl_shot_chart::init_tracing;
use nhl_shot_chart::service::{ScheduleQuery, load_feed_or_placeholder, load_schedule_section, page_for_rendered, render_chart};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = AppConfig::from_env();
    let game_id = arg_value(&args, "--game-id").unwrap_or_else(|| config.default_game_id.clone());
    let timezone = arg_value(&args, "--timezone").unwrap_or_else(|| config.default_timezone.clone());

    let feed = match arg_value(&args, "--feed") {
        Some(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("read feed {path}"))?;
            parse_game_feed_json(&raw, &game_id).with_context(|| format!("parse feed {path}"))?
        }
        None => load_feed_or_placeholder(&config, &game_id),
    };

    let schedule = match (arg_value(&args, "--team-id"), arg_value(&args, "--season")) {
        (Some(team_id), Some(season_id)) => Some(load_schedule_section(&config, &ScheduleQuery { team_id, season_id })),
        (None, None) => None,
        _ => return Err(anyhow!("--team-id and --season must be given together")),
    };

    let rendered = render_chart(&config, feed, &timezone)?;
    let html = page_for_rendered(&config, &rendered, &timezone, schedule)?;

    let out = arg_value(&args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("shot_chart_{}.html", rendered.feed.game_id)));
    fs::write(&out, html).with_context(|| format!("write {}", out.display()))?;
    if let Some(png_path) = arg_value(&args, "--png") {
        fs::write(&png_path, &rendered.png).with_context(|| format!("write {png_path}"))?;
        println!("PNG: {png_path}");
    }

    println!("{}", rendered.spec.title);
    println!("{}", rendered.spec.subtitle);
    if !rendered.spec.status_line.is_empty() {
        println!("Status: {}", rendered.spec.status_line);
    }
    println!("Markers: {} (skipped plays: {})", rendered.tally.markers.len(), rendered.tally.skipped);
    println!("HTML: {}", out.display());
    Ok(())
}

// Accepts both `--name value` and `--name=value`.
fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            let trimmed = next.trim();
            if !trimmed.is_empty() && !trimmed.starts_with("--") {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}
