use anyhow::{Context, Result};
use serde::Serialize;

use crate::aggregate::{GameTally, GameTotals, Marker, aggregate};
use crate::chart::{ChartHeader, ChartSpec, render_png};
use crate::config::AppConfig;
use crate::game::GameFeed;
use crate::game_data::load_game_data;
use crate::game_feed::fetch_game_feed;
use crate::local_time::{now_in, to_local_display};
use crate::page::{
    GAMECENTER_TITLE, QrLink, SHOT_CHART_TITLE, ScheduleSection, ShotChartPage, render_error_page,
    render_game_data_page, render_shot_chart_page, shareable_chart_url,
};
use crate::qr::{encode_base64, qr_code_base64};
use crate::schedule::fetch_team_schedule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub game_id: String,
    pub timezone: String,
    pub schedule: Option<ScheduleQuery>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleQuery {
    pub team_id: String,
    pub season_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Chart(String),
    Error(String),
}

impl PageOutcome {
    pub fn html(&self) -> &str {
        match self {
            Self::Chart(html) | Self::Error(html) => html,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub game_id: String,
    pub home: String,
    pub away: String,
    pub title: String,
    pub subtitle: String,
    pub status_line: String,
    pub start_line: String,
    pub home_totals: GameTotals,
    pub away_totals: GameTotals,
    pub markers: Vec<Marker>,
    pub skipped: usize,
}

pub struct RenderedChart {
    pub feed: GameFeed,
    pub tally: GameTally,
    pub spec: ChartSpec,
    pub png: Vec<u8>,
}

/// Loads the game feed, falling back to an empty placeholder game so the
/// page still renders a blank chart.
pub fn load_feed_or_placeholder(config: &AppConfig, game_id: &str) -> GameFeed {
    match fetch_game_feed(config, game_id) {
        Ok(feed) => feed,
        Err(err) => {
            tracing::warn!(game_id, error = %format!("{err:#}"), "game feed unavailable, rendering blank chart");
            GameFeed::placeholder(game_id)
        }
    }
}

pub fn chart_spec_for(config: &AppConfig, feed: &GameFeed, timezone: &str) -> (GameTally, ChartSpec) {
    let tally = aggregate(&feed.events, &feed.home, config.visibility);
    let start_local = feed
        .start_time_utc
        .as_deref()
        .and_then(|utc| to_local_display(utc, timezone));
    let header = ChartHeader {
        home: &feed.home,
        away: &feed.away,
        period_time_remaining: feed.period_time_remaining.as_deref(),
        period_ordinal: feed.period_ordinal.as_deref(),
        start_local: start_local.as_deref(),
    };
    let spec = ChartSpec::build(
        &header,
        &tally,
        config.annotate_attempts,
        (config.chart_width, config.chart_height),
    );
    (tally, spec)
}

pub fn render_chart(config: &AppConfig, feed: GameFeed, timezone: &str) -> Result<RenderedChart> {
    let (tally, spec) = chart_spec_for(config, &feed, timezone);
    let png = render_png(&spec).context("render shot chart")?;
    Ok(RenderedChart { feed, tally, spec, png })
}

pub fn summarize(config: &AppConfig, feed: &GameFeed, timezone: &str) -> GameSummary {
    let (tally, spec) = chart_spec_for(config, feed, timezone);
    GameSummary {
        game_id: feed.game_id.clone(),
        home: feed.home.clone(),
        away: feed.away.clone(),
        title: spec.title,
        subtitle: spec.subtitle,
        status_line: spec.status_line,
        start_line: spec.start_line,
        home_totals: tally.home,
        away_totals: tally.away,
        markers: tally.markers,
        skipped: tally.skipped,
    }
}

/// Builds the full HTML page for an already loaded feed.
pub fn build_chart_page_from_feed(
    config: &AppConfig,
    feed: GameFeed,
    timezone: &str,
    schedule: Option<ScheduleSection>,
) -> Result<String> {
    let rendered = render_chart(config, feed, timezone)?;
    page_for_rendered(config, &rendered, timezone, schedule)
}

pub fn page_for_rendered(
    config: &AppConfig,
    rendered: &RenderedChart,
    timezone: &str,
    schedule: Option<ScheduleSection>,
) -> Result<String> {
    let game_id = rendered.feed.game_id.clone();
    let gamecenter_url = config.gamecenter_url(&game_id);
    let chart_url = shareable_chart_url(&config.public_url, &game_id, timezone);

    let qr_codes = [(GAMECENTER_TITLE, gamecenter_url.clone()), (SHOT_CHART_TITLE, chart_url)]
        .into_iter()
        .map(|(title, url)| -> Result<QrLink> {
            let png_base64 = qr_code_base64(&url).with_context(|| format!("qr code for {url}"))?;
            Ok(QrLink {
                title: title.to_string(),
                url,
                png_base64,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let page = ShotChartPage {
        game_id,
        timezone: timezone.to_string(),
        gamecenter_url,
        chart_png_base64: encode_base64(&rendered.png),
        chart_caption: rendered.spec.title.clone(),
        server_time: now_in(timezone),
        qr_codes,
        schedule,
    };
    Ok(render_shot_chart_page(&page))
}

/// Fetches everything one page needs and renders it, turning any failure
/// past the feed load into the error page.
pub fn shot_chart_page(config: &AppConfig, request: &ChartRequest) -> PageOutcome {
    let (feed, schedule) = match &request.schedule {
        None => (load_feed_or_placeholder(config, &request.game_id), None),
        Some(query) => {
            let (feed, schedule) = rayon::join(
                || load_feed_or_placeholder(config, &request.game_id),
                || load_schedule_section(config, query),
            );
            (feed, Some(schedule))
        }
    };

    match build_chart_page_from_feed(config, feed, &request.timezone, schedule) {
        Ok(html) => PageOutcome::Chart(html),
        Err(err) => {
            let detail = format!("{err:#}");
            tracing::error!(game_id = %request.game_id, error = %detail, "failed to build shot chart page");
            PageOutcome::Error(render_error_page(
                &request.game_id,
                &config.gamecenter_url(&request.game_id),
                &detail,
            ))
        }
    }
}

pub fn game_summary(config: &AppConfig, game_id: &str, timezone: &str) -> GameSummary {
    let feed = load_feed_or_placeholder(config, game_id);
    summarize(config, &feed, timezone)
}

pub fn game_data_page(config: &AppConfig, game_id: &str, timezone: &str) -> Result<String> {
    let data = load_game_data(config, game_id)?;
    render_game_data_page(game_id, &config.gamecenter_url(game_id), timezone, &data)
}

pub fn load_schedule_section(config: &AppConfig, query: &ScheduleQuery) -> ScheduleSection {
    match fetch_team_schedule(config, &query.team_id, &query.season_id) {
        Ok(rows) => ScheduleSection::Rows {
            team_id: query.team_id.clone(),
            season_id: query.season_id.clone(),
            rows,
        },
        Err(err) => {
            let detail = format!("{err:#}");
            tracing::warn!(team_id = %query.team_id, season_id = %query.season_id, error = %detail, "schedule unavailable");
            ScheduleSection::Unavailable(detail)
        }
    }
}
