use anyhow::{Context, Result};
use reqwest::Url;

use crate::game_data::GameData;
use crate::local_time::to_local_display;
use crate::schedule::{ScheduleRow, ScheduleTeam};

pub const SHOT_CHART_TITLE: &str = "Shot Chart";
pub const GAMECENTER_TITLE: &str = "NHL Gamecenter";
pub const ERROR_HEADING: &str = "Error Generating Shot Chart";
pub const GAME_DATA_TITLE: &str = "NHL Data for Game";

const CHART_PATH: &str = "shot-chart";

#[derive(Debug, Clone)]
pub struct QrLink {
    pub title: String,
    pub url: String,
    pub png_base64: String,
}

#[derive(Debug, Clone)]
pub enum ScheduleSection {
    Rows {
        team_id: String,
        season_id: String,
        rows: Vec<ScheduleRow>,
    },
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct ShotChartPage {
    pub game_id: String,
    pub timezone: String,
    pub gamecenter_url: String,
    pub chart_png_base64: String,
    pub chart_caption: String,
    pub server_time: String,
    pub qr_codes: Vec<QrLink>,
    pub schedule: Option<ScheduleSection>,
}

const BASE_STYLE: &str = r#"
        .qr-code { width: 200px; height: 200px; }
        .qr-code-container { display: flex; justify-content: center; }
        #scheduleTable { display: flex; justify-content: center; align-items: center; margin: 0 auto; }
        #scheduleTable table { border-collapse: collapse; padding: 10px; }
        #scheduleTable th, #scheduleTable td { padding: 8px; border: 1px solid black; }
"#;

pub fn render_shot_chart_page(page: &ShotChartPage) -> String {
    let game_link = format!(
        r#"<a href="{}" target="_blank">{}</a>"#,
        escape_html(&page.gamecenter_url),
        escape_html(&page.game_id)
    );
    let qr_figures: String = page
        .qr_codes
        .iter()
        .map(|qr| {
            format!(
                r#"
            <figure>
                <a href="{url}" target="_blank">
                    <img src="data:image/png;base64,{png}" alt="{title}" class="qr-code">
                </a>
                <figcaption>{title}</figcaption>
            </figure>"#,
                url = escape_html(&qr.url),
                png = qr.png_base64,
                title = escape_html(&qr.title),
            )
        })
        .collect();
    let schedule_html = page
        .schedule
        .as_ref()
        .map(|section| render_schedule_section(section, &page.timezone))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset="utf-8">
        <title>{chart_title} - {game_id}</title>
        <link rel="icon" href="/static/favicon.ico" type="image/x-icon">
        <style>{style}</style>
    </head>
    <body>
        <div align="center">
            <figure>
                <img src="data:image/png;base64,{chart}" alt="{caption}">
                <figcaption>{chart_title} for Game ID {game_link}</figcaption>
            </figure>
            <p>Generated at {server_time}</p>
            <div class="qr-code-container">{qr_figures}
            </div>
        </div>{schedule_html}
    </body>
</html>
"#,
        chart_title = SHOT_CHART_TITLE,
        game_id = escape_html(&page.game_id),
        style = BASE_STYLE,
        chart = page.chart_png_base64,
        caption = escape_html(&page.chart_caption),
        server_time = escape_html(&page.server_time),
    )
}

fn render_schedule_section(section: &ScheduleSection, timezone: &str) -> String {
    let (team_id, season_id, rows) = match section {
        ScheduleSection::Unavailable(reason) => {
            return format!(
                "\n        <div id=\"scheduleTable\"><p>Schedule unavailable: {}</p></div>",
                escape_html(reason)
            );
        }
        ScheduleSection::Rows {
            team_id,
            season_id,
            rows,
        } => (team_id, season_id, rows),
    };

    let mut out = String::from("\n        <div id=\"scheduleTable\">\n            <table>\n");
    out.push_str("                <tr><th>Date</th><th>gameId</th><th>gameDate</th><th>Away team</th><th>Home team</th></tr>\n");
    for row in rows {
        let game_href = schedule_link(&row.game_id, team_id, season_id, timezone);
        let local = to_local_display(&row.start_time_utc, timezone).unwrap_or_default();
        let game_date = if local.is_empty() {
            escape_html(&row.start_time_utc)
        } else {
            format!("{} - {}", escape_html(&row.start_time_utc), escape_html(&local))
        };
        out.push_str(&format!(
            "                <tr><td>{date}</td><td><a href=\"{href}\">{game_id}</a></td><td>{game_date}</td><td>{away}</td><td>{home}</td></tr>\n",
            date = escape_html(&row.date),
            href = escape_html(&game_href),
            game_id = escape_html(&row.game_id),
            away = team_cell(&row.game_id, &row.away, season_id, timezone),
            home = team_cell(&row.game_id, &row.home, season_id, timezone),
        ));
    }
    out.push_str("            </table>\n        </div>");
    out
}

fn team_cell(game_id: &str, team: &ScheduleTeam, season_id: &str, timezone: &str) -> String {
    let href = schedule_link(game_id, &team.key, season_id, timezone);
    let score = team
        .score
        .map(|s| format!(" <strong>{s}</strong>"))
        .unwrap_or_default();
    format!(
        "<a href=\"{}\">{}</a>{score}",
        escape_html(&href),
        escape_html(&team.name)
    )
}

pub fn schedule_link(game_id: &str, team_id: &str, season_id: &str, timezone: &str) -> String {
    relative_link(
        "/nhl-schedule",
        &[
            ("gameId", game_id),
            ("teamId", team_id),
            ("seasonId", season_id),
            ("timezone", timezone),
        ],
    )
}

/// Absolute link back to this service's chart page for one game, used for
/// the QR code.
pub fn shareable_chart_url(public_url: &str, game_id: &str, timezone: &str) -> String {
    let params = [("gameId", game_id), ("timezone", timezone)];
    match Url::parse(public_url).and_then(|base| base.join(CHART_PATH)) {
        Ok(mut url) => {
            url.query_pairs_mut().extend_pairs(params);
            url.to_string()
        }
        Err(_) => relative_link(&format!("/{CHART_PATH}"), &params),
    }
}

fn relative_link(path: &str, params: &[(&str, &str)]) -> String {
    let mut url = match Url::parse("http://localhost") {
        Ok(url) => url,
        Err(_) => return path.to_string(),
    };
    url.set_path(path);
    url.query_pairs_mut().extend_pairs(params.iter().copied());
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

/// Raw gamecenter documents for one game, pretty-printed.
pub fn render_game_data_page(
    game_id: &str,
    gamecenter_url: &str,
    timezone: &str,
    data: &GameData,
) -> Result<String> {
    let sections = [
        ("Landing Data", &data.landing),
        ("Boxscore Data", &data.boxscore),
        ("Play-by-Play Data", &data.play_by_play),
    ];
    let mut body = String::new();
    for (heading, document) in sections {
        let pretty = serde_json::to_string_pretty(document).with_context(|| format!("format {heading}"))?;
        body.push_str(&format!(
            "\n        <h2>{heading}</h2>\n        <pre>{}</pre>",
            escape_html(&pretty)
        ));
    }
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset="utf-8">
        <title>{title} {game_id}</title>
    </head>
    <body>
        <h1>{title} <a href="{url}" target="_blank">{game_id}</a></h1>
        <p>Timezone: <strong>{timezone}</strong></p>{body}
    </body>
</html>
"#,
        title = GAME_DATA_TITLE,
        game_id = escape_html(game_id),
        url = escape_html(gamecenter_url),
        timezone = escape_html(timezone),
    ))
}

pub fn render_error_page(game_id: &str, gamecenter_url: &str, error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset="utf-8">
        <title>{heading}</title>
    </head>
    <body>
        <h1>{heading}</h1>
        <p>
            Sorry. We are unable to generate the shot chart for
            <a href="{url}" target="_blank">this game</a> ({game_id}).
        </p>
        <pre>{error}</pre>
    </body>
</html>
"#,
        heading = ERROR_HEADING,
        url = escape_html(gamecenter_url),
        game_id = escape_html(game_id),
        error = escape_html(error),
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
