//! HTTP surface: HTML chart and data pages plus a couple of JSON endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::game_data::{GameData, load_game_data};
use crate::service::{
    ChartRequest, GameSummary, PageOutcome, ScheduleQuery, game_data_page, game_summary, shot_chart_page,
};

pub const ALLOWED_METHODS: [&str; 4] = ["GET", "POST", "OPTIONS", "HEAD"];
const QUERY_DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    #[serde(rename = "gameId")]
    pub game_id: Option<String>,
    pub timezone: Option<String>,
    #[serde(rename = "teamId")]
    pub team_id: Option<String>,
    #[serde(rename = "seasonId")]
    pub season_id: Option<String>,
}

impl ChartQuery {
    fn into_request(self, config: &AppConfig, default_timezone: &str) -> ChartRequest {
        let non_empty = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let schedule = match (non_empty(self.team_id), non_empty(self.season_id)) {
            (Some(team_id), Some(season_id)) => Some(ScheduleQuery { team_id, season_id }),
            _ => None,
        };
        ChartRequest {
            game_id: non_empty(self.game_id).unwrap_or_else(|| config.default_game_id.clone()),
            timezone: non_empty(self.timezone).unwrap_or_else(|| default_timezone.to_string()),
            schedule,
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Upstream(String),
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };
        (status, Json(ErrorBody { code, message })).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("task join error: {err}"))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).head(index_head).options(allowed_methods))
        .route("/shot-chart", get(shot_chart).options(allowed_methods))
        .route("/nhl-schedule", get(nhl_schedule).options(allowed_methods))
        .route("/api/game-summary", get(api_game_summary).options(allowed_methods))
        .route("/api/load-game-data", get(api_load_game_data).options(allowed_methods))
        .route("/health", get(health).options(allowed_methods))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>, Query(query): Query<ChartQuery>) -> Result<Html<String>, AppError> {
    let config = Arc::clone(&state.config);
    let request = query.into_request(&config, QUERY_DEFAULT_TIMEZONE);
    let html = tokio::task::spawn_blocking(move || game_data_page(&config, &request.game_id, &request.timezone))
        .await?
        .map_err(|err| {
            tracing::warn!(error = %format!("{err:#}"), "game data page unavailable");
            AppError::Upstream(format!("{err:#}"))
        })?;
    Ok(Html(html))
}

// Headers only; nothing is fetched.
async fn index_head() -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/html")]).into_response()
}

async fn shot_chart(State(state): State<AppState>, Query(query): Query<ChartQuery>) -> Result<Response, AppError> {
    let mut request = query.into_request(&state.config, QUERY_DEFAULT_TIMEZONE);
    request.schedule = None;
    render_page(state, request).await
}

async fn nhl_schedule(State(state): State<AppState>, Query(query): Query<ChartQuery>) -> Result<Response, AppError> {
    let default_tz = state.config.default_timezone.clone();
    let request = query.into_request(&state.config, &default_tz);
    render_page(state, request).await
}

async fn render_page(state: AppState, request: ChartRequest) -> Result<Response, AppError> {
    let config = Arc::clone(&state.config);
    let outcome = tokio::task::spawn_blocking(move || shot_chart_page(&config, &request)).await?;
    Ok(match outcome {
        PageOutcome::Chart(html) => Html(html).into_response(),
        PageOutcome::Error(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
    })
}

async fn api_game_summary(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<GameSummary>, AppError> {
    let config = Arc::clone(&state.config);
    let request = query.into_request(&config, QUERY_DEFAULT_TIMEZONE);
    let summary = tokio::task::spawn_blocking(move || game_summary(&config, &request.game_id, &request.timezone)).await?;
    Ok(Json(summary))
}

async fn api_load_game_data(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<GameData>, AppError> {
    let config = Arc::clone(&state.config);
    let request = query.into_request(&config, QUERY_DEFAULT_TIMEZONE);
    let data = tokio::task::spawn_blocking(move || load_game_data(&config, &request.game_id))
        .await?
        .map_err(|err| {
            tracing::warn!(error = %format!("{err:#}"), "game data unavailable");
            AppError::Upstream(format!("{err:#}"))
        })?;
    Ok(Json(data))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn allowed_methods() -> Json<Value> {
    Json(json!({ "allowed_methods": ALLOWED_METHODS }))
}

async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return allowed_methods().await.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::extract::Path;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    const LANDING_JSON: &str = include_str!("../tests/fixtures/edge_landing.json");
    const BOXSCORE_JSON: &str = include_str!("../tests/fixtures/edge_boxscore.json");
    const PLAY_BY_PLAY_JSON: &str = include_str!("../tests/fixtures/edge_play_by_play_shootout.json");

    async fn gamecenter_document(Path((_game_id, document)): Path<(String, String)>) -> Response {
        let body = match document.as_str() {
            "landing" => LANDING_JSON,
            "boxscore" => BOXSCORE_JSON,
            "play-by-play" => PLAY_BY_PLAY_JSON,
            _ => return StatusCode::NOT_FOUND.into_response(),
        };
        ([(header::CONTENT_TYPE, "application/json")], body).into_response()
    }

    /// Serves the fixture documents on a local port and returns a config
    /// pointing the edge API at it.
    async fn fixture_upstream_config() -> AppConfig {
        let upstream = Router::new().route("/gamecenter/{game_id}/{document}", get(gamecenter_document));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.ok();
        });
        let base_url = format!("http://{addr}");
        AppConfig::from_lookup(move |key| match key {
            "NHL_EDGE_API_BASE_URL" => Some(base_url.clone()),
            _ => None,
        })
    }

    async fn text_body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    fn unreachable_config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "NHL_EDGE_API_BASE_URL" | "NHL_STATSAPI_BASE_URL" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        })
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = create_router(AppState::new(AppConfig::default()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn options_lists_allowed_methods() {
        let app = create_router(AppState::new(AppConfig::default()));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/shot-chart")
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"allowed_methods": ["GET", "POST", "OPTIONS", "HEAD"]})
        );
    }

    #[tokio::test]
    async fn summary_falls_back_to_blank_game_when_upstream_is_down() {
        let app = create_router(AppState::new(unreachable_config()));
        let request = Request::builder()
            .uri("/api/game-summary?gameId=2023020248")
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["title"], "AWAY 0 vs. HOME 0");
        assert_eq!(body["markers"], json!([]));
    }

    #[test]
    fn query_defaults_fill_in() {
        let cfg = AppConfig::default();
        let request = ChartQuery {
            team_id: Some("SEA".to_string()),
            ..ChartQuery::default()
        }
        .into_request(&cfg, "UTC");
        assert_eq!(request.game_id, "2023020248");
        assert_eq!(request.timezone, "UTC");
        assert!(request.schedule.is_none());
    }

    #[tokio::test]
    async fn options_is_answered_on_any_path() {
        let app = create_router(AppState::new(AppConfig::default()));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/anything/else")
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"allowed_methods": ["GET", "POST", "OPTIONS", "HEAD"]})
        );
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let app = create_router(AppState::new(AppConfig::default()));
        let response = app
            .oneshot(Request::builder().uri("/anything/else").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn head_on_index_skips_upstream() {
        // The upstream is unreachable, so any fetch would turn into a 502.
        let app = create_router(AppState::new(unreachable_config()));
        let request = Request::builder()
            .method(Method::HEAD)
            .uri("/?gameId=2023020248")
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert!(text_body(response).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn index_shows_game_data_in_utc_by_default() {
        let app = create_router(AppState::new(fixture_upstream_config().await));
        let response = app
            .oneshot(Request::builder().uri("/?gameId=2023020248").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let html = text_body(response).await;
        assert!(html.contains("<title>NHL Data for Game 2023020248</title>"));
        assert!(html.contains("<p>Timezone: <strong>UTC</strong></p>"));
        assert!(html.contains("<h2>Play-by-Play Data</h2>"));
        assert!(html.contains("Climate Pledge Arena"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_game_data_returns_all_three_documents() {
        let app = create_router(AppState::new(fixture_upstream_config().await));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/load-game-data?gameId=2023020248")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["landing_data"]["id"], 2023020248);
        assert_eq!(body["boxscore_data"]["homeTeam"]["abbrev"], "SEA");
        assert!(body["play_by_play_data"]["plays"].is_array());
    }

    #[tokio::test]
    async fn index_reports_upstream_failure() {
        let app = create_router(AppState::new(unreachable_config()));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["code"], "UPSTREAM_ERROR");
    }
}
