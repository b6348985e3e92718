use anyhow::{Context, Result};
use askama::Template;
use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_http::validate_request::ValidateRequestHeaderLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::directory::CompanyDirectory;
use crate::rating::{RatingRecord, StockRater};

const STATUS_PROCESSED: &str = "Zpracováno";
const ERROR_NO_DATA: &str = "Žádná data ke zpracování";

/// Shared state for the dashboard server.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<CompanyDirectory>,
    pub rater: Arc<StockRater>,
    pub log_path: PathBuf,
}

// ─── Query / request types ─────────────────────────────

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 1).unwrap_or_default()
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 30).unwrap_or_default()
}

// HTML forms submit cleared inputs as `key=`; treat those as absent.
fn deserialize_blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    use serde::de;

    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RatingQuery {
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    end: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    hide_negative: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    hide_lownews: Option<u8>,
}

impl RatingQuery {
    fn start(&self) -> NaiveDate {
        self.start.unwrap_or_else(default_start)
    }

    fn end(&self) -> NaiveDate {
        self.end.unwrap_or_else(default_end)
    }

    fn hide_negative(&self) -> u8 {
        self.hide_negative.unwrap_or(0)
    }

    fn hide_lownews(&self) -> u8 {
        self.hide_lownews.unwrap_or(0)
    }

    fn keeps(&self, record: &RatingRecord) -> bool {
        if self.hide_lownews() != 0 && record.is_low_news() {
            return false;
        }
        if self.hide_negative() != 0 && record.is_negative() {
            return false;
        }
        true
    }
}

// ─── Response types ────────────────────────────────────

#[derive(Serialize)]
struct StockSummary {
    name: String,
    date: String,
    rating: i32,
}

#[derive(Serialize)]
struct Recommendation {
    name: String,
    rating: i32,
}

#[derive(Serialize)]
struct ProcessedRecommendation {
    name: String,
    declined_last_3_days: bool,
    more_than_2_declines_last_5_days: bool,
}

#[derive(Serialize)]
struct ReceivedRecommendations {
    received_recommendations: Vec<ProcessedRecommendation>,
    status: &'static str,
}

#[derive(Serialize)]
struct CompanyName {
    name: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_json(message: impl Into<String>) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: message.into(),
    })
}

// ─── Templates ─────────────────────────────────────────

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage {
    stocks: Vec<RatingRecord>,
    start: String,
    end: String,
    hide_negative: u8,
    hide_lownews: u8,
}

fn render_template<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template render error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Template error: {}", e),
            )
                .into_response()
        }
    }
}

// ─── Handlers ──────────────────────────────────────────

async fn rate_companies(state: &AppState, start: NaiveDate, end: NaiveDate) -> Vec<RatingRecord> {
    let companies = state.directory.list_companies().await;
    state.rater.rate_all(&companies, start, end).await
}

async fn index(State(state): State<AppState>, Query(params): Query<RatingQuery>) -> Response {
    let stocks: Vec<RatingRecord> = rate_companies(&state, params.start(), params.end())
        .await
        .into_iter()
        .filter(|r| params.keeps(r))
        .collect();

    render_template(&IndexPage {
        stocks,
        start: params.start().format("%Y-%m-%d").to_string(),
        end: params.end().format("%Y-%m-%d").to_string(),
        hide_negative: params.hide_negative(),
        hide_lownews: params.hide_lownews(),
    })
}

async fn list_stock(
    State(state): State<AppState>,
    Query(params): Query<RatingQuery>,
) -> impl IntoResponse {
    Json(rate_companies(&state, params.start(), params.end()).await)
}

async fn stocks_data(
    State(state): State<AppState>,
    Query(params): Query<RatingQuery>,
) -> impl IntoResponse {
    let resp: Vec<StockSummary> = rate_companies(&state, params.start(), params.end())
        .await
        .into_iter()
        .filter(|r| params.keeps(r))
        .map(|r| StockSummary {
            name: r.name,
            date: r.date,
            rating: r.rating,
        })
        .collect();

    Json(resp)
}

async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<RatingQuery>,
) -> impl IntoResponse {
    let resp: Vec<Recommendation> = rate_companies(&state, params.start(), params.end())
        .await
        .into_iter()
        .map(|r| Recommendation {
            name: r.name,
            rating: r.rating,
        })
        .collect();

    Json(resp)
}

/// Body: `{ "<ticker>": { "declined_last_3_days": bool, "more_than_2_declines_last_5_days": bool } }`.
/// Missing flags default to false; anything that is not a non-empty object is "no data".
async fn receive_recommendations(body: Bytes) -> Response {
    let entries = match serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&body) {
        Ok(map) if !map.is_empty() => map,
        Ok(_) => return error_json(ERROR_NO_DATA).into_response(),
        Err(e) => {
            warn!("Unreadable recommendations body: {}", e);
            return error_json(ERROR_NO_DATA).into_response();
        }
    };

    let flag = |data: &serde_json::Value, key: &str| {
        data.get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    };

    let processed: Vec<ProcessedRecommendation> = entries
        .into_iter()
        .map(|(name, data)| ProcessedRecommendation {
            declined_last_3_days: flag(&data, "declined_last_3_days"),
            more_than_2_declines_last_5_days: flag(&data, "more_than_2_declines_last_5_days"),
            name,
        })
        .collect();

    info!("Received {} recommendations", processed.len());
    for rec in &processed {
        info!(
            "  {}: declined_last_3_days={} more_than_2_declines_last_5_days={}",
            rec.name, rec.declined_last_3_days, rec.more_than_2_declines_last_5_days
        );
    }

    Json(ReceivedRecommendations {
        received_recommendations: processed,
        status: STATUS_PROCESSED,
    })
    .into_response()
}

async fn external_stocks(State(state): State<AppState>) -> Response {
    match state.directory.fetch_companies().await {
        Ok(names) => {
            let resp: Vec<CompanyName> = names.into_iter().map(|name| CompanyName { name }).collect();
            Json(resp).into_response()
        }
        Err(e) => {
            warn!("External company fetch failed: {:#}", e);
            error_json(format!("{:#}", e)).into_response()
        }
    }
}

/// Streams the log file so large logs are never buffered whole.
async fn download_log(State(state): State<AppState>) -> Response {
    let file = match tokio::fs::File::open(&state.log_path).await {
        Ok(f) => f,
        Err(e) => {
            warn!("Log file {} unavailable: {}", state.log_path.display(), e);
            return (StatusCode::NOT_FOUND, error_json("Log file not found")).into_response();
        }
    };

    let filename = state
        .log_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("log.txt");

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

// ─── Router & server startup ───────────────────────────

pub fn build_router(state: AppState, password: &str) -> Router {
    let router = Router::new()
        .route("/", get(index))
        .route("/liststock", get(list_stock))
        .route("/stocks-data", get(stocks_data))
        .route(
            "/recommendations",
            get(recommendations).post(receive_recommendations),
        )
        .route("/external-stocks", get(external_stocks))
        .route("/log", get(download_log))
        .with_state(state);

    // Auth sits inside CORS: browsers send preflights without credentials.
    let router = if password.is_empty() {
        router
    } else {
        router.layer(ValidateRequestHeaderLayer::basic("admin", password))
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the dashboard HTTP server. Runs until the process exits.
pub async fn start_dashboard(config: &Config, state: AppState) -> Result<()> {
    let app = build_router(state, &config.dashboard_password);
    let addr = config.dashboard_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind dashboard to {}", addr))?;

    info!("Dashboard listening on http://{}", addr);
    axum::serve(listener, app)
        .await
        .context("Dashboard server error")?;

    Ok(())
}
