//! JSON API for the web mode.
//!
//! | Route | Method | Body / query | Response |
//! |-------|--------|--------------|----------|
//! | `/health` | GET | | `ok` |
//! | `/compare` | POST | `{domains, all_sources?}` | `{success, results, timestamp}` |
//! | `/articles` | GET | `?period=&limit=` | `{period, source, articles}` |
//! | `/export/csv` | POST | `{results}` | `text/csv` attachment |
//! | `/export/json` | POST | `{results}` | JSON attachment |
//! | `/jobs/compare` | POST | `{domains, all_sources?}` | `202 {job_id}` |
//! | `/jobs/articles` | POST | `?period=&limit=` | `202 {job_id}` |
//! | `/dashboard` | GET | | latest background results |
//!
//! Errors are `{error}` with a 4xx or 5xx status.

use crate::articles::ArticleEngine;
use crate::config::Config;
use crate::jobs::{JobBoard, JobKind, JobPayload};
use crate::models::{Comparison, Period, WebsiteMetrics};
use crate::outputs::{csv, json};
use crate::ranking::RankingEngine;
use crate::resolver::BoxError;
use crate::utils::clean_domain;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct AppState {
    pub ranking: Arc<RankingEngine>,
    pub articles: Arc<ArticleEngine>,
    pub jobs: Arc<JobBoard>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/compare", post(compare))
        .route("/articles", get(articles))
        .route("/export/csv", post(export_csv))
        .route("/export/json", post(export_json))
        .route("/jobs/compare", post(submit_compare))
        .route("/jobs/articles", post(submit_articles))
        .route("/dashboard", get(dashboard))
        .with_state(state)
}

/// Bind `config.web.host:port` and serve until the process is stopped.
pub async fn serve(config: &Config, state: AppState) -> Result<(), BoxError> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Web interface listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

struct ApiError(StatusCode, String);

impl ApiError {
    fn bad_request(msg: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, msg.into())
    }

    fn internal(e: impl std::fmt::Display) -> Self {
        error!(error = %e, "Request failed");
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

#[derive(Deserialize)]
struct CompareReq {
    #[serde(default)]
    domains: Vec<String>,
    #[serde(default)]
    all_sources: bool,
}

impl CompareReq {
    fn validate(&self) -> Result<(), ApiError> {
        if self.domains.is_empty() {
            return Err(ApiError::bad_request("No domains provided"));
        }
        if !self.domains.iter().any(|d| clean_domain(d).is_some()) {
            return Err(ApiError::bad_request("No valid domains provided"));
        }
        Ok(())
    }
}

#[instrument(level = "info", skip_all)]
async fn compare(State(state): State<AppState>, Json(req): Json<CompareReq>) -> Result<Json<Value>, ApiError> {
    req.validate()?;
    let comparison = state.ranking.compare_websites(&req.domains, req.all_sources).await;
    let results = json::domains_map(&comparison).map_err(ApiError::internal)?;
    Ok(Json(json!({
        "success": true,
        "results": results,
        "timestamp": Local::now().to_rfc3339(),
    })))
}

#[derive(Deserialize)]
struct ArticlesParams {
    period: Option<String>,
    limit: Option<usize>,
}

impl ArticlesParams {
    fn parse(&self) -> Result<(Period, usize), ApiError> {
        let period = match self.period.as_deref() {
            Some(p) => p.parse::<Period>().map_err(ApiError::bad_request)?,
            None => Period::Last7Days,
        };
        Ok((period, self.limit.unwrap_or(10)))
    }
}

async fn articles(
    State(state): State<AppState>,
    Query(params): Query<ArticlesParams>,
) -> Result<Json<Value>, ApiError> {
    let (period, limit) = params.parse()?;
    let resolution = state.articles.get_most_read_articles(period, limit).await;
    Ok(Json(json!({
        "period": period,
        "source": resolution.outcome.to_string(),
        "articles": resolution.value,
    })))
}

#[derive(Deserialize)]
struct ExportReq {
    #[serde(default)]
    results: Map<String, Value>,
}

impl ExportReq {
    fn into_comparison(self) -> Result<Comparison, ApiError> {
        if self.results.is_empty() {
            return Err(ApiError::bad_request("No results to export"));
        }
        let mut comparison = Comparison::new();
        for (domain, records) in self.results {
            let mut records: Vec<WebsiteMetrics> =
                serde_json::from_value(records).map_err(|e| ApiError::bad_request(e.to_string()))?;
            for record in &mut records {
                if record.domain.is_empty() {
                    record.domain = domain.clone();
                }
            }
            comparison.push((domain, records));
        }
        Ok(comparison)
    }
}

fn attachment(content_type: &'static str, extension: &str, body: String) -> Response {
    let filename = format!(
        "web_ranking_comparison_{}.{extension}",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        body,
    )
        .into_response()
}

async fn export_csv(Json(req): Json<ExportReq>) -> Result<Response, ApiError> {
    let comparison = req.into_comparison()?;
    let body = csv::metrics_to_csv(&comparison).map_err(ApiError::internal)?;
    Ok(attachment("text/csv", "csv", body))
}

async fn export_json(Json(req): Json<ExportReq>) -> Result<Response, ApiError> {
    let comparison = req.into_comparison()?;
    let body = json::comparison_to_json(&comparison, Local::now().naive_local()).map_err(ApiError::internal)?;
    Ok(attachment("application/json", "json", body))
}

async fn submit_compare(
    State(state): State<AppState>,
    Json(req): Json<CompareReq>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate()?;
    let ranking = Arc::clone(&state.ranking);
    let job_id = state.jobs.submit(JobKind::Comparison, async move {
        JobPayload::Comparison(ranking.compare_websites(&req.domains, req.all_sources).await)
    });
    Ok((StatusCode::ACCEPTED, Json(json!({ "job_id": job_id }))))
}

async fn submit_articles(
    State(state): State<AppState>,
    Query(params): Query<ArticlesParams>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (period, limit) = params.parse()?;
    let engine = Arc::clone(&state.articles);
    let job_id = state.jobs.submit(JobKind::Articles, async move {
        let resolution = engine.get_most_read_articles(period, limit).await;
        JobPayload::Articles {
            period,
            source: resolution.outcome.to_string(),
            articles: resolution.value,
        }
    });
    Ok((StatusCode::ACCEPTED, Json(json!({ "job_id": job_id }))))
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let snapshot = state.jobs.snapshot().await;
    let comparison = match &snapshot.comparison {
        Some(c) => Value::Object(json::domains_map(c).map_err(ApiError::internal)?),
        None => Value::Null,
    };
    let articles = match snapshot.articles {
        Some(JobPayload::Articles { period, source, articles }) => {
            json!({ "period": period, "source": source, "articles": articles })
        }
        _ => Value::Null,
    };
    Ok(Json(json!({
        "comparison_job": snapshot.comparison_job,
        "comparison": comparison,
        "articles_job": snapshot.articles_job,
        "articles": articles,
        "dropped": snapshot.dropped,
    })))
}
