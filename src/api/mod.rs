// src/api/mod.rs
//
// Route assembly and shared request-handling state.
pub mod inspection;
pub mod lean_actions;
pub mod llti;
pub mod meeting_summary;
pub mod productivity;
pub mod upload;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::response::Json;
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::ingest::TimesheetEntry;
use crate::snapshot::LatestUploads;
use crate::store::Store;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub uploads: LatestUploads,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        Self {
            config: Arc::new(config),
            store,
            uploads: LatestUploads::new(),
        }
    }

    /// The timesheet slice every productivity endpoint works from: the
    /// persisted pointage rows, falling back to the latest uploaded dataset
    /// when the database is empty.
    pub fn load_timesheet_entries(&self) -> Result<Vec<TimesheetEntry>, ApiError> {
        let rows = self.store.load_pointage(None, None, None)?;
        if !rows.is_empty() {
            return Ok(rows.iter().map(|r| r.to_entry()).collect());
        }
        if let Some(snapshot) = self.uploads.timesheet() {
            return Ok(snapshot.as_ref().clone());
        }
        Ok(Vec::new())
    }
}

/// Standard list envelope for the dashboard endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // uploads
        .route("/kpi/productivite/upload", post(upload::upload_productivity))
        .route("/kpi/inspection/upload", post(upload::upload_inspection))
        .route("/kpi/llti/upload", post(upload::upload_llti))
        // productivity + exhaustivity
        .route("/kpi/productivite/analytics", get(productivity::analytics))
        .route("/api/productivity/daily", get(productivity::daily))
        .route("/api/productivity/employee", get(productivity::employee_periods))
        .route("/api/productivity/team", get(productivity::team))
        .route(
            "/api/productivity/exhaustivity/summary",
            get(productivity::exhaustivity_summary),
        )
        .route(
            "/api/productivity/exhaustivity/anomalies",
            get(productivity::exhaustivity_anomalies),
        )
        .route(
            "/api/productivity/exhaustivity/missing-days",
            get(productivity::missing_days),
        )
        .route("/api/productivity/teams", get(productivity::teams))
        .route("/api/productivity/employees", get(productivity::employees))
        // inspection
        .route("/kpi/inspection/analytics", get(inspection::analytics))
        .route("/kpi/inspection/snapshot", get(inspection::snapshot))
        .route("/kpi/inspection/quarters", get(inspection::quarters))
        .route("/kpi/inspection/teams", get(inspection::teams))
        .route("/kpi/inspection/history", get(inspection::history))
        // llti
        .route("/kpi/llti/analytics", get(llti::analytics))
        .route("/kpi/llti/snapshot", get(llti::snapshot))
        // lean actions
        .route(
            "/api/lean-actions",
            get(lean_actions::list).post(lean_actions::create),
        )
        .route(
            "/api/lean-actions/{id}",
            put(lean_actions::update).delete(lean_actions::delete),
        )
        // meeting summaries
        .route("/api/meeting-summary/generate", post(meeting_summary::generate))
        .route("/api/meeting-summary/list", get(meeting_summary::list))
        .route("/api/meeting-summary/{id}", get(meeting_summary::get_one))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::email_guard,
        ))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
