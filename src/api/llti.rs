// src/api/llti.rs
//
// Lead-time-to-invoice endpoints. Reads re-apply the preprocessing filters
// (current quarter, single manufacturer, invoice dedup) on the stored rows;
// the latest uploaded dataset serves as fallback when the store is empty.
use axum::extract::State;
use axum::response::Json;
use chrono::Local;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::llti::{self, LltiAnalytics};

use super::AppState;

fn compute_analytics(state: &AppState) -> Result<LltiAnalytics, ApiError> {
    let today = Local::now().date_naive();
    let mut rows = state.store.load_llti()?;
    if rows.is_empty() {
        if let Some(snapshot) = state.uploads.llti() {
            rows = snapshot.as_ref().clone();
        }
    }
    let records = llti::preprocess(&rows, today);
    Ok(llti::calculate_analytics(&records))
}

/// GET /kpi/llti/analytics
pub async fn analytics(State(state): State<AppState>) -> Result<Json<LltiAnalytics>, ApiError> {
    Ok(Json(compute_analytics(&state)?))
}

/// GET /kpi/llti/snapshot
pub async fn snapshot(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let analytics = compute_analytics(&state)?;
    Ok(Json(json!({
        "moyenne_llti": analytics.global.moyenne_llti,
        "status": analytics.global.status,
        "total_factures": analytics.global.total_factures,
    })))
}
