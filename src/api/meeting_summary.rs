// src/api/meeting_summary.rs
//
// Meeting summary generation and archive. A generated summary is a
// write-once snapshot of the headline KPIs plus the rendered Markdown.
use axum::extract::{Path, State};
use axum::response::Json;
use axum::Extension;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::{require_allowed_admin, AuthUser};
use crate::error::ApiError;
use crate::periods;
use crate::report;

use super::inspection as inspection_api;
use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GeneratePayload {
    pub meeting_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes_discussion: String,
}

/// POST /api/meeting-summary/generate
pub async fn generate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Option<Json<GeneratePayload>>,
) -> Result<Json<Value>, ApiError> {
    require_allowed_admin(&state, &user)?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let today = Local::now().date_naive();
    let meeting_date = payload.meeting_date.unwrap_or(today);

    let entries = state.load_timesheet_entries()?;
    if entries.is_empty() {
        return Err(ApiError::Validation("Aucune donnée disponible".to_string()));
    }
    let total_facturable: f64 = entries.iter().map(|e| e.heures_facturables).sum();
    let total_heures: f64 = entries.iter().map(|e| e.heures_travaillees).sum();

    let (start, end) = periods::current_quarter_bounds(today);
    let last_wednesday = periods::last_wednesday(today);
    let inspection =
        inspection_api::quarter_analytics(&state, start, end, Some(last_wednesday), None)?;

    let (actions_ouvertes, actions_critiques) = state.store.open_action_counts(today)?;

    let snapshot = report::build_snapshot(
        meeting_date,
        total_facturable,
        total_heures,
        &inspection,
        actions_ouvertes,
        actions_critiques,
    );

    let actions = state.store.list_lean_actions()?;
    let generated_at = Local::now().format("%d %B %Y à %H:%M").to_string();
    let markdown = report::render_markdown(
        &snapshot,
        &actions,
        &payload.notes_discussion,
        &generated_at,
    );

    let id = state.store.insert_meeting_summary(
        meeting_date,
        snapshot.productivite_globale,
        snapshot.total_heures,
        snapshot.total_facturable,
        snapshot.actions_ouvertes,
        snapshot.actions_critiques,
        &payload.notes_discussion,
        &markdown,
        &user.email,
    )?;

    info!("Meeting summary {} generated by {}", id, user.email);
    Ok(Json(json!({
        "id": id,
        "meeting_date": meeting_date,
        "markdown": markdown,
        "summary": snapshot,
    })))
}

/// GET /api/meeting-summary/list
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    require_allowed_admin(&state, &user)?;
    let summaries = state.store.list_meeting_summaries()?;
    Ok(Json(json!({ "summaries": summaries })))
}

/// GET /api/meeting-summary/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    require_allowed_admin(&state, &user)?;
    match state.store.get_meeting_summary(id)? {
        Some(detail) => Ok(Json(
            serde_json::to_value(&detail).map_err(|e| ApiError::Internal(e.to_string()))?,
        )),
        None => Err(ApiError::NotFound("Compte rendu non trouvé".to_string())),
    }
}
