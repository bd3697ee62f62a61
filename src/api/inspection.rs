// src/api/inspection.rs
//
// Inspection-rate endpoints: quarterly analytics with the weekly delta,
// the dashboard snapshot, available quarters/teams and the four-quarter
// history.
use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::inspection::{self, InspectionAnalytics};
use crate::periods;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub year: Option<i32>,
    pub quarter: Option<u32>,
    pub team: Option<String>,
}

fn resolve_window(
    q: &AnalyticsQuery,
    today: NaiveDate,
) -> Result<(i32, u32, NaiveDate, NaiveDate), ApiError> {
    match (q.year, q.quarter) {
        (Some(year), Some(quarter)) => {
            let (start, end) = periods::quarter_bounds(year, quarter).ok_or_else(|| {
                ApiError::Validation(format!("Trimestre invalide: {}", quarter))
            })?;
            Ok((year, quarter, start, end))
        }
        _ => {
            let (start, end) = periods::current_quarter_bounds(today);
            Ok((today.year(), periods::quarter_of(today), start, end))
        }
    }
}

pub(crate) fn quarter_analytics(
    state: &AppState,
    start: NaiveDate,
    end: NaiveDate,
    last_wednesday: Option<NaiveDate>,
    team: Option<&str>,
) -> Result<InspectionAnalytics, ApiError> {
    let records = state.store.load_inspections(Some(start), Some(end), team)?;
    if records.is_empty() {
        return Ok(inspection::empty_analytics());
    }
    let last = match last_wednesday {
        Some(wednesday) => Some(
            state
                .store
                .load_inspections(Some(start), Some(wednesday), team)?,
        ),
        None => None,
    };
    Ok(inspection::calculate_analytics(&records, last.as_deref()))
}

/// GET /kpi/inspection/analytics
pub async fn analytics(
    State(state): State<AppState>,
    Query(q): Query<AnalyticsQuery>,
) -> Result<Json<Value>, ApiError> {
    let today = Local::now().date_naive();
    let (year, quarter, start, end) = resolve_window(&q, today)?;
    let last_wednesday = periods::last_wednesday(today);

    let analytics = quarter_analytics(
        &state,
        start,
        end,
        Some(last_wednesday),
        q.team.as_deref(),
    )?;

    Ok(Json(json!({
        "period": periods::quarter_label(year, quarter),
        "start_date": start,
        "end_date": end,
        "total": analytics.total,
        "inspected": analytics.inspected,
        "not_inspected": analytics.not_inspected,
        "inspection_rate": analytics.inspection_rate,
        "delta_weekly": analytics.delta_weekly,
        "inspection_rate_last_wednesday": analytics.inspection_rate_last_wednesday,
        "last_wednesday_date": last_wednesday,
        "by_atelier": analytics.by_atelier,
        "by_type_materiel": analytics.by_type_materiel,
        "by_technicien": analytics.by_technicien,
        "records": analytics.records,
    })))
}

/// GET /kpi/inspection/snapshot: current-quarter headline numbers.
pub async fn snapshot(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let today = Local::now().date_naive();
    let (start, end) = periods::current_quarter_bounds(today);
    let last_wednesday = periods::last_wednesday(today);
    let analytics = quarter_analytics(&state, start, end, Some(last_wednesday), None)?;
    Ok(Json(json!({
        "inspection_rate": analytics.inspection_rate,
        "delta_weekly": analytics.delta_weekly,
        "total": analytics.total,
        "inspected": analytics.inspected,
        "not_inspected": analytics.not_inspected,
    })))
}

/// GET /kpi/inspection/quarters: quarters present in the data.
pub async fn quarters(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let quarters: Vec<Value> = state
        .store
        .inspection_quarters()?
        .into_iter()
        .map(|(year, quarter)| {
            json!({
                "year": year,
                "quarter": quarter,
                "label": periods::quarter_label(year, quarter),
            })
        })
        .collect();
    Ok(Json(json!({ "quarters": quarters })))
}

/// GET /kpi/inspection/teams
pub async fn teams(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let teams = state.store.inspection_teams()?;
    Ok(Json(json!({ "teams": teams })))
}

/// GET /kpi/inspection/history: current and three previous quarters.
pub async fn history(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let today = Local::now().date_naive();
    let current_year = today.year();
    let current_quarter = periods::quarter_of(today);

    let mut history = Vec::new();
    for i in 0..4 {
        let (year, quarter) = periods::previous_quarter(current_year, current_quarter, i);
        let Some((start, end)) = periods::quarter_bounds(year, quarter) else {
            continue;
        };
        let analytics = quarter_analytics(&state, start, end, None, None)?;
        history.push(json!({
            "year": year,
            "quarter": quarter,
            "label": periods::quarter_label(year, quarter),
            "inspection_rate": analytics.inspection_rate,
            "total": analytics.total,
            "inspected": analytics.inspected,
            "not_inspected": analytics.not_inspected,
        }));
    }
    Ok(Json(json!({ "history": history })))
}
