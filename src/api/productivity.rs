// src/api/productivity.rs
//
// Productivity and exhaustivity endpoints. Every handler loads the
// relevant slice, computes in memory and returns a typed payload; empty
// data yields empty/zero-valued structures, never an error.
use axum::extract::{Query, State};
use axum::response::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::exhaustivity::{self, DayStatus, RateScope};
use crate::productivity::{self, EmployeeDay, TeamPeriod};

use super::{AppState, ListResponse};

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub salarie_id: Option<String>,
    pub equipe: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn filtered_daily(state: &AppState, q: &DailyQuery) -> Result<Vec<EmployeeDay>, ApiError> {
    let entries = state.load_timesheet_entries()?;
    let mut daily = productivity::calculate_daily(&entries);
    if let Some(id) = &q.salarie_id {
        daily.retain(|d| &d.salarie_id == id);
    }
    if let Some(equipe) = &q.equipe {
        daily.retain(|d| &d.equipe == equipe);
    }
    if let Some(start) = q.start_date {
        daily.retain(|d| d.date >= start);
    }
    if let Some(end) = q.end_date {
        daily.retain(|d| d.date <= end);
    }
    Ok(daily)
}

/// GET /api/productivity/daily
pub async fn daily(
    State(state): State<AppState>,
    Query(q): Query<DailyQuery>,
) -> Result<Json<ListResponse<EmployeeDay>>, ApiError> {
    Ok(Json(ListResponse::new(filtered_daily(&state, &q)?)))
}

#[derive(Debug, Deserialize)]
pub struct EmployeePeriodQuery {
    #[serde(default = "default_period")]
    pub period: String,
    pub salarie_id: Option<String>,
    pub equipe: Option<String>,
}

fn default_period() -> String {
    "monthly".to_string()
}

/// GET /api/productivity/employee: per-employee rollups at the asked
/// granularity (daily, weekly, monthly or rolling12).
pub async fn employee_periods(
    State(state): State<AppState>,
    Query(q): Query<EmployeePeriodQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = DailyQuery {
        salarie_id: q.salarie_id.clone(),
        equipe: q.equipe.clone(),
        start_date: None,
        end_date: None,
    };
    let daily = filtered_daily(&state, &filter)?;
    let data = match q.period.as_str() {
        "daily" => serde_json::to_value(&daily),
        "weekly" => serde_json::to_value(productivity::calculate_weekly(&daily)),
        "monthly" => serde_json::to_value(productivity::calculate_monthly(&daily)),
        "rolling12" => serde_json::to_value(productivity::calculate_rolling12(&daily)),
        other => {
            return Err(ApiError::Validation(format!(
                "Period must be 'daily', 'weekly', 'monthly' or 'rolling12', got '{}'",
                other
            )))
        }
    }
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    let count = data.as_array().map(Vec::len).unwrap_or(0);
    Ok(Json(json!({
        "success": true,
        "period": q.period,
        "count": count,
        "data": data,
    })))
}

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    #[serde(default = "default_period")]
    pub period: String,
    pub equipe: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// GET /api/productivity/team
pub async fn team(
    State(state): State<AppState>,
    Query(q): Query<TeamQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(period) = TeamPeriod::parse(&q.period) else {
        return Err(ApiError::Validation(
            "Period must be 'daily', 'weekly', or 'monthly'".to_string(),
        ));
    };
    let entries = state.load_timesheet_entries()?;
    let daily = productivity::calculate_daily(&entries);
    let mut rows = productivity::calculate_team(&daily, period);
    if let Some(equipe) = &q.equipe {
        rows.retain(|r| &r.equipe == equipe);
    }
    if let Some(year) = q.year {
        rows.retain(|r| r.annee == Some(year));
    }
    if let Some(month) = q.month {
        rows.retain(|r| r.mois == Some(month));
    }
    Ok(Json(json!({
        "success": true,
        "period": q.period,
        "count": rows.len(),
        "data": rows,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default = "default_summary_by")]
    pub by: String,
    pub equipe: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

fn default_summary_by() -> String {
    "team".to_string()
}

/// GET /api/productivity/exhaustivity/summary
pub async fn exhaustivity_summary(
    State(state): State<AppState>,
    Query(q): Query<SummaryQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(scope) = RateScope::parse(&q.by) else {
        return Err(ApiError::Validation(
            "by must be 'global', 'team', 'employee', or 'month'".to_string(),
        ));
    };
    let entries = state.load_timesheet_entries()?;
    let daily = productivity::calculate_daily(&entries);
    let days = exhaustivity::check_daily(&daily);
    let mut rows = exhaustivity::calculate_rate(&days, scope);
    if let Some(equipe) = &q.equipe {
        rows.retain(|r| r.equipe.as_deref() == Some(equipe.as_str()) || r.equipe.is_none());
    }
    if let Some(year) = q.year {
        rows.retain(|r| r.annee == Some(year) || r.annee.is_none());
    }
    if let Some(month) = q.month {
        rows.retain(|r| r.mois == Some(month) || r.mois.is_none());
    }
    Ok(Json(json!({
        "success": true,
        "aggregation": q.by,
        "count": rows.len(),
        "data": rows,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AnomaliesQuery {
    pub types: Option<String>,
    pub equipe: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// GET /api/productivity/exhaustivity/anomalies
pub async fn exhaustivity_anomalies(
    State(state): State<AppState>,
    Query(q): Query<AnomaliesQuery>,
) -> Result<Json<Value>, ApiError> {
    let statuses: Option<Vec<DayStatus>> = match &q.types {
        None => None,
        Some(raw) => {
            let mut parsed = Vec::new();
            for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                match DayStatus::parse(name) {
                    Some(DayStatus::Compliant) | None => {
                        return Err(ApiError::Validation(format!(
                            "Invalid anomaly type: {}",
                            name
                        )))
                    }
                    Some(status) => parsed.push(status),
                }
            }
            Some(parsed)
        }
    };
    let limit = q.limit.min(1000);

    let entries = state.load_timesheet_entries()?;
    let daily = productivity::calculate_daily(&entries);
    let days = exhaustivity::check_daily(&daily);
    let mut anomalies = exhaustivity::detect_anomalies(&days, statuses.as_deref());
    if let Some(equipe) = &q.equipe {
        anomalies.retain(|a| &a.equipe == equipe);
    }
    if let Some(start) = q.start_date {
        anomalies.retain(|a| a.date >= start);
    }
    if let Some(end) = q.end_date {
        anomalies.retain(|a| a.date <= end);
    }
    anomalies.truncate(limit);

    Ok(Json(json!({
        "success": true,
        "types": statuses
            .unwrap_or_else(|| vec![DayStatus::Missing, DayStatus::Incomplete, DayStatus::Overtime]),
        "count": anomalies.len(),
        "data": anomalies,
    })))
}

#[derive(Debug, Deserialize)]
pub struct MissingDaysQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub equipe: Option<String>,
}

/// GET /api/productivity/exhaustivity/missing-days: expected working days
/// with no record at all (distinct from 0-hour days).
pub async fn missing_days(
    State(state): State<AppState>,
    Query(q): Query<MissingDaysQuery>,
) -> Result<Json<Value>, ApiError> {
    if q.end_date < q.start_date {
        return Err(ApiError::Validation(
            "end_date must not precede start_date".to_string(),
        ));
    }
    let entries = state.load_timesheet_entries()?;
    let daily = productivity::calculate_daily(&entries);
    let mut missing = exhaustivity::get_missing_days(&daily, q.start_date, q.end_date);
    if let Some(equipe) = &q.equipe {
        missing.retain(|m| &m.equipe == equipe);
    }
    Ok(Json(json!({
        "success": true,
        "count": missing.len(),
        "data": missing,
    })))
}

/// GET /api/productivity/teams
pub async fn teams(State(state): State<AppState>) -> Result<Json<ListResponse<String>>, ApiError> {
    let entries = state.load_timesheet_entries()?;
    let mut teams: Vec<String> = entries.iter().map(|e| e.equipe.clone()).collect();
    teams.sort();
    teams.dedup();
    Ok(Json(ListResponse::new(teams)))
}

#[derive(Debug, Deserialize)]
pub struct EmployeesQuery {
    pub equipe: Option<String>,
}

/// GET /api/productivity/employees
pub async fn employees(
    State(state): State<AppState>,
    Query(q): Query<EmployeesQuery>,
) -> Result<Json<Value>, ApiError> {
    let entries = state.load_timesheet_entries()?;
    let mut seen: Vec<(String, String, String)> = entries
        .iter()
        .map(|e| (e.equipe.clone(), e.salarie_nom.clone(), e.salarie_id.clone()))
        .collect();
    seen.sort();
    seen.dedup();
    if let Some(equipe) = &q.equipe {
        seen.retain(|(e, _, _)| e == equipe);
    }
    let data: Vec<Value> = seen
        .into_iter()
        .map(|(equipe, salarie_nom, salarie_id)| {
            json!({ "salarie_id": salarie_id, "salarie_nom": salarie_nom, "equipe": equipe })
        })
        .collect();
    Ok(Json(json!({
        "success": true,
        "count": data.len(),
        "data": data,
    })))
}

/// GET /kpi/productivite/analytics: the dashboard headline block.
pub async fn analytics(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let entries = state.load_timesheet_entries()?;
    let analytics = productivity::calculate_analytics(&entries);
    serde_json::to_value(&analytics)
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}
