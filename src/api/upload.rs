// src/api/upload.rs
//
// Spreadsheet ingestion endpoints. Uploads are CSV sheets, optionally
// bundled as a zip workbook; each sheet is classified by its column set.
// An upload commits all-or-nothing per sheet; a workbook's productivity
// sheet commits before its inspection sheet is attempted.
use std::collections::BTreeMap;

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::Extension;
use chrono::{Local, NaiveDate};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{require_uploader, AuthUser};
use crate::error::ApiError;
use crate::ingest::{
    self, RawInspectionRow, SheetKind, TimesheetEntry,
};
use crate::inspection::InspectionRecord;
use crate::llti;
use crate::store::PointageRow;

use super::AppState;

fn admin_password(headers: &HeaderMap) -> Option<&str> {
    headers.get("x-admin-password").and_then(|v| v.to_str().ok())
}

async fn file_bytes(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Upload invalide: {}", e)))?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Upload invalide: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ApiError::Validation(
        "Aucun fichier dans la requête".to_string(),
    ))
}

fn classify_sheets(sheets: &[(String, Vec<u8>)]) -> Vec<(SheetKind, &[u8])> {
    sheets
        .iter()
        .map(|(_, bytes)| {
            let kind = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(bytes.as_slice())
                .headers()
                .map(|h| {
                    let headers: Vec<String> = h.iter().map(|c| c.trim().to_string()).collect();
                    ingest::sniff_sheet_kind(&headers)
                })
                .unwrap_or(SheetKind::Unknown);
            (kind, bytes.as_slice())
        })
        .collect()
}

/// Aggregates parsed timesheet rows to one pointage row per technician/day.
/// The work order kept on the row is the one with the most worked hours
/// that day, so inspection attribution follows the dominant order.
fn aggregate_pointage(entries: &[TimesheetEntry]) -> Vec<PointageRow> {
    type Key = (NaiveDate, String, String);
    struct Acc {
        facturable: f64,
        heures: f64,
        or_hours: BTreeMap<String, f64>,
    }
    let mut grouped: BTreeMap<Key, Acc> = BTreeMap::new();
    for e in entries {
        let acc = grouped
            .entry((e.date, e.salarie_nom.clone(), e.equipe.clone()))
            .or_insert(Acc {
                facturable: 0.0,
                heures: 0.0,
                or_hours: BTreeMap::new(),
            });
        acc.facturable += e.heures_facturables;
        acc.heures += e.heures_travaillees;
        if let Some(or) = &e.or_numero {
            *acc.or_hours.entry(or.clone()).or_insert(0.0) += e.heures_travaillees;
        }
    }
    grouped
        .into_iter()
        .map(|((jour, technicien, equipe), acc)| {
            let or_numero = acc
                .or_hours
                .iter()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(or, _)| or.clone());
            PointageRow {
                jour,
                technicien,
                equipe,
                facturable: acc.facturable,
                heures_total: acc.heures,
                or_numero,
            }
        })
        .collect()
}

fn enrich_inspection_rows(
    state: &AppState,
    rows: Vec<RawInspectionRow>,
) -> Result<Vec<InspectionRecord>, ApiError> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let (technicien, equipe) = if row.or_segment.is_empty() {
            (None, None)
        } else {
            match state.store.technician_for_order(&row.or_segment)? {
                Some((technicien, equipe)) => (Some(technicien), equipe),
                None => (None, None),
            }
        };
        records.push(InspectionRecord {
            sn: row.sn,
            or_segment: row.or_segment,
            type_materiel: row.type_materiel,
            atelier: row.atelier,
            date_facture: row.date_facture,
            is_inspected: row.inspected,
            technicien,
            equipe,
        });
    }
    Ok(records)
}

/// POST /kpi/productivite/upload
pub async fn upload_productivity(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    require_uploader(&state, &user, admin_password(&headers))?;

    let bytes = file_bytes(&mut multipart).await?;
    let sheets = ingest::read_workbook(&bytes)?;
    let classified = classify_sheets(&sheets);

    // Prefer the sheet whose columns identify a timesheet; otherwise fall
    // back to the first sheet and let the loader report what is wrong.
    let timesheet_bytes = classified
        .iter()
        .find(|(kind, _)| *kind == SheetKind::Productivity)
        .map(|(_, bytes)| *bytes)
        .or_else(|| classified.first().map(|(_, bytes)| *bytes))
        .ok_or_else(|| ApiError::Validation("Fichier vide".to_string()))?;

    let entries = ingest::parse_timesheet_csv(timesheet_bytes)?;
    let pointage = aggregate_pointage(&entries);
    state.store.upsert_pointage(&pointage)?;
    state.uploads.set_timesheet(entries);

    // A workbook may carry an inspection sheet alongside the timesheet.
    // The productivity rows above stay committed even when it fails.
    let mut inspection_report: Value = Value::Null;
    if let Some((_, inspection_bytes)) = classified
        .iter()
        .find(|(kind, _)| *kind == SheetKind::Inspection)
    {
        inspection_report = match ingest::parse_inspection_csv(inspection_bytes)
            .map_err(ApiError::from)
            .and_then(|rows| enrich_inspection_rows(&state, rows))
            .and_then(|records| Ok(state.store.upsert_inspections(&records)?))
        {
            Ok(rows) => json!({ "rows": rows, "processed": true }),
            Err(e) => {
                warn!("Inspection sheet in workbook failed: {}", e);
                json!({ "rows": 0, "processed": false, "error": e.to_string() })
            }
        };
    }

    info!(
        "Productivity upload by {}: {} pointage rows",
        user.email,
        pointage.len()
    );
    Ok(Json(json!({
        "message": "Données agrégées et sauvegardées en base (1 ligne par technicien/jour)",
        "kpi": {
            "rows": pointage.len(),
            "role": if user.is_admin() { "admin" } else { "guest" },
            "owner": user.email,
        },
        "inspection": inspection_report,
    })))
}

/// POST /kpi/inspection/upload
pub async fn upload_inspection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    require_uploader(&state, &user, admin_password(&headers))?;

    let bytes = file_bytes(&mut multipart).await?;
    let sheets = ingest::read_workbook(&bytes)?;
    let classified = classify_sheets(&sheets);
    let sheet_bytes = classified
        .iter()
        .find(|(kind, _)| *kind == SheetKind::Inspection)
        .map(|(_, bytes)| *bytes)
        .or_else(|| classified.first().map(|(_, bytes)| *bytes))
        .ok_or_else(|| ApiError::Validation("Fichier vide".to_string()))?;

    let rows = ingest::parse_inspection_csv(sheet_bytes)?;
    let records = enrich_inspection_rows(&state, rows)?;
    let count = state.store.upsert_inspections(&records)?;

    info!("Inspection upload by {}: {} rows", user.email, count);
    Ok(Json(json!({
        "message": "Données d'inspection enregistrées",
        "rows": count,
    })))
}

/// POST /kpi/llti/upload
pub async fn upload_llti(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    require_uploader(&state, &user, admin_password(&headers))?;

    let bytes = file_bytes(&mut multipart).await?;
    let sheets = ingest::read_workbook(&bytes)?;
    let classified = classify_sheets(&sheets);
    let sheet_bytes = classified
        .iter()
        .find(|(kind, _)| *kind == SheetKind::Llti)
        .map(|(_, bytes)| *bytes)
        .or_else(|| classified.first().map(|(_, bytes)| *bytes))
        .ok_or_else(|| ApiError::Validation("Fichier vide".to_string()))?;

    let raw_rows = ingest::parse_llti_csv(sheet_bytes)?;
    let today = Local::now().date_naive();
    let records = llti::preprocess(&raw_rows, today);
    if records.is_empty() {
        return Ok(Json(json!({
            "message": "Aucune donnée LLTI valide après preprocessing",
            "rows": 0,
        })));
    }
    state.uploads.set_llti(raw_rows);
    let count = state.store.upsert_llti(&records)?;

    info!("LLTI upload by {}: {} invoices", user.email, count);
    Ok(Json(json!({
        "message": "Données LLTI enregistrées",
        "rows": count,
    })))
}
