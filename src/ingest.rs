// src/ingest.rs
//
// Upload parsing: CSV sheets (optionally bundled as a zipped workbook),
// column validation and row-level cleaning for the three ingest feeds
// (timesheets, inspections, invoicing/LLTI).
//
// Date policy: an unparsable date anywhere fails the whole upload with the
// offending rows enumerated. Missing numeric cells are read as 0.
use std::collections::HashSet;
use std::io::{Cursor, Read};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

// Timesheet export headers, as produced by the workshop ERP.
pub const COL_SALARIE_ID: &str = "Salarié - Numéro";
pub const COL_SALARIE_NOM: &str = "Salarié - Nom";
pub const COL_EQUIPE: &str = "Salarié - Equipe(Nom)";
pub const COL_DATE: &str = "Saisie heures - Date";
pub const COL_FACTURABLE: &str = "Facturable";
pub const COL_NON_FACTURABLE: &str = "Non Facturable";
pub const COL_ALLOUEE: &str = "Allouée";
pub const COL_HR_TRAVAILLEE: &str = "Hr_travaillée";
pub const COL_HR_TOTALE: &str = "Hr_Totale";
pub const COL_OR_NUMERO: &str = "OR (Numéro)";

// Invoicing export headers used by the LLTI feed.
pub const COL_OR_SEGMENT: &str = "N° OR (Segment)";
pub const COL_NUM_FACTURE: &str = "N° Facture (Lignes)";
pub const COL_DATE_FACTURE: &str = "Date Facture (Lignes)";
pub const COL_POINTAGE_DERNIERE_DATE: &str = "Pointage dernière date (Segment)";
pub const COL_NOM_CLIENT: &str = "Nom Client OR (or)";
pub const COL_NUM_SERIE: &str = "Numéro série Equipement (Segment)";
pub const COL_CONSTRUCTEUR: &str = "Constructeur de l'équipement";

pub const INSPECTED: &str = "Inspecté";
pub const NOT_INSPECTED: &str = "Non Inspecté";

/// One raw timesheet row, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetEntry {
    pub salarie_id: String,
    pub salarie_nom: String,
    pub equipe: String,
    pub date: NaiveDate,
    pub heures_facturables: f64,
    pub heures_non_facturables: f64,
    pub heures_allouees: f64,
    pub heures_travaillees: f64,
    pub heures_totales: f64,
    pub or_numero: Option<String>,
}

/// One raw inspection line as uploaded (before technician enrichment).
#[derive(Debug, Clone, PartialEq)]
pub struct RawInspectionRow {
    pub sn: String,
    pub or_segment: String,
    pub type_materiel: String,
    pub atelier: String,
    pub date_facture: NaiveDate,
    pub inspected: bool,
}

/// One raw invoicing line as uploaded (before LLTI preprocessing).
#[derive(Debug, Clone, PartialEq)]
pub struct RawLltiRow {
    pub or_segment: String,
    pub numero_facture: String,
    pub date_facture: Option<NaiveDate>,
    pub date_pointage: Option<NaiveDate>,
    pub client: String,
    pub sn_equipement: String,
    pub constructeur: String,
}

/// Which feed a sheet belongs to, decided by column-set sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Productivity,
    Inspection,
    Llti,
    Unknown,
}

/// A row the loader refused, reported back to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub line: usize,
    pub column: String,
    pub value: String,
}

fn format_issues(issues: &[RowIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("line {} ({}: '{}')", i.line, i.column, i.value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },
    #[error("rejected rows: {}", format_issues(issues))]
    BadRows { issues: Vec<RowIssue> },
    #[error("unsupported upload format: {0}")]
    UnsupportedFormat(String),
    #[error("sheet is empty")]
    EmptySheet,
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read workbook archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];

/// Parses the date formats seen in ERP exports (plain dates and datetimes).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Numeric cell: empty and NaN-ish cells read as 0, decimal comma accepted.
fn parse_hours(raw: &str) -> Result<f64, ()> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(0.0);
    }
    s.replace(',', ".").parse::<f64>().map_err(|_| ())
}

fn header_index(headers: &csv::StringRecord) -> Vec<String> {
    headers.iter().map(|h| h.trim().to_string()).collect()
}

fn find_col(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Classifies a sheet by its header set.
///
/// The productivity check mirrors the workbook dispatch of the upload
/// pipeline: date + employee name + billable hours identify a timesheet.
pub fn sniff_sheet_kind(headers: &[String]) -> SheetKind {
    let has = |name: &str| headers.iter().any(|h| h == name);
    if has(COL_DATE) && has(COL_SALARIE_NOM) && has(COL_FACTURABLE) {
        return SheetKind::Productivity;
    }
    if has(COL_NUM_FACTURE) && has(COL_CONSTRUCTEUR) {
        return SheetKind::Llti;
    }
    if map_inspection_headers(headers).is_ok() {
        return SheetKind::Inspection;
    }
    SheetKind::Unknown
}

/// Reads an upload body as a list of named CSV sheets.
///
/// A zip archive (the multi-sheet workbook form) yields one sheet per
/// contained `.csv` entry; anything else is treated as a single CSV sheet.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<(String, Vec<u8>)>, LoadError> {
    const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
    if bytes.len() >= 4 && bytes[..4] == ZIP_MAGIC {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut sheets = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if !file.is_file() || !file.name().to_lowercase().ends_with(".csv") {
                continue;
            }
            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            sheets.push((file.name().to_string(), content));
        }
        if sheets.is_empty() {
            return Err(LoadError::UnsupportedFormat(
                "workbook archive contains no csv sheets".to_string(),
            ));
        }
        Ok(sheets)
    } else {
        Ok(vec![("sheet".to_string(), bytes.to_vec())])
    }
}

/// Parses and cleans a timesheet sheet.
///
/// Validates the fixed column set, coerces dates and hours, fills missing
/// numeric cells with 0 and drops exact-duplicate rows.
pub fn parse_timesheet_csv(bytes: &[u8]) -> Result<Vec<TimesheetEntry>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = header_index(reader.headers()?);

    let required = [
        COL_SALARIE_ID,
        COL_SALARIE_NOM,
        COL_EQUIPE,
        COL_DATE,
        COL_FACTURABLE,
        COL_NON_FACTURABLE,
        COL_ALLOUEE,
        COL_HR_TRAVAILLEE,
        COL_HR_TOTALE,
    ];
    let missing: Vec<String> = required
        .iter()
        .filter(|c| find_col(&headers, c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns { columns: missing });
    }

    let idx = |name: &str| find_col(&headers, name).expect("checked above");
    let (i_id, i_nom, i_equipe, i_date) = (
        idx(COL_SALARIE_ID),
        idx(COL_SALARIE_NOM),
        idx(COL_EQUIPE),
        idx(COL_DATE),
    );
    let hour_cols = [
        idx(COL_FACTURABLE),
        idx(COL_NON_FACTURABLE),
        idx(COL_ALLOUEE),
        idx(COL_HR_TRAVAILLEE),
        idx(COL_HR_TOTALE),
    ];
    let i_or = find_col(&headers, COL_OR_NUMERO);

    let mut entries = Vec::new();
    let mut issues = Vec::new();
    let mut seen: HashSet<(String, String, String, NaiveDate, [u64; 5], String)> = HashSet::new();

    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = row_idx + 2; // 1-based, after the header line
        let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();

        let raw_date = cell(i_date);
        let Some(date) = parse_date(&raw_date) else {
            issues.push(RowIssue {
                line,
                column: COL_DATE.to_string(),
                value: raw_date,
            });
            continue;
        };

        let mut hours = [0.0_f64; 5];
        let mut row_ok = true;
        for (slot, &col) in hours.iter_mut().zip(hour_cols.iter()) {
            match parse_hours(record.get(col).unwrap_or("")) {
                Ok(v) => *slot = v,
                Err(()) => {
                    issues.push(RowIssue {
                        line,
                        column: headers[col].clone(),
                        value: cell(col),
                    });
                    row_ok = false;
                }
            }
        }
        if !row_ok {
            continue;
        }

        let or_numero = i_or.map(|i| cell(i)).filter(|v| !v.is_empty());
        let key = (
            cell(i_id),
            cell(i_nom),
            cell(i_equipe),
            date,
            hours.map(f64::to_bits),
            or_numero.clone().unwrap_or_default(),
        );
        if !seen.insert(key) {
            continue; // exact duplicate row
        }

        entries.push(TimesheetEntry {
            salarie_id: cell(i_id),
            salarie_nom: cell(i_nom),
            equipe: cell(i_equipe),
            date,
            heures_facturables: hours[0],
            heures_non_facturables: hours[1],
            heures_allouees: hours[2],
            heures_travaillees: hours[3],
            heures_totales: hours[4],
            or_numero,
        });
    }

    if !issues.is_empty() {
        return Err(LoadError::BadRows { issues });
    }
    if entries.is_empty() {
        return Err(LoadError::EmptySheet);
    }
    info!("Parsed timesheet sheet: {} rows", entries.len());
    Ok(entries)
}

/// Resolves the loosely-named inspection export headers onto the canonical
/// (sn, or_segment, type_materiel, atelier, date_facture, is_inspected) set.
fn map_inspection_headers(headers: &[String]) -> Result<[Option<usize>; 6], Vec<String>> {
    let mut sn = None;
    let mut or_segment = None;
    let mut type_materiel = None;
    let mut atelier = None;
    let mut date_facture = None;
    let mut is_inspected = None;

    for (i, header) in headers.iter().enumerate() {
        let h = header.to_lowercase();
        if sn.is_none() && (h == "sn" || h.contains("serial") || h.contains("série")) {
            sn = Some(i);
        } else if date_facture.is_none() && h.contains("date") && h.contains("facture") {
            date_facture = Some(i);
        } else if is_inspected.is_none() && h.contains("inspect") {
            is_inspected = Some(i);
        } else if or_segment.is_none() && h.contains("or") && h.contains("segment") {
            or_segment = Some(i);
        } else if type_materiel.is_none() && h.contains("type") && h.contains("materiel") {
            type_materiel = Some(i);
        } else if atelier.is_none() && h.contains("atelier") {
            atelier = Some(i);
        }
    }

    let mut missing = Vec::new();
    if sn.is_none() {
        missing.push("sn".to_string());
    }
    if date_facture.is_none() {
        missing.push("date_facture".to_string());
    }
    if is_inspected.is_none() {
        missing.push("is_inspected".to_string());
    }
    if missing.is_empty() {
        Ok([sn, or_segment, type_materiel, atelier, date_facture, is_inspected])
    } else {
        Err(missing)
    }
}

/// Parses an inspection sheet. Only `Inspecté` / `Non Inspecté` are accepted
/// as flag values.
pub fn parse_inspection_csv(bytes: &[u8]) -> Result<Vec<RawInspectionRow>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = header_index(reader.headers()?);
    let [sn, or_segment, type_materiel, atelier, date_facture, is_inspected] =
        map_inspection_headers(&headers)
            .map_err(|columns| LoadError::MissingColumns { columns })?;
    let (i_sn, i_date, i_flag) = (
        sn.expect("required"),
        date_facture.expect("required"),
        is_inspected.expect("required"),
    );

    let mut rows = Vec::new();
    let mut issues = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = row_idx + 2;
        let cell =
            |i: Option<usize>| i.and_then(|i| record.get(i)).unwrap_or("").trim().to_string();

        let raw_date = cell(Some(i_date));
        let Some(date) = parse_date(&raw_date) else {
            issues.push(RowIssue {
                line,
                column: "date_facture".to_string(),
                value: raw_date,
            });
            continue;
        };
        let flag = cell(Some(i_flag));
        let inspected = match flag.as_str() {
            INSPECTED => true,
            NOT_INSPECTED => false,
            _ => {
                issues.push(RowIssue {
                    line,
                    column: "is_inspected".to_string(),
                    value: flag,
                });
                continue;
            }
        };

        rows.push(RawInspectionRow {
            sn: cell(Some(i_sn)),
            or_segment: cell(or_segment),
            type_materiel: cell(type_materiel),
            atelier: cell(atelier),
            date_facture: date,
            inspected,
        });
    }

    if !issues.is_empty() {
        return Err(LoadError::BadRows { issues });
    }
    info!("Parsed inspection sheet: {} rows", rows.len());
    Ok(rows)
}

/// Parses an invoicing sheet for the LLTI feed. Dates may be absent (those
/// rows are filtered by preprocessing); present-but-unparsable dates reject
/// the upload.
pub fn parse_llti_csv(bytes: &[u8]) -> Result<Vec<RawLltiRow>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = header_index(reader.headers()?);

    let required = [
        COL_OR_SEGMENT,
        COL_NUM_FACTURE,
        COL_DATE_FACTURE,
        COL_POINTAGE_DERNIERE_DATE,
        COL_NOM_CLIENT,
        COL_NUM_SERIE,
        COL_CONSTRUCTEUR,
    ];
    let missing: Vec<String> = required
        .iter()
        .filter(|c| find_col(&headers, c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns { columns: missing });
    }
    let idx = |name: &str| find_col(&headers, name).expect("checked above");

    let mut rows = Vec::new();
    let mut issues = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = row_idx + 2;
        let cell = |name: &str| record.get(idx(name)).unwrap_or("").trim().to_string();

        let mut opt_date = |name: &str| -> Result<Option<NaiveDate>, ()> {
            let raw = cell(name);
            if raw.is_empty() {
                return Ok(None);
            }
            match parse_date(&raw) {
                Some(d) => Ok(Some(d)),
                None => {
                    issues.push(RowIssue {
                        line,
                        column: name.to_string(),
                        value: raw,
                    });
                    Err(())
                }
            }
        };

        let (date_facture, date_pointage) =
            match (opt_date(COL_DATE_FACTURE), opt_date(COL_POINTAGE_DERNIERE_DATE)) {
                (Ok(f), Ok(p)) => (f, p),
                _ => continue,
            };

        rows.push(RawLltiRow {
            or_segment: cell(COL_OR_SEGMENT),
            numero_facture: cell(COL_NUM_FACTURE),
            date_facture,
            date_pointage,
            client: cell(COL_NOM_CLIENT),
            sn_equipement: cell(COL_NUM_SERIE),
            constructeur: cell(COL_CONSTRUCTEUR),
        });
    }

    if !issues.is_empty() {
        return Err(LoadError::BadRows { issues });
    }
    info!("Parsed invoicing sheet: {} rows", rows.len());
    Ok(rows)
}
