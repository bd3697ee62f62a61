// src/store.rs
//
// SQLite persistence. One short-lived connection per logical operation,
// commit per operation; uploads upsert against the unique keys
// (technicien+jour, sn+date_facture, numero_facture).
use std::path::PathBuf;

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::ingest::{RawLltiRow, TimesheetEntry, INSPECTED, NOT_INSPECTED};
use crate::inspection::InspectionRecord;
use crate::llti::LltiRecord;
use crate::periods::quarter_of;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pointage (
    jour TEXT NOT NULL,
    technicien TEXT NOT NULL,
    equipe TEXT,
    facturable REAL NOT NULL,
    heures_total REAL NOT NULL,
    or_numero TEXT,
    inserted_at TEXT DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (technicien, jour)
);
CREATE TABLE IF NOT EXISTS inspection_record (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sn TEXT NOT NULL,
    or_segment TEXT,
    type_materiel TEXT,
    atelier TEXT,
    date_facture TEXT NOT NULL,
    is_inspected TEXT NOT NULL CHECK (is_inspected IN ('Inspecté', 'Non Inspecté')),
    technicien TEXT,
    equipe TEXT,
    inserted_at TEXT DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (sn, date_facture)
);
CREATE TABLE IF NOT EXISTS llti_record (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    or_segment TEXT NOT NULL,
    numero_facture TEXT NOT NULL UNIQUE,
    date_facture TEXT NOT NULL,
    date_pointage TEXT NOT NULL,
    client TEXT,
    sn_equipement TEXT,
    constructeur TEXT,
    llti_jours REAL NOT NULL,
    inserted_at TEXT DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS lean_action (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date_ouverture TEXT NOT NULL DEFAULT CURRENT_DATE,
    date_cloture_prevue TEXT,
    probleme TEXT NOT NULL,
    owner TEXT NOT NULL,
    statut TEXT NOT NULL DEFAULT 'Ouvert' CHECK (statut IN ('Ouvert', 'Clôturé')),
    notes TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS meeting_summary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    meeting_date TEXT NOT NULL DEFAULT CURRENT_DATE,
    productivite_globale REAL,
    total_heures REAL,
    total_facturable REAL,
    actions_ouvertes INTEGER DEFAULT 0,
    actions_critiques INTEGER DEFAULT 0,
    notes_discussion TEXT,
    markdown_content TEXT,
    created_by TEXT NOT NULL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);
"#;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

type Result<T> = std::result::Result<T, StoreError>;

/// One aggregated pointage row (1 line per technician per day).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointageRow {
    pub jour: NaiveDate,
    pub technicien: String,
    pub equipe: String,
    pub facturable: f64,
    pub heures_total: f64,
    pub or_numero: Option<String>,
}

impl PointageRow {
    /// Rebuilds loader-shaped entries from persisted rows. The store only
    /// keeps billable and total hours, so both worked and total carry
    /// `heures_total` and the technician name doubles as the identifier.
    pub fn to_entry(&self) -> TimesheetEntry {
        TimesheetEntry {
            salarie_id: self.technicien.clone(),
            salarie_nom: self.technicien.clone(),
            equipe: self.equipe.clone(),
            date: self.jour,
            heures_facturables: self.facturable,
            heures_non_facturables: 0.0,
            heures_allouees: 0.0,
            heures_travaillees: self.heures_total,
            heures_totales: self.heures_total,
            or_numero: self.or_numero.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeanAction {
    pub id: i64,
    pub date_ouverture: NaiveDate,
    pub date_cloture_prevue: Option<NaiveDate>,
    pub probleme: String,
    pub owner: String,
    pub statut: String,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeanActionInput {
    pub probleme: Option<String>,
    pub owner: Option<String>,
    pub date_ouverture: Option<NaiveDate>,
    pub date_cloture_prevue: Option<NaiveDate>,
    pub statut: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingSummaryRow {
    pub id: i64,
    pub meeting_date: NaiveDate,
    pub productivite_globale: f64,
    pub total_heures: f64,
    pub total_facturable: f64,
    pub actions_ouvertes: i64,
    pub actions_critiques: i64,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingSummaryDetail {
    #[serde(flatten)]
    pub row: MeetingSummaryRow,
    pub notes_discussion: String,
    pub markdown: String,
}

fn date_param(d: NaiveDate) -> Value {
    Value::Text(d.format("%Y-%m-%d").to_string())
}

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn conn(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Creates the tables on startup (and after a wiped database file).
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        info!("Database schema ensured at {}", self.path.display());
        Ok(())
    }

    // --- pointage -------------------------------------------------------

    pub fn upsert_pointage(&self, rows: &[PointageRow]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO pointage (jour, technicien, equipe, facturable, heures_total, or_numero)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (technicien, jour) DO UPDATE SET
                     equipe = excluded.equipe,
                     facturable = excluded.facturable,
                     heures_total = excluded.heures_total,
                     or_numero = excluded.or_numero,
                     inserted_at = CURRENT_TIMESTAMP",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.jour,
                    row.technicien,
                    row.equipe,
                    row.facturable,
                    row.heures_total,
                    row.or_numero,
                ])?;
            }
        }
        tx.commit()?;
        info!("Upserted {} pointage rows", rows.len());
        Ok(rows.len())
    }

    pub fn load_pointage(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        team: Option<&str>,
    ) -> Result<Vec<PointageRow>> {
        let conn = self.conn()?;
        let mut sql = String::from(
            "SELECT jour, technicien, equipe, facturable, heures_total, or_numero FROM pointage",
        );
        let mut conditions = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(start) = start {
            values.push(date_param(start));
            conditions.push(format!("jour >= ?{}", values.len()));
        }
        if let Some(end) = end {
            values.push(date_param(end));
            conditions.push(format!("jour <= ?{}", values.len()));
        }
        if let Some(team) = team {
            values.push(Value::Text(team.to_string()));
            conditions.push(format!("equipe = ?{}", values.len()));
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY jour ASC, technicien ASC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(PointageRow {
                    jour: row.get(0)?,
                    technicien: row.get(1)?,
                    equipe: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    facturable: row.get(3)?,
                    heures_total: row.get(4)?,
                    or_numero: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The technician (and their team) with the most hours booked on a work
    /// order, used to attribute inspection lines.
    pub fn technician_for_order(
        &self,
        or_segment: &str,
    ) -> Result<Option<(String, Option<String>)>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT technicien, equipe, SUM(heures_total) AS total_heures
                 FROM pointage
                 WHERE or_numero = ?1 OR or_numero LIKE ?2
                 GROUP BY technicien, equipe
                 ORDER BY total_heures DESC
                 LIMIT 1",
                params![or_segment, format!("%{}%", or_segment)],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;
        Ok(found)
    }

    // --- inspection -----------------------------------------------------

    pub fn upsert_inspections(&self, records: &[InspectionRecord]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO inspection_record
                     (sn, or_segment, type_materiel, atelier, date_facture, is_inspected, technicien, equipe)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (sn, date_facture) DO UPDATE SET
                     or_segment = excluded.or_segment,
                     type_materiel = excluded.type_materiel,
                     atelier = excluded.atelier,
                     is_inspected = excluded.is_inspected,
                     technicien = excluded.technicien,
                     equipe = excluded.equipe,
                     inserted_at = CURRENT_TIMESTAMP",
            )?;
            for r in records {
                stmt.execute(params![
                    r.sn,
                    r.or_segment,
                    r.type_materiel,
                    r.atelier,
                    r.date_facture,
                    if r.is_inspected { INSPECTED } else { NOT_INSPECTED },
                    r.technicien,
                    r.equipe,
                ])?;
            }
        }
        tx.commit()?;
        info!("Upserted {} inspection records", records.len());
        Ok(records.len())
    }

    pub fn load_inspections(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        team: Option<&str>,
    ) -> Result<Vec<InspectionRecord>> {
        let conn = self.conn()?;
        let mut sql = String::from(
            "SELECT sn, or_segment, type_materiel, atelier, date_facture, is_inspected, technicien, equipe
             FROM inspection_record",
        );
        let mut conditions = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let (Some(start), Some(end)) = (start, end) {
            values.push(date_param(start));
            conditions.push(format!("date_facture >= ?{}", values.len()));
            values.push(date_param(end));
            conditions.push(format!("date_facture <= ?{}", values.len()));
        }
        if let Some(team) = team {
            values.push(Value::Text(format!("%{}%", team)));
            conditions.push(format!("equipe LIKE ?{}", values.len()));
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY date_facture DESC, sn ASC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(InspectionRecord {
                    sn: row.get(0)?,
                    or_segment: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    type_materiel: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    atelier: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    date_facture: row.get(4)?,
                    is_inspected: row.get::<_, String>(5)? == INSPECTED,
                    technicien: row.get(6)?,
                    equipe: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Distinct (year, quarter) pairs present in the inspection data,
    /// newest first.
    pub fn inspection_quarters(&self) -> Result<Vec<(i32, u32)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT date_facture FROM inspection_record")?;
        let dates = stmt
            .query_map([], |row| row.get::<_, NaiveDate>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut quarters: Vec<(i32, u32)> = dates
            .into_iter()
            .map(|d| (chrono::Datelike::year(&d), quarter_of(d)))
            .collect();
        quarters.sort_unstable();
        quarters.dedup();
        quarters.reverse();
        Ok(quarters)
    }

    pub fn inspection_teams(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT equipe FROM inspection_record
             WHERE equipe IS NOT NULL AND equipe != ''
             ORDER BY equipe ASC",
        )?;
        let teams = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    // --- llti -----------------------------------------------------------

    pub fn upsert_llti(&self, records: &[LltiRecord]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO llti_record
                     (or_segment, numero_facture, date_facture, date_pointage,
                      client, sn_equipement, constructeur, llti_jours)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (numero_facture) DO UPDATE SET
                     or_segment = excluded.or_segment,
                     date_facture = excluded.date_facture,
                     date_pointage = excluded.date_pointage,
                     client = excluded.client,
                     sn_equipement = excluded.sn_equipement,
                     constructeur = excluded.constructeur,
                     llti_jours = excluded.llti_jours,
                     inserted_at = CURRENT_TIMESTAMP",
            )?;
            for r in records {
                stmt.execute(params![
                    r.or_segment,
                    r.numero_facture,
                    r.date_facture,
                    r.date_pointage,
                    r.client,
                    r.sn_equipement,
                    r.constructeur,
                    r.llti_jours as f64,
                ])?;
            }
        }
        tx.commit()?;
        info!("Upserted {} llti records", records.len());
        Ok(records.len())
    }

    /// Raw invoicing rows for re-preprocessing (quarter and manufacturer
    /// filters re-apply at read time).
    pub fn load_llti(&self) -> Result<Vec<RawLltiRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT or_segment, numero_facture, date_facture, date_pointage,
                    client, sn_equipement, constructeur
             FROM llti_record
             ORDER BY date_facture DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RawLltiRow {
                    or_segment: row.get(0)?,
                    numero_facture: row.get(1)?,
                    date_facture: row.get::<_, Option<NaiveDate>>(2)?,
                    date_pointage: row.get::<_, Option<NaiveDate>>(3)?,
                    client: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    sn_equipement: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    constructeur: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // --- lean actions ---------------------------------------------------

    fn lean_action_by_id(&self, conn: &Connection, id: i64) -> Result<Option<LeanAction>> {
        let found = conn
            .query_row(
                "SELECT id, date_ouverture, date_cloture_prevue, probleme, owner, statut, notes,
                        created_at, updated_at
                 FROM lean_action WHERE id = ?1",
                params![id],
                |row| {
                    Ok(LeanAction {
                        id: row.get(0)?,
                        date_ouverture: row.get(1)?,
                        date_cloture_prevue: row.get(2)?,
                        probleme: row.get(3)?,
                        owner: row.get(4)?,
                        statut: row.get(5)?,
                        notes: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                        created_at: row.get(7)?,
                        updated_at: row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    pub fn list_lean_actions(&self) -> Result<Vec<LeanAction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, date_ouverture, date_cloture_prevue, probleme, owner, statut, notes,
                    created_at, updated_at
             FROM lean_action
             ORDER BY date_ouverture DESC, id DESC",
        )?;
        let actions = stmt
            .query_map([], |row| {
                Ok(LeanAction {
                    id: row.get(0)?,
                    date_ouverture: row.get(1)?,
                    date_cloture_prevue: row.get(2)?,
                    probleme: row.get(3)?,
                    owner: row.get(4)?,
                    statut: row.get(5)?,
                    notes: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                    created_at: row.get(7)?,
                    updated_at: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(actions)
    }

    pub fn create_lean_action(
        &self,
        probleme: &str,
        owner: &str,
        date_ouverture: Option<NaiveDate>,
        date_cloture_prevue: Option<NaiveDate>,
        statut: &str,
        notes: &str,
    ) -> Result<LeanAction> {
        let conn = self.conn()?;
        match date_ouverture {
            Some(opened) => conn.execute(
                "INSERT INTO lean_action
                     (date_ouverture, date_cloture_prevue, probleme, owner, statut, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![opened, date_cloture_prevue, probleme, owner, statut, notes],
            )?,
            None => conn.execute(
                "INSERT INTO lean_action
                     (date_cloture_prevue, probleme, owner, statut, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![date_cloture_prevue, probleme, owner, statut, notes],
            )?,
        };
        let id = conn.last_insert_rowid();
        self.lean_action_by_id(&conn, id)?
            .ok_or(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn update_lean_action(
        &self,
        id: i64,
        patch: &LeanActionInput,
    ) -> Result<Option<LeanAction>> {
        let conn = self.conn()?;
        let mut sets = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(probleme) = &patch.probleme {
            values.push(Value::Text(probleme.trim().to_string()));
            sets.push(format!("probleme = ?{}", values.len()));
        }
        if let Some(owner) = &patch.owner {
            values.push(Value::Text(owner.trim().to_string()));
            sets.push(format!("owner = ?{}", values.len()));
        }
        if let Some(date) = patch.date_cloture_prevue {
            values.push(date_param(date));
            sets.push(format!("date_cloture_prevue = ?{}", values.len()));
        }
        if let Some(statut) = &patch.statut {
            if statut == "Ouvert" || statut == "Clôturé" {
                values.push(Value::Text(statut.clone()));
                sets.push(format!("statut = ?{}", values.len()));
            }
        }
        if let Some(notes) = &patch.notes {
            values.push(Value::Text(notes.trim().to_string()));
            sets.push(format!("notes = ?{}", values.len()));
        }
        if sets.is_empty() {
            return Ok(None);
        }
        sets.push("updated_at = CURRENT_TIMESTAMP".to_string());
        values.push(Value::Integer(id));
        let sql = format!(
            "UPDATE lean_action SET {} WHERE id = ?{}",
            sets.join(", "),
            values.len()
        );
        let changed = conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Ok(None);
        }
        self.lean_action_by_id(&conn, id)
    }

    pub fn delete_lean_action(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM lean_action WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// (open actions, open actions past their planned close date).
    pub fn open_action_counts(&self, today: NaiveDate) -> Result<(i64, i64)> {
        let conn = self.conn()?;
        let counts = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN date_cloture_prevue IS NOT NULL
                                       AND date_cloture_prevue < ?1 THEN 1 ELSE 0 END), 0)
             FROM lean_action
             WHERE statut = 'Ouvert'",
            params![today],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(counts)
    }

    // --- meeting summaries ----------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn insert_meeting_summary(
        &self,
        meeting_date: NaiveDate,
        productivite_globale: f64,
        total_heures: f64,
        total_facturable: f64,
        actions_ouvertes: i64,
        actions_critiques: i64,
        notes_discussion: &str,
        markdown: &str,
        created_by: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO meeting_summary
                 (meeting_date, productivite_globale, total_heures, total_facturable,
                  actions_ouvertes, actions_critiques, notes_discussion, markdown_content, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                meeting_date,
                productivite_globale,
                total_heures,
                total_facturable,
                actions_ouvertes,
                actions_critiques,
                notes_discussion,
                markdown,
                created_by,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_meeting_summaries(&self) -> Result<Vec<MeetingSummaryRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, meeting_date, productivite_globale, total_heures, total_facturable,
                    actions_ouvertes, actions_critiques, created_by, created_at
             FROM meeting_summary
             ORDER BY meeting_date DESC, created_at DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MeetingSummaryRow {
                    id: row.get(0)?,
                    meeting_date: row.get(1)?,
                    productivite_globale: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                    total_heures: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                    total_facturable: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                    actions_ouvertes: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                    actions_critiques: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
                    created_by: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_meeting_summary(&self, id: i64) -> Result<Option<MeetingSummaryDetail>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT id, meeting_date, productivite_globale, total_heures, total_facturable,
                        actions_ouvertes, actions_critiques, created_by, created_at,
                        notes_discussion, markdown_content
                 FROM meeting_summary WHERE id = ?1",
                params![id],
                |row| {
                    Ok(MeetingSummaryDetail {
                        row: MeetingSummaryRow {
                            id: row.get(0)?,
                            meeting_date: row.get(1)?,
                            productivite_globale: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                            total_heures: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                            total_facturable: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                            actions_ouvertes: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                            actions_critiques: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
                            created_by: row.get(7)?,
                            created_at: row.get(8)?,
                        },
                        notes_discussion: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
                        markdown: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        Ok(found)
    }
}
