// src/snapshot.rs
//
// In-memory fallback for freshly uploaded datasets. Each slot holds an
// immutable `Arc` snapshot behind one lock and is swapped as a whole, so a
// concurrent upload and read never observe a half-written dataset.
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::ingest::{RawLltiRow, TimesheetEntry};

#[derive(Clone, Default)]
pub struct LatestUploads {
    timesheet: Arc<Mutex<Option<Arc<Vec<TimesheetEntry>>>>>,
    llti: Arc<Mutex<Option<Arc<Vec<RawLltiRow>>>>>,
}

impl LatestUploads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_timesheet(&self, entries: Vec<TimesheetEntry>) {
        info!("Latest timesheet snapshot set: {} rows", entries.len());
        *self.timesheet.lock().expect("snapshot lock poisoned") = Some(Arc::new(entries));
    }

    pub fn timesheet(&self) -> Option<Arc<Vec<TimesheetEntry>>> {
        self.timesheet.lock().expect("snapshot lock poisoned").clone()
    }

    pub fn set_llti(&self, rows: Vec<RawLltiRow>) {
        info!("Latest llti snapshot set: {} rows", rows.len());
        *self.llti.lock().expect("snapshot lock poisoned") = Some(Arc::new(rows));
    }

    pub fn llti(&self) -> Option<Arc<Vec<RawLltiRow>>> {
        self.llti.lock().expect("snapshot lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn swap_replaces_whole_snapshot() {
        let uploads = LatestUploads::new();
        assert!(uploads.timesheet().is_none());

        let entry = TimesheetEntry {
            salarie_id: "101".into(),
            salarie_nom: "Diop".into(),
            equipe: "Atelier A".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            heures_facturables: 6.0,
            heures_non_facturables: 2.0,
            heures_allouees: 8.0,
            heures_travaillees: 8.0,
            heures_totales: 8.0,
            or_numero: None,
        };
        uploads.set_timesheet(vec![entry.clone()]);
        let first = uploads.timesheet().unwrap();
        assert_eq!(first.len(), 1);

        uploads.set_timesheet(vec![entry.clone(), entry]);
        // the earlier snapshot is untouched, readers holding it see old data
        assert_eq!(first.len(), 1);
        assert_eq!(uploads.timesheet().unwrap().len(), 2);
    }
}
