// src/exhaustivity.rs
//
// Timesheet completeness control: classifies each employee-day against the
// expected working calendar, computes compliance rates at several
// granularities and lists anomalies in a deterministic order.
use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::periods::is_weekend;
use crate::productivity::{round2, EmployeeDay};

/// Day classification. A pure function of (total hours, weekday); weekends
/// only ever classify as Compliant (no hours) or Overtime (any hours).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    Compliant,
    Incomplete,
    Missing,
    Overtime,
}

impl DayStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "COMPLIANT" => Some(DayStatus::Compliant),
            "INCOMPLETE" => Some(DayStatus::Incomplete),
            "MISSING" => Some(DayStatus::Missing),
            "OVERTIME" => Some(DayStatus::Overtime),
            _ => None,
        }
    }

    /// Anomaly ordering: missing days are worst, overtime least severe.
    fn severity(self) -> u8 {
        match self {
            DayStatus::Missing => 1,
            DayStatus::Incomplete => 2,
            DayStatus::Overtime => 3,
            DayStatus::Compliant => 4,
        }
    }
}

/// Classifies one day from its total hours and weekday.
pub fn day_status(heures: f64, date: NaiveDate) -> DayStatus {
    if is_weekend(date) {
        if heures == 0.0 {
            DayStatus::Compliant
        } else {
            DayStatus::Overtime
        }
    } else if heures == 0.0 {
        DayStatus::Missing
    } else if heures < 8.0 {
        DayStatus::Incomplete
    } else if heures == 8.0 {
        DayStatus::Compliant
    } else {
        DayStatus::Overtime
    }
}

/// One classified employee-day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExhaustivityDay {
    pub salarie_id: String,
    pub salarie_nom: String,
    pub equipe: String,
    pub date: NaiveDate,
    pub heures_totales: f64,
    /// 0 = Monday .. 6 = Sunday
    pub jour_semaine: u32,
    pub type_jour: String,
    pub statut: DayStatus,
}

/// Aggregation level for the compliance rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateScope {
    Global,
    Team,
    Employee,
    Month,
}

impl RateScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "global" => Some(RateScope::Global),
            "team" => Some(RateScope::Team),
            "employee" => Some(RateScope::Employee),
            "month" => Some(RateScope::Month),
            _ => None,
        }
    }
}

/// One compliance-rate row; the grouping columns present depend on the
/// scope asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExhaustivityRateRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salarie_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salarie_nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annee: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mois: Option<u32>,
    pub jours_total: usize,
    pub jours_conformes: usize,
    pub jours_incomplets: usize,
    pub jours_manquants: usize,
    pub jours_heures_sup: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_salaries: Option<usize>,
    pub taux_exhaustivite_pct: f64,
}

/// An expected working day missing entirely from the data (no record at
/// all, as opposed to a 0-hour record).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingDay {
    pub salarie_id: String,
    pub salarie_nom: String,
    pub equipe: String,
    pub date: NaiveDate,
}

/// Classifies every employee-day.
pub fn check_daily(daily: &[EmployeeDay]) -> Vec<ExhaustivityDay> {
    let days: Vec<ExhaustivityDay> = daily
        .iter()
        .map(|d| {
            let weekend = is_weekend(d.date);
            ExhaustivityDay {
                salarie_id: d.salarie_id.clone(),
                salarie_nom: d.salarie_nom.clone(),
                equipe: d.equipe.clone(),
                date: d.date,
                heures_totales: d.heures_totales,
                jour_semaine: d.date.weekday().num_days_from_monday(),
                type_jour: if weekend { "weekend" } else { "ouvre" }.to_string(),
                statut: day_status(d.heures_totales, d.date),
            }
        })
        .collect();
    info!("Exhaustivity checked: {} employee-days", days.len());
    days
}

#[derive(Default)]
struct StatusCounts {
    total: usize,
    conformes: usize,
    incomplets: usize,
    manquants: usize,
    heures_sup: usize,
    salaries: BTreeSet<String>,
}

impl StatusCounts {
    fn add(&mut self, day: &ExhaustivityDay) {
        self.total += 1;
        match day.statut {
            DayStatus::Compliant => self.conformes += 1,
            DayStatus::Incomplete => self.incomplets += 1,
            DayStatus::Missing => self.manquants += 1,
            DayStatus::Overtime => self.heures_sup += 1,
        }
        self.salaries.insert(day.salarie_id.clone());
    }

    fn rate(&self) -> f64 {
        if self.total > 0 {
            round2(self.conformes as f64 / self.total as f64 * 100.0)
        } else {
            0.0
        }
    }
}

fn blank_row() -> ExhaustivityRateRow {
    ExhaustivityRateRow {
        scope: None,
        equipe: None,
        salarie_id: None,
        salarie_nom: None,
        annee: None,
        mois: None,
        jours_total: 0,
        jours_conformes: 0,
        jours_incomplets: 0,
        jours_manquants: 0,
        jours_heures_sup: 0,
        nb_salaries: None,
        taux_exhaustivite_pct: 0.0,
    }
}

fn fill_counts(mut row: ExhaustivityRateRow, counts: &StatusCounts) -> ExhaustivityRateRow {
    row.jours_total = counts.total;
    row.jours_conformes = counts.conformes;
    row.jours_incomplets = counts.incomplets;
    row.jours_manquants = counts.manquants;
    row.jours_heures_sup = counts.heures_sup;
    row.taux_exhaustivite_pct = counts.rate();
    row
}

/// Compliance rate over working (non-weekend) days at the asked granularity.
pub fn calculate_rate(days: &[ExhaustivityDay], by: RateScope) -> Vec<ExhaustivityRateRow> {
    let work: Vec<&ExhaustivityDay> = days.iter().filter(|d| d.type_jour == "ouvre").collect();

    match by {
        RateScope::Global => {
            let mut counts = StatusCounts::default();
            for d in &work {
                counts.add(d);
            }
            let mut row = fill_counts(blank_row(), &counts);
            row.scope = Some("Global".to_string());
            vec![row]
        }
        RateScope::Team => {
            let mut grouped: BTreeMap<String, StatusCounts> = BTreeMap::new();
            for d in &work {
                grouped.entry(d.equipe.clone()).or_default().add(d);
            }
            grouped
                .into_iter()
                .map(|(equipe, counts)| {
                    let mut row = fill_counts(blank_row(), &counts);
                    row.equipe = Some(equipe);
                    row.nb_salaries = Some(counts.salaries.len());
                    row
                })
                .collect()
        }
        RateScope::Employee => {
            let mut grouped: BTreeMap<(String, String, String), StatusCounts> = BTreeMap::new();
            for d in &work {
                grouped
                    .entry((d.salarie_id.clone(), d.salarie_nom.clone(), d.equipe.clone()))
                    .or_default()
                    .add(d);
            }
            grouped
                .into_iter()
                .map(|((id, nom, equipe), counts)| {
                    let mut row = fill_counts(blank_row(), &counts);
                    row.salarie_id = Some(id);
                    row.salarie_nom = Some(nom);
                    row.equipe = Some(equipe);
                    row
                })
                .collect()
        }
        RateScope::Month => {
            let mut grouped: BTreeMap<(String, i32, u32), StatusCounts> = BTreeMap::new();
            for d in &work {
                grouped
                    .entry((d.equipe.clone(), d.date.year(), d.date.month()))
                    .or_default()
                    .add(d);
            }
            grouped
                .into_iter()
                .map(|((equipe, annee, mois), counts)| {
                    let mut row = fill_counts(blank_row(), &counts);
                    row.equipe = Some(equipe);
                    row.annee = Some(annee);
                    row.mois = Some(mois);
                    row.nb_salaries = Some(counts.salaries.len());
                    row
                })
                .collect()
        }
    }
}

/// Non-compliant days, optionally restricted to the given statuses,
/// ordered by severity (Missing > Incomplete > Overtime) then date, team
/// and employee name. The ordering is part of the contract.
pub fn detect_anomalies(
    days: &[ExhaustivityDay],
    statuses: Option<&[DayStatus]>,
) -> Vec<ExhaustivityDay> {
    let wanted: Vec<DayStatus> = statuses
        .map(<[DayStatus]>::to_vec)
        .unwrap_or_else(|| vec![DayStatus::Missing, DayStatus::Incomplete, DayStatus::Overtime]);

    let mut anomalies: Vec<ExhaustivityDay> = days
        .iter()
        .filter(|d| d.statut != DayStatus::Compliant && wanted.contains(&d.statut))
        .cloned()
        .collect();
    anomalies.sort_by(|a, b| {
        a.statut
            .severity()
            .cmp(&b.statut.severity())
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.equipe.cmp(&b.equipe))
            .then_with(|| a.salarie_nom.cmp(&b.salarie_nom))
    });
    info!("Detected {} anomalies", anomalies.len());
    anomalies
}

/// Expected calendar between two dates, working days only unless weekends
/// are asked for.
pub fn expected_calendar(
    start: NaiveDate,
    end: NaiveDate,
    include_weekends: bool,
) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        if include_weekends || !is_weekend(current) {
            days.push(current);
        }
        current += Duration::days(1);
    }
    days
}

/// Expected working days with no record at all, per known employee:
/// the (calendar × employees) product minus observed employee-days.
pub fn get_missing_days(
    daily: &[EmployeeDay],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<MissingDay> {
    let calendar = expected_calendar(start, end, false);

    let mut employees: BTreeMap<String, (String, String)> = BTreeMap::new();
    let mut observed: HashSet<(String, NaiveDate)> = HashSet::new();
    for d in daily {
        employees
            .entry(d.salarie_id.clone())
            .or_insert_with(|| (d.salarie_nom.clone(), d.equipe.clone()));
        observed.insert((d.salarie_id.clone(), d.date));
    }

    let mut missing = Vec::new();
    for (id, (nom, equipe)) in &employees {
        for &date in &calendar {
            if !observed.contains(&(id.clone(), date)) {
                missing.push(MissingDay {
                    salarie_id: id.clone(),
                    salarie_nom: nom.clone(),
                    equipe: equipe.clone(),
                    date,
                });
            }
        }
    }
    info!("Found {} missing employee-days", missing.len());
    missing
}
