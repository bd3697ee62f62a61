// src/productivity.rs
//
// Productivity aggregation: daily / weekly / monthly / rolling-12-month
// ratios per employee, team rollups and the monthly correlation driver.
//
// Every ratio is re-derived from summed hours (billable / worked), never
// from averaged daily ratios, and is 0 when worked hours are 0.
use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::ingest::TimesheetEntry;

/// Round to 2 decimals, the precision every percentage is reported at.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// billable / worked × 100, guarded against empty denominators.
pub fn productivity_pct(facturable: f64, travaillees: f64) -> f64 {
    if travaillees > 0.0 {
        round2(facturable / travaillees * 100.0)
    } else {
        0.0
    }
}

/// One employee-day, unique per (employee, date). Derived from raw entries,
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeDay {
    pub salarie_id: String,
    pub salarie_nom: String,
    pub equipe: String,
    pub date: NaiveDate,
    pub heures_facturables: f64,
    pub heures_non_facturables: f64,
    pub heures_allouees: f64,
    pub heures_travaillees: f64,
    pub heures_totales: f64,
    pub productivite_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyProductivity {
    pub salarie_id: String,
    pub salarie_nom: String,
    pub equipe: String,
    pub annee: i32,
    pub numero_semaine: u32,
    pub semaine_debut: NaiveDate,
    pub heures_facturables: f64,
    pub heures_travaillees: f64,
    pub productivite_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProductivity {
    pub salarie_id: String,
    pub salarie_nom: String,
    pub equipe: String,
    pub annee: i32,
    pub mois: u32,
    pub heures_facturables: f64,
    pub heures_travaillees: f64,
    pub productivite_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rolling12Productivity {
    pub salarie_id: String,
    pub salarie_nom: String,
    pub equipe: String,
    pub date_reference: NaiveDate,
    pub heures_facturables_r12: f64,
    pub heures_travaillees_r12: f64,
    pub productivite_r12_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl TeamPeriod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(TeamPeriod::Daily),
            "weekly" => Some(TeamPeriod::Weekly),
            "monthly" => Some(TeamPeriod::Monthly),
            _ => None,
        }
    }
}

/// Team rollup; the period columns present depend on the aggregation asked
/// for, mirroring the shape the dashboard expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamProductivity {
    pub equipe: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annee: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_semaine: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mois: Option<u32>,
    pub heures_facturables: f64,
    pub heures_travaillees: f64,
    pub nb_salaries: usize,
    pub productivite_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationDriver {
    pub equipe: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalProductivity {
    pub heures_facturables: f64,
    pub heures_travaillees: f64,
    pub productivite_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamTotals {
    pub equipe: String,
    pub heures_facturables: f64,
    pub heures_travaillees: f64,
    pub productivite_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyGlobalPoint {
    pub annee: i32,
    pub mois: u32,
    pub heures_facturables: f64,
    pub heures_travaillees: f64,
    pub productivite_pct: f64,
}

/// The analytics block served to the dashboard: global totals, per-team
/// totals, the global monthly series and the correlation driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivityAnalytics {
    pub global: GlobalProductivity,
    pub by_team: Vec<TeamTotals>,
    pub monthly: Vec<MonthlyGlobalPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<CorrelationDriver>,
    pub total_rows: usize,
}

/// Groups raw entries into employee-days, summing each hour category.
pub fn calculate_daily(entries: &[TimesheetEntry]) -> Vec<EmployeeDay> {
    let mut grouped: BTreeMap<(String, String, String, NaiveDate), [f64; 5]> = BTreeMap::new();
    for e in entries {
        let sums = grouped
            .entry((
                e.salarie_id.clone(),
                e.salarie_nom.clone(),
                e.equipe.clone(),
                e.date,
            ))
            .or_insert([0.0; 5]);
        sums[0] += e.heures_facturables;
        sums[1] += e.heures_non_facturables;
        sums[2] += e.heures_allouees;
        sums[3] += e.heures_travaillees;
        sums[4] += e.heures_totales;
    }
    let days: Vec<EmployeeDay> = grouped
        .into_iter()
        .map(|((salarie_id, salarie_nom, equipe, date), sums)| EmployeeDay {
            salarie_id,
            salarie_nom,
            equipe,
            date,
            heures_facturables: sums[0],
            heures_non_facturables: sums[1],
            heures_allouees: sums[2],
            heures_travaillees: sums[3],
            heures_totales: sums[4],
            productivite_pct: productivity_pct(sums[0], sums[3]),
        })
        .collect();
    info!("Daily productivity calculated: {} employee-days", days.len());
    days
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Weekly rollup per employee (ISO week), ratio re-derived from summed hours.
pub fn calculate_weekly(daily: &[EmployeeDay]) -> Vec<WeeklyProductivity> {
    let mut grouped: BTreeMap<(String, String, String, i32, u32, NaiveDate), (f64, f64)> =
        BTreeMap::new();
    for d in daily {
        let iso = d.date.iso_week();
        let entry = grouped
            .entry((
                d.salarie_id.clone(),
                d.salarie_nom.clone(),
                d.equipe.clone(),
                iso.year(),
                iso.week(),
                week_start(d.date),
            ))
            .or_insert((0.0, 0.0));
        entry.0 += d.heures_facturables;
        entry.1 += d.heures_travaillees;
    }
    grouped
        .into_iter()
        .map(
            |((salarie_id, salarie_nom, equipe, annee, numero_semaine, semaine_debut), (f, t))| {
                WeeklyProductivity {
                    salarie_id,
                    salarie_nom,
                    equipe,
                    annee,
                    numero_semaine,
                    semaine_debut,
                    heures_facturables: f,
                    heures_travaillees: t,
                    productivite_pct: productivity_pct(f, t),
                }
            },
        )
        .collect()
}

/// Monthly rollup per employee.
pub fn calculate_monthly(daily: &[EmployeeDay]) -> Vec<MonthlyProductivity> {
    let mut grouped: BTreeMap<(String, String, String, i32, u32), (f64, f64)> = BTreeMap::new();
    for d in daily {
        let entry = grouped
            .entry((
                d.salarie_id.clone(),
                d.salarie_nom.clone(),
                d.equipe.clone(),
                d.date.year(),
                d.date.month(),
            ))
            .or_insert((0.0, 0.0));
        entry.0 += d.heures_facturables;
        entry.1 += d.heures_travaillees;
    }
    grouped
        .into_iter()
        .map(|((salarie_id, salarie_nom, equipe, annee, mois), (f, t))| MonthlyProductivity {
            salarie_id,
            salarie_nom,
            equipe,
            annee,
            mois,
            heures_facturables: f,
            heures_travaillees: t,
            productivite_pct: productivity_pct(f, t),
        })
        .collect()
}

/// Trailing-12-month rollup per employee × observed date.
///
/// Scans the full window for every (employee, date) pair; quadratic in the
/// number of observed dates, intended for monthly batch use, not streaming.
pub fn calculate_rolling12(daily: &[EmployeeDay]) -> Vec<Rolling12Productivity> {
    let mut employees: BTreeMap<String, (String, String)> = BTreeMap::new();
    let mut all_dates: BTreeSet<NaiveDate> = BTreeSet::new();
    for d in daily {
        employees
            .entry(d.salarie_id.clone())
            .or_insert_with(|| (d.salarie_nom.clone(), d.equipe.clone()));
        all_dates.insert(d.date);
    }

    let mut results = Vec::new();
    for (salarie_id, (salarie_nom, equipe)) in &employees {
        let emp_days: Vec<&EmployeeDay> =
            daily.iter().filter(|d| &d.salarie_id == salarie_id).collect();
        for &date in &all_dates {
            let start = date
                .checked_sub_months(Months::new(12))
                .unwrap_or(NaiveDate::MIN);
            let (mut fact, mut trav, mut n) = (0.0, 0.0, 0usize);
            for d in &emp_days {
                if d.date >= start && d.date <= date {
                    fact += d.heures_facturables;
                    trav += d.heures_travaillees;
                    n += 1;
                }
            }
            if n == 0 {
                continue; // employee has no data in this window
            }
            results.push(Rolling12Productivity {
                salarie_id: salarie_id.clone(),
                salarie_nom: salarie_nom.clone(),
                equipe: equipe.clone(),
                date_reference: date,
                heures_facturables_r12: fact,
                heures_travaillees_r12: trav,
                productivite_r12_pct: productivity_pct(fact, trav),
            });
        }
    }
    info!("Rolling 12-month productivity calculated: {} records", results.len());
    results
}

/// Team rollup by period, with the distinct-employee count carried along.
pub fn calculate_team(daily: &[EmployeeDay], period: TeamPeriod) -> Vec<TeamProductivity> {
    type Key = (String, Option<NaiveDate>, Option<i32>, Option<u32>, Option<u32>);
    let mut grouped: BTreeMap<Key, (f64, f64, BTreeSet<String>)> = BTreeMap::new();
    for d in daily {
        let key: Key = match period {
            TeamPeriod::Daily => (d.equipe.clone(), Some(d.date), None, None, None),
            TeamPeriod::Weekly => {
                let iso = d.date.iso_week();
                (
                    d.equipe.clone(),
                    None,
                    Some(iso.year()),
                    Some(iso.week()),
                    None,
                )
            }
            TeamPeriod::Monthly => (
                d.equipe.clone(),
                None,
                Some(d.date.year()),
                None,
                Some(d.date.month()),
            ),
        };
        let entry = grouped.entry(key).or_insert((0.0, 0.0, BTreeSet::new()));
        entry.0 += d.heures_facturables;
        entry.1 += d.heures_travaillees;
        entry.2.insert(d.salarie_id.clone());
    }
    grouped
        .into_iter()
        .map(
            |((equipe, date, annee, numero_semaine, mois), (f, t, ids))| TeamProductivity {
                equipe,
                date,
                annee,
                numero_semaine,
                mois,
                heures_facturables: f,
                heures_travaillees: t,
                nb_salaries: ids.len(),
                productivite_pct: productivity_pct(f, t),
            },
        )
        .collect()
}

/// Pearson correlation; `None` with fewer than two points or a degenerate
/// (zero-variance) series.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some(cov / denom)
}

fn monthly_ratio_series(daily: &[EmployeeDay]) -> BTreeMap<(i32, u32), f64> {
    let mut sums: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for d in daily {
        let entry = sums
            .entry((d.date.year(), d.date.month()))
            .or_insert((0.0, 0.0));
        entry.0 += d.heures_facturables;
        entry.1 += d.heures_travaillees;
    }
    sums.into_iter()
        .map(|(k, (f, t))| (k, if t > 0.0 { f / t } else { 0.0 }))
        .collect()
}

/// The team whose monthly ratio series correlates most with the global
/// series. Teams with fewer than two overlapping months are excluded.
pub fn correlation_driver(daily: &[EmployeeDay]) -> Option<CorrelationDriver> {
    if daily.is_empty() {
        return None;
    }
    let global = monthly_ratio_series(daily);

    let teams: BTreeSet<String> = daily
        .iter()
        .map(|d| d.equipe.clone())
        .filter(|e| !e.is_empty())
        .collect();

    let mut best: Option<CorrelationDriver> = None;
    for equipe in teams {
        let team_days: Vec<EmployeeDay> = daily
            .iter()
            .filter(|d| d.equipe == equipe)
            .cloned()
            .collect();
        let team_series = monthly_ratio_series(&team_days);

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (month, team_ratio) in &team_series {
            if let Some(global_ratio) = global.get(month) {
                xs.push(*global_ratio);
                ys.push(*team_ratio);
            }
        }
        let Some(score) = pearson(&xs, &ys) else {
            continue;
        };
        match &best {
            Some(b) if b.score >= score => {}
            _ => best = Some(CorrelationDriver { equipe, score }),
        }
    }
    best
}

/// Assembles the dashboard analytics block from raw entries.
pub fn calculate_analytics(entries: &[TimesheetEntry]) -> ProductivityAnalytics {
    let daily = calculate_daily(entries);

    let total_fact: f64 = daily.iter().map(|d| d.heures_facturables).sum();
    let total_trav: f64 = daily.iter().map(|d| d.heures_travaillees).sum();

    let mut by_team_sums: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for d in &daily {
        let entry = by_team_sums.entry(d.equipe.clone()).or_insert((0.0, 0.0));
        entry.0 += d.heures_facturables;
        entry.1 += d.heures_travaillees;
    }
    let mut by_team: Vec<TeamTotals> = by_team_sums
        .into_iter()
        .map(|(equipe, (f, t))| TeamTotals {
            equipe,
            heures_facturables: f,
            heures_travaillees: t,
            productivite_pct: productivity_pct(f, t),
        })
        .collect();
    by_team.sort_by(|a, b| {
        b.productivite_pct
            .partial_cmp(&a.productivite_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.equipe.cmp(&b.equipe))
    });

    let mut monthly_sums: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for d in &daily {
        let entry = monthly_sums
            .entry((d.date.year(), d.date.month()))
            .or_insert((0.0, 0.0));
        entry.0 += d.heures_facturables;
        entry.1 += d.heures_travaillees;
    }
    let monthly = monthly_sums
        .into_iter()
        .map(|((annee, mois), (f, t))| MonthlyGlobalPoint {
            annee,
            mois,
            heures_facturables: f,
            heures_travaillees: t,
            productivite_pct: productivity_pct(f, t),
        })
        .collect();

    ProductivityAnalytics {
        global: GlobalProductivity {
            heures_facturables: total_fact,
            heures_travaillees: total_trav,
            productivite_pct: productivity_pct(total_fact, total_trav),
        },
        by_team,
        monthly,
        driver: correlation_driver(&daily),
        total_rows: entries.len(),
    }
}
