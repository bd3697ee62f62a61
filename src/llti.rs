// src/llti.rs
//
// Lead Time to Invoice: days between the last recorded labor on a work
// order and invoice issuance. The feed is filtered to Caterpillar
// equipment, deduplicated per invoice and bounded to the current quarter.
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::ingest::RawLltiRow;
use crate::periods::current_quarter_bounds;
use crate::productivity::round2;

// Mean lead-time thresholds (days).
pub const EXCELLENT_THRESHOLD: f64 = 7.0;
pub const ADVANCED_THRESHOLD: f64 = 17.0;
pub const EMERGING_THRESHOLD: f64 = 21.0;

const MANUFACTURER: &str = "CATERPILLAR";

/// One invoice, unique per invoice number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LltiRecord {
    pub or_segment: String,
    pub numero_facture: String,
    pub date_facture: NaiveDate,
    pub date_pointage: NaiveDate,
    pub client: String,
    pub sn_equipement: String,
    pub constructeur: String,
    pub llti_jours: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalLlti {
    pub moyenne_llti: f64,
    pub mediane_llti: f64,
    pub total_factures: usize,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientLlti {
    pub client: String,
    pub moyenne_llti: f64,
    pub total_factures: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrLlti {
    pub or_numero: String,
    pub num_facture: String,
    pub date_facture: NaiveDate,
    pub date_pointage: NaiveDate,
    pub llti_jours: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LltiDistribution {
    pub excellent: usize,
    pub advanced: usize,
    pub emerging: usize,
    pub a_ameliorer: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LltiAnalytics {
    pub global: GlobalLlti,
    pub by_client: Vec<ClientLlti>,
    pub by_or: Vec<OrLlti>,
    pub distribution: LltiDistribution,
}

/// Prepares the invoicing feed:
/// Caterpillar equipment only, both dates present, invoice date inside the
/// quarter containing `today`, one row per invoice keeping the latest
/// last-labor date, negative lead times dropped as data errors.
pub fn preprocess(rows: &[RawLltiRow], today: NaiveDate) -> Vec<LltiRecord> {
    let (quarter_start, _) = current_quarter_bounds(today);

    let mut filtered: Vec<(&RawLltiRow, NaiveDate, NaiveDate)> = rows
        .iter()
        .filter(|r| r.constructeur.trim().to_uppercase() == MANUFACTURER)
        .filter_map(|r| match (r.date_facture, r.date_pointage) {
            (Some(f), Some(p)) => Some((r, f, p)),
            _ => None,
        })
        .filter(|(_, facture, _)| *facture >= quarter_start)
        .filter(|(r, _, _)| !r.numero_facture.is_empty())
        .collect();

    // Latest last-labor date wins per invoice.
    filtered.sort_by_key(|(_, _, pointage)| *pointage);
    let mut by_invoice: BTreeMap<String, (&RawLltiRow, NaiveDate, NaiveDate)> = BTreeMap::new();
    for (row, facture, pointage) in filtered {
        by_invoice.insert(row.numero_facture.clone(), (row, facture, pointage));
    }

    let records: Vec<LltiRecord> = by_invoice
        .into_values()
        .filter_map(|(row, facture, pointage)| {
            let jours = (facture - pointage).num_days();
            if jours < 0 {
                return None;
            }
            Some(LltiRecord {
                or_segment: row.or_segment.clone(),
                numero_facture: row.numero_facture.clone(),
                date_facture: facture,
                date_pointage: pointage,
                client: row.client.clone(),
                sn_equipement: row.sn_equipement.clone(),
                constructeur: row.constructeur.clone(),
                llti_jours: jours,
            })
        })
        .collect();
    info!("LLTI preprocessing kept {} invoices", records.len());
    records
}

fn status_for_mean(moyenne: f64) -> String {
    if moyenne < EXCELLENT_THRESHOLD {
        "Excellent"
    } else if moyenne < ADVANCED_THRESHOLD {
        "Advanced"
    } else if moyenne <= EMERGING_THRESHOLD {
        "Emerging"
    } else {
        "À améliorer"
    }
    .to_string()
}

fn median(sorted: &[i64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2] as f64
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
    }
}

/// Global lead-time KPI: mean (1 decimal), median (whole days), unique
/// invoice count and the categorical status of the mean.
pub fn calculate_global(records: &[LltiRecord]) -> GlobalLlti {
    if records.is_empty() {
        return GlobalLlti {
            moyenne_llti: 0.0,
            mediane_llti: 0.0,
            total_factures: 0,
            status: "N/A".to_string(),
        };
    }
    let mut days: Vec<i64> = records.iter().map(|r| r.llti_jours).collect();
    days.sort_unstable();
    let moyenne = days.iter().sum::<i64>() as f64 / days.len() as f64;
    let mediane = median(&days);

    GlobalLlti {
        moyenne_llti: (moyenne * 10.0).round() / 10.0,
        mediane_llti: mediane.round(),
        total_factures: records.len(),
        status: status_for_mean(moyenne),
    }
}

/// Mean lead time per client, sorted fastest first.
pub fn calculate_by_client(records: &[LltiRecord]) -> Vec<ClientLlti> {
    let mut grouped: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    for r in records {
        let entry = grouped.entry(r.client.clone()).or_insert((0, 0));
        entry.0 += r.llti_jours;
        entry.1 += 1;
    }
    let mut by_client: Vec<ClientLlti> = grouped
        .into_iter()
        .map(|(client, (sum, count))| ClientLlti {
            client,
            moyenne_llti: round2(sum as f64 / count as f64),
            total_factures: count,
        })
        .collect();
    by_client.sort_by(|a, b| {
        a.moyenne_llti
            .partial_cmp(&b.moyenne_llti)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.client.cmp(&b.client))
    });
    by_client
}

/// Per-order detail, slowest invoices first.
pub fn calculate_by_or(records: &[LltiRecord]) -> Vec<OrLlti> {
    let mut by_or: Vec<OrLlti> = records
        .iter()
        .map(|r| OrLlti {
            or_numero: r.or_segment.clone(),
            num_facture: r.numero_facture.clone(),
            date_facture: r.date_facture,
            date_pointage: r.date_pointage,
            llti_jours: r.llti_jours,
        })
        .collect();
    by_or.sort_by(|a, b| {
        b.llti_jours
            .cmp(&a.llti_jours)
            .then_with(|| a.num_facture.cmp(&b.num_facture))
    });
    by_or
}

/// Invoice counts per lead-time bucket.
pub fn calculate_distribution(records: &[LltiRecord]) -> LltiDistribution {
    let mut dist = LltiDistribution {
        excellent: 0,
        advanced: 0,
        emerging: 0,
        a_ameliorer: 0,
    };
    for r in records {
        let d = r.llti_jours as f64;
        if d < EXCELLENT_THRESHOLD {
            dist.excellent += 1;
        } else if d < ADVANCED_THRESHOLD {
            dist.advanced += 1;
        } else if d <= EMERGING_THRESHOLD {
            dist.emerging += 1;
        } else {
            dist.a_ameliorer += 1;
        }
    }
    dist
}

pub fn calculate_analytics(records: &[LltiRecord]) -> LltiAnalytics {
    LltiAnalytics {
        global: calculate_global(records),
        by_client: calculate_by_client(records),
        by_or: calculate_by_or(records),
        distribution: calculate_distribution(records),
    }
}
