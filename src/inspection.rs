// src/inspection.rs
//
// Inspection-rate analytics. The rate is order-based: several inspection
// lines can share a work order, and an order counts as inspected as soon as
// any of its lines is flagged. Breakdowns reuse the same order-level dedup.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::productivity::round2;

/// One inspection line, unique per (serial number, invoice date).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionRecord {
    pub sn: String,
    pub or_segment: String,
    pub type_materiel: String,
    pub atelier: String,
    pub date_facture: NaiveDate,
    pub is_inspected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technicien: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipe: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionRateSummary {
    pub total: usize,
    pub inspected: usize,
    pub not_inspected: usize,
    pub inspection_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionRate {
    pub label: String,
    pub total: usize,
    pub inspected: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicianRate {
    pub technicien: String,
    pub equipe: String,
    pub total_or: usize,
    pub inspected_or: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionAnalytics {
    pub total: usize,
    pub inspected: usize,
    pub not_inspected: usize,
    pub total_lines: usize,
    pub inspected_lines: usize,
    pub not_inspected_lines: usize,
    pub inspection_rate: f64,
    pub delta_weekly: f64,
    pub inspection_rate_last_wednesday: f64,
    pub by_atelier: Vec<DimensionRate>,
    pub by_type_materiel: Vec<DimensionRate>,
    pub by_technicien: Vec<TechnicianRate>,
    pub records: Vec<InspectionRecord>,
}

/// Lines with a usable work-order segment; the rate only counts orders.
fn with_order(records: &[InspectionRecord]) -> impl Iterator<Item = &InspectionRecord> {
    records.iter().filter(|r| !r.or_segment.trim().is_empty())
}

/// Order-based inspection rate: dedup lines per order, an order is
/// inspected when any of its lines is.
pub fn calculate_rate(records: &[InspectionRecord]) -> InspectionRateSummary {
    let mut orders: BTreeMap<&str, bool> = BTreeMap::new();
    for r in with_order(records) {
        let inspected = orders.entry(r.or_segment.as_str()).or_insert(false);
        *inspected = *inspected || r.is_inspected;
    }
    let total = orders.len();
    let inspected = orders.values().filter(|&&v| v).count();
    InspectionRateSummary {
        total,
        inspected,
        not_inspected: total - inspected,
        inspection_rate: if total > 0 {
            round2(inspected as f64 / total as f64 * 100.0)
        } else {
            0.0
        },
    }
}

/// Order-deduped rate per dimension (workshop or equipment type).
fn rate_by_dimension<F>(records: &[InspectionRecord], dim: F) -> Vec<DimensionRate>
where
    F: Fn(&InspectionRecord) -> &str,
{
    // (dimension, order) -> any line inspected
    let mut orders: BTreeMap<(String, String), bool> = BTreeMap::new();
    for r in with_order(records) {
        let label = dim(r).trim();
        if label.is_empty() {
            continue;
        }
        let inspected = orders
            .entry((label.to_string(), r.or_segment.clone()))
            .or_insert(false);
        *inspected = *inspected || r.is_inspected;
    }

    let mut grouped: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for ((label, _), inspected) in orders {
        let entry = grouped.entry(label).or_insert((0, 0));
        entry.0 += 1;
        if inspected {
            entry.1 += 1;
        }
    }
    grouped
        .into_iter()
        .map(|(label, (total, inspected))| DimensionRate {
            label,
            total,
            inspected,
            rate: round2(inspected as f64 / total as f64 * 100.0),
        })
        .collect()
}

/// Order-deduped rate per technician, sorted by rate descending.
pub fn rate_by_technician(records: &[InspectionRecord]) -> Vec<TechnicianRate> {
    let mut orders: BTreeMap<(String, String), (bool, String)> = BTreeMap::new();
    for r in with_order(records) {
        let Some(technicien) = r.technicien.as_deref().map(str::trim).filter(|t| !t.is_empty())
        else {
            continue;
        };
        let entry = orders
            .entry((technicien.to_string(), r.or_segment.clone()))
            .or_insert((false, r.equipe.clone().unwrap_or_default()));
        entry.0 = entry.0 || r.is_inspected;
    }

    let mut grouped: BTreeMap<String, (usize, usize, String)> = BTreeMap::new();
    for ((technicien, _), (inspected, equipe)) in orders {
        let entry = grouped.entry(technicien).or_insert((0, 0, equipe));
        entry.0 += 1;
        if inspected {
            entry.1 += 1;
        }
    }
    let mut stats: Vec<TechnicianRate> = grouped
        .into_iter()
        .map(|(technicien, (total_or, inspected_or, equipe))| TechnicianRate {
            technicien,
            equipe,
            total_or,
            inspected_or,
            rate: round2(inspected_or as f64 / total_or as f64 * 100.0),
        })
        .collect();
    stats.sort_by(|a, b| {
        b.rate
            .partial_cmp(&a.rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.technicien.cmp(&b.technicien))
    });
    stats
}

/// Full analytics block. `last` carries the records of the
/// [window-start, most-recent-Wednesday] slice used for the weekly delta.
pub fn calculate_analytics(
    records: &[InspectionRecord],
    last: Option<&[InspectionRecord]>,
) -> InspectionAnalytics {
    let rate = calculate_rate(records);

    let (delta_weekly, rate_last_wednesday) = match last {
        Some(last) if !last.is_empty() => {
            let last_rate = calculate_rate(last);
            (
                round2(rate.inspection_rate - last_rate.inspection_rate),
                last_rate.inspection_rate,
            )
        }
        _ => (0.0, 0.0),
    };

    let total_lines = records.len();
    let inspected_lines = records.iter().filter(|r| r.is_inspected).count();

    let analytics = InspectionAnalytics {
        total: rate.total,
        inspected: rate.inspected,
        not_inspected: rate.not_inspected,
        total_lines,
        inspected_lines,
        not_inspected_lines: total_lines - inspected_lines,
        inspection_rate: rate.inspection_rate,
        delta_weekly,
        inspection_rate_last_wednesday: rate_last_wednesday,
        by_atelier: rate_by_dimension(records, |r| &r.atelier),
        by_type_materiel: rate_by_dimension(records, |r| &r.type_materiel),
        by_technicien: rate_by_technician(records),
        records: records.iter().take(100).cloned().collect(),
    };
    info!(
        "Inspection analytics: {} orders, rate {}%",
        analytics.total, analytics.inspection_rate
    );
    analytics
}

/// Zero-valued analytics, served when no data matches the window.
pub fn empty_analytics() -> InspectionAnalytics {
    InspectionAnalytics {
        total: 0,
        inspected: 0,
        not_inspected: 0,
        total_lines: 0,
        inspected_lines: 0,
        not_inspected_lines: 0,
        inspection_rate: 0.0,
        delta_weekly: 0.0,
        inspection_rate_last_wednesday: 0.0,
        by_atelier: Vec::new(),
        by_type_materiel: Vec::new(),
        by_technicien: Vec::new(),
        records: Vec::new(),
    }
}
