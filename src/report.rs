// src/report.rs
//
// Meeting summary: a point-in-time snapshot of the headline KPIs plus the
// Markdown narrative archived with it.
use chrono::NaiveDate;
use serde::Serialize;

use crate::inspection::InspectionAnalytics;
use crate::productivity::round2;
use crate::store::LeanAction;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingSnapshot {
    pub meeting_date: NaiveDate,
    pub productivite_globale: f64,
    pub total_heures: f64,
    pub total_facturable: f64,
    pub inspection_rate: f64,
    pub inspection_delta_weekly: f64,
    pub actions_ouvertes: i64,
    pub actions_critiques: i64,
}

/// Assembles the snapshot from already-computed inputs.
pub fn build_snapshot(
    meeting_date: NaiveDate,
    total_facturable: f64,
    total_heures: f64,
    inspection: &InspectionAnalytics,
    actions_ouvertes: i64,
    actions_critiques: i64,
) -> MeetingSnapshot {
    let productivite = if total_heures > 0.0 {
        total_facturable / total_heures
    } else {
        0.0
    };
    MeetingSnapshot {
        meeting_date,
        productivite_globale: round2(productivite * 100.0),
        total_heures: round2(total_heures),
        total_facturable: round2(total_facturable),
        inspection_rate: inspection.inspection_rate,
        inspection_delta_weekly: inspection.delta_weekly,
        actions_ouvertes,
        actions_critiques,
    }
}

fn productivity_status(pct: f64) -> &'static str {
    if pct >= 85.0 {
        "✅ **Excellent** (≥85%)"
    } else if pct >= 78.0 {
        "⚠️ **Advanced** (78-84%)"
    } else {
        "❌ **Emerging** (<78%)"
    }
}

fn inspection_status(rate: f64) -> &'static str {
    if rate >= 65.0 {
        "✅ **Excellent** (≥65%)"
    } else if rate >= 50.0 {
        "⚠️ **Alerte** (50-64%)"
    } else {
        "❌ **Critique** (<50%)"
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Renders the meeting report in the shape the performance reviews use.
pub fn render_markdown(
    snapshot: &MeetingSnapshot,
    actions: &[LeanAction],
    notes: &str,
    generated_at: &str,
) -> String {
    let mut md = String::new();
    md.push_str("# COMPTE RENDU RÉUNION SEP\n\n");
    md.push_str(&format!(
        "**Date de la séance :** {}\n\n---\n\n",
        snapshot.meeting_date.format("%d %B %Y")
    ));
    md.push_str("## 📊 RÉSUMÉ DE PERFORMANCE\n\n");

    md.push_str("### Productivité Atelier\n");
    md.push_str(&format!(
        "- **Taux :** {}% - {} aux objectifs SEP 2025\n",
        snapshot.productivite_globale,
        productivity_status(snapshot.productivite_globale)
    ));
    md.push_str(&format!(
        "- **Heures totales :** {:.0}h\n",
        snapshot.total_heures
    ));
    md.push_str(&format!(
        "- **Heures facturables :** {:.0}h\n\n",
        snapshot.total_facturable
    ));

    if snapshot.inspection_rate > 0.0 {
        let delta_text = if snapshot.inspection_delta_weekly != 0.0 {
            format!(
                " ({:+.1}% vs mercredi dernier)",
                snapshot.inspection_delta_weekly
            )
        } else {
            String::new()
        };
        md.push_str("### Inspection Rate\n");
        md.push_str(&format!(
            "- **Taux :** {:.1}% - {}{}\n\n",
            snapshot.inspection_rate,
            inspection_status(snapshot.inspection_rate),
            delta_text
        ));
    }

    md.push_str("---\n\n");

    let ouvertes: Vec<&LeanAction> = actions.iter().filter(|a| a.statut == "Ouvert").collect();
    md.push_str("## 🔧 ACTIONS LEAN OUVERTES\n\n");
    if ouvertes.is_empty() {
        md.push_str("*Aucune action ouverte.*\n\n");
    } else {
        md.push_str("| ID | Date ouverture | Problème | Owner | Date clôture prévue |\n");
        md.push_str("|----|----------------|----------|-------|---------------------|\n");
        for a in &ouvertes {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                a.id,
                a.date_ouverture,
                escape_cell(&a.probleme),
                if a.owner.is_empty() { "-" } else { &a.owner },
                a.date_cloture_prevue
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ));
        }
        md.push('\n');
    }

    let critiques: Vec<&&LeanAction> = ouvertes
        .iter()
        .filter(|a| {
            a.date_cloture_prevue
                .map(|d| d < snapshot.meeting_date)
                .unwrap_or(false)
        })
        .collect();
    if !critiques.is_empty() {
        md.push_str("## 🚨 ACTIONS CRITIQUES (en retard)\n\n");
        md.push_str("| ID | Problème | Owner | Date clôture prévue |\n");
        md.push_str("|----|----------|-------|---------------------|\n");
        for a in &critiques {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                a.id,
                escape_cell(&a.probleme),
                if a.owner.is_empty() { "-" } else { &a.owner },
                a.date_cloture_prevue
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            ));
        }
        md.push('\n');
    }

    if !notes.trim().is_empty() {
        md.push_str("---\n\n## 📝 NOTES DE DISCUSSION\n\n");
        for line in notes.lines() {
            let line = line.trim();
            if !line.is_empty() {
                md.push_str(&format!("- {}\n", line));
            }
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str(&format!("*Généré le {}*\n", generated_at));
    md
}
