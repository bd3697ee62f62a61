// src/llti_tests.rs

#[cfg(test)]
mod tests {
    use crate::ingest::RawLltiRow;
    use crate::llti::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    const TODAY: &str = "2025-06-15"; // inside Q2 2025, quarter starts 2025-04-01

    fn raw(
        facture: &str,
        date_facture: Option<&str>,
        date_pointage: Option<&str>,
        constructeur: &str,
    ) -> RawLltiRow {
        RawLltiRow {
            or_segment: format!("OR-{}", facture),
            numero_facture: facture.to_string(),
            date_facture: date_facture.map(d),
            date_pointage: date_pointage.map(d),
            client: "Client SA".to_string(),
            sn_equipement: "SN0".to_string(),
            constructeur: constructeur.to_string(),
        }
    }

    fn record(facture: &str, jours: i64) -> LltiRecord {
        let pointage = d("2025-05-01");
        LltiRecord {
            or_segment: format!("OR-{}", facture),
            numero_facture: facture.to_string(),
            date_facture: pointage + chrono::Duration::days(jours),
            date_pointage: pointage,
            client: "Client SA".to_string(),
            sn_equipement: "SN0".to_string(),
            constructeur: "CATERPILLAR".to_string(),
            llti_jours: jours,
        }
    }

    #[test]
    fn preprocess_keeps_only_caterpillar() {
        let rows = vec![
            raw("F1", Some("2025-05-10"), Some("2025-05-01"), "CATERPILLAR"),
            raw("F2", Some("2025-05-10"), Some("2025-05-01"), " caterpillar "),
            raw("F3", Some("2025-05-10"), Some("2025-05-01"), "KOMATSU"),
        ];
        let records = preprocess(&rows, d(TODAY));
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.numero_facture != "F3"));
    }

    #[test]
    fn preprocess_requires_both_dates() {
        let rows = vec![
            raw("F1", Some("2025-05-10"), None, "CATERPILLAR"),
            raw("F2", None, Some("2025-05-01"), "CATERPILLAR"),
            raw("F3", Some("2025-05-10"), Some("2025-05-01"), "CATERPILLAR"),
        ];
        let records = preprocess(&rows, d(TODAY));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].numero_facture, "F3");
        assert_eq!(records[0].llti_jours, 9);
    }

    #[test]
    fn preprocess_filters_to_current_quarter() {
        let rows = vec![
            raw("F1", Some("2025-03-31"), Some("2025-03-20"), "CATERPILLAR"),
            raw("F2", Some("2025-04-01"), Some("2025-03-20"), "CATERPILLAR"),
        ];
        let records = preprocess(&rows, d(TODAY));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].numero_facture, "F2");
    }

    #[test]
    fn preprocess_dedups_invoices_keeping_latest_labor_date() {
        let rows = vec![
            raw("F1", Some("2025-05-20"), Some("2025-05-01"), "CATERPILLAR"),
            raw("F1", Some("2025-05-20"), Some("2025-05-10"), "CATERPILLAR"),
            raw("F1", Some("2025-05-20"), Some("2025-05-05"), "CATERPILLAR"),
        ];
        let records = preprocess(&rows, d(TODAY));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_pointage, d("2025-05-10"));
        assert_eq!(records[0].llti_jours, 10);
    }

    #[test]
    fn preprocess_drops_negative_lead_times() {
        let rows = vec![raw("F1", Some("2025-05-01"), Some("2025-05-10"), "CATERPILLAR")];
        let records = preprocess(&rows, d(TODAY));
        assert!(records.is_empty());
    }

    #[test]
    fn distribution_puts_one_invoice_in_each_bucket() {
        let records = vec![record("F1", 3), record("F2", 10), record("F3", 18), record("F4", 25)];
        let dist = calculate_distribution(&records);
        assert_eq!(dist.excellent, 1);
        assert_eq!(dist.advanced, 1);
        assert_eq!(dist.emerging, 1);
        assert_eq!(dist.a_ameliorer, 1);
    }

    #[test]
    fn distribution_boundaries() {
        // 7 is advanced, 17 is emerging, 21 is emerging, 22 needs improvement
        let records = vec![record("F1", 7), record("F2", 17), record("F3", 21), record("F4", 22)];
        let dist = calculate_distribution(&records);
        assert_eq!(dist.excellent, 0);
        assert_eq!(dist.advanced, 1);
        assert_eq!(dist.emerging, 2);
        assert_eq!(dist.a_ameliorer, 1);
    }

    #[test]
    fn global_reports_mean_median_and_status() {
        let records = vec![record("F1", 2), record("F2", 4), record("F3", 6)];
        let global = calculate_global(&records);
        assert_eq!(global.moyenne_llti, 4.0);
        assert_eq!(global.mediane_llti, 4.0);
        assert_eq!(global.total_factures, 3);
        assert_eq!(global.status, "Excellent");

        let records = vec![record("F1", 10), record("F2", 12)];
        assert_eq!(calculate_global(&records).status, "Advanced");
        let records = vec![record("F1", 18), record("F2", 20)];
        assert_eq!(calculate_global(&records).status, "Emerging");
        let records = vec![record("F1", 30)];
        assert_eq!(calculate_global(&records).status, "À améliorer");
    }

    #[test]
    fn global_on_empty_is_na_not_nan() {
        let global = calculate_global(&[]);
        assert_eq!(global.moyenne_llti, 0.0);
        assert_eq!(global.mediane_llti, 0.0);
        assert_eq!(global.total_factures, 0);
        assert_eq!(global.status, "N/A");
    }

    #[test]
    fn by_client_sorts_fastest_first() {
        let mut fast = record("F1", 2);
        fast.client = "Rapide SARL".to_string();
        let mut slow = record("F2", 20);
        slow.client = "Lent SA".to_string();
        let mut slow2 = record("F3", 30);
        slow2.client = "Lent SA".to_string();

        let by_client = calculate_by_client(&[fast, slow, slow2]);
        assert_eq!(by_client.len(), 2);
        assert_eq!(by_client[0].client, "Rapide SARL");
        assert_eq!(by_client[0].moyenne_llti, 2.0);
        assert_eq!(by_client[1].client, "Lent SA");
        assert_eq!(by_client[1].moyenne_llti, 25.0);
        assert_eq!(by_client[1].total_factures, 2);
    }

    #[test]
    fn by_or_sorts_slowest_first() {
        let records = vec![record("F1", 2), record("F2", 20), record("F3", 10)];
        let by_or = calculate_by_or(&records);
        let days: Vec<i64> = by_or.iter().map(|o| o.llti_jours).collect();
        assert_eq!(days, vec![20, 10, 2]);
    }
}
