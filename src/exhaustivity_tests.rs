// src/exhaustivity_tests.rs

#[cfg(test)]
mod tests {
    use crate::exhaustivity::*;
    use crate::productivity::EmployeeDay;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn day(id: &str, nom: &str, equipe: &str, date: &str, heures: f64) -> EmployeeDay {
        EmployeeDay {
            salarie_id: id.to_string(),
            salarie_nom: nom.to_string(),
            equipe: equipe.to_string(),
            date: d(date),
            heures_facturables: heures,
            heures_non_facturables: 0.0,
            heures_allouees: 0.0,
            heures_travaillees: heures,
            heures_totales: heures,
            productivite_pct: 0.0,
        }
    }

    // 2025-06-02 is a Monday, 2025-06-07 a Saturday, 2025-06-08 a Sunday.

    #[test]
    fn weekday_statuses_cover_every_branch() {
        assert_eq!(day_status(0.0, d("2025-06-02")), DayStatus::Missing);
        assert_eq!(day_status(4.5, d("2025-06-02")), DayStatus::Incomplete);
        assert_eq!(day_status(7.99, d("2025-06-02")), DayStatus::Incomplete);
        assert_eq!(day_status(8.0, d("2025-06-02")), DayStatus::Compliant);
        assert_eq!(day_status(8.5, d("2025-06-02")), DayStatus::Overtime);
    }

    #[test]
    fn weekend_statuses_are_compliant_or_overtime_only() {
        // Saturday
        assert_eq!(day_status(0.0, d("2025-06-07")), DayStatus::Compliant);
        assert_eq!(day_status(3.0, d("2025-06-07")), DayStatus::Overtime);
        // Sunday, tested independently
        assert_eq!(day_status(0.0, d("2025-06-08")), DayStatus::Compliant);
        assert_eq!(day_status(8.0, d("2025-06-08")), DayStatus::Overtime);
    }

    #[test]
    fn check_daily_carries_day_typing() {
        let daily = vec![
            day("101", "Diop", "Atelier A", "2025-06-02", 8.0),
            day("101", "Diop", "Atelier A", "2025-06-07", 2.0),
        ];
        let days = check_daily(&daily);
        assert_eq!(days[0].type_jour, "ouvre");
        assert_eq!(days[0].statut, DayStatus::Compliant);
        assert_eq!(days[0].jour_semaine, 0);
        assert_eq!(days[1].type_jour, "weekend");
        assert_eq!(days[1].statut, DayStatus::Overtime);
        assert_eq!(days[1].jour_semaine, 5);
    }

    #[test]
    fn global_rate_only_counts_working_days() {
        let daily = vec![
            day("101", "Diop", "Atelier A", "2025-06-02", 8.0), // compliant
            day("101", "Diop", "Atelier A", "2025-06-03", 4.0), // incomplete
            day("101", "Diop", "Atelier A", "2025-06-04", 0.0), // missing
            day("101", "Diop", "Atelier A", "2025-06-05", 10.0), // overtime
            day("101", "Diop", "Atelier A", "2025-06-07", 5.0), // weekend, excluded
        ];
        let days = check_daily(&daily);
        let rows = calculate_rate(&days, RateScope::Global);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.scope.as_deref(), Some("Global"));
        assert_eq!(row.jours_total, 4);
        assert_eq!(row.jours_conformes, 1);
        assert_eq!(row.jours_incomplets, 1);
        assert_eq!(row.jours_manquants, 1);
        assert_eq!(row.jours_heures_sup, 1);
        assert_eq!(row.taux_exhaustivite_pct, 25.0);
    }

    #[test]
    fn rate_by_team_counts_employees() {
        let daily = vec![
            day("101", "Diop", "Atelier A", "2025-06-02", 8.0),
            day("102", "Ndiaye", "Atelier A", "2025-06-02", 4.0),
            day("201", "Sarr", "Atelier B", "2025-06-02", 8.0),
        ];
        let days = check_daily(&daily);
        let rows = calculate_rate(&days, RateScope::Team);
        assert_eq!(rows.len(), 2);
        let a = rows.iter().find(|r| r.equipe.as_deref() == Some("Atelier A")).unwrap();
        assert_eq!(a.nb_salaries, Some(2));
        assert_eq!(a.taux_exhaustivite_pct, 50.0);
    }

    #[test]
    fn rate_by_month_groups_team_and_month() {
        let daily = vec![
            day("101", "Diop", "Atelier A", "2025-05-05", 8.0),
            day("101", "Diop", "Atelier A", "2025-06-02", 0.0),
        ];
        let days = check_daily(&daily);
        let rows = calculate_rate(&days, RateScope::Month);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].annee, Some(2025));
        assert_eq!(rows[0].mois, Some(5));
        assert_eq!(rows[0].taux_exhaustivite_pct, 100.0);
        assert_eq!(rows[1].mois, Some(6));
        assert_eq!(rows[1].taux_exhaustivite_pct, 0.0);
    }

    #[test]
    fn empty_input_yields_zero_rate_not_a_panic() {
        let rows = calculate_rate(&[], RateScope::Global);
        assert_eq!(rows[0].jours_total, 0);
        assert_eq!(rows[0].taux_exhaustivite_pct, 0.0);
    }

    #[test]
    fn anomalies_sorted_by_severity_then_date_team_name() {
        let daily = vec![
            day("103", "Ba", "Atelier B", "2025-06-03", 9.0),   // overtime
            day("102", "Ndiaye", "Atelier A", "2025-06-03", 4.0), // incomplete
            day("101", "Diop", "Atelier A", "2025-06-04", 0.0), // missing, later date
            day("104", "Sarr", "Atelier A", "2025-06-03", 0.0), // missing, earlier date
            day("105", "Fall", "Atelier A", "2025-06-02", 8.0), // compliant, excluded
        ];
        let days = check_daily(&daily);
        let anomalies = detect_anomalies(&days, None);
        let order: Vec<(&str, DayStatus)> = anomalies
            .iter()
            .map(|a| (a.salarie_nom.as_str(), a.statut))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Sarr", DayStatus::Missing),
                ("Diop", DayStatus::Missing),
                ("Ndiaye", DayStatus::Incomplete),
                ("Ba", DayStatus::Overtime),
            ]
        );
    }

    #[test]
    fn anomalies_can_be_filtered_by_status() {
        let daily = vec![
            day("101", "Diop", "Atelier A", "2025-06-02", 0.0),
            day("102", "Ndiaye", "Atelier A", "2025-06-02", 4.0),
            day("103", "Ba", "Atelier A", "2025-06-02", 10.0),
        ];
        let days = check_daily(&daily);
        let missing_only = detect_anomalies(&days, Some(&[DayStatus::Missing]));
        assert_eq!(missing_only.len(), 1);
        assert_eq!(missing_only[0].statut, DayStatus::Missing);
    }

    #[test]
    fn expected_calendar_skips_weekends_by_default() {
        // 2025-06-02 (Mon) .. 2025-06-08 (Sun)
        let working = expected_calendar(d("2025-06-02"), d("2025-06-08"), false);
        assert_eq!(working.len(), 5);
        let all = expected_calendar(d("2025-06-02"), d("2025-06-08"), true);
        assert_eq!(all.len(), 7);
    }

    #[test]
    fn missing_days_is_calendar_times_employees_minus_records() {
        // 5-working-day window; X has 3 records, Y has all 5.
        let daily = vec![
            day("X", "Xavier", "Atelier A", "2025-06-02", 8.0),
            day("X", "Xavier", "Atelier A", "2025-06-03", 8.0),
            day("X", "Xavier", "Atelier A", "2025-06-05", 8.0),
            day("Y", "Yaya", "Atelier A", "2025-06-02", 8.0),
            day("Y", "Yaya", "Atelier A", "2025-06-03", 8.0),
            day("Y", "Yaya", "Atelier A", "2025-06-04", 8.0),
            day("Y", "Yaya", "Atelier A", "2025-06-05", 8.0),
            day("Y", "Yaya", "Atelier A", "2025-06-06", 8.0),
        ];
        let missing = get_missing_days(&daily, d("2025-06-02"), d("2025-06-06"));
        assert_eq!(missing.len(), 2);
        assert!(missing.iter().all(|m| m.salarie_id == "X"));
        let dates: Vec<NaiveDate> = missing.iter().map(|m| m.date).collect();
        assert_eq!(dates, vec![d("2025-06-04"), d("2025-06-06")]);
    }

    #[test]
    fn missing_days_differs_from_zero_hour_records() {
        // A 0-hour record exists, so the day is not "missing" in the
        // calendar sense even though its status is Missing.
        let daily = vec![day("X", "Xavier", "Atelier A", "2025-06-02", 0.0)];
        let missing = get_missing_days(&daily, d("2025-06-02"), d("2025-06-02"));
        assert!(missing.is_empty());
        let days = check_daily(&daily);
        assert_eq!(days[0].statut, DayStatus::Missing);
    }
}
