// src/productivity_tests.rs

#[cfg(test)]
mod tests {
    use crate::ingest::TimesheetEntry;
    use crate::productivity::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn entry(
        id: &str,
        nom: &str,
        equipe: &str,
        date: &str,
        facturable: f64,
        travaillees: f64,
    ) -> TimesheetEntry {
        TimesheetEntry {
            salarie_id: id.to_string(),
            salarie_nom: nom.to_string(),
            equipe: equipe.to_string(),
            date: d(date),
            heures_facturables: facturable,
            heures_non_facturables: 0.0,
            heures_allouees: 0.0,
            heures_travaillees: travaillees,
            heures_totales: travaillees,
            or_numero: None,
        }
    }

    #[test]
    fn daily_sums_entries_per_employee_day() {
        let entries = vec![
            entry("101", "Diop", "Atelier A", "2025-06-02", 3.0, 4.0),
            entry("101", "Diop", "Atelier A", "2025-06-02", 3.0, 4.0),
            entry("102", "Ndiaye", "Atelier A", "2025-06-02", 8.0, 8.0),
        ];
        let daily = calculate_daily(&entries);
        assert_eq!(daily.len(), 2);
        let diop = daily.iter().find(|d| d.salarie_id == "101").unwrap();
        assert_eq!(diop.heures_facturables, 6.0);
        assert_eq!(diop.heures_travaillees, 8.0);
        assert_eq!(diop.productivite_pct, 75.0);
    }

    #[test]
    fn productivity_is_zero_when_no_worked_hours() {
        let entries = vec![entry("101", "Diop", "Atelier A", "2025-06-02", 5.0, 0.0)];
        let daily = calculate_daily(&entries);
        assert_eq!(daily[0].productivite_pct, 0.0);
        assert!(daily[0].productivite_pct.is_finite());
    }

    #[test]
    fn productivity_is_never_negative_and_rounded() {
        let entries = vec![entry("101", "Diop", "Atelier A", "2025-06-02", 1.0, 3.0)];
        let daily = calculate_daily(&entries);
        assert!(daily[0].productivite_pct >= 0.0);
        assert_eq!(daily[0].productivite_pct, 33.33);
    }

    #[test]
    fn weekly_groups_by_iso_week_across_year_boundary() {
        // 2024-12-30 (Mon) and 2025-01-02 (Thu) share ISO week 2025-W01
        let entries = vec![
            entry("101", "Diop", "Atelier A", "2024-12-30", 4.0, 8.0),
            entry("101", "Diop", "Atelier A", "2025-01-02", 8.0, 8.0),
        ];
        let daily = calculate_daily(&entries);
        let weekly = calculate_weekly(&daily);
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].annee, 2025);
        assert_eq!(weekly[0].numero_semaine, 1);
        assert_eq!(weekly[0].semaine_debut, d("2024-12-30"));
        assert_eq!(weekly[0].productivite_pct, 75.0);
    }

    #[test]
    fn monthly_rederives_ratio_from_summed_hours() {
        // A 100% day and a 0% short day must yield 80%, not the 50% a
        // ratio-average would give.
        let entries = vec![
            entry("101", "Diop", "Atelier A", "2025-06-02", 8.0, 8.0),
            entry("101", "Diop", "Atelier A", "2025-06-03", 0.0, 2.0),
        ];
        let daily = calculate_daily(&entries);
        let monthly = calculate_monthly(&daily);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].annee, 2025);
        assert_eq!(monthly[0].mois, 6);
        assert_eq!(monthly[0].productivite_pct, 80.0);
    }

    #[test]
    fn rolling12_windows_are_inclusive_and_trailing() {
        let entries = vec![
            entry("101", "Diop", "Atelier A", "2024-07-15", 5.0, 10.0),
            entry("101", "Diop", "Atelier A", "2025-07-01", 10.0, 10.0),
        ];
        let daily = calculate_daily(&entries);
        let rolling = calculate_rolling12(&daily);
        assert_eq!(rolling.len(), 2);

        let early = rolling
            .iter()
            .find(|r| r.date_reference == d("2024-07-15"))
            .unwrap();
        assert_eq!(early.productivite_r12_pct, 50.0);

        // 2024-07-15 is inside [2024-07-01, 2025-07-01]
        let late = rolling
            .iter()
            .find(|r| r.date_reference == d("2025-07-01"))
            .unwrap();
        assert_eq!(late.heures_facturables_r12, 15.0);
        assert_eq!(late.heures_travaillees_r12, 20.0);
        assert_eq!(late.productivite_r12_pct, 75.0);
    }

    #[test]
    fn rolling12_excludes_days_before_the_window() {
        let entries = vec![
            entry("101", "Diop", "Atelier A", "2024-06-30", 10.0, 10.0),
            entry("101", "Diop", "Atelier A", "2025-07-01", 5.0, 10.0),
        ];
        let daily = calculate_daily(&entries);
        let rolling = calculate_rolling12(&daily);
        let late = rolling
            .iter()
            .find(|r| r.date_reference == d("2025-07-01"))
            .unwrap();
        // window starts 2024-07-01, so the June day is out
        assert_eq!(late.heures_travaillees_r12, 10.0);
        assert_eq!(late.productivite_r12_pct, 50.0);
    }

    #[test]
    fn team_rollup_counts_distinct_employees() {
        let entries = vec![
            entry("101", "Diop", "Atelier A", "2025-06-02", 4.0, 8.0),
            entry("102", "Ndiaye", "Atelier A", "2025-06-03", 8.0, 8.0),
            entry("102", "Ndiaye", "Atelier A", "2025-06-04", 8.0, 8.0),
            entry("201", "Sarr", "Atelier B", "2025-06-02", 2.0, 8.0),
        ];
        let daily = calculate_daily(&entries);
        let monthly = calculate_team(&daily, TeamPeriod::Monthly);
        assert_eq!(monthly.len(), 2);
        let a = monthly.iter().find(|t| t.equipe == "Atelier A").unwrap();
        assert_eq!(a.nb_salaries, 2);
        assert_eq!(a.heures_travaillees, 24.0);
        assert_eq!(a.productivite_pct, round2(20.0 / 24.0 * 100.0));
        let b = monthly.iter().find(|t| t.equipe == "Atelier B").unwrap();
        assert_eq!(b.nb_salaries, 1);
        assert_eq!(b.productivite_pct, 25.0);
    }

    #[test]
    fn pearson_requires_two_points_and_variance() {
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_driver_picks_the_positively_correlated_team() {
        // Team A tracks the global trend exactly, team B runs against it.
        let entries = vec![
            entry("1", "A1", "Equipe A", "2025-01-15", 4.0, 10.0),
            entry("1", "A1", "Equipe A", "2025-02-15", 6.0, 10.0),
            entry("1", "A1", "Equipe A", "2025-03-15", 8.0, 10.0),
            entry("2", "B1", "Equipe B", "2025-01-15", 7.0, 10.0),
            entry("2", "B1", "Equipe B", "2025-02-15", 6.0, 10.0),
            entry("2", "B1", "Equipe B", "2025-03-15", 5.0, 10.0),
        ];
        let daily = calculate_daily(&entries);
        let driver = correlation_driver(&daily).unwrap();
        assert_eq!(driver.equipe, "Equipe A");
        assert!((driver.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn correlation_driver_excludes_teams_with_one_month() {
        let entries = vec![
            entry("1", "A1", "Equipe A", "2025-01-15", 4.0, 10.0),
            entry("1", "A1", "Equipe A", "2025-02-15", 6.0, 10.0),
            entry("2", "B1", "Equipe B", "2025-01-15", 9.0, 10.0),
        ];
        let daily = calculate_daily(&entries);
        let driver = correlation_driver(&daily).unwrap();
        assert_eq!(driver.equipe, "Equipe A");
    }

    #[test]
    fn correlation_driver_none_when_no_team_qualifies() {
        let entries = vec![entry("1", "A1", "Equipe A", "2025-01-15", 4.0, 10.0)];
        let daily = calculate_daily(&entries);
        assert!(correlation_driver(&daily).is_none());
        assert!(correlation_driver(&[]).is_none());
    }

    #[test]
    fn analytics_on_empty_input_is_zero_valued() {
        let analytics = calculate_analytics(&[]);
        assert_eq!(analytics.global.productivite_pct, 0.0);
        assert!(analytics.by_team.is_empty());
        assert!(analytics.monthly.is_empty());
        assert!(analytics.driver.is_none());
        assert_eq!(analytics.total_rows, 0);
    }

    #[test]
    fn analytics_sorts_teams_by_productivity_desc() {
        let entries = vec![
            entry("1", "A1", "Equipe A", "2025-01-15", 4.0, 10.0),
            entry("2", "B1", "Equipe B", "2025-01-15", 9.0, 10.0),
        ];
        let analytics = calculate_analytics(&entries);
        assert_eq!(analytics.by_team[0].equipe, "Equipe B");
        assert_eq!(analytics.by_team[1].equipe, "Equipe A");
        assert_eq!(analytics.global.productivite_pct, 65.0);
    }
}
