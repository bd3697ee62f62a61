// src/ingest_tests.rs

#[cfg(test)]
mod tests {
    use crate::ingest::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    const TIMESHEET_HEADER: &str = "Salarié - Numéro,Salarié - Nom,Salarié - Equipe(Nom),Saisie heures - Date,Facturable,Non Facturable,Allouée,Hr_travaillée,Hr_Totale";

    fn timesheet_csv(rows: &[&str]) -> Vec<u8> {
        let mut out = String::from(TIMESHEET_HEADER);
        out.push('\n');
        for r in rows {
            out.push_str(r);
            out.push('\n');
        }
        out.into_bytes()
    }

    #[test]
    fn parses_a_clean_timesheet() {
        let csv = timesheet_csv(&[
            "101,Diop,Atelier A,2025-06-02,6,1,8,7,8",
            "102,Ndiaye,Atelier A,2025-06-02,8,0,8,8,8",
        ]);
        let entries = parse_timesheet_csv(&csv).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].salarie_id, "101");
        assert_eq!(entries[0].date, d("2025-06-02"));
        assert_eq!(entries[0].heures_facturables, 6.0);
        assert_eq!(entries[0].heures_totales, 8.0);
    }

    #[test]
    fn missing_columns_are_all_named() {
        let csv = b"Salari\xc3\xa9 - Nom,Facturable\nDiop,5\n".to_vec();
        let err = parse_timesheet_csv(&csv).unwrap_err();
        match err {
            LoadError::MissingColumns { columns } => {
                assert!(columns.contains(&"Salarié - Numéro".to_string()));
                assert!(columns.contains(&"Saisie heures - Date".to_string()));
                assert!(columns.contains(&"Hr_Totale".to_string()));
                assert!(!columns.contains(&"Facturable".to_string()));
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn unparsable_dates_fail_the_whole_upload_with_row_numbers() {
        let csv = timesheet_csv(&[
            "101,Diop,Atelier A,2025-06-02,6,1,8,7,8",
            "102,Ndiaye,Atelier A,not-a-date,8,0,8,8,8",
            "103,Sarr,Atelier A,02/13/2025,8,0,8,8,8",
        ]);
        let err = parse_timesheet_csv(&csv).unwrap_err();
        match err {
            LoadError::BadRows { issues } => {
                let lines: Vec<usize> = issues.iter().map(|i| i.line).collect();
                assert_eq!(lines, vec![3, 4]);
                assert_eq!(issues[0].value, "not-a-date");
            }
            other => panic!("expected BadRows, got {:?}", other),
        }
    }

    #[test]
    fn empty_numeric_cells_read_as_zero() {
        let csv = timesheet_csv(&["101,Diop,Atelier A,2025-06-02,,,,7,"]);
        let entries = parse_timesheet_csv(&csv).unwrap();
        assert_eq!(entries[0].heures_facturables, 0.0);
        assert_eq!(entries[0].heures_travaillees, 7.0);
        assert_eq!(entries[0].heures_totales, 0.0);
    }

    #[test]
    fn decimal_comma_and_datetime_cells_are_accepted() {
        let csv = timesheet_csv(&["101,Diop,Atelier A,2025-06-02 08:30:00,\"6,5\",0,8,\"7,5\",8"]);
        let entries = parse_timesheet_csv(&csv).unwrap();
        assert_eq!(entries[0].date, d("2025-06-02"));
        assert_eq!(entries[0].heures_facturables, 6.5);
        assert_eq!(entries[0].heures_travaillees, 7.5);
    }

    #[test]
    fn exact_duplicate_rows_are_removed() {
        let csv = timesheet_csv(&[
            "101,Diop,Atelier A,2025-06-02,6,1,8,7,8",
            "101,Diop,Atelier A,2025-06-02,6,1,8,7,8",
            "101,Diop,Atelier A,2025-06-02,2,1,8,2,2",
        ]);
        let entries = parse_timesheet_csv(&csv).unwrap();
        // the duplicate collapses, the different row for the same day stays
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn sheet_kinds_are_sniffed_from_headers() {
        let productivity: Vec<String> = TIMESHEET_HEADER.split(',').map(String::from).collect();
        assert_eq!(sniff_sheet_kind(&productivity), SheetKind::Productivity);

        let inspection: Vec<String> = ["SN", "Date Facture", "Is Inspected", "Atelier"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(sniff_sheet_kind(&inspection), SheetKind::Inspection);

        let llti: Vec<String> = [
            "N° OR (Segment)",
            "N° Facture (Lignes)",
            "Date Facture (Lignes)",
            "Pointage dernière date (Segment)",
            "Nom Client OR (or)",
            "Numéro série Equipement (Segment)",
            "Constructeur de l'équipement",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(sniff_sheet_kind(&llti), SheetKind::Llti);

        let unknown: Vec<String> = ["foo", "bar"].iter().map(|s| s.to_string()).collect();
        assert_eq!(sniff_sheet_kind(&unknown), SheetKind::Unknown);
    }

    #[test]
    fn inspection_sheet_maps_loose_headers_and_validates_flags() {
        let csv = b"SN,Date Facture,Is Inspected,N\xc2\xb0 OR (Segment),Atelier\n\
SN1,2025-06-02,Inspect\xc3\xa9,OR-A,Central\n\
SN2,2025-06-03,Non Inspect\xc3\xa9,OR-B,Nord\n"
            .to_vec();
        let rows = parse_inspection_csv(&csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].inspected);
        assert!(!rows[1].inspected);
        assert_eq!(rows[0].or_segment, "OR-A");
        assert_eq!(rows[1].atelier, "Nord");
    }

    #[test]
    fn inspection_sheet_rejects_unknown_flag_values() {
        let csv = b"sn,date_facture,is_inspected\nSN1,2025-06-02,Oui\n".to_vec();
        let err = parse_inspection_csv(&csv).unwrap_err();
        match err {
            LoadError::BadRows { issues } => {
                assert_eq!(issues[0].column, "is_inspected");
                assert_eq!(issues[0].value, "Oui");
            }
            other => panic!("expected BadRows, got {:?}", other),
        }
    }

    #[test]
    fn inspection_sheet_requires_core_columns() {
        let csv = b"sn,atelier\nSN1,Central\n".to_vec();
        let err = parse_inspection_csv(&csv).unwrap_err();
        match err {
            LoadError::MissingColumns { columns } => {
                assert!(columns.contains(&"date_facture".to_string()));
                assert!(columns.contains(&"is_inspected".to_string()));
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn llti_sheet_allows_empty_dates_but_not_bad_ones() {
        let header = "N° OR (Segment),N° Facture (Lignes),Date Facture (Lignes),Pointage dernière date (Segment),Nom Client OR (or),Numéro série Equipement (Segment),Constructeur de l'équipement";
        let good = format!(
            "{}\nOR-1,F1,2025-05-10,2025-05-01,Client,SN1,CATERPILLAR\nOR-2,F2,,,Client,SN2,CATERPILLAR\n",
            header
        );
        let rows = parse_llti_csv(good.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date_facture, Some(d("2025-05-10")));
        assert_eq!(rows[1].date_facture, None);

        let bad = format!(
            "{}\nOR-1,F1,bogus,2025-05-01,Client,SN1,CATERPILLAR\n",
            header
        );
        let err = parse_llti_csv(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::BadRows { .. }));
    }

    #[test]
    fn workbook_zip_yields_its_csv_sheets() {
        let mut buffer = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buffer));
            let options: zip::write::SimpleFileOptions = Default::default();
            writer.start_file("productivite.csv", options).unwrap();
            writer
                .write_all(timesheet_csv(&["101,Diop,Atelier A,2025-06-02,6,1,8,7,8"]).as_slice())
                .unwrap();
            writer.start_file("notes.txt", options).unwrap();
            writer.write_all(b"ignored").unwrap();
            writer.finish().unwrap();
        }
        let sheets = read_workbook(&buffer).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].0, "productivite.csv");
        let entries = parse_timesheet_csv(&sheets[0].1).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn plain_bytes_are_a_single_sheet() {
        let csv = timesheet_csv(&["101,Diop,Atelier A,2025-06-02,6,1,8,7,8"]);
        let sheets = read_workbook(&csv).unwrap();
        assert_eq!(sheets.len(), 1);
    }

    #[test]
    fn date_formats_seen_in_exports_parse() {
        assert_eq!(parse_date("2025-06-02"), Some(d("2025-06-02")));
        assert_eq!(parse_date("02/06/2025"), Some(d("2025-06-02")));
        assert_eq!(parse_date("2025-06-02 14:30:00"), Some(d("2025-06-02")));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2025-13-02"), None);
    }
}
