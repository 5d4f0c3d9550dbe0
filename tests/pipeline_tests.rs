use data_sweeper::data::cleaning::CleaningOp;
use data_sweeper::data::datatable::DataValue;
use data_sweeper::data::excel_loader::ExcelLoader;
use data_sweeper::data::file_format::FileFormat;
use data_sweeper::session::{self, FileSession, UploadedFile};
use std::fs;
use std::io::Write;

fn session_from_csv(name: &str, content: &str) -> FileSession {
    let file = UploadedFile {
        name: name.to_string(),
        bytes: content.as_bytes().to_vec(),
    };
    FileSession::new(session::ingest(&file).expect("valid csv"))
}

/// The end-to-end scenario: data.csv with [id, value], rows
/// (1,5), (1,5), (2,missing). Dedup, fill, export as Excel.
#[test]
fn test_clean_and_convert_scenario() {
    let mut session = session_from_csv("data.csv", "id,value\n1,5\n1,5\n2,\n");

    session.toggle_op(CleaningOp::RemoveDuplicates);
    let deduped = session.current_table();
    assert_eq!(deduped.row_count(), 2);
    assert_eq!(deduped.get_value(0, 0), Some(&DataValue::Integer(1)));
    assert_eq!(deduped.get_value(1, 1), Some(&DataValue::Null));

    session.toggle_op(CleaningOp::FillMissingNumeric);
    let cleaned = session.current_table();
    // Mean of {5} is 5
    assert_eq!(cleaned.get_value(0, 1), Some(&DataValue::Integer(5)));
    assert_eq!(cleaned.get_value(1, 1), Some(&DataValue::Integer(5)));

    session.export_format = FileFormat::Xlsx;
    let artifact = session.export().expect("export succeeds");
    assert_eq!(artifact.file_name, "data.xlsx");
    assert_eq!(
        artifact.content_type,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );

    // The artifact decodes back to the cleaned table
    let reloaded = ExcelLoader::load_bytes(&artifact.bytes, "data.xlsx").unwrap();
    assert_eq!(reloaded.column_names(), vec!["id", "value"]);
    assert_eq!(reloaded.row_count(), 2);
    assert_eq!(reloaded.get_value(0, 0), Some(&DataValue::Integer(1)));
    assert_eq!(reloaded.get_value(0, 1), Some(&DataValue::Integer(5)));
    assert_eq!(reloaded.get_value(1, 0), Some(&DataValue::Integer(2)));
    assert_eq!(reloaded.get_value(1, 1), Some(&DataValue::Integer(5)));
}

#[test]
fn test_unsupported_file_reports_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();

    let txt_path = dir.path().join("report.txt");
    let mut f = fs::File::create(&txt_path).unwrap();
    writeln!(f, "not tabular").unwrap();

    let csv_path = dir.path().join("good.csv");
    fs::write(&csv_path, "a,b\n1,2\n").unwrap();

    let paths = vec![
        txt_path.to_str().unwrap().to_string(),
        csv_path.to_str().unwrap().to_string(),
    ];
    let (sessions, errors) = session::load_sessions(&paths);

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].file_name, "good.csv");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0], "Unsupported file type: .txt");
}

#[test]
fn test_malformed_file_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();

    let bad_path = dir.path().join("corrupt.xlsx");
    fs::write(&bad_path, b"this is not a workbook").unwrap();

    let good_path = dir.path().join("ok.csv");
    fs::write(&good_path, "x\n1\n").unwrap();

    let paths = vec![
        bad_path.to_str().unwrap().to_string(),
        good_path.to_str().unwrap().to_string(),
    ];
    let (sessions, errors) = session::load_sessions(&paths);

    assert_eq!(sessions.len(), 1);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("corrupt.xlsx"));
}

#[test]
fn test_empty_batch_does_nothing() {
    let paths: Vec<String> = Vec::new();
    let (sessions, errors) = session::load_sessions(&paths);
    assert!(sessions.is_empty());
    assert!(errors.is_empty());
}

#[test]
fn test_sessions_are_independent_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    fs::write(&a, "x\n1\n1\n").unwrap();
    fs::write(&b, "y\n2\n").unwrap();

    let paths = vec![
        a.to_str().unwrap().to_string(),
        b.to_str().unwrap().to_string(),
    ];
    let (mut sessions, _) = session::load_sessions(&paths);
    assert_eq!(sessions.len(), 2);

    // Cleaning the first file must not touch the second
    sessions[0].toggle_op(CleaningOp::RemoveDuplicates);
    assert_eq!(sessions[0].current_table().row_count(), 1);
    assert_eq!(sessions[1].current_table().row_count(), 1);
    assert!(sessions[1].ops.is_empty());
    assert_eq!(sessions[1].file_name, "b.csv");
}

#[test]
fn test_cleaning_toggles_compose_deterministically() {
    // Toggling fill before dedup applies them in that order; the duplicate
    // row still weights the mean because dedup runs second.
    let mut session = session_from_csv("t.csv", "id,value\n1,4\n1,4\n2,\n");

    session.toggle_op(CleaningOp::FillMissingNumeric);
    session.toggle_op(CleaningOp::RemoveDuplicates);

    let table = session.current_table();
    assert_eq!(table.row_count(), 2);
    // Mean of {4, 4} is 4
    assert_eq!(table.get_value(1, 1), Some(&DataValue::Integer(4)));
}
