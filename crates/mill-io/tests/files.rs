use mill_core::Instance;
use mill_io::{read_instance, write_instance, write_json, write_records, ReadOptions, RunRecord};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_instance_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("duopoly.txt");
    let instance = Instance::new(
        vec![vec![0, 2], vec![1, 1], vec![4, 0]],
        vec![vec![3, 0]],
        vec![10, 8],
    )
    .unwrap();

    write_instance(&path, &instance).unwrap();
    let read = read_instance(&path, &ReadOptions::from_header()).unwrap();
    assert_eq!(read, instance);
}

#[test]
fn test_missing_file_names_the_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    let err = read_instance(&path, &ReadOptions::default()).unwrap_err();
    assert!(err.to_string().contains("absent.txt"));
}

#[test]
fn test_parse_errors_carry_file_context() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.txt");
    fs::write(&path, "3 2 0\n1 2\n").unwrap();

    let err = read_instance(&path, &ReadOptions::default()).unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("broken.txt"));
    assert!(chain.contains("unexpected end of input"));
}

#[test]
fn test_reports_are_written_as_text_and_json() {
    let dir = tempdir().unwrap();
    let records = vec![
        RunRecord::new("a.txt", 12, 0.5),
        RunRecord::new("b.txt", 0, 2.0),
    ];

    let text_path = dir.path().join("result.txt");
    write_records(&text_path, &records).unwrap();
    let text = fs::read_to_string(&text_path).unwrap();
    assert_eq!(
        text,
        "Test file: a.txt\nResult: 12\nTime: 0.5\nTest file: b.txt\nResult: 0\nTime: 2\n"
    );

    let json_path = dir.path().join("result.json");
    write_json(&json_path, &records).unwrap();
    let back: Vec<RunRecord> =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(back, records);
}
