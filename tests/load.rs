use std::fs;
use std::io;
use std::path::Path;

use mtplates::repl::{self, PlainReader};
use mtplates::{CountyTable, DisplayPreference, LoadError, MalformedData, DEFAULT_DATA_FILE};
use tempfile::tempdir;

#[test]
fn shipped_data_file_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_DATA_FILE);
    let table = CountyTable::from_path(path).expect("load shipped table");

    assert_eq!(table.len(), 56);
    assert_eq!(table.prefix_range(), Some(1..=56));

    let custer = table.lookup(14).unwrap();
    assert_eq!(custer.county_name, "Custer");
    assert_eq!(custer.seat_city, "Miles City");

    let meagher = table.lookup(47).unwrap();
    assert_eq!(meagher.seat_city, "White Sulphur Springs");
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nowhere.csv");

    match CountyTable::from_path(&path) {
        Err(LoadError::NotFound { path: reported }) => assert_eq!(reported, path),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn non_numeric_prefix_is_malformed() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("counties.csv");
    fs::write(&path, "County,Seat,Prefix\nCuster,Miles City,two\n").expect("write csv");

    let err = CountyTable::from_path(&path).unwrap_err();
    assert!(err.to_string().contains("'two'"));
    match err {
        LoadError::Malformed { source, .. } => assert_eq!(
            source,
            MalformedData::InvalidPrefix {
                line: 2,
                value: "two".to_string()
            }
        ),
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn short_row_is_malformed() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("counties.csv");
    fs::write(&path, "County,Seat,Prefix\nCuster\n").expect("write csv");

    assert!(matches!(
        CountyTable::from_path(&path),
        Err(LoadError::Malformed {
            source: MalformedData::MissingFields { line: 2, found: 1 },
            ..
        })
    ));
}

#[test]
fn invalid_utf8_is_malformed() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("counties.csv");
    fs::write(&path, b"County,Seat,Prefix\nCuster,Miles \xff City,2\n").expect("write csv");

    assert!(matches!(
        CountyTable::from_path(&path),
        Err(LoadError::Malformed {
            source: MalformedData::InvalidUtf8,
            ..
        })
    ));
}

#[test]
fn duplicate_prefixes_keep_last_row() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("counties.csv");
    fs::write(
        &path,
        "County,Seat,Prefix\nCuster,Miles City,2\nCarbon,Red Lodge,10\nCascade,Great Falls,2\n",
    )
    .expect("write csv");

    let table = CountyTable::from_path(&path).expect("load table");
    assert_eq!(table.len(), 2);
    assert_eq!(table.lookup(2).unwrap().county_name, "Cascade");
    assert_eq!(table.lookup(10).unwrap().county_name, "Carbon");
}

#[test]
fn scripted_session_over_loaded_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_DATA_FILE);
    let table = CountyTable::from_path(path).expect("load shipped table");

    let script = "3\n14\nabc\n99\nchange\n3\n5\nexit\n";
    let mut input = PlainReader::new(script.as_bytes(), io::sink());
    let mut out = Vec::new();

    let preference = repl::select_preference(&mut input, &mut out)
        .expect("select")
        .expect("not interrupted");
    assert_eq!(preference, DisplayPreference::SeatOnly);

    let active = repl::run(&table, preference, &mut input, &mut out).expect("run");
    assert_eq!(active, DisplayPreference::SeatOnly);

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("County Seat: Miles City"));
    assert!(!out.contains("County: Custer"));
    assert!(out.contains("Invalid input: 'abc'"));
    assert!(out.contains("Prefix 99 not found in database."));
    assert!(out.contains("Valid prefixes are 1-56."));
    assert!(out.contains("County Seat: Helena"));
    assert!(out.ends_with("See ya!\n"));
}
