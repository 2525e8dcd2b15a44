use anyhow::Result;
use chrono::{Local, TimeZone};
use mfc_control::acquisition::{ControllerSample, Reading};
use mfc_control::datalog::{header_for, CsvLogWriter, DatalogError};
use std::fs;
use tempfile::tempdir;

fn reading(flows: &[(&str, f64, i64)]) -> Reading {
    let timestamp = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
    Reading::new(
        timestamp,
        flows
            .iter()
            .map(|(name, setpoint, flow)| ControllerSample {
                name: name.to_string(),
                setpoint: *setpoint,
                flow: *flow,
            })
            .collect(),
    )
}

#[test]
fn test_header_written_once_and_rows_appended() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("2024-03-07").join("MFC_20240307_090502.csv");
    let header = header_for(["A", "B"]);

    let writer = CsvLogWriter::open_log(&path, &header)?;
    assert_eq!(writer.columns(), 5);
    writer.append(&reading(&[("A", 100.0, 98), ("B", 0.0, 1)]))?;

    // Reopening an existing log keeps its header and rows
    let reopened = CsvLogWriter::open_log(&path, &header)?;
    reopened.append(&reading(&[("A", 150.5, 151), ("B", 0.0, -2)]))?;

    let contents = fs::read_to_string(&path)?;
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "datetime,A_setpoint,A_flowrate,B_setpoint,B_flowrate",
            "2024-03-07 09:05:02.000000,100,98,0,1",
            "2024-03-07 09:05:02.000000,150.5,151,0,-2",
        ]
    );
    Ok(())
}

#[test]
fn test_row_with_wrong_column_count_is_rejected() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("log.csv");
    let writer = CsvLogWriter::open_log(&path, &header_for(["A", "B"]))?;

    let result = writer.append(&reading(&[("A", 1.0, 1)]));
    assert!(matches!(
        result,
        Err(DatalogError::ColumnMismatch {
            expected: 5,
            found: 3
        })
    ));
    assert_eq!(fs::read_to_string(&path)?.lines().count(), 1);
    Ok(())
}

#[test]
fn test_unwritable_location_is_reported() -> Result<()> {
    let temp_dir = tempdir()?;
    let blocker = temp_dir.path().join("not_a_dir");
    fs::write(&blocker, "file")?;

    let result = CsvLogWriter::open_log(blocker.join("log.csv"), &header_for(["A"]));
    assert!(matches!(result, Err(DatalogError::Io { .. })));
    Ok(())
}
