/// Export of a completed scan as CSV or JSON.
use crate::error::{EngineError, Result};
use crate::model::ScanResult;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    path: String,
    size_bytes: u64,
    size_in_unit: String,
    accessible: bool,
}

/// Write one row per displayed entry, in display order, with a header.
pub fn write_csv<W: Write>(result: &ScanResult, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for entry in &result.entries {
        out.serialize(CsvRow {
            name: &entry.name,
            path: entry.path.to_string_lossy().into_owned(),
            size_bytes: entry.size_bytes,
            size_in_unit: format!("{:.2}", result.unit.convert(entry.size_bytes)),
            accessible: entry.accessible,
        })
        .map_err(|e| EngineError::Export {
            details: e.to_string(),
        })?;
    }
    out.flush().map_err(|e| EngineError::Export {
        details: e.to_string(),
    })
}

/// The full result, including volume and statistics, as pretty JSON.
pub fn to_json(result: &ScanResult) -> Result<String> {
    serde_json::to_string_pretty(result).map_err(|e| EngineError::Export {
        details: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DirectoryEntry, SizeUnit, VolumeInfo};
    use std::path::PathBuf;
    use std::time::Duration;

    fn sample() -> ScanResult {
        ScanResult {
            entries: vec![
                DirectoryEntry::new("big", "/r/big", 2048),
                DirectoryEntry::new("locked", "/r/locked", 0).restricted(),
            ],
            file_count: 4,
            hidden_count: 1,
            volume: Some(VolumeInfo::new(10_000, 2_500)),
            scanned_path: PathBuf::from("/r"),
            unit: SizeUnit::Kb,
            timestamp: chrono::Local::now(),
            duration: Duration::from_millis(12),
            error_count: 1,
            depth_limit_hits: 0,
            generation: 3,
            failure: None,
        }
    }

    #[test]
    fn csv_has_header_and_rows_in_order() {
        let mut buf = Vec::new();
        write_csv(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name,path,size_bytes,size_in_unit,accessible");
        assert_eq!(lines[1], "big,/r/big,2048,2.00,true");
        assert_eq!(lines[2], "locked,/r/locked,0,0.00,false");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn json_carries_entries_and_volume() {
        let json = to_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entries"][0]["name"], "big");
        assert_eq!(value["entries"][1]["accessible"], false);
        assert_eq!(value["file_count"], 4);
        assert_eq!(value["unit"], "KB");
        assert!(value["volume"].is_object());
    }
}
