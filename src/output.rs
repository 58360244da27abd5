//! Output formatting and persistence for aggregate views.
//!
//! Supports pretty-printing, JSON serialization, and CSV (optionally gzipped).

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Logs a view using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(rows: &[T]) {
    debug!("{:#?}", rows);
}

/// Logs a view as pretty-printed JSON.
pub fn print_json<T: Serialize>(rows: &[T]) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

/// Serializes `rows` as CSV with a header row into any writer.
///
/// An empty view produces an empty document, not an error.
pub fn write_csv_to<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Serializes `rows` as a JSON array into any writer.
pub fn write_json_to<W: Write, T: Serialize>(mut writer: W, rows: &[T]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("cannot create {}", path.display()))
}

/// Writes `rows` as CSV to `path`, gzip-compressing the stream when `gzip` is set.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T], gzip: bool) -> Result<()> {
    let file = BufWriter::new(create(path)?);
    debug!(path = %path.display(), rows = rows.len(), gzip, "Writing CSV");

    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_csv_to(&mut encoder, rows)?;
        encoder.finish()?.flush()?;
    } else {
        write_csv_to(file, rows)?;
    }

    info!(path = %path.display(), rows = rows.len(), "View written");
    Ok(())
}

/// Writes `rows` as a JSON array to `path`.
pub fn write_json<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    write_json_to(BufWriter::new(create(path)?), rows)?;
    info!(path = %path.display(), rows = rows.len(), "View written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::{ChangeRow, EnrichedAggregate};
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn enriched() -> EnrichedAggregate {
        EnrichedAggregate {
            town: "Hartford".to_string(),
            residential_type: "All".to_string(),
            year: 2015,
            sale_amount: 250_000.0,
            sales: 3,
            population: None,
            median_household_income: Some(34_338.0),
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&[enriched()]);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&[enriched()]).unwrap();
    }

    #[test]
    fn test_csv_uses_public_column_names() {
        let mut buf = Vec::new();
        write_csv_to(&mut buf, &[enriched()]).unwrap();
        let content = String::from_utf8(buf).unwrap();

        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Town,Residential Type,Sale Year,Sale Amount,Sales,Population,Median Household Income"
        );
        assert_eq!(lines.next().unwrap(), "Hartford,All,2015,250000.0,3,,34338.0");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_csv_of_empty_view_is_empty() {
        let mut buf = Vec::new();
        write_csv_to::<_, ChangeRow>(&mut buf, &[]).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_write_csv_gzip_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("view.csv.gz");

        write_csv(&path, &[enriched(), enriched()], true).unwrap();

        let mut decoded = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded.lines().count(), 3);
        assert!(decoded.starts_with("Town,"));
    }

    #[test]
    fn test_write_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.json");

        write_json(&path, &[enriched()]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["Town"], "Hartford");
        assert_eq!(value[0]["Population"], serde_json::Value::Null);
    }
}
