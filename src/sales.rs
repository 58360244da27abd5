//! Loading of the raw parcel-sale table.
//!
//! Rows are read into [`RawSaleRow`], a loose mirror of the source file's
//! columns, and mapped into [`SaleRecord`]. Only the mapping knows the
//! source column names.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// A single parcel sale, validated and typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    #[serde(rename = "Town")]
    pub town: String,
    #[serde(rename = "Date Recorded")]
    pub date_recorded: NaiveDate,
    #[serde(rename = "Sale Year")]
    pub sale_year: i32,
    #[serde(rename = "Sale Amount")]
    pub sale_amount: f64,
    #[serde(rename = "Assessed Value")]
    pub assessed_value: Option<f64>,
    #[serde(rename = "Residential Type")]
    pub residential_type: Option<String>,
    #[serde(rename = "Property Type")]
    pub property_type: Option<String>,
}

impl SaleRecord {
    pub fn new(town: &str, date_recorded: NaiveDate, sale_amount: f64) -> Self {
        Self {
            town: town.to_string(),
            date_recorded,
            sale_year: date_recorded.year(),
            sale_amount,
            assessed_value: None,
            residential_type: None,
            property_type: None,
        }
    }

    pub fn with_residential_type(mut self, residential_type: &str) -> Self {
        self.residential_type = Some(residential_type.to_string());
        self
    }
}

/// One row of the CT "Real Estate Sales" export, every field as found.
#[derive(Debug, Default, Deserialize)]
pub struct RawSaleRow {
    #[serde(rename = "Town", default)]
    pub town: Option<String>,
    #[serde(rename = "Date Recorded", default)]
    pub date_recorded: Option<String>,
    #[serde(rename = "Sale Amount", default)]
    pub sale_amount: Option<String>,
    #[serde(rename = "Assessed Value", default)]
    pub assessed_value: Option<String>,
    #[serde(rename = "Residential Type", default)]
    pub residential_type: Option<String>,
    #[serde(rename = "Property Type", default)]
    pub property_type: Option<String>,
}

/// Why a raw row was left out of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRejection {
    MissingTown,
    BadDate,
    BadAmount,
}

/// Counts of rows kept and skipped by [`load_sales`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub kept: usize,
    pub missing_town: usize,
    pub bad_date: usize,
    pub bad_amount: usize,
    pub unreadable: usize,
}

impl LoadReport {
    pub fn skipped(&self) -> usize {
        self.missing_town + self.bad_date + self.bad_amount + self.unreadable
    }

    fn reject(&mut self, reason: RowRejection) {
        match reason {
            RowRejection::MissingTown => self.missing_town += 1,
            RowRejection::BadDate => self.bad_date += 1,
            RowRejection::BadAmount => self.bad_amount += 1,
        }
    }
}

impl TryFrom<RawSaleRow> for SaleRecord {
    type Error = RowRejection;

    fn try_from(raw: RawSaleRow) -> Result<Self, Self::Error> {
        let town = non_blank(raw.town).ok_or(RowRejection::MissingTown)?;
        let date_recorded = raw
            .date_recorded
            .as_deref()
            .and_then(parse_recorded_date)
            .ok_or(RowRejection::BadDate)?;
        let sale_amount = raw
            .sale_amount
            .as_deref()
            .and_then(parse_amount)
            .ok_or(RowRejection::BadAmount)?;

        Ok(SaleRecord {
            town,
            date_recorded,
            sale_year: date_recorded.year(),
            sale_amount,
            assessed_value: raw.assessed_value.as_deref().and_then(parse_amount),
            residential_type: non_blank(raw.residential_type),
            property_type: non_blank(raw.property_type),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a recording date such as `04/14/2021`, `4/1/2021`, `2021-04-14` or
/// `04/14/2021 12:00:00 AM`. Any time part is ignored.
pub fn parse_recorded_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split([' ', 'T']).next()?;
    ["%m/%d/%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Parses a money amount, tolerating `$` and thousands separators.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads sale records from any CSV source, skipping malformed rows.
///
/// Header-level failures (unreadable input, bad header row) are errors.
/// Row-level failures are counted in the returned [`LoadReport`].
pub fn read_sales<R: Read>(reader: R) -> Result<(Vec<SaleRecord>, LoadReport)> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    rdr.headers().context("cannot read sales header row")?;

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for (idx, result) in rdr.deserialize::<RawSaleRow>().enumerate() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                debug!(row = idx + 1, error = %e, "Unreadable sales row skipped");
                report.unreadable += 1;
                continue;
            }
        };
        match SaleRecord::try_from(raw) {
            Ok(record) => records.push(record),
            Err(reason) => {
                debug!(row = idx + 1, ?reason, "Sales row skipped");
                report.reject(reason);
            }
        }
    }

    report.kept = records.len();
    Ok((records, report))
}

/// Loads the raw sales file at `path`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_sales(path: &Path) -> Result<Vec<SaleRecord>> {
    let file =
        File::open(path).with_context(|| format!("cannot open sales file {}", path.display()))?;
    let (records, report) =
        read_sales(file).with_context(|| format!("cannot read sales file {}", path.display()))?;

    if report.skipped() > 0 {
        warn!(
            skipped = report.skipped(),
            missing_town = report.missing_town,
            bad_date = report.bad_date,
            bad_amount = report.bad_amount,
            unreadable = report.unreadable,
            "Malformed sales rows excluded"
        );
    }
    info!(rows = report.kept, "Sales loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Serial Number,List Year,Date Recorded,Town,Address,Assessed Value,Sale Amount,Sales Ratio,Property Type,Residential Type,Non Use Code,Assessor Remarks,OPM remarks,Location";

    fn csv_of(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for row in rows {
            s.push('\n');
            s.push_str(row);
        }
        s.push('\n');
        s
    }

    #[test]
    fn test_parse_recorded_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 4, 14).unwrap();
        assert_eq!(parse_recorded_date("04/14/2021"), Some(expected));
        assert_eq!(parse_recorded_date("2021-04-14"), Some(expected));
        assert_eq!(parse_recorded_date("04/14/2021 12:00:00 AM"), Some(expected));
        assert_eq!(parse_recorded_date("2021-04-14T00:00:00"), Some(expected));

        let unpadded = NaiveDate::from_ymd_opt(2021, 4, 1).unwrap();
        assert_eq!(parse_recorded_date("4/1/2021"), Some(unpadded));
        assert_eq!(parse_recorded_date("4/1/2021 12:00:00 AM"), Some(unpadded));
        assert_eq!(parse_recorded_date("2021-4-1T08:30:00"), Some(unpadded));
        assert_eq!(parse_recorded_date("sometime"), None);
        assert_eq!(parse_recorded_date(""), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("250000"), Some(250000.0));
        assert_eq!(parse_amount(" $1,250,000.50 "), Some(1250000.5));
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_read_sales_maps_typed_fields() {
        let data = csv_of(&[
            "200001,2020,04/14/2021,Hartford,1 MAIN ST,150000,250000,0.6,Residential,Single Family,,,,",
        ]);
        let (records, report) = read_sales(data.as_bytes()).unwrap();

        assert_eq!(report.kept, 1);
        assert_eq!(report.skipped(), 0);
        let r = &records[0];
        assert_eq!(r.town, "Hartford");
        assert_eq!(r.sale_year, 2021);
        assert_eq!(r.sale_amount, 250000.0);
        assert_eq!(r.assessed_value, Some(150000.0));
        assert_eq!(r.residential_type.as_deref(), Some("Single Family"));
        assert_eq!(r.property_type.as_deref(), Some("Residential"));
    }

    #[test]
    fn test_read_sales_skips_malformed_rows() {
        let data = csv_of(&[
            "1,2020,04/14/2021,,1 MAIN ST,1,100000,0.6,Residential,Condo,,,,",
            "2,2020,not a date,Hartford,1 MAIN ST,1,100000,0.6,Residential,Condo,,,,",
            "3,2020,04/14/2021,Hartford,1 MAIN ST,1,free,0.6,Residential,Condo,,,,",
            "4,2020,04/14/2021,Hartford,1 MAIN ST,1,100000,0.6,,,,,,",
        ]);
        let (records, report) = read_sales(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(report.missing_town, 1);
        assert_eq!(report.bad_date, 1);
        assert_eq!(report.bad_amount, 1);
        assert_eq!(report.skipped(), 3);
        assert_eq!(records[0].residential_type, None);
    }

    #[test]
    fn test_read_sales_tolerates_short_rows() {
        let data = format!("{HEADER}\n5,2020,2019-01-02,Andover\n");
        let (records, report) = read_sales(data.as_bytes()).unwrap();

        assert!(records.is_empty());
        assert_eq!(report.bad_amount, 1);
    }

    #[test]
    fn test_load_sales_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sales(&dir.path().join("absent.csv")).unwrap_err();
        assert!(err.to_string().contains("cannot open sales file"));
    }
}
