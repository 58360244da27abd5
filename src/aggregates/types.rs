//! Row types produced by the aggregation pipeline.
//!
//! Serde names are the public column names consumed by the presentation
//! layer (e.g. `Town` is matched against boundary `Municipality` names).

use serde::Serialize;

/// Synthetic residential type meaning "not partitioned by type".
pub const ALL_RESIDENTIAL_TYPES: &str = "All";

/// Mean sale amount per (town, year), all residential types pooled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TownYearAggregate {
    #[serde(rename = "Town")]
    pub town: String,
    #[serde(rename = "Sale Year")]
    pub year: i32,
    #[serde(rename = "Sale Amount")]
    pub sale_amount: f64,
    #[serde(rename = "Sales")]
    pub sales: usize,
}

/// Mean sale amount per (town, residential type, year).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TownTypeYearAggregate {
    #[serde(rename = "Town")]
    pub town: String,
    #[serde(rename = "Residential Type")]
    pub residential_type: String,
    #[serde(rename = "Sale Year")]
    pub year: i32,
    #[serde(rename = "Sale Amount")]
    pub sale_amount: f64,
    #[serde(rename = "Sales")]
    pub sales: usize,
}

/// A sales aggregate row with demographic columns.
///
/// Rows built from a [`TownYearAggregate`] carry `"All"` and whatever the
/// demographic join found. Rows built from a [`TownTypeYearAggregate`] carry
/// their own type and no demographics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedAggregate {
    #[serde(rename = "Town")]
    pub town: String,
    #[serde(rename = "Residential Type")]
    pub residential_type: String,
    #[serde(rename = "Sale Year")]
    pub year: i32,
    #[serde(rename = "Sale Amount")]
    pub sale_amount: f64,
    #[serde(rename = "Sales")]
    pub sales: usize,
    #[serde(rename = "Population")]
    pub population: Option<u64>,
    #[serde(rename = "Median Household Income")]
    pub median_household_income: Option<f64>,
}

impl From<TownTypeYearAggregate> for EnrichedAggregate {
    fn from(row: TownTypeYearAggregate) -> Self {
        Self {
            town: row.town,
            residential_type: row.residential_type,
            year: row.year,
            sale_amount: row.sale_amount,
            sales: row.sales,
            population: None,
            median_household_income: None,
        }
    }
}

/// Year-over-year change of a town's mean sale amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRow {
    #[serde(rename = "Town")]
    pub town: String,
    #[serde(rename = "Sale Year")]
    pub year: i32,
    #[serde(rename = "Sale Amount")]
    pub sale_amount: f64,
    /// Percent change against the previous year present for this town.
    #[serde(rename = "Pct Change")]
    pub pct_change: f64,
}

/// Common accessors used by [`ViewFilter`](super::filter::ViewFilter).
pub trait ViewRow {
    fn town(&self) -> &str;
    fn year(&self) -> i32;
    /// Pooled rows report [`ALL_RESIDENTIAL_TYPES`].
    fn residential_type(&self) -> &str;
}

impl ViewRow for TownTypeYearAggregate {
    fn town(&self) -> &str {
        &self.town
    }
    fn year(&self) -> i32 {
        self.year
    }
    fn residential_type(&self) -> &str {
        &self.residential_type
    }
}

impl ViewRow for EnrichedAggregate {
    fn town(&self) -> &str {
        &self.town
    }
    fn year(&self) -> i32 {
        self.year
    }
    fn residential_type(&self) -> &str {
        &self.residential_type
    }
}

impl ViewRow for ChangeRow {
    fn town(&self) -> &str {
        &self.town
    }
    fn year(&self) -> i32 {
        self.year
    }
    fn residential_type(&self) -> &str {
        ALL_RESIDENTIAL_TYPES
    }
}
