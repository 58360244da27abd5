//! Census enrichment: per-town, per-year demographics.
//!
//! [`CensusSource`] is the seam over the external demographic API, with
//! [`CensusApiClient`] as the ACS implementation. [`CensusLoader`] owns the
//! flat cache file and decides when a source is consulted at all.

mod api;
mod cache;
mod loader;

pub use api::{CensusApiClient, parse_acs_response};
pub use cache::{read_cache, write_cache};
pub use loader::CensusLoader;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One row of demographics for a town in a given year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicRecord {
    #[serde(rename = "Town")]
    pub town: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Population")]
    pub population: Option<u64>,
    #[serde(rename = "Median Household Income")]
    pub median_household_income: Option<f64>,
    /// Composite state + county + county-subdivision code. Absent in caches
    /// written by older tooling.
    #[serde(rename = "GEO_ID", default)]
    pub geo_id: Option<String>,
}

/// Abstraction over a provider of yearly county-subdivision demographics.
#[async_trait::async_trait]
pub trait CensusSource: Send + Sync {
    /// Returns the batch for `year`, already tagged with that year.
    async fn fetch_year(&self, year: i32) -> Result<Vec<DemographicRecord>>;
}

/// Derives the town name from a census place name.
///
/// `"Andover town, Tolland County, Connecticut"` becomes `"Andover"`. Names
/// without a `" town"` marker are returned trimmed but otherwise unchanged.
pub fn normalize_town(name: &str) -> String {
    match name.find(" town") {
        Some(idx) => name[..idx].trim().to_string(),
        None => name.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_town_strips_suffix_and_rest() {
        assert_eq!(
            normalize_town("Andover town, Tolland County, Connecticut"),
            "Andover"
        );
        assert_eq!(
            normalize_town("Windsor Locks town, Hartford County, Connecticut"),
            "Windsor Locks"
        );
    }

    #[test]
    fn test_normalize_town_without_marker() {
        assert_eq!(
            normalize_town("County subdivisions not defined, Fairfield County, Connecticut"),
            "County subdivisions not defined, Fairfield County, Connecticut"
        );
        assert_eq!(normalize_town(" Hartford "), "Hartford");
    }

    #[test]
    fn test_normalize_town_only_matches_whole_marker() {
        // "Newtown" has no space before "town"
        assert_eq!(
            normalize_town("Newtown town, Fairfield County, Connecticut"),
            "Newtown"
        );
    }
}
