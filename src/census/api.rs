use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::{CensusSource, DemographicRecord, normalize_town};
use crate::fetch::{HttpClient, fetch_bytes};

/// ACS variable for median household income in the past 12 months.
const INCOME_VAR: &str = "B19013_001E";
/// ACS variable for total population.
const POPULATION_VAR: &str = "B01003_001E";

/// Client for the ACS 5-year county-subdivision tables.
pub struct CensusApiClient<C> {
    client: C,
    base_url: String,
    state_fips: String,
}

impl<C: HttpClient> CensusApiClient<C> {
    pub fn new(client: C, base_url: impl Into<String>, state_fips: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            state_fips: state_fips.into(),
        }
    }

    pub fn year_url(&self, year: i32) -> String {
        format!(
            "{}/{}/acs/acs5?get=NAME,{},{}&for=county%20subdivision:*&in=state:{}",
            self.base_url, year, INCOME_VAR, POPULATION_VAR, self.state_fips
        )
    }
}

#[async_trait]
impl<C: HttpClient> CensusSource for CensusApiClient<C> {
    #[tracing::instrument(skip(self))]
    async fn fetch_year(&self, year: i32) -> Result<Vec<DemographicRecord>> {
        let url = self.year_url(year);
        let bytes = fetch_bytes(&self.client, &url).await?;
        let records = parse_acs_response(&bytes, year)
            .with_context(|| format!("unexpected census response for {year}"))?;
        debug!(rows = records.len(), "Census batch parsed");
        Ok(records)
    }
}

/// Parses an ACS JSON body (array of string arrays, header first) into
/// records tagged with `year`.
///
/// Columns are located by header name, so the API reordering them is fine.
/// Missing required columns are an error. Negative values are the API's
/// annotation sentinels (e.g. `-666666666`) and become `None`.
pub fn parse_acs_response(bytes: &[u8], year: i32) -> Result<Vec<DemographicRecord>> {
    let rows: Vec<Vec<Option<String>>> = serde_json::from_slice(bytes)?;
    let mut rows = rows.into_iter();
    let header = rows.next().ok_or_else(|| anyhow!("empty response"))?;

    let column = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| h.as_deref() == Some(name))
            .ok_or_else(|| anyhow!("missing column '{name}'"))
    };

    let name_idx = column("NAME")?;
    let income_idx = column(INCOME_VAR)?;
    let population_idx = column(POPULATION_VAR)?;
    let state_idx = column("state")?;
    let county_idx = column("county")?;
    let cousub_idx = column("county subdivision")?;

    let cell = |row: &[Option<String>], idx: usize| -> Option<String> {
        row.get(idx).cloned().flatten()
    };

    let mut records = Vec::new();
    for row in rows {
        let Some(name) = cell(&row, name_idx) else {
            warn!(year, "Census row without NAME skipped");
            continue;
        };

        let geo_id = match (
            cell(&row, state_idx),
            cell(&row, county_idx),
            cell(&row, cousub_idx),
        ) {
            (Some(s), Some(c), Some(t)) => Some(format!("{s}{c}{t}")),
            _ => None,
        };

        records.push(DemographicRecord {
            town: normalize_town(&name),
            year,
            population: cell(&row, population_idx)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| *v >= 0)
                .map(|v| v as u64),
            median_household_income: cell(&row, income_idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| *v >= 0.0),
            geo_id,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    const SAMPLE: &str = r#"[
        ["NAME","B19013_001E","B01003_001E","state","county","county subdivision"],
        ["Andover town, Tolland County, Connecticut","101250","3269","09","013","01080"],
        ["Hartford town, Hartford County, Connecticut","34338","121054","09","003","37070"],
        ["County subdivisions not defined, Tolland County, Connecticut","-666666666","0","09","013","00000"]
    ]"#;

    #[test]
    fn test_parse_acs_response() {
        let records = parse_acs_response(SAMPLE.as_bytes(), 2019).unwrap();
        assert_eq!(records.len(), 3);

        let andover = &records[0];
        assert_eq!(andover.town, "Andover");
        assert_eq!(andover.year, 2019);
        assert_eq!(andover.population, Some(3269));
        assert_eq!(andover.median_household_income, Some(101250.0));
        assert_eq!(andover.geo_id.as_deref(), Some("0901301080"));

        assert_eq!(records[1].town, "Hartford");
    }

    #[test]
    fn test_parse_acs_sentinel_becomes_none() {
        let records = parse_acs_response(SAMPLE.as_bytes(), 2019).unwrap();
        assert_eq!(records[2].median_household_income, None);
        assert_eq!(records[2].population, Some(0));
    }

    #[test]
    fn test_parse_acs_handles_reordered_and_null_cells() {
        let body = r#"[
            ["state","county","county subdivision","B01003_001E","NAME","B19013_001E"],
            ["09","003","37070","121054","Hartford town, Hartford County, Connecticut",null]
        ]"#;
        let records = parse_acs_response(body.as_bytes(), 2020).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].town, "Hartford");
        assert_eq!(records[0].population, Some(121054));
        assert_eq!(records[0].median_household_income, None);
    }

    #[test]
    fn test_parse_acs_missing_column_is_error() {
        let body = r#"[["NAME","state"],["Hartford town","09"]]"#;
        let err = parse_acs_response(body.as_bytes(), 2020).unwrap_err();
        assert!(err.to_string().contains("B19013_001E"));
    }

    #[test]
    fn test_parse_acs_garbage_is_error() {
        assert!(parse_acs_response(b"<html>rate limited</html>", 2020).is_err());
        assert!(parse_acs_response(b"[]", 2020).is_err());
    }

    #[test]
    fn test_year_url() {
        let client = CensusApiClient::new(
            BasicClient::new().unwrap(),
            "https://api.census.gov/data",
            "09",
        );
        assert_eq!(
            client.year_url(2015),
            "https://api.census.gov/data/2015/acs/acs5?get=NAME,B19013_001E,B01003_001E&for=county%20subdivision:*&in=state:09"
        );
    }
}
