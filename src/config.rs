//! Runtime settings read from the environment (after `.env` is loaded).

use anyhow::{Context, Result, bail};
use std::ops::RangeInclusive;
use std::path::PathBuf;

pub const DEFAULT_ESTATE_DATA_PATH: &str = "res/estate_data.csv";
pub const DEFAULT_CENSUS_CACHE_PATH: &str = "res/census_data.csv";
pub const DEFAULT_CENSUS_API_BASE: &str = "https://api.census.gov/data";
/// FIPS code for Connecticut.
pub const DEFAULT_STATE_FIPS: &str = "09";
pub const DEFAULT_CENSUS_START_YEAR: i32 = 2011;
pub const DEFAULT_CENSUS_END_YEAR: i32 = 2022;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub estate_data_path: PathBuf,
    pub census_cache_path: PathBuf,
    pub census_api_base: String,
    pub census_state_fips: String,
    pub census_api_key: Option<String>,
    pub census_start_year: i32,
    pub census_end_year: i32,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let parse_year = |key: &str, default: i32| -> Result<i32> {
            match get(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<i32>()
                    .with_context(|| format!("{key} must be a year, got '{raw}'")),
                None => Ok(default),
            }
        };

        let census_start_year = parse_year("CENSUS_START_YEAR", DEFAULT_CENSUS_START_YEAR)?;
        let census_end_year = parse_year("CENSUS_END_YEAR", DEFAULT_CENSUS_END_YEAR)?;
        if census_start_year > census_end_year {
            bail!(
                "CENSUS_START_YEAR ({}) is after CENSUS_END_YEAR ({})",
                census_start_year,
                census_end_year
            );
        }

        let census_api_base = get("CENSUS_API_BASE")
            .unwrap_or_else(|| DEFAULT_CENSUS_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        if !census_api_base.starts_with("http://") && !census_api_base.starts_with("https://") {
            bail!("CENSUS_API_BASE must start with http:// or https://");
        }

        Ok(Self {
            estate_data_path: get("ESTATE_DATA_PATH")
                .unwrap_or_else(|| DEFAULT_ESTATE_DATA_PATH.to_string())
                .into(),
            census_cache_path: get("CENSUS_CACHE_PATH")
                .unwrap_or_else(|| DEFAULT_CENSUS_CACHE_PATH.to_string())
                .into(),
            census_api_base,
            census_state_fips: get("CENSUS_STATE_FIPS")
                .unwrap_or_else(|| DEFAULT_STATE_FIPS.to_string()),
            census_api_key: get("CENSUS_API_KEY"),
            census_start_year,
            census_end_year,
        })
    }

    pub fn census_years(&self) -> RangeInclusive<i32> {
        self.census_start_year..=self.census_end_year
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            estate_data_path: DEFAULT_ESTATE_DATA_PATH.into(),
            census_cache_path: DEFAULT_CENSUS_CACHE_PATH.into(),
            census_api_base: DEFAULT_CENSUS_API_BASE.to_string(),
            census_state_fips: DEFAULT_STATE_FIPS.to_string(),
            census_api_key: None,
            census_start_year: DEFAULT_CENSUS_START_YEAR,
            census_end_year: DEFAULT_CENSUS_END_YEAR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.census_years(), 2011..=2022);
    }

    #[test]
    fn test_overrides_are_applied() {
        let settings = Settings::from_lookup(lookup(&[
            ("ESTATE_DATA_PATH", "/data/sales.csv"),
            ("CENSUS_CACHE_PATH", "/data/census.csv"),
            ("CENSUS_API_BASE", "http://localhost:8080/data/"),
            ("CENSUS_API_KEY", "abc123"),
            ("CENSUS_START_YEAR", "2015"),
            ("CENSUS_END_YEAR", "2016"),
        ]))
        .unwrap();

        assert_eq!(settings.estate_data_path, PathBuf::from("/data/sales.csv"));
        assert_eq!(settings.census_cache_path, PathBuf::from("/data/census.csv"));
        assert_eq!(settings.census_api_base, "http://localhost:8080/data");
        assert_eq!(settings.census_api_key.as_deref(), Some("abc123"));
        assert_eq!(settings.census_years(), 2015..=2016);
    }

    #[test]
    fn test_blank_key_is_unset() {
        let settings = Settings::from_lookup(lookup(&[("CENSUS_API_KEY", "  ")])).unwrap();
        assert!(settings.census_api_key.is_none());
    }

    #[test]
    fn test_inverted_year_range_is_rejected() {
        let result = Settings::from_lookup(lookup(&[
            ("CENSUS_START_YEAR", "2020"),
            ("CENSUS_END_YEAR", "2019"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_numeric_year_is_rejected() {
        let result = Settings::from_lookup(lookup(&[("CENSUS_END_YEAR", "soon")]));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("CENSUS_END_YEAR"));
    }

    #[test]
    fn test_api_base_requires_scheme() {
        let result = Settings::from_lookup(lookup(&[("CENSUS_API_BASE", "api.census.gov")]));
        assert!(result.is_err());
    }
}
