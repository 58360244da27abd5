use anyhow::{Result, bail};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{Instrument, info, warn};

use super::{CensusSource, DemographicRecord, read_cache, write_cache};

/// Owns the demographic cache file and the year range it should cover.
///
/// Reading and refreshing are separate operations: [`load_cached`] never
/// touches the network, [`refresh`] always does, and [`get_demographics`]
/// only fetches on a cold start.
///
/// [`load_cached`]: CensusLoader::load_cached
/// [`refresh`]: CensusLoader::refresh
/// [`get_demographics`]: CensusLoader::get_demographics
#[derive(Debug, Clone)]
pub struct CensusLoader {
    cache_path: PathBuf,
    years: RangeInclusive<i32>,
}

impl CensusLoader {
    pub fn new(cache_path: impl Into<PathBuf>, years: RangeInclusive<i32>) -> Self {
        Self {
            cache_path: cache_path.into(),
            years,
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn has_cache(&self) -> bool {
        self.cache_path.exists()
    }

    pub fn load_cached(&self) -> Result<Vec<DemographicRecord>> {
        read_cache(&self.cache_path)
    }

    /// Fetches every year in range from `source` and rewrites the cache.
    ///
    /// Any failing year aborts the refresh before the cache is touched, and so
    /// does a range for which the source returned no rows at all.
    #[tracing::instrument(skip(self, source), fields(cache = %self.cache_path.display()))]
    pub async fn refresh<S: CensusSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Vec<DemographicRecord>> {
        if self.years.is_empty() {
            bail!(
                "census year range {}..={} is empty",
                self.years.start(),
                self.years.end()
            );
        }

        let mut records = Vec::new();
        for year in self.years.clone() {
            let span = tracing::info_span!("census_year", year);
            let batch = source.fetch_year(year).instrument(span).await?;
            if batch.is_empty() {
                warn!(year, "Census source returned no rows");
            }
            records.extend(batch);
        }

        if records.is_empty() {
            bail!(
                "census source returned no rows for {}..={}",
                self.years.start(),
                self.years.end()
            );
        }

        write_cache(&self.cache_path, &records)?;
        info!(rows = records.len(), "Census refresh complete");
        Ok(records)
    }

    /// Loads the cache when present, otherwise fetches and writes it.
    pub async fn get_demographics<S: CensusSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Vec<DemographicRecord>> {
        if self.has_cache() {
            info!(cache = %self.cache_path.display(), "Loading census data from cache");
            self.load_cached()
        } else {
            info!(cache = %self.cache_path.display(), "Census cache absent, fetching");
            self.refresh(source).await
        }
    }
}
