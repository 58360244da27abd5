//! The loaded tables and the queries the presentation layer calls.

use anyhow::{Result, bail};
use std::collections::BTreeSet;
use tracing::info;

use crate::aggregates::change;
use crate::aggregates::enrich::join_demographics;
use crate::aggregates::group::{town_type_year_means, town_year_means};
use crate::aggregates::{
    ALL_RESIDENTIAL_TYPES, ChangeRow, EnrichedAggregate, TownTypeYearAggregate, ViewFilter,
};
use crate::census::{CensusApiClient, CensusLoader, DemographicRecord};
use crate::config::Settings;
use crate::fetch::BasicClient;
use crate::fetch::auth::UrlParam;
use crate::sales::{SaleRecord, load_sales};

/// Immutable sales and demographic tables.
///
/// Built once, then shared by reference. Every query rescans the sales table;
/// nothing is cached between calls, so concurrent readers need no locking.
#[derive(Debug, Clone, Default)]
pub struct EstateContext {
    sales: Vec<SaleRecord>,
    demographics: Vec<DemographicRecord>,
}

/// Whether [`EstateContext::open`] may call the census API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CensusMode {
    /// Use the cache, fetching it on a cold start.
    FetchIfMissing,
    /// Use the cache only; a missing cache is an error.
    Offline,
}

impl EstateContext {
    pub fn new(sales: Vec<SaleRecord>, demographics: Vec<DemographicRecord>) -> Self {
        Self {
            sales,
            demographics,
        }
    }

    /// Loads both tables as described by `settings`.
    #[tracing::instrument(skip(settings))]
    pub async fn open(settings: &Settings, mode: CensusMode) -> Result<Self> {
        let loader = census_loader(settings);
        let demographics = match mode {
            CensusMode::Offline => {
                if !loader.has_cache() {
                    bail!(
                        "census cache {} is missing and offline mode forbids fetching it",
                        loader.cache_path().display()
                    );
                }
                loader.load_cached()?
            }
            CensusMode::FetchIfMissing => {
                let source = census_source(settings)?;
                loader.get_demographics(&source).await?
            }
        };

        let sales = load_sales(&settings.estate_data_path)?;
        info!(
            sales = sales.len(),
            demographics = demographics.len(),
            "Estate context ready"
        );
        Ok(Self::new(sales, demographics))
    }

    pub fn sales(&self) -> &[SaleRecord] {
        &self.sales
    }

    pub fn demographics(&self) -> &[DemographicRecord] {
        &self.demographics
    }

    /// Mean sale amount per (town, year), tagged `"All"` and left-joined
    /// with demographics.
    pub fn town_year_mean(&self) -> Vec<EnrichedAggregate> {
        join_demographics(town_year_means(&self.sales), &self.demographics)
    }

    /// Mean sale amount per (town, residential type, year). No demographics.
    pub fn town_type_year_mean(&self) -> Vec<TownTypeYearAggregate> {
        town_type_year_means(&self.sales)
    }

    /// [`town_year_mean`](Self::town_year_mean) rows followed by
    /// [`town_type_year_mean`](Self::town_type_year_mean) rows.
    pub fn combined(&self) -> Vec<EnrichedAggregate> {
        let mut rows = self.town_year_mean();
        rows.extend(
            self.town_type_year_mean()
                .into_iter()
                .map(EnrichedAggregate::from),
        );
        rows
    }

    /// Year-over-year percent change of each town's mean sale amount.
    pub fn change_series(&self) -> Vec<ChangeRow> {
        change::change_series(&town_year_means(&self.sales))
    }

    pub fn town_year_mean_filtered(&self, filter: &ViewFilter) -> Vec<EnrichedAggregate> {
        filter.apply(self.town_year_mean())
    }

    pub fn town_type_year_mean_filtered(&self, filter: &ViewFilter) -> Vec<TownTypeYearAggregate> {
        filter.apply(self.town_type_year_mean())
    }

    pub fn combined_filtered(&self, filter: &ViewFilter) -> Vec<EnrichedAggregate> {
        filter.apply(self.combined())
    }

    pub fn change_series_filtered(&self, filter: &ViewFilter) -> Vec<ChangeRow> {
        filter.apply(self.change_series())
    }

    /// Distinct sale years, ascending.
    pub fn available_years(&self) -> Vec<i32> {
        self.sales
            .iter()
            .map(|s| s.sale_year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `"All"` followed by the distinct raw residential types, sorted.
    pub fn residential_types(&self) -> Vec<String> {
        let raw: BTreeSet<&str> = self
            .sales
            .iter()
            .filter_map(|s| s.residential_type.as_deref())
            .filter(|t| *t != ALL_RESIDENTIAL_TYPES)
            .collect();

        std::iter::once(ALL_RESIDENTIAL_TYPES)
            .chain(raw)
            .map(str::to_string)
            .collect()
    }

    /// Distinct towns, sorted.
    pub fn towns(&self) -> Vec<String> {
        self.sales
            .iter()
            .map(|s| s.town.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

pub fn census_loader(settings: &Settings) -> CensusLoader {
    CensusLoader::new(&settings.census_cache_path, settings.census_years())
}

pub fn census_source(settings: &Settings) -> Result<CensusApiClient<UrlParam<BasicClient>>> {
    let client = UrlParam::census_key(BasicClient::new()?, settings.census_api_key.clone());
    Ok(CensusApiClient::new(
        client,
        settings.census_api_base.clone(),
        settings.census_state_fips.clone(),
    ))
}
