use std::collections::BTreeMap;

use crate::aggregates::types::{TownTypeYearAggregate, TownYearAggregate};
use crate::aggregates::utility::mean;
use crate::sales::SaleRecord;

/// Groups sales by (town, year) and averages the sale amount.
///
/// Output is sorted ascending by (town, year), one row per pair present.
pub fn town_year_means(sales: &[SaleRecord]) -> Vec<TownYearAggregate> {
    let mut series: BTreeMap<(&str, i32), Vec<f64>> = BTreeMap::new();

    for sale in sales {
        if sale.town.is_empty() {
            continue;
        }
        series
            .entry((sale.town.as_str(), sale.sale_year))
            .or_default()
            .push(sale.sale_amount);
    }

    series
        .into_iter()
        .map(|((town, year), amounts)| TownYearAggregate {
            town: town.to_string(),
            year,
            sale_amount: mean(&amounts),
            sales: amounts.len(),
        })
        .collect()
}

/// Groups sales by (town, residential type, year) and averages the sale amount.
///
/// Sales without a residential type have no group and are left out. Output is
/// sorted ascending by (town, year), ties by residential type.
pub fn town_type_year_means(sales: &[SaleRecord]) -> Vec<TownTypeYearAggregate> {
    let mut series: BTreeMap<(&str, i32, &str), Vec<f64>> = BTreeMap::new();

    for sale in sales {
        let Some(residential_type) = sale.residential_type.as_deref() else {
            continue;
        };
        if sale.town.is_empty() {
            continue;
        }
        series
            .entry((sale.town.as_str(), sale.sale_year, residential_type))
            .or_default()
            .push(sale.sale_amount);
    }

    series
        .into_iter()
        .map(|((town, year, residential_type), amounts)| TownTypeYearAggregate {
            town: town.to_string(),
            residential_type: residential_type.to_string(),
            year,
            sale_amount: mean(&amounts),
            sales: amounts.len(),
        })
        .collect()
}
