use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::warn;

use crate::aggregates::types::{ALL_RESIDENTIAL_TYPES, EnrichedAggregate, TownYearAggregate};
use crate::census::DemographicRecord;

/// Left-joins demographics onto town-year aggregates on (town, year).
///
/// Every input row yields exactly one output row, in input order. Rows with
/// no demographic match keep null demographic columns. When the demographic
/// set holds the same key twice, the first record wins.
pub fn join_demographics(
    rows: Vec<TownYearAggregate>,
    demographics: &[DemographicRecord],
) -> Vec<EnrichedAggregate> {
    let mut by_key: HashMap<(&str, i32), &DemographicRecord> = HashMap::new();
    for record in demographics {
        match by_key.entry((record.town.as_str(), record.year)) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(_) => {
                warn!(
                    town = %record.town,
                    year = record.year,
                    "Duplicate demographic record ignored"
                );
            }
        }
    }

    rows.into_iter()
        .map(|row| {
            let matched = by_key.get(&(row.town.as_str(), row.year));
            EnrichedAggregate {
                population: matched.and_then(|d| d.population),
                median_household_income: matched.and_then(|d| d.median_household_income),
                town: row.town,
                residential_type: ALL_RESIDENTIAL_TYPES.to_string(),
                year: row.year,
                sale_amount: row.sale_amount,
                sales: row.sales,
            }
        })
        .collect()
}
