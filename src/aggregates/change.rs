use crate::aggregates::types::{ChangeRow, TownYearAggregate};
use crate::aggregates::utility::pct_change;

/// Computes the percent change of each town's mean sale amount.
///
/// `rows` must be sorted by (town, year), as produced by
/// [`town_year_means`](super::group::town_year_means). Each row is compared
/// with the previous row of the same town, whatever the year gap. A town's
/// first row and rows with an undefined change are dropped.
pub fn change_series(rows: &[TownYearAggregate]) -> Vec<ChangeRow> {
    rows.windows(2)
        .filter(|pair| pair[0].town == pair[1].town && !pair[1].town.is_empty())
        .filter_map(|pair| {
            let (previous, current) = (&pair[0], &pair[1]);
            let pct = pct_change(previous.sale_amount, current.sale_amount)?;
            Some(ChangeRow {
                town: current.town.clone(),
                year: current.year,
                sale_amount: current.sale_amount,
                pct_change: pct,
            })
        })
        .collect()
}
