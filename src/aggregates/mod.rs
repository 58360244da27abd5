//! Sales aggregation: grouped means, the demographic join, year-over-year
//! change and view filtering.

pub mod change;
pub mod enrich;
pub mod filter;
pub mod group;
pub mod types;
pub mod utility;

pub use filter::ViewFilter;
pub use types::{
    ALL_RESIDENTIAL_TYPES, ChangeRow, EnrichedAggregate, TownTypeYearAggregate,
    TownYearAggregate, ViewRow,
};
