use crate::aggregates::types::ViewRow;

/// Filter parameters supplied by the presentation layer. Unset fields match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub year: Option<i32>,
    pub residential_type: Option<String>,
    pub town: Option<String>,
}

impl ViewFilter {
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn residential_type(mut self, residential_type: impl Into<String>) -> Self {
        self.residential_type = Some(residential_type.into());
        self
    }

    pub fn town(mut self, town: impl Into<String>) -> Self {
        self.town = Some(town.into());
        self
    }

    pub fn matches<R: ViewRow>(&self, row: &R) -> bool {
        self.year.is_none_or(|year| row.year() == year)
            && self
                .town
                .as_deref()
                .is_none_or(|town| row.town() == town)
            && self
                .residential_type
                .as_deref()
                .is_none_or(|kind| row.residential_type() == kind)
    }

    /// Keeps the rows that match. An empty result is not an error.
    pub fn apply<R: ViewRow>(&self, rows: Vec<R>) -> Vec<R> {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}
