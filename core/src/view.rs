//! The filtered and sorted projection the UI renders.
//!
//! `project` is a pure function of the authoritative items and the current
//! `ViewParameters`: image filter, then name search, then a stable sort on
//! the case-folded name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Item;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort order: {0}")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            _ => Err(ParseSortOrderError(s.to_string())),
        }
    }
}

/// UI-owned view state. Never sent to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParameters {
    pub search_term: String,
    pub sort_order: SortOrder,
    pub only_with_image: bool,
}

impl ViewParameters {
    pub fn with_search(mut self, term: &str) -> Self {
        self.search_term = term.to_string();
        self
    }

    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    pub fn with_only_images(mut self, only_with_image: bool) -> Self {
        self.only_with_image = only_with_image;
        self
    }
}

fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Filter then sort. Equal folded names keep their input order in both
/// directions.
pub fn project<'a>(items: &'a [Item], params: &ViewParameters) -> Vec<&'a Item> {
    let needle = fold(&params.search_term);

    let mut keyed: Vec<(String, &Item)> = items
        .iter()
        .filter(|item| !params.only_with_image || item.has_image())
        .map(|item| (fold(&item.name), item))
        .filter(|(name, _)| needle.is_empty() || (!name.is_empty() && name.contains(&needle)))
        .collect();

    // `sort_by` is stable; flipping the comparison (not reversing the
    // output) keeps ties in input order for descending too.
    match params.sort_order {
        SortOrder::Ascending => keyed.sort_by(|(a, _), (b, _)| a.cmp(b)),
        SortOrder::Descending => keyed.sort_by(|(a, _), (b, _)| b.cmp(a)),
    }

    keyed.into_iter().map(|(_, item)| item).collect()
}
