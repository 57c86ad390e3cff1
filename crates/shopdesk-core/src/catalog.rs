//! # Catalog Filter
//!
//! The salesperson's item picker: text search over name and code, an
//! optional category, and only items that can still be sold.

use serde::Deserialize;

use crate::types::Item;

/// Item picker query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilter {
    /// Case-insensitive substring of the name or code.
    pub search: Option<String>,
    /// `None` (or `"all"`) for every category.
    pub category_id: Option<String>,
}

impl CatalogFilter {
    /// Checks if an item should be shown in the picker.
    pub fn matches(&self, item: &Item) -> bool {
        if !item.in_stock() {
            return false;
        }

        let category_ok = match self.category_id.as_deref() {
            None | Some("all") | Some("") => true,
            Some(id) => item.category_id.as_deref() == Some(id),
        };

        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                item.name.to_lowercase().contains(&term) || item.code.to_lowercase().contains(&term)
            }
        };

        category_ok && search_ok
    }

    /// Filters a catalog, keeping order.
    pub fn apply(&self, items: Vec<Item>) -> Vec<Item> {
        items.into_iter().filter(|i| self.matches(i)).collect()
    }
}
