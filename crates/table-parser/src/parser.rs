//! Locating named tables on a page, with per-scenario caching.

use stepkit_core::{Result, StepKitError};
use stepkit_store::Store;
use tracing::{debug, info, instrument, warn};

use crate::dom::{DomNode, Page};
use crate::table::{parse_table, Table};

const QA_ID: &str = "data-qa-id";

/// Finds tables on a page and remembers parsed results in the scenario store.
#[derive(Debug, Clone, Copy)]
pub struct TableParser<'s> {
    store: &'s Store,
}

impl<'s> TableParser<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// The table called `name`, cached under its own name.
    pub fn get_table<P: Page>(&self, page: &P, name: &str, force_fresh: bool) -> Result<Table> {
        self.get_table_cached_as(page, name, name, force_fresh)
    }

    /// Parse the table called `name`, reusing the copy cached under
    /// `cache_key` unless `force_fresh` is set.
    ///
    /// The cache key is used literally: "1st Quarter" is never read as the
    /// first entry of "Quarter". A fresh parse replaces the cached copy.
    #[instrument(skip(self, page))]
    pub fn get_table_cached_as<P: Page>(
        &self,
        page: &P,
        name: &str,
        cache_key: &str,
        force_fresh: bool,
    ) -> Result<Table> {
        if !force_fresh {
            if let Some(table) = self.cached(cache_key) {
                debug!("using cached table");
                return Ok(table);
            }
        }

        let element = find_table(page, name)?;
        let table = parse_table(name, &element)?;
        self.store.replace(cache_key, serde_json::to_value(&table)?);
        info!(rows = table.body.len(), "table parsed and cached");
        Ok(table)
    }

    fn cached(&self, cache_key: &str) -> Option<Table> {
        let thing = self.store.get_exact(cache_key)?;
        let value = thing.as_value()?.clone();
        match serde_json::from_value(value) {
            Ok(table) => Some(table),
            Err(err) => {
                warn!(cache_key, error = %err, "entry under table key is not a table, parsing again");
                None
            }
        }
    }
}

/// First visible `<table>` whose `data-qa-id` equals `name`, or failing
/// that whose `id` or `name` attribute contains it.
pub fn find_table<P: Page>(page: &P, name: &str) -> Result<P::Node> {
    let tables = page.find_all("table");

    let exact: Vec<P::Node> = tables
        .iter()
        .filter(|table| table.attribute(QA_ID).as_deref() == Some(name))
        .cloned()
        .collect();

    let candidates = if exact.is_empty() {
        tables
            .into_iter()
            .filter(|table| {
                ["id", "name"].iter().any(|attr| {
                    table
                        .attribute(attr)
                        .is_some_and(|value| value.contains(name))
                })
            })
            .collect()
    } else {
        exact
    };

    if candidates.is_empty() {
        return Err(StepKitError::TableNotFound {
            name: name.to_string(),
        });
    }

    candidates
        .into_iter()
        .find(|table| table.is_visible())
        .ok_or_else(|| StepKitError::TableNotVisible {
            name: name.to_string(),
        })
}
