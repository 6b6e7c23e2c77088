//! Filter catalog access and name mapping.
//!
//! The engine's filter catalog is expensive to enumerate (each query leaks
//! memory on the remote side), so each direction is fetched at most once
//! per session and kept for the session's lifetime. There is no
//! invalidation: a session assumes the catalog does not change under it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bridge::{BridgeError, FilterFactory, PropertyValue, PropertyValueKind, prop_lookup};
use crate::error::FilterDirection;

/// Filter flag marking import capability.
pub const SFX_FILTER_IMPORT: i64 = 1;
/// Filter flag marking export capability.
pub const SFX_FILTER_EXPORT: i64 = 2;

/// One filter from the engine's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    /// Canonical filter identifier.
    pub name: String,
    /// Document service the filter belongs to.
    pub document_service: String,
    /// Engine type name the filter reads or writes.
    pub type_name: String,
    /// Free-form metadata: aliases, extensions, flags.
    pub user_data: Vec<String>,
    /// Capability bitmask.
    pub flags: i64,
}

impl FilterDescriptor {
    /// Build a descriptor from a catalog property set.
    ///
    /// Missing properties fall back to empty values.
    pub fn from_properties(properties: &[PropertyValue]) -> Self {
        let string = |name: &str| {
            prop_lookup(properties, name)
                .and_then(PropertyValueKind::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let user_data = match prop_lookup(properties, "UserData") {
            Some(PropertyValueKind::StrList(items)) => items.clone(),
            Some(PropertyValueKind::Str(item)) => vec![item.clone()],
            _ => Vec::new(),
        };

        Self {
            name: string("Name"),
            document_service: string("DocumentService"),
            type_name: string("Type"),
            user_data,
            flags: prop_lookup(properties, "Flags")
                .and_then(PropertyValueKind::as_int)
                .unwrap_or(0),
        }
    }

    /// Whether the filter can import.
    pub fn can_import(&self) -> bool {
        self.flags & SFX_FILTER_IMPORT != 0
    }

    /// Whether the filter can export.
    pub fn can_export(&self) -> bool {
        self.flags & SFX_FILTER_EXPORT != 0
    }
}

/// Alias/extension to canonical filter name.
///
/// Ordered so that listing the valid names is already sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterAliasTable {
    names: BTreeMap<String, String>,
}

impl FilterAliasTable {
    /// Build the table from a filter sequence.
    ///
    /// Every filter maps its own name. `UserData` entries are added as
    /// aliases except empty strings, the literal `"true"`, and anything that
    /// looks like a path or file name (contains `/`, `\` or `.`).
    pub fn from_filters(filters: &[FilterDescriptor]) -> Self {
        let mut names = BTreeMap::new();
        for filter in filters {
            names.insert(filter.name.clone(), filter.name.clone());
            for alias in filter.user_data.iter().filter(|a| is_usable_alias(a)) {
                names.insert(alias.clone(), filter.name.clone());
            }
        }
        Self { names }
    }

    /// Canonical filter name for `alias`.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.names.get(alias).map(String::as_str)
    }

    /// Whether `alias` is known.
    pub fn contains(&self, alias: &str) -> bool {
        self.names.contains_key(alias)
    }

    /// All known aliases, sorted.
    pub fn sorted_names(&self) -> Vec<String> {
        self.names.keys().cloned().collect()
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(alias, canonical name)` pairs in alias order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn is_usable_alias(alias: &str) -> bool {
    !alias.is_empty() && alias != "true" && !alias.contains(['/', '\\', '.'])
}

type FilterCache = Mutex<Option<Arc<Vec<FilterDescriptor>>>>;

/// Lazily populated, memoized view of the engine's filter catalog.
#[derive(Debug)]
pub struct FilterRegistry {
    factory: Arc<dyn FilterFactory>,
    import_filters: FilterCache,
    export_filters: FilterCache,
}

impl FilterRegistry {
    /// Catalog query selecting import filters.
    pub const IMPORT_QUERY: &'static str = "getSortedFilterList():iflags=1";
    /// Catalog query selecting export filters.
    pub const EXPORT_QUERY: &'static str = "getSortedFilterList():iflags=2";

    /// Create an empty registry over `factory`.
    pub fn new(factory: Arc<dyn FilterFactory>) -> Self {
        Self {
            factory,
            import_filters: Mutex::new(None),
            export_filters: Mutex::new(None),
        }
    }

    /// Import filters, fetched on first call only.
    pub fn available_import_filters(&self) -> Result<Arc<Vec<FilterDescriptor>>, BridgeError> {
        self.cached(FilterDirection::Import)
    }

    /// Export filters, fetched on first call only.
    pub fn available_export_filters(&self) -> Result<Arc<Vec<FilterDescriptor>>, BridgeError> {
        self.cached(FilterDirection::Export)
    }

    /// Alias table for one direction.
    pub fn filter_names(
        &self,
        direction: FilterDirection,
    ) -> Result<FilterAliasTable, BridgeError> {
        let filters = self.cached(direction)?;
        Ok(FilterAliasTable::from_filters(&filters))
    }

    /// Export filter converting `import_type` documents to `export_type`.
    ///
    /// Scans export filters in catalog order and returns the first whose
    /// document service and type both match. The engine is expected to have
    /// at most one such filter.
    pub fn resolve_filter(
        &self,
        import_type: &str,
        export_type: &str,
    ) -> Result<Option<String>, BridgeError> {
        let filters = self.available_export_filters()?;
        let mut matches = filters
            .iter()
            .filter(|f| f.document_service == import_type && f.type_name == export_type);

        let found = matches.next().map(|f| f.name.clone());

        if cfg!(debug_assertions) {
            let others: Vec<&str> = matches.map(|f| f.name.as_str()).collect();
            if !others.is_empty() {
                warn!(
                    import_type,
                    export_type,
                    chosen = ?found,
                    ignored = ?others,
                    "Multiple export filters match; using the first in catalog order"
                );
            }
        }

        Ok(found)
    }

    fn cached(
        &self,
        direction: FilterDirection,
    ) -> Result<Arc<Vec<FilterDescriptor>>, BridgeError> {
        let (slot, query) = match direction {
            FilterDirection::Import => (&self.import_filters, Self::IMPORT_QUERY),
            FilterDirection::Export => (&self.export_filters, Self::EXPORT_QUERY),
        };

        let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(filters) = guard.as_ref() {
            return Ok(Arc::clone(filters));
        }

        let filters: Vec<FilterDescriptor> = self
            .factory
            .query(query)?
            .iter()
            .map(|props| FilterDescriptor::from_properties(props))
            .collect();
        debug!(%direction, count = filters.len(), "Fetched filter catalog");

        let filters = Arc::new(filters);
        *guard = Some(Arc::clone(&filters));
        Ok(filters)
    }
}
