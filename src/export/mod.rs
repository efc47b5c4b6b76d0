//! Export and import of the full data set
//!
//! The export bundle is `{ "lists": [...], "items": [...], "exportDate": "..." }`.
//! Import replaces both collections wholesale; nothing is written unless the
//! whole file parses and validates.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::models::{ShoppingItem, ShoppingList};
use crate::storage::{KeyValueStore, StorageError};
use crate::store::{Result, ShoppingStore, StoreError};
use crate::validation::{lint_bundle, validate_bundle};

/// Everything in the store at one point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportBundle {
    pub lists: Vec<ShoppingList>,
    pub items: Vec<ShoppingItem>,
    #[serde(rename = "exportDate")]
    pub export_date: DateTime<Utc>,
}

/// Shape accepted on import; `exportDate` is informational only
#[derive(Debug, Deserialize)]
struct ImportDocument {
    lists: Vec<ShoppingList>,
    items: Vec<ShoppingItem>,
    #[serde(rename = "exportDate", default)]
    export_date: Option<String>,
}

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub lists: usize,
    pub items: usize,
    pub export_date: Option<String>,
    pub warnings: Vec<String>,
}

/// File name used when exporting without an explicit path
pub fn default_file_name(now: DateTime<Utc>) -> String {
    format!("shopping-lists-{}.json", now.timestamp_millis())
}

pub fn export_bundle<S: KeyValueStore>(store: &ShoppingStore<S>) -> Result<ExportBundle> {
    Ok(ExportBundle {
        lists: store.lists()?,
        items: store.items()?,
        export_date: Utc::now(),
    })
}

/// Pretty-printed export document
pub fn export_string<S: KeyValueStore>(store: &ShoppingStore<S>) -> Result<String> {
    let bundle = export_bundle(store)?;
    serde_json::to_string_pretty(&bundle).map_err(|source| StoreError::Serialize {
        what: "export bundle",
        source,
    })
}

/// Write the export document to `path`
pub fn export_to_file<S: KeyValueStore>(store: &ShoppingStore<S>, path: &Path) -> Result<ExportBundle> {
    let bundle = export_bundle(store)?;
    let json = serde_json::to_string_pretty(&bundle).map_err(|source| StoreError::Serialize {
        what: "export bundle",
        source,
    })?;
    fs::write(path, json).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        lists = bundle.lists.len(),
        items = bundle.items.len(),
        "Exported data"
    );
    Ok(bundle)
}

/// Replace all stored data with the contents of an export document
pub fn import_str<S: KeyValueStore>(store: &mut ShoppingStore<S>, text: &str) -> Result<ImportSummary> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::ImportFormat(format!("Failed to parse JSON: {}", e)))?;

    validate_bundle(&doc)?;

    let doc: ImportDocument = serde_json::from_value(doc)
        .map_err(|e| StoreError::ImportFormat(format!("Invalid record: {}", e)))?;

    let warnings = lint_bundle(&doc.lists, &doc.items);
    for warning in &warnings {
        warn!(%warning, "Import lint");
    }

    store.replace_all(&doc.lists, &doc.items)?;

    info!(lists = doc.lists.len(), items = doc.items.len(), "Imported data");
    Ok(ImportSummary {
        lists: doc.lists.len(),
        items: doc.items.len(),
        export_date: doc.export_date,
        warnings,
    })
}

pub fn import_file<S: KeyValueStore>(store: &mut ShoppingStore<S>, path: &Path) -> Result<ImportSummary> {
    let text = fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    import_str(store, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_file_name_uses_millis() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(default_file_name(now), "shopping-lists-1700000000123.json");
    }
}
