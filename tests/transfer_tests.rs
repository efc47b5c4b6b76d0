// Integration tests for export and import
// Tests round-tripping, wholesale replacement and rejection of bad files

mod common;

use anyhow::Result;
use basket::export::{export_bundle, export_string, export_to_file, import_file, import_str};
use basket::storage::{KeyValueStore, ITEMS_KEY, LISTS_KEY};
use basket::store::StoreError;
use common::{list_with_items, memory_store};
use tempfile::TempDir;

#[test]
fn test_export_then_import_restores_everything() -> Result<()> {
    let mut source = memory_store();
    let weekly = list_with_items(&mut source, "Weekly", &[("milk", true), ("eggs", false)])?;
    source.mark_as_template(&weekly.id)?;
    list_with_items(&mut source, "Party", &[("chips", false)])?;

    let json = export_string(&source)?;

    let mut target = memory_store();
    let summary = import_str(&mut target, &json)?;

    assert_eq!(summary.lists, 2);
    assert_eq!(summary.items, 3);
    assert!(summary.export_date.is_some());
    assert!(summary.warnings.is_empty());
    assert_eq!(target.lists()?, source.lists()?);
    assert_eq!(target.items()?, source.items()?);
    Ok(())
}

#[test]
fn test_export_format_keys() -> Result<()> {
    let mut store = memory_store();
    list_with_items(&mut store, "Weekly", &[("milk", false)])?;

    let doc: serde_json::Value = serde_json::from_str(&export_string(&store)?)?;
    assert!(doc["lists"].is_array());
    assert!(doc["items"].is_array());
    assert!(doc["exportDate"].is_string());
    assert_eq!(doc["items"][0]["unit"], "pcs");
    assert_eq!(doc["items"][0]["checked"], false);
    Ok(())
}

#[test]
fn test_import_replaces_instead_of_merging() -> Result<()> {
    let mut source = memory_store();
    list_with_items(&mut source, "Imported", &[("tea", false)])?;
    let json = export_string(&source)?;

    let mut target = memory_store();
    list_with_items(&mut target, "Local", &[("coffee", false), ("sugar", false)])?;

    import_str(&mut target, &json)?;

    let names: Vec<String> = target.lists()?.into_iter().map(|l| l.name).collect();
    assert_eq!(names, vec!["Imported"]);
    assert_eq!(target.items()?.len(), 1);
    Ok(())
}

#[test]
fn test_import_missing_key_leaves_storage_untouched() -> Result<()> {
    let mut store = memory_store();
    list_with_items(&mut store, "Local", &[("coffee", false)])?;
    let lists_raw = store.backend().get(LISTS_KEY)?;
    let items_raw = store.backend().get(ITEMS_KEY)?;

    let err = import_str(&mut store, r#"{ "lists": [] }"#).unwrap_err();

    assert!(matches!(err, StoreError::ImportFormat(_)));
    assert_eq!(store.backend().get(LISTS_KEY)?, lists_raw);
    assert_eq!(store.backend().get(ITEMS_KEY)?, items_raw);
    Ok(())
}

#[test]
fn test_import_unparsable_file_is_descriptive() -> Result<()> {
    let mut store = memory_store();
    list_with_items(&mut store, "Local", &[])?;

    let err = import_str(&mut store, "not json at all").unwrap_err();
    assert!(err.to_string().contains("Failed to parse JSON"));
    assert_eq!(store.lists()?.len(), 1);
    Ok(())
}

#[test]
fn test_import_accepts_empty_collections_without_date() -> Result<()> {
    let mut store = memory_store();
    list_with_items(&mut store, "Local", &[("coffee", false)])?;

    let summary = import_str(&mut store, r#"{ "lists": [], "items": [] }"#)?;

    assert_eq!(summary.export_date, None);
    assert!(store.lists()?.is_empty());
    assert!(store.items()?.is_empty());
    Ok(())
}

#[test]
fn test_import_reports_lint_warnings() -> Result<()> {
    let json = r#"{
        "lists": [],
        "items": [{
            "id": "i1", "shopping_list_id": "gone", "name": "milk",
            "created_date": "2024-01-01T00:00:00Z", "updated_date": "2024-01-01T00:00:00Z"
        }]
    }"#;
    let mut store = memory_store();

    let summary = import_str(&mut store, json)?;

    assert_eq!(summary.items, 1);
    assert_eq!(summary.warnings.len(), 1);
    assert!(summary.warnings[0].contains("non-existent list gone"));
    Ok(())
}

#[test]
fn test_import_null_quantity_reads_as_default() -> Result<()> {
    let json = r#"{
        "lists": [{
            "id": "l1", "name": "Weekly", "is_template": true,
            "created_date": "2024-03-01T09:30:00.000Z", "updated_date": "2024-03-01T09:30:00.000Z"
        }],
        "items": [{
            "id": "i1", "shopping_list_id": "l1", "name": "milk",
            "quantity": null, "unit": "pcs", "category": "dairy", "section": "dairy",
            "notes": null, "checked": false,
            "created_date": "2024-03-01T09:30:00.000Z", "updated_date": "2024-03-01T09:30:00.000Z"
        }],
        "exportDate": "2024-03-02T10:00:00.000Z"
    }"#;
    let mut store = memory_store();

    let summary = import_str(&mut store, json)?;

    assert_eq!(summary.items, 1);
    let items = store.items()?;
    assert_eq!(items[0].quantity, 1.0);
    assert_eq!(items[0].notes, None);
    assert!(store.lists()?[0].is_template());
    Ok(())
}

#[test]
fn test_file_round_trip() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("backup.json");

    let mut source = memory_store();
    list_with_items(&mut source, "Weekly", &[("milk", false)])?;
    let bundle = export_to_file(&source, &path)?;
    assert_eq!(bundle.lists, export_bundle(&source)?.lists);
    assert_eq!(bundle.items.len(), 1);

    let mut target = memory_store();
    import_file(&mut target, &path)?;
    assert_eq!(target.items()?, source.items()?);

    let missing = import_file(&mut target, &temp.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, StoreError::Backend(_)));
    Ok(())
}
