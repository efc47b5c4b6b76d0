// Integration tests for template instantiation
// Tests copy semantics, independence of copies, and cleanup on failure

mod common;

use std::collections::HashSet;

use anyhow::Result;
use basket::models::{ItemPatch, NewItem};
use basket::store::{ShoppingStore, StoreError};
use basket::templates::{instantiate_from_template, instantiate_with_default_name};
use common::{list_with_items, memory_store, FlakyStore};

#[test]
fn test_copies_are_fresh_and_unchecked() -> Result<()> {
    let mut store = memory_store();
    let source = list_with_items(
        &mut store,
        "Weekly",
        &[("milk", true), ("eggs", true), ("bread", false)],
    )?;
    let source_items = store.items_for_list(&source.id)?;

    let copy = instantiate_from_template(&mut store, &source.id, "Copy")?;
    let copies = store.items_for_list(&copy.id)?;

    assert_eq!(copy.name, "Copy");
    assert_ne!(copy.id, source.id);
    assert_eq!(copies.len(), 3);
    assert!(copies.iter().all(|item| !item.checked));
    assert!(copies.iter().all(|item| item.shopping_list_id == copy.id));

    let source_ids: HashSet<&str> = source_items.iter().map(|i| i.id.as_str()).collect();
    assert!(copies.iter().all(|item| !source_ids.contains(item.id.as_str())));

    let names: Vec<&str> = copies.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["milk", "eggs", "bread"]);
    Ok(())
}

#[test]
fn test_mutating_copy_leaves_source_alone() -> Result<()> {
    let mut store = memory_store();
    let source = list_with_items(&mut store, "Weekly", &[("milk", true)])?;
    let original = store.items_for_list(&source.id)?.remove(0);

    let copy = instantiate_from_template(&mut store, &source.id, "Copy")?;
    let copied = store.items_for_list(&copy.id)?.remove(0);

    store.update_item(
        &copied.id,
        &ItemPatch {
            name: Some("oat milk".to_string()),
            ..Default::default()
        },
    )?;

    assert_eq!(store.get_item(&original.id)?, Some(original));
    assert_eq!(
        store.get_item(&copied.id)?.map(|i| i.name),
        Some("oat milk".to_string())
    );
    Ok(())
}

#[test]
fn test_copy_keeps_descriptive_fields() -> Result<()> {
    let mut store = memory_store();
    let source = store.create_list_with("Party", true)?;
    let mut new_item = NewItem::new(&source.id, "chips")
        .quantity(4.0)
        .unit("bags")
        .category("snacks")
        .section("snacks")
        .notes("salted")
        .checked(true);
    new_item
        .extra
        .insert("brand".to_string(), serde_json::json!("crunchy"));
    store.create_item(new_item)?;

    let copy = instantiate_from_template(&mut store, &source.id, "Friday")?;
    let copied = store.items_for_list(&copy.id)?.remove(0);

    assert_eq!(copied.quantity, 4.0);
    assert_eq!(copied.unit, "bags");
    assert_eq!(copied.category, "snacks");
    assert_eq!(copied.section, "snacks");
    assert_eq!(copied.notes.as_deref(), Some("salted"));
    assert_eq!(copied.extra.get("brand"), Some(&serde_json::json!("crunchy")));
    assert!(!copied.checked);
    assert!(!copy.is_template());
    Ok(())
}

#[test]
fn test_default_copy_name() -> Result<()> {
    let mut store = memory_store();
    let source = list_with_items(&mut store, "Weekly", &[])?;

    let copy = instantiate_with_default_name(&mut store, &source.id, None)?;
    assert_eq!(copy.name, "Weekly (Copy)");
    assert_eq!(store.item_count(&copy.id)?, 0);

    let named = instantiate_with_default_name(&mut store, &source.id, Some("Mine"))?;
    assert_eq!(named.name, "Mine");
    Ok(())
}

#[test]
fn test_unknown_source_creates_nothing() -> Result<()> {
    let mut store = memory_store();
    let err = instantiate_from_template(&mut store, "missing", "Copy").unwrap_err();
    assert!(matches!(err, StoreError::UnknownList(_)));
    assert!(store.lists()?.is_empty());
    Ok(())
}

#[test]
fn test_failed_copy_removes_partial_list() -> Result<()> {
    let mut store = ShoppingStore::new(FlakyStore::default());
    let source = list_with_items(
        &mut store,
        "Weekly",
        &[("milk", false), ("eggs", false), ("bread", false)],
    )?;
    let lists_before = store.lists()?;
    let items_before = store.items()?;

    // put 1 creates the list, put 2 copies milk, put 3 (eggs) fails
    store.backend_mut().fail_after(3);
    let err = instantiate_from_template(&mut store, &source.id, "Copy").unwrap_err();

    assert!(matches!(err, StoreError::Backend(_)));
    assert_eq!(store.lists()?, lists_before);
    assert_eq!(store.items()?, items_before);
    Ok(())
}
