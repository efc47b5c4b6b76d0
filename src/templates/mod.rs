//! Template instantiation
//!
//! A template is an ordinary list whose items get copied into a fresh list.
//! Copies are new records: new ids, new timestamps, unchecked, owned by the
//! new list. Nothing links a copy back to its source.

use tracing::{error, info, warn};

use crate::models::{NewItem, ShoppingItem, ShoppingList};
use crate::storage::KeyValueStore;
use crate::store::{Result, ShoppingStore, StoreError};

/// Name given to a copy when the caller does not pick one
pub fn default_copy_name(source: &ShoppingList) -> String {
    format!("{} (Copy)", source.name)
}

/// Build a new list from the items of `source_list_id`
///
/// If copying any item fails, the partially built list is deleted again and
/// the original error is returned.
pub fn instantiate_from_template<S: KeyValueStore>(
    store: &mut ShoppingStore<S>,
    source_list_id: &str,
    new_name: &str,
) -> Result<ShoppingList> {
    if store.get_list(source_list_id)?.is_none() {
        return Err(StoreError::UnknownList(source_list_id.to_string()));
    }

    let new_list = store.create_list(new_name)?;

    if let Err(err) = copy_items(store, source_list_id, &new_list.id) {
        warn!(
            source_id = %source_list_id,
            list_id = %new_list.id,
            error = %err,
            "Template copy failed, removing partial list"
        );
        if let Err(cleanup) = store.delete_list(&new_list.id) {
            error!(list_id = %new_list.id, error = %cleanup, "Failed to remove partial list");
        }
        return Err(err);
    }

    info!(source_id = %source_list_id, list_id = %new_list.id, "Instantiated template");
    Ok(new_list)
}

/// Same as [`instantiate_from_template`], naming the copy "<source> (Copy)"
/// when `new_name` is `None`
pub fn instantiate_with_default_name<S: KeyValueStore>(
    store: &mut ShoppingStore<S>,
    source_list_id: &str,
    new_name: Option<&str>,
) -> Result<ShoppingList> {
    let source = store
        .get_list(source_list_id)?
        .ok_or_else(|| StoreError::UnknownList(source_list_id.to_string()))?;
    let name = match new_name {
        Some(name) => name.to_string(),
        None => default_copy_name(&source),
    };
    instantiate_from_template(store, source_list_id, &name)
}

fn copy_items<S: KeyValueStore>(
    store: &mut ShoppingStore<S>,
    source_list_id: &str,
    target_list_id: &str,
) -> Result<usize> {
    let source_items = store.items_for_list(source_list_id)?;
    for item in &source_items {
        store.create_item(copy_of(item, target_list_id))?;
    }
    Ok(source_items.len())
}

fn copy_of(item: &ShoppingItem, target_list_id: &str) -> NewItem {
    NewItem {
        shopping_list_id: target_list_id.to_string(),
        name: item.name.clone(),
        quantity: item.quantity,
        unit: item.unit.clone(),
        category: item.category.clone(),
        section: item.section.clone(),
        notes: item.notes.clone(),
        checked: false,
        extra: item.extra.clone(),
    }
}
