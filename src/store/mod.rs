//! Typed persistence for shopping lists and items
//!
//! Every mutation is a read-modify-write of the whole collection: the current
//! JSON array is decoded, changed in memory, and written back in full. A
//! missing key reads as an empty collection; a key holding anything other
//! than a JSON array of records is reported as [`StoreError::Corrupt`].

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::models::{ItemPatch, ListPatch, NewItem, ShoppingItem, ShoppingList};
use crate::storage::{KeyValueStore, StorageError, ITEMS_KEY, LISTS_KEY};

/// Errors surfaced by the store, template and transfer operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },

    #[error("Invalid quantity {0}: must be a finite, non-negative number")]
    InvalidQuantity(f64),

    #[error("Shopping list not found: {0}")]
    UnknownList(String),

    #[error("Corrupt store: key '{key}' does not hold a valid collection: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid import file: {0}")]
    ImportFormat(String),

    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Backend(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Generate a fresh record identifier
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Shopping list persistence over any [`KeyValueStore`]
pub struct ShoppingStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> ShoppingStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// All lists in storage order
    pub fn lists(&self) -> Result<Vec<ShoppingList>> {
        self.read(LISTS_KEY)
    }

    /// All items in storage order
    pub fn items(&self) -> Result<Vec<ShoppingItem>> {
        self.read(ITEMS_KEY)
    }

    /// Items belonging to one list, in storage order
    pub fn items_for_list(&self, list_id: &str) -> Result<Vec<ShoppingItem>> {
        let mut items = self.items()?;
        items.retain(|item| item.shopping_list_id == list_id);
        Ok(items)
    }

    pub fn get_list(&self, id: &str) -> Result<Option<ShoppingList>> {
        Ok(self.lists()?.into_iter().find(|list| list.id == id))
    }

    pub fn get_item(&self, id: &str) -> Result<Option<ShoppingItem>> {
        Ok(self.items()?.into_iter().find(|item| item.id == id))
    }

    /// Lists flagged as reusable templates
    pub fn templates(&self) -> Result<Vec<ShoppingList>> {
        let mut lists = self.lists()?;
        lists.retain(|list| list.is_template());
        Ok(lists)
    }

    /// Lists that are not templates
    pub fn regular_lists(&self) -> Result<Vec<ShoppingList>> {
        let mut lists = self.lists()?;
        lists.retain(|list| !list.is_template());
        Ok(lists)
    }

    pub fn item_count(&self, list_id: &str) -> Result<usize> {
        Ok(self.items_for_list(list_id)?.len())
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    pub fn create_list(&mut self, name: &str) -> Result<ShoppingList> {
        self.create_list_with(name, false)
    }

    /// Create a list, optionally flagged as a template from the start
    pub fn create_list_with(&mut self, name: &str, is_template: bool) -> Result<ShoppingList> {
        let name = validate_name(name, "List")?;
        let mut lists = self.lists()?;

        let now = Utc::now();
        let list = ShoppingList {
            id: generate_id(),
            name,
            is_template: is_template.then_some(true),
            created_date: now,
            updated_date: now,
            extra: Default::default(),
        };
        lists.push(list.clone());
        self.write(LISTS_KEY, &lists)?;

        info!(list_id = %list.id, name = %list.name, is_template, "Created shopping list");
        Ok(list)
    }

    /// Merge `patch` over the stored list; `None` when no list has `id`
    pub fn update_list(&mut self, id: &str, patch: &ListPatch) -> Result<Option<ShoppingList>> {
        let mut lists = self.lists()?;
        let Some(index) = lists.iter().position(|list| list.id == id) else {
            debug!(list_id = %id, "Update skipped, list not found");
            return Ok(None);
        };

        let mut merged: ShoppingList = merge_patch(&lists[index], patch, "list")?;
        merged.name = validate_name(&merged.name, "List")?;
        merged.updated_date = Utc::now();
        lists[index] = merged.clone();
        self.write(LISTS_KEY, &lists)?;

        debug!(list_id = %id, "Updated shopping list");
        Ok(Some(merged))
    }

    /// Flag an existing list as a reusable template
    pub fn mark_as_template(&mut self, id: &str) -> Result<Option<ShoppingList>> {
        self.update_list(id, &ListPatch::template(true))
    }

    /// Delete a list together with all of its items
    ///
    /// Both collections are replaced in a single batch. Returns whether the
    /// list existed.
    pub fn delete_list(&mut self, id: &str) -> Result<bool> {
        let mut lists = self.lists()?;
        let mut items = self.items()?;

        let list_count = lists.len();
        let item_count = items.len();
        lists.retain(|list| list.id != id);
        items.retain(|item| item.shopping_list_id != id);

        let existed = lists.len() != list_count;
        let removed_items = item_count - items.len();
        if !existed && removed_items == 0 {
            debug!(list_id = %id, "Delete skipped, list not found");
            return Ok(false);
        }

        let entries = [
            (LISTS_KEY, encode(&lists, "lists")?),
            (ITEMS_KEY, encode(&items, "items")?),
        ];
        self.backend.put_batch(&entries)?;

        info!(list_id = %id, removed_items, "Deleted shopping list");
        Ok(existed)
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Add an item to an existing list
    pub fn create_item(&mut self, new_item: NewItem) -> Result<ShoppingItem> {
        let name = validate_name(&new_item.name, "Item")?;
        validate_quantity(new_item.quantity)?;

        if !self.lists()?.iter().any(|l| l.id == new_item.shopping_list_id) {
            return Err(StoreError::UnknownList(new_item.shopping_list_id));
        }

        let mut items = self.items()?;
        let now = Utc::now();
        let item = ShoppingItem {
            id: generate_id(),
            shopping_list_id: new_item.shopping_list_id,
            name,
            quantity: new_item.quantity,
            unit: new_item.unit,
            category: new_item.category,
            section: new_item.section,
            notes: new_item.notes.filter(|n| !n.is_empty()),
            checked: new_item.checked,
            created_date: now,
            updated_date: now,
            extra: new_item.extra,
        };
        items.push(item.clone());
        self.write(ITEMS_KEY, &items)?;

        debug!(item_id = %item.id, list_id = %item.shopping_list_id, "Created item");
        Ok(item)
    }

    /// Merge `patch` over the stored item; `None` when no item has `id`
    pub fn update_item(&mut self, id: &str, patch: &ItemPatch) -> Result<Option<ShoppingItem>> {
        let mut items = self.items()?;
        let Some(index) = items.iter().position(|item| item.id == id) else {
            debug!(item_id = %id, "Update skipped, item not found");
            return Ok(None);
        };

        // Non-finite floats serialize as null, which a merge patch reads as "remove"
        if let Some(quantity) = patch.quantity {
            validate_quantity(quantity)?;
        }

        let mut merged: ShoppingItem = merge_patch(&items[index], patch, "item")?;
        merged.name = validate_name(&merged.name, "Item")?;
        validate_quantity(merged.quantity)?;
        if merged.notes.as_deref() == Some("") {
            merged.notes = None;
        }
        merged.updated_date = Utc::now();
        items[index] = merged.clone();
        self.write(ITEMS_KEY, &items)?;

        debug!(item_id = %id, "Updated item");
        Ok(Some(merged))
    }

    /// Flip the purchased state of an item
    pub fn toggle_checked(&mut self, id: &str) -> Result<Option<ShoppingItem>> {
        let Some(item) = self.get_item(id)? else {
            return Ok(None);
        };
        self.update_item(id, &ItemPatch::checked(!item.checked))
    }

    pub fn delete_item(&mut self, id: &str) -> Result<bool> {
        let mut items = self.items()?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write(ITEMS_KEY, &items)?;

        debug!(item_id = %id, "Deleted item");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Bulk
    // ------------------------------------------------------------------

    /// Replace both collections wholesale in one batch
    pub fn replace_all(&mut self, lists: &[ShoppingList], items: &[ShoppingItem]) -> Result<()> {
        let entries = [
            (LISTS_KEY, encode(lists, "lists")?),
            (ITEMS_KEY, encode(items, "items")?),
        ];
        self.backend.put_batch(&entries)?;
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.backend.get(key)? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, records: &[T]) -> Result<()> {
        let json = encode(records, key_label(key))?;
        self.backend.put(key, &json)?;
        debug!(key, records = records.len(), bytes = json.len(), "Persisted collection");
        Ok(())
    }
}

fn key_label(key: &str) -> &'static str {
    if key == LISTS_KEY {
        "lists"
    } else {
        "items"
    }
}

fn encode<T: Serialize>(records: &[T], what: &'static str) -> Result<String> {
    serde_json::to_string(records).map_err(|source| StoreError::Serialize { what, source })
}

/// Apply an RFC 7396 merge patch to a record
fn merge_patch<T, P>(record: &T, patch: &P, what: &'static str) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    P: Serialize,
{
    let mut doc =
        serde_json::to_value(record).map_err(|source| StoreError::Serialize { what, source })?;
    let patch = serde_json::to_value(patch).map_err(|source| StoreError::Serialize { what, source })?;
    json_patch::merge(&mut doc, &patch);
    serde_json::from_value(doc).map_err(|source| StoreError::Serialize { what, source })
}

fn validate_name(name: &str, kind: &'static str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::EmptyName { kind });
    }
    Ok(trimmed.to_string())
}

fn validate_quantity(quantity: f64) -> Result<()> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(StoreError::InvalidQuantity(quantity));
    }
    Ok(())
}
