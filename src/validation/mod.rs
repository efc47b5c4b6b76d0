//! Schema validation and linting for import bundles

use std::collections::HashSet;

use jsonschema::JSONSchema;
use serde_json::{json, Value};

use crate::models::{Category, Section, ShoppingItem, ShoppingList};
use crate::store::{Result, StoreError};

/// JSON schema an import file has to satisfy
pub fn bundle_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "basket export",
        "type": "object",
        "required": ["lists", "items"],
        "properties": {
            "lists": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "name", "created_date", "updated_date"],
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "is_template": { "type": "boolean" },
                        "created_date": { "type": "string" },
                        "updated_date": { "type": "string" }
                    }
                }
            },
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "shopping_list_id", "name", "created_date", "updated_date"],
                    "properties": {
                        "id": { "type": "string" },
                        "shopping_list_id": { "type": "string" },
                        "name": { "type": "string" },
                        "quantity": { "type": ["number", "null"], "minimum": 0 },
                        "unit": { "type": "string" },
                        "category": { "type": "string" },
                        "section": { "type": "string" },
                        "notes": { "type": ["string", "null"] },
                        "checked": { "type": "boolean" },
                        "created_date": { "type": "string" },
                        "updated_date": { "type": "string" }
                    }
                }
            },
            "exportDate": { "type": "string" }
        }
    })
}

/// Validate a parsed import document against [`bundle_schema`]
pub fn validate_bundle(doc: &Value) -> Result<()> {
    let schema = bundle_schema();
    let compiled = JSONSchema::compile(&schema)
        .map_err(|e| StoreError::ImportFormat(format!("Failed to compile bundle schema: {}", e)))?;

    if let Err(errors) = compiled.validate(doc) {
        let error_messages: Vec<String> = errors.map(|e| format!("{}", e)).collect();
        return Err(StoreError::ImportFormat(error_messages.join("\n")));
    }

    Ok(())
}

/// Check imported records for issues that do not block the import
pub fn lint_bundle(lists: &[ShoppingList], items: &[ShoppingItem]) -> Vec<String> {
    let mut warnings = Vec::new();

    let mut list_ids = HashSet::new();
    for list in lists {
        if !list_ids.insert(list.id.as_str()) {
            warnings.push(format!("Duplicate list ID: {}", list.id));
        }
    }

    let mut item_ids = HashSet::new();
    for item in items {
        if !item_ids.insert(item.id.as_str()) {
            warnings.push(format!("Duplicate item ID: {}", item.id));
        }

        if !list_ids.contains(item.shopping_list_id.as_str()) {
            warnings.push(format!(
                "{}: References non-existent list {}",
                item.id, item.shopping_list_id
            ));
        }

        if item.category.parse::<Category>().is_err() {
            warnings.push(format!(
                "{}: Unknown category '{}', shown as Other",
                item.id, item.category
            ));
        }
        if item.section.parse::<Section>().is_err() {
            warnings.push(format!(
                "{}: Unknown section '{}', shown as Other",
                item.id, item.section
            ));
        }
    }

    warnings
}
