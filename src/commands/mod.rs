//! CLI commands for basket

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::config::{load_config, save_config, Backend, BasketPaths, Config};
use crate::db::SqliteStore;
use crate::export;
use crate::models::{
    group_by_section, Category, ItemPatch, ListPatch, NewItem, Section, ShoppingItem, ShoppingList,
};
use crate::storage::{FileStore, KeyValueStore};
use crate::store::ShoppingStore;
use crate::templates;

/// Store over whichever backend the config selects
pub type Store = ShoppingStore<Box<dyn KeyValueStore>>;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Summary,
}

/// Which lists `lists` prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Templates,
    Regular,
}

/// Optional item fields shared by `item add` and `item edit`
#[derive(Debug, Clone, Default)]
pub struct ItemFields {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub section: Option<String>,
    pub notes: Option<String>,
    pub clear_notes: bool,
}

/// Initialize basket for first-time setup
pub fn init(paths: &BasketPaths, backend: Backend) -> Result<()> {
    if paths.is_initialized() {
        println!("Basket is already initialized at {}", paths.root.display());
        return Ok(());
    }

    println!("Initializing basket at {}...", paths.root.display());

    paths.ensure_dirs()?;
    println!("  Created directory structure");

    let config = Config {
        backend,
        ..Config::default()
    };
    save_config(paths, &config)?;
    println!("  Created config.toml ({} backend)", backend);

    open_store(paths, &config)?;
    println!("  Opened storage");

    println!();
    println!("Basket initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  basket new <name>                 Create a shopping list");
    println!("  basket item add <list> <name>     Add an item");
    println!("  basket lists                      Show all lists");

    Ok(())
}

/// Open the store selected by `config`
pub fn open_store(paths: &BasketPaths, config: &Config) -> Result<Store> {
    let backend: Box<dyn KeyValueStore> = match config.backend {
        Backend::Json => Box::new(FileStore::open(&paths.data).context("Failed to open data directory")?),
        Backend::Sqlite => {
            std::fs::create_dir_all(&paths.db).context("Failed to create db directory")?;
            Box::new(SqliteStore::open(&paths.db_file).context("Failed to open basket database")?)
        }
    };
    Ok(ShoppingStore::new(backend))
}

/// Load config and open the store, failing if `init` never ran
pub fn open(paths: &BasketPaths) -> Result<(Config, Store)> {
    ensure_initialized(paths)?;
    let config = load_config(paths)?;
    let store = open_store(paths, &config)?;
    Ok((config, store))
}

/// Print lists with their item counts
pub fn lists(store: &Store, filter: ListFilter, format: OutputFormat) -> Result<()> {
    let lists = match filter {
        ListFilter::All => store.lists()?,
        ListFilter::Templates => store.templates()?,
        ListFilter::Regular => store.regular_lists()?,
    };

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&lists)?);
        return Ok(());
    }

    if lists.is_empty() {
        println!("No shopping lists found.");
        println!("Create one with: basket new <name>");
        return Ok(());
    }

    println!("{:<10} {:<30} {:<7} {:<9}", "ID", "NAME", "ITEMS", "TEMPLATE");
    println!("{}", "-".repeat(59));

    for list in &lists {
        println!(
            "{:<10} {:<30} {:<7} {:<9}",
            short_id(&list.id),
            truncate(&list.name, 28),
            store.item_count(&list.id)?,
            if list.is_template() { "yes" } else { "" }
        );
    }

    Ok(())
}

/// Create a new list
pub fn new_list(store: &mut Store, name: &str, template: bool) -> Result<ShoppingList> {
    let list = store.create_list_with(name, template)?;
    println!("Created list: {}", list.id);
    println!("  Name:     {}", list.name);
    if list.is_template() {
        println!("  Template: yes");
    }
    Ok(list)
}

pub fn rename(store: &mut Store, id: &str, name: &str) -> Result<()> {
    let id = resolve_list_id(store, id)?;
    let list = store
        .update_list(&id, &ListPatch::rename(name))?
        .with_context(|| format!("List not found: {}", id))?;
    println!("Renamed list {} to {}", short_id(&list.id), list.name);
    Ok(())
}

pub fn delete(store: &mut Store, id: &str) -> Result<()> {
    let id = resolve_list_id(store, id)?;
    let count = store.item_count(&id)?;
    if !store.delete_list(&id)? {
        bail!("List not found: {}", id);
    }
    println!("Deleted list {} and {} item(s)", short_id(&id), count);
    Ok(())
}

pub fn save_template(store: &mut Store, id: &str) -> Result<()> {
    let id = resolve_list_id(store, id)?;
    let list = store
        .mark_as_template(&id)?
        .with_context(|| format!("List not found: {}", id))?;
    println!("Saved {} as a template", list.name);
    Ok(())
}

/// Create a fresh list from a template's items
pub fn use_template(store: &mut Store, id: &str, name: Option<&str>) -> Result<ShoppingList> {
    let id = resolve_list_id(store, id)?;
    let list = templates::instantiate_with_default_name(store, &id, name)?;
    println!("Created list: {}", list.id);
    println!("  Name:  {}", list.name);
    println!("  Items: {}", store.item_count(&list.id)?);
    Ok(list)
}

/// Show a list and its items grouped by store section
pub fn show(store: &Store, id: &str, format: OutputFormat) -> Result<()> {
    let id = resolve_list_id(store, id)?;
    let list = store
        .get_list(&id)?
        .with_context(|| format!("List not found: {}", id))?;
    let items = store.items_for_list(&id)?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "list": list, "items": items });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Summary => print_list_summary(&list, &items),
    }

    Ok(())
}

fn print_list_summary(list: &ShoppingList, items: &[ShoppingItem]) {
    println!("List: {}", list.name);
    println!("{}", "=".repeat(50));
    println!("ID:       {}", list.id);
    if list.is_template() {
        println!("Template: yes");
    }

    let (checked, unchecked): (Vec<&ShoppingItem>, Vec<&ShoppingItem>) =
        items.iter().partition(|item| item.checked);

    if items.is_empty() {
        println!();
        println!("No items yet. Add one with: basket item add {} <name>", short_id(&list.id));
    }

    for (section, group) in group_by_section(unchecked) {
        println!();
        println!("{}", section.label());
        for item in group {
            print_item_line(item);
        }
    }

    if !checked.is_empty() {
        println!();
        println!("Purchased ({})", checked.len());
        for (_, group) in group_by_section(checked) {
            for item in group {
                print_item_line(item);
            }
        }
    }

    println!();
    println!("Created:  {}", format_timestamp(list.created_date));
    println!("Updated:  {}", format_timestamp(list.updated_date));
}

fn print_item_line(item: &ShoppingItem) {
    let mark = if item.checked { "x" } else { " " };
    let notes = item
        .notes
        .as_deref()
        .map(|n| format!("  ({})", n))
        .unwrap_or_default();
    println!(
        "  [{}] {:<10} {} {} {} [{}]{}",
        mark,
        short_id(&item.id),
        item.name,
        format_quantity(item.quantity),
        item.unit,
        item.category().label(),
        notes
    );
}

/// Add an item to a list
pub fn add_item(
    store: &mut Store,
    config: &Config,
    list_id: &str,
    name: &str,
    fields: ItemFields,
) -> Result<ShoppingItem> {
    let list_id = resolve_list_id(store, list_id)?;

    let mut new_item = NewItem::new(list_id, name)
        .quantity(fields.quantity.unwrap_or(1.0))
        .unit(fields.unit.unwrap_or_else(|| config.default_unit.clone()));
    if let Some(category) = fields.category {
        new_item = new_item.category(parse_label::<Category>(&category)?.value());
    }
    if let Some(section) = fields.section {
        new_item = new_item.section(parse_label::<Section>(&section)?.value());
    }
    if let Some(notes) = fields.notes {
        new_item = new_item.notes(notes);
    }

    let item = store.create_item(new_item)?;
    println!("Added {} ({})", item.name, short_id(&item.id));
    Ok(item)
}

/// Toggle an item between purchased and not purchased
pub fn check_item(store: &mut Store, id: &str) -> Result<()> {
    let id = resolve_item_id(store, id)?;
    let item = store
        .toggle_checked(&id)?
        .with_context(|| format!("Item not found: {}", id))?;
    let state = if item.checked { "purchased" } else { "not purchased" };
    println!("Marked {} as {}", item.name, state);
    Ok(())
}

pub fn edit_item(store: &mut Store, id: &str, fields: ItemFields) -> Result<()> {
    let id = resolve_item_id(store, id)?;

    let patch = ItemPatch {
        name: fields.name,
        quantity: fields.quantity,
        unit: fields.unit,
        category: fields
            .category
            .map(|c| parse_label::<Category>(&c).map(|c| c.value().to_string()))
            .transpose()?,
        section: fields
            .section
            .map(|s| parse_label::<Section>(&s).map(|s| s.value().to_string()))
            .transpose()?,
        notes: if fields.clear_notes {
            Some(None)
        } else {
            fields.notes.map(Some)
        },
        checked: None,
    };
    if patch.is_empty() {
        bail!("Nothing to change. Pass at least one field to update");
    }

    let item = store
        .update_item(&id, &patch)?
        .with_context(|| format!("Item not found: {}", id))?;
    println!("Updated {} ({})", item.name, short_id(&item.id));
    Ok(())
}

pub fn remove_item(store: &mut Store, id: &str) -> Result<()> {
    let id = resolve_item_id(store, id)?;
    if !store.delete_item(&id)? {
        bail!("Item not found: {}", id);
    }
    println!("Removed item {}", short_id(&id));
    Ok(())
}

/// Export everything to `output`, or to the exports directory by default
pub fn export(store: &Store, paths: &BasketPaths, output: Option<&str>) -> Result<()> {
    let output_path = match output {
        Some(path) => Path::new(path).to_path_buf(),
        None => {
            std::fs::create_dir_all(&paths.exports).context("Failed to create exports directory")?;
            paths.exports.join(export::default_file_name(chrono::Utc::now()))
        }
    };

    let bundle = export::export_to_file(store, &output_path)?;
    println!(
        "✓ Exported {} list(s) and {} item(s) to {}",
        bundle.lists.len(),
        bundle.items.len(),
        output_path.display()
    );
    Ok(())
}

/// Replace all data with the contents of an export file
pub fn import(store: &mut Store, path: &str) -> Result<()> {
    let summary = export::import_file(store, Path::new(path))
        .with_context(|| format!("Failed to import data from {}", path))?;

    println!(
        "✓ Imported {} list(s) and {} item(s)",
        summary.lists, summary.items
    );
    if let Some(date) = &summary.export_date {
        println!("  Exported at: {}", date);
    }
    if !summary.warnings.is_empty() {
        println!("⚠ {} warning(s)", summary.warnings.len());
        for warning in &summary.warnings {
            println!("  ⚠ {}", warning);
        }
    }
    Ok(())
}

/// Print the allowed category and section values
pub fn labels() {
    println!("Categories:");
    for category in Category::ALL {
        println!("  {:<14} {}", category.value(), category.label());
    }
    println!();
    println!("Sections:");
    for section in Section::ALL {
        println!("  {:<14} {}", section.value(), section.label());
    }
}

/// Resolve a full id or a unique prefix of one
pub fn resolve_list_id(store: &Store, id: &str) -> Result<String> {
    let lists = store.lists()?;
    resolve_id(lists.iter().map(|l| l.id.as_str()), id, "List")
}

pub fn resolve_item_id(store: &Store, id: &str) -> Result<String> {
    let items = store.items()?;
    resolve_id(items.iter().map(|i| i.id.as_str()), id, "Item")
}

fn resolve_id<'a>(ids: impl Iterator<Item = &'a str>, wanted: &str, kind: &str) -> Result<String> {
    let mut matches = Vec::new();
    for id in ids {
        if id == wanted {
            return Ok(id.to_string());
        }
        if !wanted.is_empty() && id.starts_with(wanted) {
            matches.push(id);
        }
    }
    match matches.as_slice() {
        [] => bail!("{} not found: {}", kind, wanted),
        [only] => Ok(only.to_string()),
        _ => bail!(
            "{} id prefix '{}' is ambiguous ({} matches)",
            kind,
            wanted,
            matches.len()
        ),
    }
}

fn parse_label<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse::<T>().map_err(|e| anyhow::anyhow!(e))
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{}", quantity)
    }
}

fn format_timestamp(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}

fn ensure_initialized(paths: &BasketPaths) -> Result<()> {
    if !paths.is_initialized() {
        bail!("Basket not initialized. Run `basket init` first.");
    }
    Ok(())
}
