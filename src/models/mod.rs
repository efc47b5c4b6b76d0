//! Data models for basket
//!
//! These represent the canonical JSON records stored under each collection key.
//! Field names match the on-disk and export format exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default unit for a new item
pub const DEFAULT_UNIT: &str = "pcs";

/// Product category shown next to an item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Dairy,
    Fruits,
    Vegetables,
    Meat,
    Bakery,
    Beverages,
    Snacks,
    Frozen,
    Canned,
    Spices,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Dairy,
        Category::Fruits,
        Category::Vegetables,
        Category::Meat,
        Category::Bakery,
        Category::Beverages,
        Category::Snacks,
        Category::Frozen,
        Category::Canned,
        Category::Spices,
        Category::Other,
    ];

    pub fn value(&self) -> &'static str {
        match self {
            Category::Dairy => "dairy",
            Category::Fruits => "fruits",
            Category::Vegetables => "vegetables",
            Category::Meat => "meat",
            Category::Bakery => "bakery",
            Category::Beverages => "beverages",
            Category::Snacks => "snacks",
            Category::Frozen => "frozen",
            Category::Canned => "canned",
            Category::Spices => "spices",
            Category::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Dairy => "Dairy",
            Category::Fruits => "Fruits",
            Category::Vegetables => "Vegetables",
            Category::Meat => "Meat",
            Category::Bakery => "Bakery",
            Category::Beverages => "Beverages",
            Category::Snacks => "Snacks",
            Category::Frozen => "Frozen",
            Category::Canned => "Canned",
            Category::Spices => "Spices",
            Category::Other => "Other",
        }
    }

    /// Resolve a stored value, falling back to `Other` for anything unknown
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.value() == wanted)
            .ok_or_else(|| {
                let values: Vec<&str> = Category::ALL.iter().map(|c| c.value()).collect();
                format!("Invalid category: {}. Use: {}", s, values.join(", "))
            })
    }
}

/// Store section an item is shelved in
///
/// Declaration order is the order sections are walked through in a store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Produce,
    Dairy,
    MeatSeafood,
    Bakery,
    Frozen,
    Pantry,
    Beverages,
    Snacks,
    Household,
    PersonalCare,
    #[default]
    Other,
}

impl Section {
    pub const ALL: [Section; 11] = [
        Section::Produce,
        Section::Dairy,
        Section::MeatSeafood,
        Section::Bakery,
        Section::Frozen,
        Section::Pantry,
        Section::Beverages,
        Section::Snacks,
        Section::Household,
        Section::PersonalCare,
        Section::Other,
    ];

    pub fn value(&self) -> &'static str {
        match self {
            Section::Produce => "produce",
            Section::Dairy => "dairy",
            Section::MeatSeafood => "meat_seafood",
            Section::Bakery => "bakery",
            Section::Frozen => "frozen",
            Section::Pantry => "pantry",
            Section::Beverages => "beverages",
            Section::Snacks => "snacks",
            Section::Household => "household",
            Section::PersonalCare => "personal_care",
            Section::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Section::Produce => "Produce",
            Section::Dairy => "Dairy",
            Section::MeatSeafood => "Meat & Seafood",
            Section::Bakery => "Bakery",
            Section::Frozen => "Frozen",
            Section::Pantry => "Pantry",
            Section::Beverages => "Beverages",
            Section::Snacks => "Snacks",
            Section::Household => "Household",
            Section::PersonalCare => "Personal Care",
            Section::Other => "Other",
        }
    }

    /// Resolve a stored value, falling back to `Other` for anything unknown
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl std::str::FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        Section::ALL
            .into_iter()
            .find(|sec| sec.value() == wanted)
            .ok_or_else(|| {
                let values: Vec<&str> = Section::ALL.iter().map(|s| s.value()).collect();
                format!("Invalid section: {}. Use: {}", s, values.join(", "))
            })
    }
}

/// A shopping list (or a template when `is_template` is set)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShoppingList {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    /// Fields written by other tools, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShoppingList {
    pub fn is_template(&self) -> bool {
        self.is_template.unwrap_or(false)
    }
}

/// A single entry on a shopping list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShoppingItem {
    pub id: String,
    pub shopping_list_id: String,
    pub name: String,
    #[serde(default = "default_quantity", deserialize_with = "quantity_or_default")]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_label")]
    pub category: String,
    #[serde(default = "default_label")]
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub checked: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShoppingItem {
    /// Category for display; unknown stored values read as `Other`
    pub fn category(&self) -> Category {
        Category::from_stored(&self.category)
    }

    /// Section for display; unknown stored values read as `Other`
    pub fn section(&self) -> Section {
        Section::from_stored(&self.section)
    }
}

fn default_quantity() -> f64 {
    1.0
}

/// `null` quantities (NaN written out by older exports) read as the default
fn quantity_or_default<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_else(default_quantity))
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

fn default_label() -> String {
    "other".to_string()
}

/// Caller-supplied fields for a new item
///
/// Identity and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub shopping_list_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    pub section: String,
    pub notes: Option<String>,
    pub checked: bool,
    pub extra: Map<String, Value>,
}

impl NewItem {
    pub fn new(shopping_list_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            shopping_list_id: shopping_list_id.into(),
            name: name.into(),
            quantity: default_quantity(),
            unit: default_unit(),
            category: Category::Other.value().to_string(),
            section: Section::Other.value().to_string(),
            notes: None,
            checked: false,
            extra: Map::new(),
        }
    }

    pub fn quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = if notes.is_empty() { None } else { Some(notes) };
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }
}

/// Partial update for a list; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ListPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,
}

impl ListPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn template(flag: bool) -> Self {
        Self {
            is_template: Some(flag),
            ..Default::default()
        }
    }
}

/// Partial update for an item; `None` fields are left untouched
///
/// `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl ItemPatch {
    pub fn checked(checked: bool) -> Self {
        Self {
            checked: Some(checked),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Items of one list grouped by section, in store walking order
pub fn group_by_section<'a>(
    items: impl IntoIterator<Item = &'a ShoppingItem>,
) -> Vec<(Section, Vec<&'a ShoppingItem>)> {
    let mut groups: std::collections::BTreeMap<Section, Vec<&'a ShoppingItem>> =
        std::collections::BTreeMap::new();
    for item in items {
        groups.entry(item.section()).or_default().push(item);
    }
    groups.into_iter().collect()
}
