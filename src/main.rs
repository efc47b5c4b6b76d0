//! basket - local shopping lists
//!
//! Lists, items grouped by store section, reusable templates, JSON export/import

use basket::commands::{self, ItemFields, ListFilter, OutputFormat};
use basket::config::{self, Backend, BasketPaths};

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "basket")]
#[command(author, version, about = "Local shopping lists with templates and JSON export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize basket (first-time setup)
    Init {
        /// Storage backend: json or sqlite
        #[arg(short, long, default_value = "json")]
        backend: String,
    },

    /// List shopping lists
    Lists {
        /// Only show templates
        #[arg(long, conflicts_with = "regular")]
        templates: bool,

        /// Only show lists that are not templates
        #[arg(long)]
        regular: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new shopping list
    New {
        /// Name of the list
        name: String,

        /// Save the new list as a template
        #[arg(short, long)]
        template: bool,
    },

    /// Rename a list
    Rename {
        /// List ID (or unique prefix)
        id: String,

        /// New name
        name: String,
    },

    /// Delete a list and all of its items
    Delete {
        /// List ID (or unique prefix)
        id: String,
    },

    /// Mark a list as a reusable template
    SaveTemplate {
        /// List ID (or unique prefix)
        id: String,
    },

    /// Create a new list from a template
    UseTemplate {
        /// Template list ID (or unique prefix)
        id: String,

        /// Name for the new list (defaults to "<template> (Copy)")
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show a list grouped by store section
    Show {
        /// List ID (or unique prefix)
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Item operations
    Item {
        #[command(subcommand)]
        operation: ItemOperation,
    },

    /// Export all lists and items to a JSON file
    Export {
        /// Output file path (defaults to the exports directory)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Replace all data with the contents of an export file
    Import {
        /// Path to a file produced by `basket export`
        path: String,
    },

    /// Show the allowed category and section values
    Labels,
}

#[derive(Subcommand)]
enum ItemOperation {
    /// Add an item to a list
    Add {
        /// List ID (or unique prefix)
        list_id: String,

        /// Item name
        name: String,

        #[command(flatten)]
        fields: ItemArgs,
    },

    /// Toggle an item's purchased state
    Check {
        /// Item ID (or unique prefix)
        id: String,
    },

    /// Edit an item
    Edit {
        /// Item ID (or unique prefix)
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: ItemArgs,

        /// Remove the item's notes
        #[arg(long, conflicts_with = "notes")]
        clear_notes: bool,
    },

    /// Remove an item
    Remove {
        /// Item ID (or unique prefix)
        id: String,
    },
}

#[derive(Args)]
struct ItemArgs {
    /// Quantity
    #[arg(short, long)]
    quantity: Option<f64>,

    /// Unit (e.g. pcs, kg, l)
    #[arg(short, long)]
    unit: Option<String>,

    /// Category (see `basket labels`)
    #[arg(short, long)]
    category: Option<String>,

    /// Store section (see `basket labels`)
    #[arg(short, long)]
    section: Option<String>,

    /// Free-text notes
    #[arg(short, long)]
    notes: Option<String>,
}

impl ItemArgs {
    fn into_fields(self, name: Option<String>, clear_notes: bool) -> ItemFields {
        ItemFields {
            name,
            quantity: self.quantity,
            unit: self.unit,
            category: self.category,
            section: self.section,
            notes: self.notes,
            clear_notes,
        }
    }
}

fn format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Summary
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let paths = BasketPaths::new()?;

    config::load_config(&paths)
        .map(|c| c.logging)
        .unwrap_or_default()
        .init();

    match cli.command {
        Commands::Init { backend } => {
            let backend = match backend.to_lowercase().as_str() {
                "json" => Backend::Json,
                "sqlite" => Backend::Sqlite,
                _ => {
                    eprintln!("Invalid backend: {}. Use: json or sqlite", backend);
                    std::process::exit(1);
                }
            };
            commands::init(&paths, backend)?;
        }
        Commands::Labels => {
            commands::labels();
        }
        command => {
            let (config, mut store) = commands::open(&paths)?;
            run(command, &paths, &config, &mut store)?;
        }
    }

    Ok(())
}

fn run(
    command: Commands,
    paths: &BasketPaths,
    config: &config::Config,
    store: &mut commands::Store,
) -> anyhow::Result<()> {
    match command {
        Commands::Lists {
            templates,
            regular,
            json,
        } => {
            let filter = if templates {
                ListFilter::Templates
            } else if regular {
                ListFilter::Regular
            } else {
                ListFilter::All
            };
            commands::lists(store, filter, format(json))?;
        }
        Commands::New { name, template } => {
            commands::new_list(store, &name, template)?;
        }
        Commands::Rename { id, name } => {
            commands::rename(store, &id, &name)?;
        }
        Commands::Delete { id } => {
            commands::delete(store, &id)?;
        }
        Commands::SaveTemplate { id } => {
            commands::save_template(store, &id)?;
        }
        Commands::UseTemplate { id, name } => {
            commands::use_template(store, &id, name.as_deref())?;
        }
        Commands::Show { id, json } => {
            commands::show(store, &id, format(json))?;
        }
        Commands::Item { operation } => match operation {
            ItemOperation::Add {
                list_id,
                name,
                fields,
            } => {
                commands::add_item(store, config, &list_id, &name, fields.into_fields(None, false))?;
            }
            ItemOperation::Check { id } => {
                commands::check_item(store, &id)?;
            }
            ItemOperation::Edit {
                id,
                name,
                fields,
                clear_notes,
            } => {
                commands::edit_item(store, &id, fields.into_fields(name, clear_notes))?;
            }
            ItemOperation::Remove { id } => {
                commands::remove_item(store, &id)?;
            }
        },
        Commands::Export { output } => {
            commands::export(store, paths, output.as_deref())?;
        }
        Commands::Import { path } => {
            commands::import(store, &path)?;
        }
        Commands::Init { .. } | Commands::Labels => unreachable!("handled before opening the store"),
    }

    Ok(())
}
