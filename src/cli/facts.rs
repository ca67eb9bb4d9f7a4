//! Fact store subcommands.
//!
//! - `list`: Show stored facts, oldest first
//! - `count`: Number of stored facts
//! - `delete`: Remove a fact by id

use anyhow::Result;
use clap::Subcommand;

use super::open_store;
use crate::config::Settings;

/// Fact-store subcommands
#[derive(Subcommand, Debug)]
pub enum FactsCommands {
    /// List stored facts
    List {
        /// Maximum number of facts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Show source, date and context
        #[arg(short, long)]
        metadata: bool,
    },

    /// Count stored facts
    Count,

    /// Delete a fact by id
    Delete {
        /// Fact id
        id: String,
    },
}

/// Execute a facts subcommand
pub fn execute(settings: &Settings, command: FactsCommands) -> Result<()> {
    let store = open_store(settings)?;

    match command {
        FactsCommands::List { limit, metadata } => {
            let facts = store.get_all()?;
            if facts.is_empty() {
                println!("No facts stored. Use 'factcheck ingest <csv>' to add some.");
                return Ok(());
            }

            println!("{:<36} {}", "ID", "FACT");
            println!("{}", "-".repeat(80));
            for fact in facts.iter().take(limit) {
                println!("{:<36} {}", fact.id, truncate(&fact.text, 60));
                if metadata {
                    println!(
                        "{:<36} source: {} | date: {} | context: {}",
                        "",
                        fact.metadata.source_or_unknown(),
                        fact.metadata.date_or_unknown(),
                        if fact.metadata.context.is_empty() { "-" } else { fact.metadata.context.as_str() }
                    );
                }
            }
            println!("\nShowing {} of {} facts", facts.len().min(limit), facts.len());
        }
        FactsCommands::Count => {
            println!("{}", store.count()?);
        }
        FactsCommands::Delete { id } => {
            if store.delete(&id)? {
                println!("Deleted {}", id);
            } else {
                anyhow::bail!("Fact not found: {}", id);
            }
        }
    }
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
