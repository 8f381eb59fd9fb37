//! Terminal subcommands. Each opens the configured database on its own.

pub mod edit;
pub mod explain;
pub mod import;
pub mod review;
pub mod search;
pub mod show;
pub mod stats;

use anyhow::{Context, Result};
use reprise::card::SqliteCardStore;
use reprise::config::RepriseConfig;
use reprise::query::{self, CompiledQuery};

fn open_store(config: &RepriseConfig) -> Result<SqliteCardStore> {
    SqliteCardStore::open(config.resolved_db_path())
}

/// Compile `query`, failing with the offending prefix when it is overquoted.
fn parse_query(text: &str) -> Result<CompiledQuery> {
    query::parse(text).with_context(|| format!("invalid query {text:?}"))
}

fn preview(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > max_chars {
        let cut: String = line.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
