mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reprise::card::content::Side;
use reprise::config::RepriseConfig;
use reprise::review::Outcome;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reprise", version, about = "Spaced-repetition flashcards from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List cards matching a query
    Search {
        /// Query, e.g. `tag:verb -status:leech`
        #[arg(default_value = "")]
        query: String,
        /// Maximum number of cards to print
        #[arg(long)]
        limit: Option<usize>,
        /// Print cards as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how a query is tokenized and compiled
    Explain { query: String },
    /// Review statistics for the cards matching a query
    Stats {
        #[arg(default_value = "")]
        query: String,
    },
    /// Start a review session and print the card ids
    Review {
        #[arg(default_value = "")]
        query: String,
    },
    /// Record an answer for a card
    Answer {
        card_id: String,
        /// right, wrong or skip
        outcome: Outcome,
    },
    /// Add or remove card tags
    Tag {
        card_id: String,
        #[arg(long = "add")]
        add: Vec<String>,
        #[arg(long = "remove")]
        remove: Vec<String>,
    },
    /// Set a card's mnemonic
    Mnemonic { card_id: String, text: String },
    /// Print a card's content, inherited from its template and model where empty
    Show {
        card_id: String,
        /// front, back or shared; all sides when omitted
        side: Option<Side>,
    },
    /// Import models, templates, notes and cards from a JSON file
    Import { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = RepriseConfig::load()?;

    // Log to stderr so stdout stays clean for --json output.
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Search { query, limit, json } => cli::search::search(&config, &query, limit, json)?,
        Command::Explain { query } => cli::explain::explain(&query)?,
        Command::Stats { query } => cli::stats::stats(&config, &query)?,
        Command::Review { query } => cli::review::review(&config, &query)?,
        Command::Answer { card_id, outcome } => cli::review::answer(&config, &card_id, outcome)?,
        Command::Tag {
            card_id,
            add,
            remove,
        } => cli::edit::tag(&config, &card_id, &add, &remove)?,
        Command::Mnemonic { card_id, text } => cli::edit::mnemonic(&config, &card_id, &text)?,
        Command::Show { card_id, side } => cli::show::show(&config, &card_id, side)?,
        Command::Import { file } => cli::import::import(&config, &file)?,
    }

    Ok(())
}
