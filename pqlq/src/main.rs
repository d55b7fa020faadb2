//! pqlq: PQL Query - CLI for editing a persisted filter query.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pqlq")]
#[command(about = "PQL Query - parse, format and edit faceted filter queries")]
#[command(version)]
struct Cli {
    /// Slot holding the current query (overrides config)
    #[arg(short = 's', long = "slot", global = true)]
    slot: Option<String>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse PQL text and print its AST as JSON
    Parse {
        /// PQL text
        text: String,
    },

    /// Print PQL text in canonical form
    #[command(visible_alias = "fmt")]
    Format {
        /// PQL text
        text: String,
    },

    /// Print the current query
    Show,

    /// Print filter terms as a query object (JSON)
    Filters {
        /// Read this text instead of the current query
        #[arg(short = 't', long = "text")]
        text: Option<String>,
    },

    /// Add terms to a facet
    Add {
        category: String,
        facet: String,
        /// Terms to add (numbers are stored as numbers)
        #[arg(required = true, allow_hyphen_values = true)]
        terms: Vec<String>,
    },

    /// Remove terms from a facet
    #[command(visible_alias = "rm")]
    Remove {
        category: String,
        facet: String,
        #[arg(required = true, allow_hyphen_values = true)]
        terms: Vec<String>,
    },

    /// Remove a facet and all its terms
    RemoveFacet { category: String, facet: String },

    /// Replace all terms of a facet (no terms removes it)
    Overwrite {
        category: String,
        facet: String,
        #[arg(allow_hyphen_values = true)]
        terms: Vec<String>,
    },

    /// Ensure the query requests facet counts
    Facets,

    /// Set the pagination window
    Limit {
        /// Offset of the first result
        from: u64,
        /// Page size
        size: Option<u64>,
    },

    /// Set the sort order, e.g. +donor.age or -donor.id
    Sort {
        #[arg(required = true, allow_hyphen_values = true)]
        keys: Vec<String>,
    },

    /// Merge PQL text into the current query
    Merge {
        /// PQL text to merge in
        text: String,
    },

    /// Reset the current query to empty
    Clear,

    /// Print the effective configuration
    Config,
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let slot = cli.slot.as_deref();
    let result = match cli.command {
        Commands::Parse { text } => commands::parse(&text),
        Commands::Format { text } => commands::format(&text),
        Commands::Show => commands::show(slot),
        Commands::Filters { text } => commands::filters(slot, text.as_deref()),
        Commands::Add {
            category,
            facet,
            terms,
        } => commands::add(slot, &category, &facet, &terms),
        Commands::Remove {
            category,
            facet,
            terms,
        } => commands::remove(slot, &category, &facet, &terms),
        Commands::RemoveFacet { category, facet } => {
            commands::remove_facet(slot, &category, &facet)
        }
        Commands::Overwrite {
            category,
            facet,
            terms,
        } => commands::overwrite(slot, &category, &facet, &terms),
        Commands::Facets => commands::facets(slot),
        Commands::Limit { from, size } => commands::limit(slot, from, size),
        Commands::Sort { keys } => commands::sort(slot, &keys),
        Commands::Merge { text } => commands::merge(slot, &text),
        Commands::Clear => commands::clear(slot),
        Commands::Config => commands::config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
