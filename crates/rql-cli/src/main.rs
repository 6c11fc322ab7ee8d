//! rql CLI
//!
//! Command-line tool for parsing, checking and formatting queries.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use rql_core::{
    ParserOptions, Query, QueryType,
    parser::{DEFAULT_MAX_CONNECTIVES, DEFAULT_MAX_DEPTH},
};

/// Parse, check and format document-database queries.
#[derive(Parser)]
#[command(name = "rql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Maximum nesting of parentheses and method calls.
    #[arg(long, env = "RQL_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Maximum number of AND/OR connectives in one query.
    #[arg(long, env = "RQL_MAX_CONNECTIVES", default_value_t = DEFAULT_MAX_CONNECTIVES)]
    max_connectives: usize,

    /// Kind of query to parse (select or update).
    #[arg(short = 't', long, env = "RQL_QUERY_TYPE", default_value = "select")]
    query_type: QueryType,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the query text comes from.
#[derive(Args)]
struct Input {
    /// Query text (read from stdin if neither this nor --file is given).
    query: Option<String>,

    /// Read the query from a file.
    #[arg(short, long, conflicts_with = "query")]
    file: Option<PathBuf>,
}

impl Input {
    fn read(self) -> anyhow::Result<String> {
        if let Some(query) = self.query {
            return Ok(query);
        }
        if let Some(path) = self.file {
            debug!(path = %path.display(), "reading query from file");
            return std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
        debug!("reading query from stdin");
        let mut query = String::new();
        std::io::stdin()
            .read_to_string(&mut query)
            .context("failed to read stdin")?;
        Ok(query)
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum Format {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// Rust debug representation.
    Debug,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print its syntax tree.
    Parse {
        #[command(flatten)]
        input: Input,

        /// Output format.
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },

    /// Check that a query parses.
    Check {
        #[command(flatten)]
        input: Input,
    },

    /// Print a query in canonical form.
    Fmt {
        #[command(flatten)]
        input: Input,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = ParserOptions::default()
        .with_max_depth(cli.max_depth)
        .with_max_connectives(cli.max_connectives);
    let query_type = cli.query_type;
    debug!(
        %query_type,
        max_depth = options.max_depth,
        max_connectives = options.max_connectives,
        "starting"
    );

    let parse = |text: &str| -> rql_core::Result<Query> {
        rql_core::Parser::with_options(text, options).parse(query_type)
    };

    match cli.command {
        Commands::Parse { input, format } => {
            let text = input.read()?;
            let query = parse(&text)?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&query)?),
                Format::Debug => println!("{query:#?}"),
            }
        }

        Commands::Check { input } => {
            let text = input.read()?;
            match parse(&text) {
                Ok(query) => {
                    info!(
                        functions = query.declared_functions.len(),
                        has_where = query.where_clause.is_some(),
                        "query is valid"
                    );
                    println!("ok");
                }
                Err(err) => {
                    eprintln!("{err}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Commands::Fmt { input } => {
            let text = input.read()?;
            let query = parse(&text)?;
            println!("{query}");
        }
    }

    Ok(ExitCode::SUCCESS)
}
