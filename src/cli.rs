use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "doxysearch")]
#[command(about = "Read, check and query Doxygen search-index tables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ./doxysearch.toml, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Documentation tree: the HTML directory containing search/, or search/ itself
    #[arg(short, long, global = true)]
    pub docs: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdio
    Serve,
    /// Prefix search, as typed into the search box
    Search {
        query: String,
        #[arg(short, long, default_value = "all")]
        section: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Keyword search over labels
    Find {
        query: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Check every table, or one table file
    Validate {
        #[arg(short, long)]
        file: Option<String>,
        /// Require anchors on every target and ASCII tokens
        #[arg(long)]
        strict: bool,
    },
    /// List search sections
    Sections,
    /// Parse and rewrite tables, reporting whether the bytes are unchanged
    Roundtrip {
        /// A table file, or a directory of table files
        path: PathBuf,
    },
    /// Print a table's entries as JSON
    Dump {
        path: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Regenerate tables and searchdata.js from a JSON symbol list
    Rebuild {
        symbols: PathBuf,
        /// Output search/ directory
        output: PathBuf,
    },
}
