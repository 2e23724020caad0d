pub mod builder;
pub mod cache;
pub mod cli;
pub mod config;
pub mod docset;
pub mod error;
pub mod manifest;
pub mod search;
pub mod server;
pub mod state;
pub mod table;
pub mod tools;
pub mod tracing;

pub use builder::{BuiltIndex, SymbolKind, SymbolRecord, TableBuilder};
pub use config::Config;
pub use docset::{Docset, DocsetOptions};
pub use error::{LoadError, ParseError, Result};
pub use manifest::{IndexManifest, IndexSection};
pub use state::DocsetState;
pub use table::{SearchEntry, SearchTable, Target};
