//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Rebuild trees from flat parent-linked JSON records
#[derive(Parser, Debug)]
#[command(name = "listree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (overrides the global listree.toml)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Record field holding the node id
    #[arg(long, global = true)]
    pub pk: Option<String>,

    /// Record field holding the parent id
    #[arg(long, global = true)]
    pub fk: Option<String>,

    /// Keep the last parentless record as root instead of failing
    #[arg(long, global = true)]
    pub last_wins: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the hierarchy as an indented tree
    Tree {
        /// JSON array of records (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Payload field appended to each node label
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Export the hierarchy as nested JSON
    Json {
        /// JSON array of records (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Field name holding nested children
        #[arg(long)]
        children_field: Option<String>,
        /// Pretty-print
        #[arg(short, long)]
        pretty: bool,
    },

    /// List node ids in pre-order
    Ids {
        /// JSON array of records (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Flatten the hierarchy into a JSON array in pre-order
    List {
        /// JSON array of records (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Only include these payload fields
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
        /// Sort siblings by this payload field
        #[arg(short, long)]
        sort_by: Option<String>,
    },

    /// List the direct children of the root or of a given node
    Children {
        /// JSON array of records (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Node whose children to list (default: root)
        #[arg(long)]
        id: Option<String>,
        /// Only include these payload fields
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
    },

    /// Show effective settings
    Config,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
