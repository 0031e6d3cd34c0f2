use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(
    name = "groundtruth",
    version,
    about = "Review parsed documents with chunks synchronised to their page regions"
)]
pub struct Cli {
    /// RON configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Backend address; overrides the configuration file.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List uploaded documents.
    Documents,
    /// Open a document and show its chunks next to their page regions.
    Open {
        doc_id: String,
        /// Select the chunk at this list position.
        #[arg(long)]
        select: Option<usize>,
        /// Zoom steps; negative values zoom out.
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        zoom: i32,
        /// Drag the divider so the chunk list takes this share of the width.
        #[arg(long)]
        divider: Option<f64>,
    },
    /// Semantic search across all documents.
    Search {
        query: String,
        /// Jump to the result at this position.
        #[arg(long)]
        open: Option<usize>,
    },
    /// Ask a question about the uploaded documents.
    Ask {
        question: String,
        /// Jump to the cited source at this position.
        #[arg(long)]
        source: Option<usize>,
    },
    /// Upload a single document.
    Upload { path: PathBuf },
    /// Upload several PDFs in bounded waves.
    Batch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Extract structured data from a document.
    Extract { doc_id: String },
    /// Save reviewed data for a document.
    Validate {
        doc_id: String,
        /// JSON file holding the reviewed data.
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a document from the backend.
    Delete { doc_id: String },
    /// Print the effective configuration.
    Config {
        /// Also write it to the configuration file.
        #[arg(long)]
        write: bool,
    },
}
