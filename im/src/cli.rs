//! CLI argument parsing for ingestmap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "im")]
#[command(author, version, about = "Field mapping engine for CRM ingestion pipelines", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value at a path expression inside a JSON file
    Extract {
        /// JSON payload file
        #[arg(required = true)]
        payload: PathBuf,

        /// Path expression, e.g. users[0].name
        #[arg(required = true)]
        path: String,
    },

    /// Check a pipeline definition and list its compiled mappings
    Validate {
        /// Pipeline definition (YAML or JSON)
        #[arg(required = true)]
        pipeline: PathBuf,
    },

    /// Assemble every record of a payload and print the results
    Map {
        /// Pipeline definition (YAML or JSON)
        #[arg(required = true)]
        pipeline: PathBuf,

        /// JSON payload file
        #[arg(required = true)]
        payload: PathBuf,
    },

    /// Test a pipeline against sample records
    Preview {
        /// Pipeline definition (YAML or JSON)
        #[arg(required = true)]
        pipeline: PathBuf,

        /// JSON file holding the sample records (array or single object)
        #[arg(required = true)]
        samples: PathBuf,

        /// Maximum records in the preview (default from config)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Run a payload through the full pipeline against an in-memory store
    Process {
        /// Pipeline definition (YAML or JSON)
        #[arg(required = true)]
        pipeline: PathBuf,

        /// JSON payload file
        #[arg(required = true)]
        payload: PathBuf,

        /// Also print the records left in the store
        #[arg(short, long)]
        dump: bool,
    },
}
