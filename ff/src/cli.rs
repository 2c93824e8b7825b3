//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// FloorForge - floor plan generation client
#[derive(Parser)]
#[command(
    name = "ff",
    about = "Generate floor plans from text descriptions and keep them locally",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a floor plan from a description
    Generate {
        /// Description of the floor plan
        prompt: String,

        /// Number of diffusion steps
        #[arg(long)]
        steps: Option<u32>,

        /// Guidance scale
        #[arg(short, long)]
        guidance: Option<f64>,

        /// Seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,

        /// Name to give the new plan
        #[arg(short, long)]
        name: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List floor plans, most recent first
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one floor plan
    Show {
        /// Plan ID
        id: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Rename a floor plan
    ///
    /// Names are kept locally. The service does not store them, but a name
    /// given here survives later runs that reload the list from the service.
    Rename {
        /// Plan ID
        id: String,

        /// New name
        name: String,
    },

    /// Delete a floor plan
    ///
    /// Removes the plan from the local collection only. The service keeps its
    /// copy, so a plan it still lists comes back on the next run that reaches
    /// the service.
    Delete {
        /// Plan ID
        id: String,
    },

    /// Show the room counts found in a description (offline)
    Rooms {
        /// Description to analyze
        prompt: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check the generation service and model
    Status {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for commands that print data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Path the binary writes its log file to
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("floorforge")
        .join("logs")
        .join("floorforge.log")
}
