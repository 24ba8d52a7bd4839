//! CLI command definitions and parsing
use crate::export::BundlePreset;
use crate::models::ConversionDirection;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "textlens",
    version,
    author = "neur0map",
    about = "Command-line client for the Chinese text analysis service",
    long_about = "Textlens talks to a Chinese text analysis service: it analyzes texts, compares \
                  their similarity, converts between traditional and simplified script, assembles \
                  comprehensive reports and downloads the resulting charts and data."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/textlens/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Profile to apply on top of the configuration file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Directory downloads are written to (overrides export.output_dir)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Conversion target accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Script {
    Traditional,
    Simplified,
}

impl From<Script> for ConversionDirection {
    fn from(script: Script) -> Self {
        match script {
            Script::Traditional => ConversionDirection::ToTraditional,
            Script::Simplified => ConversionDirection::ToSimplified,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a Chinese text
    Analyze {
        /// Text to analyze
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long, conflicts_with_all = ["text", "sample"])]
        file: Option<PathBuf>,

        /// Analyze the sample text served by the backend
        #[arg(long, conflicts_with = "text")]
        sample: bool,

        /// Generate a comprehensive report afterwards
        #[arg(long)]
        report: bool,

        /// Download a chart bundle (basic, advanced or all)
        #[arg(long, value_name = "PRESET")]
        bundle: Option<BundlePreset>,

        /// Save the full result as JSON
        #[arg(long)]
        json: bool,

        /// Save word frequencies as CSV
        #[arg(long)]
        csv: bool,

        /// Save every chart and the JSON result
        #[arg(long)]
        everything: bool,
    },

    /// Convert between traditional and simplified Chinese
    Convert {
        /// Text to convert
        text: String,

        /// Target script
        #[arg(short, long, value_enum, default_value = "traditional")]
        to: Script,

        /// Save the converted text to the output directory
        #[arg(short, long)]
        save: bool,
    },

    /// Compare the similarity of two or more texts
    Similarity {
        /// Texts to compare
        texts: Vec<String>,

        /// Use the built-in example texts
        #[arg(short, long, conflicts_with = "texts")]
        example: bool,

        /// Read texts from a file, one per line
        #[arg(short, long, conflicts_with_all = ["texts", "example"])]
        file: Option<PathBuf>,

        /// Analyze this text too and generate a report covering both
        #[arg(long, value_name = "TEXT")]
        report_with: Option<String>,
    },

    /// Upload a document and show the extracted text
    Upload {
        /// Document to upload
        path: PathBuf,

        /// Analyze the extracted text
        #[arg(short, long)]
        analyze: bool,
    },

    /// Show which backend features are available
    Capabilities,

    /// Analyze a text and generate a comprehensive report
    Report {
        /// Text to analyze
        text: String,

        /// Additional texts for a similarity section
        #[arg(short = 's', long = "compare", value_name = "TEXT")]
        compare: Vec<String>,

        /// Download the rendered report
        #[arg(short, long)]
        download: bool,
    },

    /// Interactive session keeping results between commands
    Shell,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Show only a specific section
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Get a configuration value
    Get {
        /// Configuration key in dot notation (e.g., "api.base_url")
        key: String,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Set active profile
    SetProfile {
        /// Profile name defined under [profiles]
        profile: String,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
