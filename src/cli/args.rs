//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

/// Partner readiness tier matrix: refresh the facet cache, render filtered views
#[derive(Parser, Debug)]
#[command(name = "tiermatrix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Additional config file, layered over the global one
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the facet cache from roster, scores, baseline and links
    Refresh {
        /// Exit non-zero when the refresh was skipped
        #[arg(long)]
        strict: bool,
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },

    /// Render the matrix for a facet selection
    View {
        /// Partner type: All, Managed, Unmanaged
        #[arg(short = 't', long = "type", default_value = "All")]
        partner_type: String,
        /// Region name or All
        #[arg(short, long, default_value = "All")]
        region: String,
        /// Country or All
        #[arg(short = 'C', long, default_value = "All")]
        country: String,
        /// Comma separated solutions or All
        #[arg(short, long, default_value = "All")]
        solution: String,
        /// Product or All
        #[arg(short, long, default_value = "All")]
        product: String,
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },

    /// List selectable facet values
    Options {
        /// Region whose countries are listed
        #[arg(short, long, default_value = "All")]
        region: String,
        /// Solutions whose products are listed
        #[arg(short, long, default_value = "All")]
        solution: String,
        /// Toggle a solution in or out of the selection (repeatable)
        #[arg(long)]
        toggle: Vec<String>,
    },

    /// Manage the baseline snapshot
    Baseline {
        #[command(subcommand)]
        command: BaselineCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum BaselineCommands {
    /// Store the current cache values as the baseline for future deltas
    Freeze,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Write config template to the global config path
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,

    /// Print commented config template
    Template,
}
