//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Peripheral request arguments; each one overrides the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct RequestArgs {
    /// Offer peripherals whose advertised name starts with this prefix
    #[arg(long, env = "GATTDEMO_NAME_PREFIX", conflicts_with = "accept_all")]
    pub name_prefix: Option<String>,

    /// Offer only the peripheral with this exact advertised name
    #[arg(long, conflicts_with = "accept_all")]
    pub name: Option<String>,

    /// Require an advertised service (name, 16-bit alias or UUID); repeatable
    #[arg(long = "service", value_name = "SERVICE", conflicts_with = "accept_all")]
    pub services: Vec<String>,

    /// Offer every peripheral in range
    #[arg(long)]
    pub accept_all: bool,

    /// Scan duration in seconds
    #[arg(long, value_name = "SECS")]
    pub scan_timeout: Option<u64>,

    /// Use the built-in demo peripherals instead of Bluetooth
    #[arg(long, env = "GATTDEMO_MOCK")]
    pub mock: bool,
}

#[derive(Parser)]
#[command(name = "gattdemo")]
#[command(author, version, about = "Step-by-step BLE pairing and GATT read demo", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH", env = "GATTDEMO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk a peripheral through the pairing workflow (default)
    Run {
        #[command(flatten)]
        request: RequestArgs,

        /// Follow the workflow to the end without prompting
        #[arg(long)]
        auto: bool,

        /// Write the activity log as JSON lines to this file ("-" for stdout)
        #[arg(long, value_name = "PATH")]
        log_json: Option<PathBuf>,
    },

    /// List peripherals the adapter already knows about
    Known {
        #[command(flatten)]
        request: RequestArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a configuration file with the default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
