//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use mplp_domain::collab::CollabMode;
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for mplp
#[derive(Parser, Debug)]
#[command(name = "mplp")]
#[command(author, version, about = "Collaboration and extension management service")]
#[command(long_about = r#"
mplp hosts the collaboration and extension modules behind an HTTP API
and offers a few offline helpers.

Configuration files are loaded from (in priority order):
1. MPLP_* environment variables (e.g. MPLP_SERVER__BIND)
2. --config <path>     Explicit config file
3. ./mplp.toml         Project-level config
4. ~/.config/mplp/config.toml   Global config

Example:
  mplp serve --bind 0.0.0.0:8080
  mplp recommend --mode parallel --participants 6 -c analysis,review
  mplp validate-schema collab.json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API under /api/v1
    Serve {
        /// Address to bind, overriding [server].bind
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Recommend a coordination strategy for a team
    Recommend {
        /// Collaboration mode
        #[arg(short, long, value_parser = parse_mode)]
        mode: CollabMode,

        /// Number of participants
        #[arg(short, long)]
        participants: usize,

        /// Capabilities of one participant, comma separated (repeatable)
        #[arg(short, long = "capabilities", value_name = "CAPS")]
        capabilities: Vec<String>,
    },

    /// Check a snake_case collaboration document
    ValidateSchema {
        /// JSON file to check
        file: PathBuf,
    },

    /// Show configuration file locations and the effective settings
    ShowConfig,
}

fn parse_mode(value: &str) -> Result<CollabMode, String> {
    value.parse().map_err(|_| {
        let valid: Vec<&str> = CollabMode::ALL.iter().map(|m| m.as_str()).collect();
        format!("expected one of: {}", valid.join(", "))
    })
}

impl Command {
    /// Split `-c a,b` arguments into one capability list per participant
    pub fn capability_matrix(capabilities: &[String]) -> Vec<Vec<String>> {
        capabilities
            .iter()
            .map(|entry| {
                entry
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .collect()
    }
}
