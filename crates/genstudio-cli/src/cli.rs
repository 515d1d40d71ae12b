use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "genstudio")]
#[command(version, about = "GenStudio - image and video generation client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to ~/.config/genstudio/config.toml)
    #[arg(long, global = true, env = "GENSTUDIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Call a generation endpoint, rotating credentials on failure
    Call(CallArgs),

    /// Personal credential management
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Args)]
pub struct CallArgs {
    /// Endpoint URL to POST to
    pub endpoint: String,

    /// JSON request body
    #[arg(long, conflicts_with = "payload_file")]
    pub payload: Option<String>,

    /// Read the JSON request body from a file
    #[arg(long)]
    pub payload_file: Option<PathBuf>,

    /// Label used in logs and the audit trail
    #[arg(long, default_value = "CLI Request")]
    pub context: String,

    /// Use only this token instead of rotating
    #[arg(long, env = "GENSTUDIO_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Print every attempt after the call
    #[arg(long)]
    pub show_attempts: bool,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Show configured credentials (redacted)
    Show,

    /// Save the personal token to the user profile
    SetPersonal {
        /// Token value
        token: String,
    },

    /// Remove the personal token from the user profile
    ClearPersonal,
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
