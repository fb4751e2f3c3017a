use crate::tracing::LogFormat;
use crate::types::ListKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "choice-engine")]
#[command(about = "Classify keystrokes and rank launcher choices", long_about = None)]
pub struct Cli {
    /// Engine config file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log record format on stderr
    #[arg(long, global = true, value_enum, default_value = "compact")]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank a choice file for a single query and print the result as JSON
    Rank {
        #[arg(short, long)]
        choices: PathBuf,
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Feed raw inputs through classification and print every event as a JSON line
    Replay {
        #[arg(short, long)]
        choices: PathBuf,
        /// Flags description (JSON object) for the actions list
        #[arg(short, long)]
        actions: Option<PathBuf>,
        /// Which list the inputs are typed into
        #[arg(short, long, value_enum, default_value = "main")]
        list: ListArg,
        /// Command characters that gate ranking
        #[arg(long)]
        command_chars: Option<String>,
        /// Successive contents of the input field
        inputs: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListArg {
    Main,
    Actions,
}

impl From<ListArg> for ListKind {
    fn from(value: ListArg) -> Self {
        match value {
            ListArg::Main => Self::Main,
            ListArg::Actions => Self::Actions,
        }
    }
}
