// crates/askbridge/src/cli/mod.rs
// CLI module for askbridge commands

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub mod ask;
pub mod chat;
pub mod check;
pub mod clients;

pub use ask::run_ask;
pub use chat::run_chat;
pub use check::run_check;

#[derive(Parser)]
#[command(name = "askbridge")]
#[command(about = "Answer questions by planning web searches, database queries and clarifying dialogue")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// SQLite database for the database_query tool
    #[arg(long, global = true, env = "ASKBRIDGE_DB_PATH")]
    pub db: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive session (default)
    Chat,

    /// Answer one question and exit
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Validate configuration and print a report
    Check,
}
