use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `toolweave` - dependency-aware parallel tool orchestration.
#[derive(Parser, Debug)]
#[command(name = "toolweave")]
#[command(version)]
#[command(about = "Run tool plans in dependency-ordered parallel waves.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.toolweave/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging, plus execution metrics after each run
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a question: a model plans the tool calls and fuses the results
    Ask {
        /// The question to answer
        question: String,

        /// Print the answer and full result bundle as JSON
        #[arg(long)]
        json: bool,
    },

    /// Execute a plan file and print the fused answer
    Run {
        /// JSON plan, or planner output containing one
        #[arg(short, long)]
        plan: PathBuf,

        /// The user query the plan answers
        #[arg(short, long, default_value = "")]
        query: String,

        /// Print the full result bundle as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate a plan file and print its waves
    Validate {
        #[arg(short, long)]
        plan: PathBuf,
    },

    /// List the registered tools
    Tools,
}
