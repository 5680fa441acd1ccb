use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "gt",
    about = "gtrack: a minimal content-addressed version control tool",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    pub dir: PathBuf,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty repository
    Init,
    /// Record the working directory as a new commit
    Commit(CommitArgs),
    /// Show commit history, newest first
    Log(LogArgs),
    /// Print a stored object
    Cat(CatArgs),
    /// Replace the working directory with a commit's snapshot
    Checkout(CheckoutArgs),
}

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Single-line commit message
    pub message: String,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Show at most this many commits
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CatArgs {
    /// Full 40-character object fingerprint
    pub fingerprint: String,
}

#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Full 40-character commit fingerprint
    pub fingerprint: String,
}
