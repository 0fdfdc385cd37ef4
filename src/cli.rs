use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "seqlaunch",
    version,
    about = "Runs shell commands one after another and logs all their output to a file"
)]
pub struct Cli {
    /// Log internal diagnostics to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run commands in order, teeing output to the terminal and a log file
    Run(RunArgs),

    /// Show the resolved configuration
    Info,

    /// Generate a default .seqlaunch.toml config file
    Init {
        /// Generate in ~/.config/seqlaunch/ instead of current directory
        #[arg(long)]
        global: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Commands to run, one per argument (quote each one)
    pub commands: Vec<String>,

    /// Read additional commands from a file, one per line (# starts a comment)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Additional commands as a JSON array of strings
    #[arg(long, value_name = "ARRAY")]
    pub json: Option<String>,

    /// Directory in which log files are generated
    #[arg(long, value_name = "LOG_DIRECTORY")]
    pub log_directory: Option<String>,

    /// Program to open the log file with when launching starts
    #[arg(long, value_name = "LOG_OPEN_CMD")]
    pub log_open_cmd: Option<String>,

    /// user@hostname[:port] to notify over ssh when the job is finished
    #[arg(long, value_name = "ADDRESS")]
    pub ssh_notify_address: Option<String>,

    /// Directory the commands run in (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Exit with status 1 if any command failed
    #[arg(long)]
    pub strict: bool,
}
