mod cli;
mod config;
mod hooks;
mod input;
mod recorder;
mod report;
mod runner;
mod session;
mod sink;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, RunArgs};
use config::Config;
use hooks::notify::{NotifyTarget, SshNotifier};
use hooks::open_log::LogOpener;
use input::CommandSources;
use runner::ProcessRunner;
use session::{Session, SessionPlan};
use sink::logfile::{LogFileSink, expand_home};
use sink::terminal::TerminalSink;
use sink::{FanOutWriter, Sink};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let cfg = Config::load();

    match cli.command {
        Commands::Info => {
            print_info(&cfg);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { global } => {
            create_config(global)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => run(cfg, args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cfg: Config, args: RunArgs) -> anyhow::Result<ExitCode> {
    let commands = input::collect(&CommandSources {
        args: &args.commands,
        file: args.file.as_deref(),
        json: args.json.as_deref(),
    })?;

    let notify_target = args
        .ssh_notify_address
        .or(cfg.ssh_notify_address.clone())
        .map(|addr| addr.parse::<NotifyTarget>())
        .transpose()?;

    let working_dir = match args.cwd.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("could not determine current directory")?,
    };

    let log_dir = expand_home(args.log_directory.as_deref().unwrap_or(&cfg.log_directory));
    let started_at = chrono::Local::now();
    let log = LogFileSink::create(&log_dir, started_at)
        .with_context(|| format!("could not create log file in {}", log_dir.display()))?;

    let plan = SessionPlan {
        commands,
        log_path: log.path().to_path_buf(),
        working_dir,
        started_at,
    };

    let sinks: Vec<Box<dyn Sink>> = vec![Box::new(TerminalSink::new()), Box::new(log)];
    let runner = ProcessRunner::new(cfg.shell(), args.cwd);
    let mut session = Session::new(FanOutWriter::new(sinks), runner);

    if let Some(open_cmd) = args.log_open_cmd.or(cfg.log_open_cmd.clone()) {
        session = session.with_hook(Box::new(LogOpener::new(&open_cmd)));
    }
    if let Some(target) = notify_target {
        session = session.with_hook(Box::new(SshNotifier::new(target, cfg.notify_command.clone())));
    }

    let report = session.run(&plan)?;
    tracing::debug!(log = %report.log_path.display(), "transcript saved");

    if (args.strict || cfg.fail_on_error) && !report.all_succeeded() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_info(cfg: &Config) {
    println!("[seqlaunch info]");
    println!("  version: {}", env!("CARGO_PKG_VERSION"));
    match config::global_config_path() {
        Some(path) => println!("  global config: {}", path.display()),
        None => println!("  global config: (no config directory)"),
    }
    println!("  project config: {}", config::PROJECT_FILE);
    println!("  log_directory: {}", expand_home(&cfg.log_directory).display());
    println!("  log_open_cmd: {}", cfg.log_open_cmd.as_deref().unwrap_or("(none)"));
    println!(
        "  ssh_notify_address: {}",
        cfg.ssh_notify_address.as_deref().unwrap_or("(none)")
    );
    println!("  notify_command: {}", cfg.notify_command);
    println!("  shell: {} {}", cfg.shell, cfg.shell_flag);
    println!("  fail_on_error: {}", cfg.fail_on_error);
}

fn create_config(global: bool) -> anyhow::Result<()> {
    let path = if global {
        let dir = config::global_config_path()
            .and_then(|p| p.parent().map(|d| d.to_path_buf()))
            .context("could not determine config directory")?;
        std::fs::create_dir_all(&dir).context("could not create config dir")?;
        dir.join("config.toml")
    } else {
        std::path::PathBuf::from(config::PROJECT_FILE)
    };

    if path.exists() {
        println!("[seqlaunch] config already exists: {}", path.display());
        return Ok(());
    }

    std::fs::write(&path, Config::default_toml())
        .with_context(|| format!("could not write {}", path.display()))?;
    println!("[seqlaunch] created {}", path.display());
    Ok(())
}
