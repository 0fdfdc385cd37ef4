use crate::hooks::notify::DEFAULT_NOTIFY_COMMAND;
use crate::runner::Shell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const PROJECT_FILE: &str = ".seqlaunch.toml";

/// Global + per-project configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory that receives one log file per session. A leading `~` is the home directory.
    pub log_directory: String,
    /// Program (plus args) started with the log path once logging begins.
    pub log_open_cmd: Option<String>,
    /// `user@host[:port]` to notify over ssh when the session ends.
    pub ssh_notify_address: Option<String>,
    /// Remote command run by the notifier; `{text}` is replaced by the quoted summary.
    pub notify_command: String,
    /// Shell that interprets each command.
    pub shell: String,
    /// Flag that makes `shell` run its next argument as a script.
    pub shell_flag: String,
    /// Exit 1 when any command failed.
    pub fail_on_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        let shell = Shell::default();
        Self {
            log_directory: "~/SequentialLauncherLog".into(),
            log_open_cmd: None,
            ssh_notify_address: None,
            notify_command: DEFAULT_NOTIFY_COMMAND.into(),
            shell: shell.program,
            shell_flag: shell.flag,
            fail_on_error: false,
        }
    }
}

impl Config {
    /// Load config with priority: .seqlaunch.toml (project) > ~/.config/seqlaunch/config.toml (global) > defaults.
    pub fn load() -> Self {
        Self::load_from(global_config_path().as_deref(), Path::new(PROJECT_FILE))
    }

    fn load_from(global: Option<&Path>, project: &Path) -> Self {
        let mut config = Self::default();

        // 1. Global config
        if let Some(path) = global
            && let Some(global) = load_file(path)
        {
            config = merge(config, global);
        }

        // 2. Project config (overrides global)
        if let Some(project) = load_file(project) {
            config = merge(config, project);
        }

        config
    }

    pub fn shell(&self) -> Shell {
        Shell {
            program: self.shell.clone(),
            flag: self.shell_flag.clone(),
        }
    }

    /// Generate a default config file content.
    pub fn default_toml() -> &'static str {
        r#"# seqlaunch configuration
# Place in ~/.config/seqlaunch/config.toml (global) or .seqlaunch.toml (per-project)

# Where session logs are written (one file per run)
log_directory = "~/SequentialLauncherLog"

# Open the log when the session starts; the log path is appended
# log_open_cmd = "firefox -new-tab"

# Notify a remote display over ssh when the session ends
# ssh_notify_address = "user@hostname:22"
notify_command = "export DISPLAY=:0; zenity --info --text={text}"

# Shell used to run each command
# shell = "sh"
# shell_flag = "-c"

# Exit with status 1 if any command failed
fail_on_error = false
"#
    }
}

/// Partial config for TOML deserialization (all fields optional).
#[derive(Debug, Deserialize)]
struct PartialConfig {
    log_directory: Option<String>,
    log_open_cmd: Option<String>,
    ssh_notify_address: Option<String>,
    notify_command: Option<String>,
    shell: Option<String>,
    shell_flag: Option<String>,
    fail_on_error: Option<bool>,
}

pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("seqlaunch").join("config.toml"))
}

fn load_file(path: &Path) -> Option<PartialConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(partial) => Some(partial),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring config: {e}");
            None
        }
    }
}

fn merge(base: Config, partial: PartialConfig) -> Config {
    Config {
        log_directory: partial.log_directory.unwrap_or(base.log_directory),
        log_open_cmd: partial.log_open_cmd.or(base.log_open_cmd),
        ssh_notify_address: partial.ssh_notify_address.or(base.ssh_notify_address),
        notify_command: partial.notify_command.unwrap_or(base.notify_command),
        shell: partial.shell.unwrap_or(base.shell),
        shell_flag: partial.shell_flag.unwrap_or(base.shell_flag),
        fail_on_error: partial.fail_on_error.unwrap_or(base.fail_on_error),
    }
}
