use super::SessionHook;
use anyhow::{Context, bail};
use std::path::Path;
use std::process::{Command, Stdio};

/// Opens the log in an external viewer (e.g. `firefox -new-tab`) without waiting for it.
pub struct LogOpener {
    argv: Vec<String>,
}

impl LogOpener {
    /// Split `cmdline` on whitespace; the log path becomes the last argument.
    pub fn new(cmdline: &str) -> Self {
        Self {
            argv: cmdline.split_whitespace().map(str::to_string).collect(),
        }
    }

    fn command(&self, log_path: &Path) -> Option<Command> {
        let (program, args) = self.argv.split_first()?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg(log_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Some(cmd)
    }
}

impl SessionHook for LogOpener {
    #[allow(clippy::zombie_processes)]
    fn log_ready(&self, log_path: &Path) -> anyhow::Result<()> {
        let Some(mut cmd) = self.command(log_path) else {
            bail!("log open command is empty");
        };
        let child = cmd
            .spawn()
            .with_context(|| format!("failed to start `{}`", self.argv.join(" ")))?;
        tracing::debug!(pid = child.id(), "log viewer started");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log-open"
    }
}
