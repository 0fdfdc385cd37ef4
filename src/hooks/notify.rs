use super::SessionHook;
use anyhow::{Context, bail};
use std::fmt;
use std::process::{Command, Stdio};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_NOTIFY_COMMAND: &str = "export DISPLAY=:0; zenity --info --text={text}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyTargetError {
    #[error("notify address is empty")]
    Empty,
    #[error("notify address `{0}` has no host")]
    MissingHost(String),
    #[error("invalid port `{port}` in notify address `{addr}`")]
    BadPort { addr: String, port: String },
}

/// Remote display to notify, written `user@host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyTarget {
    /// `user@host` or bare `host`, passed to ssh as-is.
    pub destination: String,
    pub port: u16,
}

impl FromStr for NotifyTarget {
    type Err = NotifyTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NotifyTargetError::Empty);
        }
        let (destination, port) = match s.rsplit_once(':') {
            Some((dest, port)) => {
                let port = port.parse::<u16>().map_err(|_| NotifyTargetError::BadPort {
                    addr: s.to_string(),
                    port: port.to_string(),
                })?;
                (dest, port)
            }
            None => (s, DEFAULT_SSH_PORT),
        };
        let host = destination.rsplit_once('@').map_or(destination, |(_, h)| h);
        if host.is_empty() {
            return Err(NotifyTargetError::MissingHost(s.to_string()));
        }
        Ok(Self {
            destination: destination.to_string(),
            port,
        })
    }
}

impl fmt::Display for NotifyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.destination, self.port)
    }
}

/// Shows the session summary on a remote display through ssh. Not retried.
pub struct SshNotifier {
    target: NotifyTarget,
    template: String,
}

impl SshNotifier {
    pub fn new(target: NotifyTarget, template: impl Into<String>) -> Self {
        Self {
            target,
            template: template.into(),
        }
    }

    fn remote_command(&self, summary: &str) -> String {
        let text = format!("!!! Notification from {}\n\n{summary}", local_hostname());
        self.template.replace("{text}", &shell_quote(&text))
    }

    fn command(&self, summary: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-p")
            .arg(self.target.port.to_string())
            .arg(&self.target.destination)
            .arg(self.remote_command(summary))
            .stdin(Stdio::null());
        cmd
    }
}

impl SessionHook for SshNotifier {
    fn finished(&self, summary: &str) -> anyhow::Result<()> {
        let status = self
            .command(summary)
            .status()
            .with_context(|| format!("failed to run ssh for {}", self.target))?;
        if !status.success() {
            bail!("ssh notification to {} exited with {status}", self.target);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ssh-notify"
    }
}

/// Wrap `s` in single quotes for a POSIX shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn local_hostname() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()))
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "unknown host".into())
}
