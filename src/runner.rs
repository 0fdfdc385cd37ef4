use crate::sink::Sink;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command};
use thiserror::Error;

/// Result of a process that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Exit code, or -1 when the process was ended by a signal.
    pub exit_code: i32,
}

impl Outcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to create output pipe")]
    Pipe(#[source] io::Error),
    #[error("failed to launch `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read command output")]
    Read(#[source] io::Error),
    #[error("failed to wait for command to exit")]
    Wait(#[source] io::Error),
    #[error("failed to write command output")]
    Sink(#[source] io::Error),
}

impl RunError {
    /// Everything except a sink fault counts against the command itself.
    pub fn is_launch_failure(&self) -> bool {
        !matches!(self, Self::Sink(_))
    }
}

/// Shell used to interpret each command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    pub program: String,
    pub flag: String,
}

impl Default for Shell {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd".into(),
                flag: "/C".into(),
            }
        } else {
            Self {
                program: "sh".into(),
                flag: "-c".into(),
            }
        }
    }
}

/// Spawns one command at a time and streams its merged output line by line.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    shell: Shell,
    working_dir: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new(shell: Shell, working_dir: Option<PathBuf>) -> Self {
        Self { shell, working_dir }
    }

    /// Run `command` through the shell, writing `prefix + line` to `sink`
    /// for every line of combined stdout/stderr, flushing after each one.
    pub fn run(&self, command: &str, prefix: &str, sink: &mut dyn Sink) -> Result<Outcome, RunError> {
        let (reader, writer) = io::pipe().map_err(RunError::Pipe)?;

        let mut child = {
            let err_writer = writer.try_clone().map_err(RunError::Pipe)?;
            let mut cmd = Command::new(&self.shell.program);
            cmd.arg(&self.shell.flag)
                .arg(command)
                .stdout(writer)
                .stderr(err_writer);
            if let Some(dir) = &self.working_dir {
                cmd.current_dir(dir);
            }
            cmd.spawn().map_err(|source| RunError::Spawn {
                command: command.to_string(),
                source,
            })?
            // `cmd` drops here, closing our copies of the write end so EOF can arrive.
        };
        tracing::debug!(pid = child.id(), command, "spawned");

        if let Err(e) = pump(BufReader::new(reader), prefix, sink) {
            abandon(&mut child);
            return Err(e);
        }

        let status = child.wait().map_err(RunError::Wait)?;
        let exit_code = status.code().unwrap_or(-1);
        tracing::debug!(command, exit_code, "exited");
        Ok(Outcome { exit_code })
    }
}

/// Drain `reader` until EOF. Only one line is held in memory at a time.
fn pump<R: BufRead>(mut reader: R, prefix: &str, sink: &mut dyn Sink) -> Result<(), RunError> {
    let mut raw = Vec::with_capacity(1024);
    let mut text = String::with_capacity(1024);
    loop {
        raw.clear();
        let n = reader.read_until(b'\n', &mut raw).map_err(RunError::Read)?;
        if n == 0 {
            return Ok(());
        }
        text.clear();
        text.push_str(prefix);
        text.push_str(&String::from_utf8_lossy(&raw));
        if !text.ends_with('\n') {
            text.push('\n');
        }
        sink.write_text(&text).map_err(RunError::Sink)?;
        sink.flush().map_err(RunError::Sink)?;
    }
}

/// Kill and reap a child whose output we can no longer handle.
fn abandon(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!(pid = child.id(), error = %e, "failed to kill child");
    }
    if let Err(e) = child.wait() {
        tracing::warn!(pid = child.id(), error = %e, "failed to reap child");
    }
}
