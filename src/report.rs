//! Text blocks for the session transcript. Pure: every function returns a string.

use crate::recorder::RunRecord;
use chrono::{DateTime, Local, TimeDelta, Timelike};
use std::path::Path;

const PROGRAM: &str = "seqlaunch";
const TAGLINE: &str = "- Runs shell commands one after another and logs all their output to a file.";
pub const SESSION_RULE: &str =
    "================================================================================";
const COMMAND_RULE: &str = "============================================================";

/// Display prefix for the command at 0-based `index`: `"3> "`.
pub fn prefix(index: usize) -> String {
    format!("{}> ", index + 1)
}

pub fn header(started_at: DateTime<Local>, working_dir: &Path, commands: &[String]) -> String {
    let mut s = String::new();
    line(&mut s, SESSION_RULE);
    line(&mut s, PROGRAM);
    line(&mut s, TAGLINE);
    line(&mut s, "");
    line(&mut s, &format!("STARTED at {}", timestamp(started_at)));
    line(&mut s, &format!("Executed in {}", working_dir.display()));
    line(&mut s, "");
    line(&mut s, &format!("# of total launching commands: {}", commands.len()));
    for (i, cmd) in commands.iter().enumerate() {
        line(&mut s, &format!("{}{cmd}", prefix(i)));
    }
    line(&mut s, SESSION_RULE);
    line(&mut s, "");
    s
}

pub fn command_started(index: usize, command: &str, started_at: DateTime<Local>) -> String {
    let p = prefix(index);
    let mut s = String::new();
    line(&mut s, COMMAND_RULE);
    line(&mut s, &format!("{p}{command}"));
    line(&mut s, &format!("{p}STARTED at {}", timestamp(started_at)));
    line(&mut s, COMMAND_RULE);
    line(&mut s, "");
    s
}

/// End block for a completed record. A record still running renders as failed at its start time.
pub fn command_finished(record: &RunRecord) -> String {
    let p = prefix(record.index);
    let finished_at = record.finished_at.unwrap_or(record.started_at);
    let verdict = if record.succeeded() { "SUCCEEDED" } else { "FAILED" };

    let mut s = String::new();
    line(&mut s, "");
    line(&mut s, COMMAND_RULE);
    line(&mut s, &format!("{p}{}", record.command));
    line(&mut s, &format!("{p}{verdict} at {}", timestamp(finished_at)));
    line(
        &mut s,
        &format!("{p}Elapsed time: {}", elapsed(finished_at - record.started_at)),
    );
    line(&mut s, COMMAND_RULE);
    line(&mut s, "");
    s
}

/// Diagnostic block for a command that could not be run.
pub fn launch_failure(index: usize, diagnostic: &str) -> String {
    let p = prefix(index);
    let mut s = String::new();
    for l in diagnostic.lines() {
        line(&mut s, &format!("{p}{l}"));
    }
    s
}

pub fn summary(
    records: &[RunRecord],
    started_at: DateTime<Local>,
    finished_at: DateTime<Local>,
    log_path: &Path,
) -> String {
    let (ok, failed): (Vec<&RunRecord>, Vec<&RunRecord>) =
        records.iter().partition(|r| r.succeeded());

    let mut s = String::new();
    line(&mut s, SESSION_RULE);
    line(&mut s, PROGRAM);
    line(&mut s, "");
    line(&mut s, &format!("FINISHED at {}", timestamp(finished_at)));
    line(&mut s, &format!("Elapsed time: {}", elapsed(finished_at - started_at)));
    line(&mut s, "");
    line(&mut s, &format!("# of succeeded launching commands: {}", ok.len()));
    for r in &ok {
        line(&mut s, &format!("{}{}", prefix(r.index), r.command));
    }
    line(&mut s, "");
    line(&mut s, &format!("# of failed launching commands: {}", failed.len()));
    for r in &failed {
        line(&mut s, &format!("{}{}", prefix(r.index), r.command));
    }
    line(&mut s, SESSION_RULE);
    line(&mut s, "");
    line(&mut s, &format!("This log has been saved to {}", log_path.display()));
    s
}

/// `2024-03-09 14:05:07.250000`; the fraction is omitted on whole seconds.
pub fn timestamp(at: DateTime<Local>) -> String {
    let micros = at.nanosecond() % 1_000_000_000 / 1_000;
    let base = at.format("%Y-%m-%d %H:%M:%S");
    if micros == 0 {
        base.to_string()
    } else {
        format!("{base}.{micros:06}")
    }
}

/// `H:MM:SS[.ffffff]`, prefixed with `N day(s), ` past 24 hours. Negative spans clamp to zero.
pub fn elapsed(delta: TimeDelta) -> String {
    let d = delta.to_std().unwrap_or_default();
    let total = d.as_secs();
    let (days, rem) = (total / 86_400, total % 86_400);
    let (h, m, sec) = (rem / 3600, rem % 3600 / 60, rem % 60);
    let micros = d.subsec_micros();

    let mut s = match days {
        0 => String::new(),
        1 => "1 day, ".to_string(),
        n => format!("{n} days, "),
    };
    s.push_str(&format!("{h}:{m:02}:{sec:02}"));
    if micros != 0 {
        s.push_str(&format!(".{micros:06}"));
    }
    s
}

fn line(buf: &mut String, text: &str) {
    buf.push_str(text);
    buf.push('\n');
}
