//! Turns user input into a validated command list. Input is data only, never evaluated.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("command #{position} is empty")]
    EmptyCommand { position: usize },
    #[error("--json must be a JSON array of strings")]
    Json(#[source] serde_json::Error),
    #[error("failed to read command file {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Sources of commands, concatenated in field order.
#[derive(Debug, Default)]
pub struct CommandSources<'a> {
    pub args: &'a [String],
    pub file: Option<&'a Path>,
    pub json: Option<&'a str>,
}

pub fn collect(sources: &CommandSources<'_>) -> Result<Vec<String>, InputError> {
    let mut out: Vec<String> = sources.args.to_vec();

    if let Some(path) = sources.file {
        let text = std::fs::read_to_string(path).map_err(|source| InputError::File {
            path: path.to_path_buf(),
            source,
        })?;
        out.extend(parse_lines(&text));
    }

    if let Some(raw) = sources.json {
        out.extend(parse_json(raw)?);
    }

    validate(out)
}

/// One command per line; blank lines and `#` comments are skipped.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| {
            let t = l.trim_start();
            !t.is_empty() && !t.starts_with('#')
        })
        .map(str::to_string)
        .collect()
}

pub fn parse_json(raw: &str) -> Result<Vec<String>, InputError> {
    serde_json::from_str(raw).map_err(InputError::Json)
}

fn validate(commands: Vec<String>) -> Result<Vec<String>, InputError> {
    commands
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let c = c.trim_end_matches(['\r', '\n']).to_string();
            if c.trim().is_empty() {
                Err(InputError::EmptyCommand { position: i + 1 })
            } else {
                Ok(c)
            }
        })
        .collect()
}
