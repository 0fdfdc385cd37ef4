use super::{Sink, closed_error};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File-name stamp for a session log.
const STAMP_FORMAT: &str = "%Y-%m-%d--%H-%M-%S";

/// Give up after this many same-second collisions.
const MAX_SUFFIX: u32 = 1000;

/// Persistent transcript file. Flushed on every `flush` so the log tracks the terminal.
pub struct LogFileSink {
    path: PathBuf,
    file: Option<BufWriter<File>>,
}

impl LogFileSink {
    /// Create a fresh log in `dir` named after `started_at`.
    /// The directory is created if absent; an existing log is never reused.
    pub fn create(dir: &Path, started_at: DateTime<Local>) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let stamp = started_at.format(STAMP_FORMAT).to_string();

        for n in 1..=MAX_SUFFIX {
            let name = if n == 1 {
                format!("{stamp}.txt")
            } else {
                format!("{stamp}-{n}.txt")
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    tracing::debug!(path = %path.display(), "opened session log");
                    return Ok(Self {
                        path,
                        file: Some(BufWriter::new(file)),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free log name for {stamp} in {}", dir.display()),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for LogFileSink {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        match self.file.as_mut() {
            Some(f) => f.write_all(text.as_bytes()),
            None => Err(closed_error()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        let Some(mut f) = self.file.take() else {
            return Ok(());
        };
        f.flush()?;
        f.get_ref().sync_all()
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_name_from_start_time() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LogFileSink::create(dir.path(), at()).unwrap();
        assert_eq!(
            sink.path().file_name().unwrap().to_str().unwrap(),
            "2024-03-09--14-05-07.txt"
        );
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let sink = LogFileSink::create(&nested, at()).unwrap();
        assert!(nested.is_dir());
        assert!(sink.path().starts_with(&nested));
    }

    #[test]
    fn test_same_second_gets_distinct_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = LogFileSink::create(dir.path(), at()).unwrap();
        first.write_text("first\n").unwrap();
        first.close().unwrap();

        let second = LogFileSink::create(dir.path(), at()).unwrap();
        assert_ne!(first.path(), second.path());
        assert!(second.path().to_str().unwrap().ends_with("-2.txt"));
        assert_eq!(std::fs::read_to_string(first.path()).unwrap(), "first\n");
    }

    #[test]
    fn test_flush_makes_text_visible() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = LogFileSink::create(dir.path(), at()).unwrap();
        sink.write_text("1> partial\n").unwrap();
        sink.flush().unwrap();
        assert_eq!(std::fs::read_to_string(sink.path()).unwrap(), "1> partial\n");
    }

    #[test]
    fn test_write_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = LogFileSink::create(dir.path(), at()).unwrap();
        sink.close().unwrap();
        sink.close().unwrap();
        assert!(sink.write_text("x").is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/log"), PathBuf::from("/var/log"));
        assert_eq!(expand_home("logs"), PathBuf::from("logs"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x"), home.join("x"));
            assert_eq!(expand_home("~"), home);
        }
    }
}
