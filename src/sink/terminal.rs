use super::Sink;
use std::io::{self, Write};

/// The operator's terminal (process stdout). Owns nothing, so close only flushes.
pub struct TerminalSink {
    out: io::Stdout,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for TerminalSink {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.out.lock().write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.lock().flush()
    }
}
