pub mod logfile;
pub mod terminal;

use std::io;

/// A destination for session text.
/// Implementations receive text verbatim; they never reformat it.
pub trait Sink {
    /// Write `text` as-is.
    fn write_text(&mut self, text: &str) -> io::Result<()>;

    /// Push buffered text to the underlying destination.
    fn flush(&mut self) -> io::Result<()>;

    /// Release any owned resource. Sinks that own nothing just flush.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Duplicates every write across a fixed list of sinks, in registration order.
///
/// A failing sink never prevents the remaining sinks from being attempted;
/// the first error is returned once all of them have been tried.
pub struct FanOutWriter {
    sinks: Vec<Box<dyn Sink>>,
    closed: bool,
}

impl FanOutWriter {
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        Self {
            sinks,
            closed: false,
        }
    }

    fn each<F>(&mut self, op: &str, mut f: F) -> io::Result<()>
    where
        F: FnMut(&mut dyn Sink) -> io::Result<()>,
    {
        let mut first: Option<io::Error> = None;
        for (idx, sink) in self.sinks.iter_mut().enumerate() {
            if let Err(e) = f(sink.as_mut()) {
                if first.is_none() {
                    first = Some(e);
                } else {
                    tracing::warn!(sink = idx, error = %e, "secondary sink {op} failure");
                }
            }
        }
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Sink for FanOutWriter {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        if self.closed {
            return Err(closed_error());
        }
        self.each("write", |s| s.write_text(text))
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.each("flush", |s| s.flush())
    }

    /// Closes every sink once; later calls are no-ops.
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.each("close", |s| s.close())
    }
}

pub(crate) fn closed_error() -> io::Error {
    io::Error::other("sink already closed")
}
