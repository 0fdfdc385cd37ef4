pub mod notify;
pub mod open_log;

use std::path::Path;

/// Optional collaborator invoked at the edges of a session.
/// Failures are reported by the session and never stop it.
pub trait SessionHook {
    /// Called once the header is written and the log file exists.
    fn log_ready(&self, _log_path: &Path) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after the transcript is closed, with the rendered summary.
    fn finished(&self, _summary: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Short label used in diagnostics.
    fn name(&self) -> &'static str;
}
