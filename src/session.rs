use crate::hooks::SessionHook;
use crate::recorder::{LedgerError, RunRecord, RunRecorder};
use crate::report;
use crate::runner::{ProcessRunner, RunError};
use crate::sink::Sink;
use chrono::{DateTime, Local};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session output could not be written")]
    Sink(#[from] io::Error),
    #[error("command output could not be written")]
    Output(#[source] RunError),
    #[error("run ledger violated")]
    Ledger(#[from] LedgerError),
}

/// What a session will run and where its transcript lands.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub commands: Vec<String>,
    pub log_path: PathBuf,
    pub working_dir: PathBuf,
    pub started_at: DateTime<Local>,
}

/// Everything a finished session produced.
#[derive(Debug)]
pub struct SessionReport {
    pub records: Vec<RunRecord>,
    pub log_path: PathBuf,
}

impl SessionReport {
    pub fn succeeded_count(&self) -> usize {
        self.records.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.records.len() - self.succeeded_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Runs commands strictly in order, writing the whole transcript through one writer.
/// A failing command is recorded and the next one starts regardless.
pub struct Session<W: Sink> {
    writer: W,
    runner: ProcessRunner,
    recorder: RunRecorder,
    hooks: Vec<Box<dyn SessionHook>>,
}

impl<W: Sink> Session<W> {
    pub fn new(writer: W, runner: ProcessRunner) -> Self {
        Self {
            writer,
            runner,
            recorder: RunRecorder::new(),
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: Box<dyn SessionHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn run(mut self, plan: &SessionPlan) -> Result<SessionReport, SessionError> {
        self.emit(&report::header(
            plan.started_at,
            &plan.working_dir,
            &plan.commands,
        ))?;
        for hook in &self.hooks {
            if let Err(e) = hook.log_ready(&plan.log_path) {
                tracing::warn!(hook = hook.name(), "{e:#}");
            }
        }

        for (index, command) in plan.commands.iter().enumerate() {
            self.run_one(index, command)?;
        }

        let finished_at = Local::now();
        let summary = report::summary(
            self.recorder.records(),
            plan.started_at,
            finished_at,
            &plan.log_path,
        );
        self.emit(&summary)?;
        self.writer.close()?;
        tracing::debug!(
            succeeded = self.recorder.succeeded_count(),
            failed = self.recorder.failed_count(),
            "session finished"
        );

        for hook in &self.hooks {
            if let Err(e) = hook.finished(&summary) {
                tracing::warn!(hook = hook.name(), "{e:#}");
            }
        }

        Ok(SessionReport {
            records: self.recorder.into_records(),
            log_path: plan.log_path.clone(),
        })
    }

    fn run_one(&mut self, index: usize, command: &str) -> Result<(), SessionError> {
        let started_at = Local::now();
        self.recorder.begin(index, command, started_at)?;
        self.emit(&report::command_started(index, command, started_at))?;

        let prefix = report::prefix(index);
        let succeeded = match self.runner.run(command, &prefix, &mut self.writer) {
            Ok(outcome) => outcome.success(),
            Err(e) if !e.is_launch_failure() => return Err(SessionError::Output(e)),
            Err(e) => {
                tracing::debug!(index, command, error = %e, "launch failure");
                let diagnostic = format!("{:?}", anyhow::Error::new(e));
                self.emit(&report::launch_failure(index, &diagnostic))?;
                false
            }
        };

        let record = self.recorder.complete(index, succeeded, Local::now())?;
        let block = report::command_finished(record);
        self.emit(&block)
    }

    fn emit(&mut self, text: &str) -> Result<(), SessionError> {
        self.writer.write_text(text)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::CommandStatus;
    use crate::runner::Shell;
    use crate::sink::FanOutWriter;
    use crate::sink::logfile::LogFileSink;
    use crate::sink::testing::{BrokenSink, MemorySink};
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    fn plan(commands: &[&str]) -> SessionPlan {
        SessionPlan {
            commands: commands.iter().map(|c| c.to_string()).collect(),
            log_path: PathBuf::from("/tmp/seqlaunch-test.txt"),
            working_dir: PathBuf::from("/work"),
            started_at: Local::now(),
        }
    }

    fn statuses(report: &SessionReport) -> Vec<CommandStatus> {
        report.records.iter().map(|r| r.status).collect()
    }

    #[derive(Clone, Default)]
    struct SpyHook {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl SessionHook for SpyHook {
        fn log_ready(&self, log_path: &Path) -> anyhow::Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("ready {}", log_path.display()));
            anyhow::bail!("viewer missing")
        }

        fn finished(&self, summary: &str) -> anyhow::Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("finished {}", summary.starts_with(report::SESSION_RULE)));
            Ok(())
        }

        fn name(&self) -> &'static str {
            "spy"
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_true_false_true() {
        let out = MemorySink::default();
        let report = Session::new(out.clone(), ProcessRunner::default())
            .run(&plan(&["true", "false", "true"]))
            .unwrap();

        assert_eq!(
            statuses(&report),
            vec![
                CommandStatus::Succeeded,
                CommandStatus::Failed,
                CommandStatus::Succeeded
            ]
        );
        assert_eq!(report.succeeded_count(), 2);
        assert_eq!(report.failed_count(), 1);
        let text = out.contents();
        assert!(text.contains("# of succeeded launching commands: 2\n1> true\n3> true\n"));
        assert!(text.contains("# of failed launching commands: 1\n2> false\n"));
        assert!(text.ends_with("This log has been saved to /tmp/seqlaunch-test.txt\n"));
        assert_eq!(*out.closes.borrow(), 1);
    }

    #[test]
    fn test_empty_list() {
        let out = MemorySink::default();
        let report = Session::new(out.clone(), ProcessRunner::default())
            .run(&plan(&[]))
            .unwrap();
        assert!(report.records.is_empty());
        let text = out.contents();
        assert!(text.contains("# of total launching commands: 0\n"));
        assert!(text.contains("# of succeeded launching commands: 0\n"));
        assert!(text.contains("# of failed launching commands: 0\n"));
        assert_eq!(text.matches("STARTED at").count(), 1);
        assert!(!text.contains("1> "));
    }

    #[cfg(unix)]
    #[test]
    fn test_blocks_in_execution_order() {
        let out = MemorySink::default();
        Session::new(out.clone(), ProcessRunner::default())
            .run(&plan(&["echo one", "echo two"]))
            .unwrap();
        let text = out.contents();
        let positions: Vec<usize> = [
            "1> STARTED at",
            "1> one\n",
            "1> SUCCEEDED at",
            "2> STARTED at",
            "2> two\n",
            "2> SUCCEEDED at",
            "This log has been saved to",
        ]
        .iter()
        .map(|needle| text.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_launch_failure_does_not_stop_sequence() {
        let out = MemorySink::default();
        let runner = ProcessRunner::new(Shell::default(), Some("/definitely/not/here".into()));
        let report = Session::new(out.clone(), runner)
            .run(&plan(&["echo a", "echo b"]))
            .unwrap();
        assert_eq!(report.records.len(), 2);
        assert!(report.records.iter().all(|r| !r.succeeded()));
        assert!(report.records.iter().all(|r| r.finished_at.is_some()));
        let text = out.contents();
        assert!(text.contains("1> failed to launch `echo a`"));
        assert!(text.contains("2> failed to launch `echo b`"));
        assert!(text.contains("1> FAILED at"));
    }

    #[cfg(unix)]
    #[test]
    fn test_log_matches_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let started_at = Local::now();
        let log = LogFileSink::create(dir.path(), started_at).unwrap();
        let log_path = log.path().to_path_buf();
        let term = MemorySink::default();
        let writer = FanOutWriter::new(vec![Box::new(term.clone()), Box::new(log)]);

        let plan = SessionPlan {
            commands: vec!["echo out; echo err 1>&2".into(), "exit 4".into()],
            log_path: log_path.clone(),
            working_dir: dir.path().to_path_buf(),
            started_at,
        };
        let report = Session::new(writer, ProcessRunner::default())
            .run(&plan)
            .unwrap();

        let logged = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(logged, term.contents());
        assert!(logged.contains("1> out\n1> err\n"));
        assert_eq!(report.failed_count(), 1);
        assert!(logged.ends_with(&format!("This log has been saved to {}\n", log_path.display())));
    }

    #[test]
    fn test_sink_failure_aborts() {
        let err = Session::new(BrokenSink, ProcessRunner::default())
            .run(&plan(&["true"]))
            .unwrap_err();
        assert!(matches!(err, SessionError::Sink(_)));
    }

    /// Accepts everything except text containing "boom".
    struct PickySink;

    impl Sink for PickySink {
        fn write_text(&mut self, text: &str) -> io::Result<()> {
            if text.contains("boom") {
                return Err(io::Error::other("refused"));
            }
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_sink_failure_mid_command_aborts() {
        let err = Session::new(PickySink, ProcessRunner::default())
            .run(&plan(&["echo bo''om", "true"]))
            .unwrap_err();
        assert!(matches!(err, SessionError::Output(RunError::Sink(_))));
    }

    #[test]
    fn test_hooks_called_and_errors_swallowed() {
        let spy = SpyHook::default();
        let out = MemorySink::default();
        Session::new(out.clone(), ProcessRunner::default())
            .with_hook(Box::new(spy.clone()))
            .run(&plan(&[]))
            .unwrap();
        let calls = spy.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], "ready /tmp/seqlaunch-test.txt");
        assert_eq!(calls[1], "finished true");
    }
}
