use chrono::{DateTime, Local};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Running,
    Succeeded,
    Failed,
}

/// One command's entry in the session ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub index: usize,
    pub command: String,
    pub status: CommandStatus,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl RunRecord {
    pub fn succeeded(&self) -> bool {
        self.status == CommandStatus::Succeeded
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("record {got} begun out of order (next index is {expected})")]
    OutOfOrder { expected: usize, got: usize },
    #[error("no record with index {0}")]
    Unknown(usize),
    #[error("record {0} already completed")]
    AlreadyCompleted(usize),
}

/// Append-only ledger of run records, indexed by submission position.
#[derive(Debug, Default)]
pub struct RunRecorder {
    records: Vec<RunRecord>,
}

impl RunRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(
        &mut self,
        index: usize,
        command: &str,
        started_at: DateTime<Local>,
    ) -> Result<(), LedgerError> {
        let expected = self.records.len();
        if index != expected {
            return Err(LedgerError::OutOfOrder {
                expected,
                got: index,
            });
        }
        self.records.push(RunRecord {
            index,
            command: command.to_string(),
            status: CommandStatus::Running,
            started_at,
            finished_at: None,
        });
        Ok(())
    }

    pub fn complete(
        &mut self,
        index: usize,
        succeeded: bool,
        finished_at: DateTime<Local>,
    ) -> Result<&RunRecord, LedgerError> {
        let record = self
            .records
            .get_mut(index)
            .ok_or(LedgerError::Unknown(index))?;
        if record.status != CommandStatus::Running {
            return Err(LedgerError::AlreadyCompleted(index));
        }
        record.status = if succeeded {
            CommandStatus::Succeeded
        } else {
            CommandStatus::Failed
        };
        record.finished_at = Some(finished_at);
        Ok(record)
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RunRecord> {
        self.records
    }

    pub fn succeeded_count(&self) -> usize {
        self.count(CommandStatus::Succeeded)
    }

    pub fn failed_count(&self) -> usize {
        self.count(CommandStatus::Failed)
    }

    fn count(&self, status: CommandStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_then_complete() {
        let mut rec = RunRecorder::new();
        let t0 = Local::now();
        rec.begin(0, "true", t0).unwrap();
        assert_eq!(rec.records()[0].status, CommandStatus::Running);
        assert_eq!(rec.succeeded_count() + rec.failed_count(), 0);

        let r = rec.complete(0, true, t0).unwrap();
        assert!(r.succeeded());
        assert_eq!(r.finished_at, Some(t0));
        assert_eq!(rec.succeeded_count(), 1);
    }

    #[test]
    fn test_counts_follow_records() {
        let mut rec = RunRecorder::new();
        let t = Local::now();
        for (i, ok) in [true, false, true, false, false].into_iter().enumerate() {
            rec.begin(i, "cmd", t).unwrap();
            rec.complete(i, ok, t).unwrap();
        }
        assert_eq!(rec.succeeded_count(), 2);
        assert_eq!(rec.failed_count(), 3);
        let indices: Vec<usize> = rec.records().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_rejects_skipped_index() {
        let mut rec = RunRecorder::new();
        let err = rec.begin(1, "x", Local::now()).unwrap_err();
        assert_eq!(err, LedgerError::OutOfOrder { expected: 0, got: 1 });
        assert!(rec.records().is_empty());
    }

    #[test]
    fn test_complete_errors() {
        let mut rec = RunRecorder::new();
        let t = Local::now();
        assert_eq!(rec.complete(0, true, t).unwrap_err(), LedgerError::Unknown(0));
        rec.begin(0, "x", t).unwrap();
        rec.complete(0, false, t).unwrap();
        assert_eq!(
            rec.complete(0, true, t).unwrap_err(),
            LedgerError::AlreadyCompleted(0)
        );
        assert!(!rec.records()[0].succeeded());
    }
}
