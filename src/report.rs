use std::fmt;

use crate::error::RowError;

/// How a single row ended up.
#[derive(Debug)]
pub enum RowOutcome {
    /// The endpoint answered 201.
    Created,
    /// The endpoint answered with anything else.
    Rejected { status: u16, body: String },
    /// The row never got an answer: bad date, missing column, transport error.
    Failed(RowError),
    /// Dry run: the payload that would have been sent.
    Previewed(String),
}

/// Outcome of one row, numbered from 1 in file order.
#[derive(Debug)]
pub struct RowReport {
    pub row: usize,
    pub outcome: RowOutcome,
}

impl RowReport {
    pub fn is_failure(&self) -> bool {
        matches!(
            self.outcome,
            RowOutcome::Rejected { .. } | RowOutcome::Failed(_)
        )
    }
}

/// The console line printed for a row.
impl fmt::Display for RowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            RowOutcome::Created => write!(f, "[OK] Row {}: day created.", self.row),
            RowOutcome::Rejected { status, body } => {
                write!(f, "[ERROR] Row {}: {} - {}", self.row, status, body)
            }
            RowOutcome::Failed(e) => write!(f, "[EXCEPTION] Row {}: {}", self.row, e),
            RowOutcome::Previewed(payload) => write!(f, "[DRY-RUN] Row {}: {}", self.row, payload),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub rows: Vec<RowReport>,
}

impl RunReport {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Created))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Rejected { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed(_)))
    }

    pub fn previewed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Previewed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.rows.iter().any(RowReport::is_failure)
    }

    /// Row numbers that did not make it, in file order.
    pub fn failed_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .filter(|r| r.is_failure())
            .map(|r| r.row)
            .collect()
    }

    /// Why a `--strict` run should exit non-zero, if it should.
    pub fn strict_failure(&self) -> Option<String> {
        let failed = self.failed_rows();
        if failed.is_empty() {
            None
        } else {
            Some(format!(
                "{} of {} rows were not imported",
                failed.len(),
                self.rows.len()
            ))
        }
    }

    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }
}
