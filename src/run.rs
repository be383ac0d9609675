use std::io::Write;
use tracing::{debug, error, info, warn};

use crate::report::{RowOutcome, RowReport, RunReport};
use crate::source::{SourceRow, SourceTable};
use crate::submit::{DaySink, CREATED};
use crate::transform::transform_row;

/// Where transformed rows go.
pub enum Delivery<'a> {
    Live(&'a dyn DaySink),
    /// Transform and print, never send.
    DryRun,
}

/// One forward pass over `table`: transform, deliver, write one line per row
/// to `out`. A failing row never stops the pass.
pub fn run_import<W: Write>(
    table: &SourceTable,
    delivery: Delivery<'_>,
    out: &mut W,
) -> std::io::Result<RunReport> {
    info!(rows = table.len(), dry_run = matches!(delivery, Delivery::DryRun), "import started");

    let mut report = RunReport::default();
    for (idx, row) in table.rows.iter().enumerate() {
        let row_no = idx + 1;
        let outcome = import_row(row_no, row, &delivery);
        let line = RowReport { row: row_no, outcome };
        writeln!(out, "{}", line)?;
        report.rows.push(line);
    }

    info!(
        created = report.created(),
        rejected = report.rejected(),
        failed = report.failed(),
        previewed = report.previewed(),
        "import finished"
    );
    Ok(report)
}

fn import_row(row_no: usize, row: &SourceRow, delivery: &Delivery<'_>) -> RowOutcome {
    let day = match transform_row(row) {
        Ok(day) => day,
        Err(e) => {
            error!(row = row_no, error = %e, "row skipped");
            return RowOutcome::Failed(e);
        }
    };
    for issue in day.schedule_issues() {
        warn!(row = row_no, %issue, "schedule looks wrong; the server may refuse it");
    }

    match delivery {
        Delivery::DryRun => match serde_json::to_string(&day) {
            Ok(payload) => RowOutcome::Previewed(payload),
            Err(e) => RowOutcome::Failed(e.into()),
        },
        Delivery::Live(sink) => match sink.submit(&day) {
            Ok(resp) if resp.status == CREATED => {
                debug!(row = row_no, "created");
                RowOutcome::Created
            }
            Ok(resp) => RowOutcome::Rejected {
                status: resp.status,
                body: resp.body,
            },
            Err(e) => {
                error!(row = row_no, error = %e, "submission failed");
                RowOutcome::Failed(e)
            }
        },
    }
}
