pub mod config;
pub mod error;
pub mod report;
pub mod run;
pub mod source;
pub mod submit;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use config::{Args, ImportConfig};
pub use error::RowError;
pub use report::{RowOutcome, RowReport, RunReport};
pub use run::{run_import, Delivery};
pub use source::{load_table, SourceRow, SourceTable};
pub use submit::{DaySink, HttpSink, SinkResponse};
pub use transform::{transform_row, DayRecord};
