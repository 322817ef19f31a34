//! Output formatting module.

pub mod report;
pub mod table;

pub use report::{ReportData, build_report, save_report};
pub use table::*;
