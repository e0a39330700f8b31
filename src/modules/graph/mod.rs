pub mod handlers;
mod report;
pub mod routes;

pub use report::{GroomingReport, MonthStats, OverallStats, ReportAggregator};
