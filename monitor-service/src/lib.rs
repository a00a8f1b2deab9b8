pub mod fetcher;
pub mod monitor;
pub mod report;

pub use fetcher::{fetch_and_filter, fetch_matching};
pub use monitor::{Monitor, ScanPlan};
