pub mod aggregate;
pub mod assemble;
pub mod batch;
pub mod filter;
pub mod normalize;
pub mod pipeline;

pub use pipeline::{ReportRun, ReportService};
