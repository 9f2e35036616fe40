pub mod criteria;
pub mod order;
pub mod report;

pub use criteria::FilterCriteria;
pub use order::{Order, OrderLine, OrderType};
pub use report::{AggregateReport, DataWarning, DayTotals, GrandTotals, GroupTotals};
