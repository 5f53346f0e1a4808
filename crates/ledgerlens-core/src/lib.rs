pub mod aggregate;
pub mod analytics;
pub mod budget;
pub mod error;
pub mod forecast;
pub mod insight;
pub mod model;
pub mod period;
pub mod policy;

pub use error::{CoreError, CoreResult};
pub use insight::{Insight, InsightKind, Severity};
pub use model::{Budget, Transaction, TransactionKind};
pub use period::{PeriodKind, TimePeriod};

pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
