pub mod projection;
pub mod risk;
pub mod trend;
