pub mod anomaly;
pub mod compare;
pub mod filter;
pub mod metrics;
pub mod patterns;
