pub mod recommend;
pub mod status;
