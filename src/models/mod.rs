pub mod cache;
pub mod market;
