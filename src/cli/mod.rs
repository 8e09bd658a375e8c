pub mod genotyping;
pub mod metrics;
pub mod shared;
pub mod signatures;
