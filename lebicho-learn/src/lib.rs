pub mod alerts;
pub mod analysis;
pub mod config;
pub mod learner;
pub mod ranking;
pub mod stats;
