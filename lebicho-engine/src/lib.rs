pub mod confidence;
pub mod config;
pub mod dream;
pub mod methods;
pub mod profile;
pub mod reading;
pub mod sampler;
pub mod scorer;
pub mod tables;
