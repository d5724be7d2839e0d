pub mod db;
pub mod error;
pub mod models;
pub mod patterns;
pub mod predictions;
pub mod user_hits;

pub use rusqlite;
