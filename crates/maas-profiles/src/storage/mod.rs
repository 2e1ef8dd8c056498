//! Storage layer (`SQLite`)

pub mod db;
pub mod manager;
pub mod migrations;

pub use db::{Database, DatabaseError};
pub use manager::ProfileManager;
