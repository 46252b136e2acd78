pub mod config;
pub mod database;
pub mod entity;

pub use config::Config;
pub use database::{get_db_connection, sqlite_url};
