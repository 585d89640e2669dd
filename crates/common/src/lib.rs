pub mod config;
pub mod error;
pub mod maps;
pub mod types;
