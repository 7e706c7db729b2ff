pub mod config;
pub mod deberta_engine;
pub mod engine;
pub mod error;
pub mod server;
pub mod types;
