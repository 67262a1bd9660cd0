pub mod chat;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod errors;
pub mod logging;
pub mod models;
pub mod rag;

pub use config::AppConfig;
pub use errors::*;
