pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod http;
pub mod image_processing;
pub mod keywords;
pub mod logging;
pub mod mcp_server;
pub mod models;
pub mod placeholder;
pub mod provider;
pub mod recommender;
pub mod scoring;
pub mod service;
pub mod store;
pub mod tools;

pub use error::{Result, TryOnError};
pub use generation::{GenerateRequest, GenerationOutcome};
pub use service::TryOnService;
