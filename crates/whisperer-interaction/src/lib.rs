//! Boundary layer: model client implementations and their configuration.

pub mod config;
pub mod gemini_api_client;

pub use config::{GeminiConfig, SecretConfig, load_secret_config};
pub use gemini_api_client::GeminiApiClient;
