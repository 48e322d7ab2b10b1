pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ModelProvider};
pub use error::PersonaError;
pub use types::*;
