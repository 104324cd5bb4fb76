pub mod policy;
pub mod server;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable '{name}' is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("cannot read file policy '{path}': {reason}")]
    Policy { path: String, reason: String },
}
