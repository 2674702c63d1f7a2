//! Error types for the pool manager.
//!
//! The taxonomy is deliberately narrow: "no eligible entry" is a normal
//! outcome surfaced as `Option::None` on the retrieval path, never an error.
//! The only genuine fault class is an invalid configuration.

use thiserror::Error;

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pool management operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Pool configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// The error message.
        message: String,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_displays_message() {
        let err = Error::configuration("max_size must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Configuration error: max_size must be greater than 0"
        );
    }
}
