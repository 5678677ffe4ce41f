use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is missing (set it in the environment or in .env)")]
    Missing(&'static str),

    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to parse config file: {0}")]
    File(String),
}

/// Failures reported by the messaging gateway.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    /// The addressed chat or handle does not exist, or the account never
    /// talked to the bot.
    #[error("chat not found: {0}")]
    NotFound(String),

    #[error("gateway request failed: {0}")]
    Api(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}
