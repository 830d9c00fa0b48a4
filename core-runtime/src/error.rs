use thiserror::Error;

/// Errors raised while setting up the runtime around a session.
#[derive(Error, Debug)]
pub enum Error {
    /// A runtime setting is out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required bridge was not supplied to the builder.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl Error {
    pub fn capability_missing(capability: &str, message: impl Into<String>) -> Self {
        Error::CapabilityMissing {
            capability: capability.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
