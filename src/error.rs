use thiserror::Error;

use crate::application::request::RequestError;
use crate::domain::error::PayloadError;
use crate::port::transport::TransportError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or incomplete order data in a response or event.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),

    /// The transport rejected or failed the request. Passed through as-is.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A live message arrived without its expected data key.
    #[error("property \"{expected}\" not present on update event")]
    EventShapeMismatch { expected: &'static str },

    #[error(transparent)]
    InvalidRequest(#[from] RequestError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the error came from the transport rather than from local validation.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
