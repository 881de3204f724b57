//! Error types and handling for the `ShelterFinder` application

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Machine-readable classification of API failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Credentials rejected by the remote service
    ApiUnauthorized,
    /// Requested resource does not exist
    ApiNotFound,
    /// Remote service throttled the request
    ApiRateLimit,
    /// Transport failure or unexpected status
    ApiNetworkError,
    /// Response body could not be decoded
    ApiInvalidResponse,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::ApiUnauthorized => "API_UNAUTHORIZED",
            ErrorCode::ApiNotFound => "API_NOT_FOUND",
            ErrorCode::ApiRateLimit => "API_RATE_LIMIT",
            ErrorCode::ApiNetworkError => "API_NETWORK_ERROR",
            ErrorCode::ApiInvalidResponse => "API_INVALID_RESPONSE",
        };
        f.write_str(code)
    }
}

/// Main error type for the `ShelterFinder` application
#[derive(Error, Debug)]
pub enum ShelterFinderError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error [{code}]: {message}")]
    Api {
        message: String,
        code: ErrorCode,
        context: HashMap<String, String>,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The user's location could not be determined
    #[error("User location is not available")]
    LocationUnavailable,

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl ShelterFinderError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error with a generic network code
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::api_with_context(message, ErrorCode::ApiNetworkError, HashMap::new())
    }

    /// Create a new API error carrying a code and request context
    pub fn api_with_context<S: Into<String>>(
        message: S,
        code: ErrorCode,
        context: HashMap<String, String>,
    ) -> Self {
        Self::Api {
            message: message.into(),
            code,
            context,
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// API error code, if this is an API error
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ShelterFinderError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ShelterFinderError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            ShelterFinderError::Api {
                code: ErrorCode::ApiUnauthorized,
                ..
            } => "The service rejected the API key. Please check your configuration.".to_string(),
            ShelterFinderError::Api {
                code: ErrorCode::ApiRateLimit,
                ..
            } => "Too many requests. Please wait a moment and try again.".to_string(),
            ShelterFinderError::Api { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            ShelterFinderError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            ShelterFinderError::LocationUnavailable => {
                "User location is not available. Pass --location lat,lon.".to_string()
            }
            ShelterFinderError::General { message } => message.clone(),
        }
    }
}
