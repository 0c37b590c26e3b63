// src/errors.rs
use thiserror::Error;

pub const INITIATE_FAILED: &str = "Failed to initiate payment";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Purchase request failed: {0}")]
    RequestError(String),

    #[error("Status check failed: {0}")]
    PollingTransportError(String),

    #[error("Payment rejected by backend")]
    BackendRejected,

    #[error("Payment still pending after {attempts} status checks")]
    PollingTimeout { attempts: u32 },

    #[error("Status polling cancelled")]
    PollingCancelled,

    #[error("Not signed in")]
    Unauthenticated,

    #[error("API error ({status:?}): {}", .message.as_deref().unwrap_or("no message"))]
    ApiError {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("HTTP client error: {0}")]
    HttpClientError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpClientError(format!("HTTP request failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        // Surface the first field message the way the form would show it.
        let message = err
            .field_errors()
            .values()
            .flat_map(|errors| errors.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| err.to_string());
        AppError::ValidationError(message)
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        AppError::StorageError(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn api(status: Option<u16>, message: Option<String>) -> Self {
        AppError::ApiError { status, message }
    }

    /// The `message` field the backend put in an error body, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            AppError::ApiError { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Backend message when present, otherwise `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        self.backend_message().unwrap_or(fallback).to_string()
    }

    /// Turns any call failure into an [`AppError::ApiError`] whose message is
    /// the backend's, or `fallback` when it sent none.
    pub fn or_message(self, fallback: &str) -> Self {
        match self {
            AppError::ApiError { status, message } => AppError::ApiError {
                status,
                message: Some(message.unwrap_or_else(|| fallback.to_string())),
            },
            AppError::HttpClientError(_) => AppError::api(None, Some(fallback.to_string())),
            other => other,
        }
    }

    /// Text shown to the rider for this failure.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(msg) | AppError::RequestError(msg) => msg.clone(),
            AppError::PollingTransportError(_) => {
                "Failed to check payment status. Please try again.".to_string()
            }
            AppError::BackendRejected => "Payment failed. Please try again.".to_string(),
            AppError::PollingTimeout { .. } => {
                "Payment confirmation timed out. Please check your policies or try again."
                    .to_string()
            }
            AppError::PollingCancelled => "Payment confirmation stopped.".to_string(),
            AppError::Unauthenticated => "Please sign up or log in first.".to_string(),
            AppError::ApiError { message, .. } => message
                .clone()
                .unwrap_or_else(|| "Unexpected response from server".to_string()),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
