use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

/// Represents to an API error.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "code")]
pub enum ApiError {
    /// The requested method was not found.
    #[error("no such method")]
    NoSuchMethod,

    /// The requested method's parameter requirements wasn't satisfied.
    #[error("invalid parameters: {message}")]
    InvalidParams { message: String },

    /// The request format is not considered.
    #[error("bad request ({kind}): {message}")]
    BadRequest { kind: String, message: String },

    /// The response format is not considered.
    #[error("bad response ({kind}): {message}")]
    BadResponse { kind: String, message: String },

    /// The requested power transition target is not recognised.
    #[error("invalid transition request: {target}")]
    InvalidTransition { target: String },

    /// The requested surface object was not found.
    #[error("no such object: {name}")]
    NoSuchObject { name: String },

    /// The requested operation is unsupported.
    #[error("operation not supported: {message}")]
    Unsupported { message: Cow<'static, str> },

    /// An I/O error occured.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// An internal error.
    #[error("internal error: {message}")]
    Internal { message: Cow<'static, str> },
}
impl ApiError {
    pub fn bad_request<K: Into<String>, M: Into<String>>(kind: K, message: M) -> Self {
        Self::BadRequest {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn bad_response<K: Into<String>, M: Into<String>>(kind: K, message: M) -> Self {
        Self::BadResponse {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn invalid_params<E: ToString>(err: E) -> Self {
        Self::InvalidParams {
            message: err.to_string(),
        }
    }

    pub fn invalid_transition<T: Into<String>>(target: T) -> Self {
        Self::InvalidTransition {
            target: target.into(),
        }
    }

    pub fn no_such_object<T: Into<String>>(name: T) -> Self {
        Self::NoSuchObject { name: name.into() }
    }

    pub fn unsupported<T: Into<Cow<'static, str>>>(message: T) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    pub fn io(err: &std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }

    pub fn internal<T: Into<Cow<'static, str>>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
