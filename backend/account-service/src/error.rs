use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed, unknown or expired token passed in the URL.
    #[error("{0}")]
    InvalidToken(String),

    #[error("Page not found.")]
    NotFound,

    #[error("Method not allowed. This URL can only handle the following request methods: {0}.")]
    MethodNotAllowed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Body rendered by the error action.
#[derive(Debug, Serialize)]
pub struct ErrorView {
    pub view: &'static str,
    pub name: String,
    pub message: String,
    pub status: u16,
}

impl AppError {
    fn title(&self) -> &'static str {
        match self {
            AppError::InvalidToken(_) => "Bad Request",
            AppError::NotFound => "Not Found",
            AppError::MethodNotAllowed(_) => "Method Not Allowed",
            AppError::Conflict(_) => "Conflict",
            _ => "Internal Server Error",
        }
    }

    /// Server-side failures never leak their details to the client.
    fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => {
                "An internal server error occurred.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "client error");
        }

        let mut builder = HttpResponse::build(status);
        if let AppError::MethodNotAllowed(allowed) = self {
            builder.insert_header(("Allow", allowed.as_str()));
        }

        builder.json(ErrorView {
            view: "error",
            name: format!("{} (#{})", self.title(), status.as_u16()),
            message: self.public_message(),
            status: status.as_u16(),
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Session(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<envy::Error> for AppError {
    fn from(err: envy::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
