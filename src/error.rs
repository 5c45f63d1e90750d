//! Error types for the storage, quote, summarizer and HTTP layers.
//!
//! Failures that only affect one unit of work (a source, an article, a symbol)
//! are logged and contained by the caller; the variants here are what gets
//! surfaced when a whole operation cannot produce a meaningful answer.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the [`ArticleStore`](crate::store::ArticleStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying SQLite call failed.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A persisted timestamp could not be parsed back.
    #[error("invalid stored timestamp: {0}")]
    Timestamp(String),

    /// The database directory could not be created.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Errors raised while fetching or normalizing market quotes.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("error fetching quote data: {0}")]
    Http(#[from] reqwest::Error),

    #[error("received non-200 status code: {status} for symbol {symbol}")]
    Status { status: u16, symbol: String },

    #[error("upstream API error: {code} - {description}")]
    Upstream { code: String, description: String },

    #[error("error decoding quote response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no data received for symbol {0}")]
    EmptyResult(String),

    /// The price resolved to zero after every fallback.
    #[error("no valid price data available for {0}")]
    NoPrice(String),

    /// Every requested symbol failed.
    #[error("no valid market indices data found")]
    NoData,
}

/// Errors raised by the text summarizer.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("empty text provided")]
    EmptyText,

    #[error("no sentences found in text")]
    NoSentences,
}

/// Errors raised while loading the YAML configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors returned from HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal {
            message: err.to_string(),
            details: None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Internal {
                message,
                details: Some(details),
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message, "details": details }),
            ),
            ApiError::Internal {
                message,
                details: None,
            } => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message })),
        };

        (status, Json(body)).into_response()
    }
}
