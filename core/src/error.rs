//! Error types for the zip-tax lookup client.
//!
//! # Design
//! Three failure kinds, each detected at a different stage of a lookup:
//! `ValidationError` before any I/O, `TransportError` when the HTTP exchange
//! did not yield a usable body, `ServiceError` when the service answered with
//! a known failure code. `ZipTaxError` wraps all three so callers match on the
//! kind instead of on message text.

use thiserror::Error;

/// Errors returned by `ZipTaxClient` lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZipTaxError {
    /// Caller input was rejected locally; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The HTTP exchange failed or the body could not be decoded.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service reported one of its enumerated failure codes.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Local input violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("the state must be a two character state code")]
    InvalidStateCode,
}

/// The service did not produce a well-formed 2xx response with a decodable
/// body. `status` is `None` when the transport itself failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no data returned ({}){}", status_label(.status), detail_suffix(.detail))]
pub struct TransportError {
    pub status: Option<u16>,
    pub detail: Option<String>,
}

impl TransportError {
    pub fn new(status: Option<u16>, detail: Option<String>) -> Self {
        Self { status, detail }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("http status: {code}"),
        None => "no status".to_string(),
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(" {d}"),
        _ => String::new(),
    }
}

/// A failure code from the service's error table (101-105).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub code: i64,
    pub message: &'static str,
}

/// Failure to assemble a `ClientConfig` from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("ZIPTAX_API_KEY is not set")]
    MissingApiKey,
}
