//! Blocking client for the zip-tax.com sales/use tax rate lookup API.
//!
//! # Overview
//! One lookup is one GET: `request` builds a validated, form-encoded query,
//! hands it to a `Transport`, and classifies the outcome into a
//! `LookupResult` or a `ZipTaxError`.
//!
//! # Design
//! - Request construction (`request::build`) and response classification
//!   (`response::interpret`) are pure functions; `ZipTaxClient` wires them to
//!   a transport and owns the last-lookup cache.
//! - `ZipTaxError` separates local validation failures, transport failures
//!   (including undecodable bodies) and service-reported error codes.
//! - The transport is a trait so tests can substitute a recording fake; the
//!   default is a blocking ureq agent.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod response;

pub use client::ZipTaxClient;
pub use config::{ClientConfig, ResponseFormat};
pub use error::{ConfigError, ServiceError, TransportError, ValidationError, ZipTaxError};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use request::{EncodedQuery, LookupRequest};
pub use response::{LookupResult, TaxRecord};
