//! Lookup client: request building, dispatch and the last-lookup cache.
//!
//! # Design
//! `ZipTaxClient` keeps the split between building a request and parsing a
//! response (`build_request` / `parse_response`) so a host can run the HTTP
//! exchange itself. `request` and `lookup` chain both halves through the
//! client's `Transport`.
//!
//! The last non-empty successful result is kept on the instance. Lookups take
//! `&mut self`, so sharing one client across threads requires the caller to
//! wrap it in a lock; the cache is never synchronized internally.

use crate::config::{ClientConfig, ResponseFormat};
use crate::error::{TransportError, ZipTaxError};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::request::{self, LookupRequest};
use crate::response::{self, LookupResult};

#[derive(Debug)]
pub struct ZipTaxClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
    last_lookup: Option<LookupResult>,
}

impl ZipTaxClient<UreqTransport> {
    /// Client for the public endpoint using the default ureq transport.
    /// `format` accepts a `ResponseFormat` or a name; unrecognized names fall
    /// back to JSON.
    pub fn new(api_key: impl Into<String>, format: impl Into<ResponseFormat>) -> Self {
        Self::with_transport(ClientConfig::new(api_key, format), UreqTransport::new())
    }

    /// JSON client for the public endpoint.
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self::new(api_key, ResponseFormat::default())
    }
}

impl<T: Transport> ZipTaxClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            last_lookup: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The most recent successful lookup that returned at least one record.
    pub fn last_lookup(&self) -> Option<&LookupResult> {
        self.last_lookup.as_ref()
    }

    pub fn clear_last_lookup(&mut self) {
        self.last_lookup = None;
    }

    /// Build the GET for `lookup` without sending it.
    pub fn build_request(&self, lookup: &LookupRequest) -> Result<HttpRequest, ZipTaxError> {
        let query = request::build(&self.config, lookup)?;
        Ok(HttpRequest { url: query.url })
    }

    /// Classify the outcome of an exchange and update the cache when the
    /// result carries records.
    pub fn parse_response(
        &mut self,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<LookupResult, ZipTaxError> {
        let result = response::interpret(self.config.format(), outcome)?;
        tracing::debug!(
            r_code = result.r_code,
            records = result.results.len(),
            "lookup succeeded"
        );
        if !result.is_empty() {
            self.last_lookup = Some(result.clone());
        }
        Ok(result)
    }

    /// Look up rates for a postal code, optionally narrowed by city and
    /// two-letter state code.
    pub fn request(
        &mut self,
        postal_code: &str,
        city: Option<&str>,
        state: Option<&str>,
    ) -> Result<LookupResult, ZipTaxError> {
        let mut lookup = LookupRequest::new(postal_code);
        lookup.city = city.map(str::to_string);
        lookup.state = state.map(str::to_string);
        self.lookup(&lookup)
    }

    pub fn lookup(&mut self, lookup: &LookupRequest) -> Result<LookupResult, ZipTaxError> {
        let http_request = self.build_request(lookup)?;
        tracing::debug!(
            postal_code = lookup.postal_code.trim(),
            format = %self.config.format(),
            "dispatching tax rate lookup"
        );
        let outcome = self.transport.get(&http_request);
        self.parse_response(outcome)
    }
}
