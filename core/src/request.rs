//! Lookup parameters and query construction.
//!
//! `build` is a pure function of the config and the request: it trims every
//! value, drops empty optional parameters, validates the state code and
//! form-encodes the query in a fixed order (key, postalcode, format, city,
//! state) so identical inputs always produce identical URLs.

use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::error::ValidationError;

/// Maximum length of a state code, in characters.
pub const STATE_CODE_LEN: usize = 2;

/// One postal-code lookup. The postal code is opaque text; leading zeros are
/// kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookupRequest {
    pub postal_code: String,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl LookupRequest {
    pub fn new(postal_code: impl Into<String>) -> Self {
        Self {
            postal_code: postal_code.into(),
            city: None,
            state: None,
        }
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

/// A fully assembled request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedQuery {
    /// Parameters in the order they were encoded, values already trimmed.
    pub params: Vec<(&'static str, String)>,
    /// `<endpoint>/request/v20?<query>`
    pub url: String,
}

impl EncodedQuery {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub fn build(config: &ClientConfig, request: &LookupRequest) -> Result<EncodedQuery, ValidationError> {
    let mut params = vec![
        ("key", config.api_key().trim().to_string()),
        ("postalcode", request.postal_code.trim().to_string()),
        ("format", config.format().as_param().to_string()),
    ];

    if let Some(city) = non_empty(request.city.as_deref()) {
        params.push(("city", city.to_string()));
    }

    if let Some(state) = non_empty(request.state.as_deref()) {
        if state.chars().count() > STATE_CODE_LEN {
            return Err(ValidationError::InvalidStateCode);
        }
        params.push(("state", state.to_string()));
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();

    Ok(EncodedQuery {
        url: format!("{}?{query}", config.base_url()),
        params,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
