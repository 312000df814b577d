//! Immutable client configuration.
//!
//! # Design
//! The action and version segments are fixed by the service's wire contract
//! and are not configurable. The endpoint host defaults to the public API but
//! may be overridden so tests can point the client at a local mock server.

use std::fmt;

use crate::error::ConfigError;

/// Public endpoint of the lookup service.
pub const DEFAULT_ENDPOINT: &str = "http://api.zip-tax.com";
/// Fixed action path segment.
pub const ACTION: &str = "request";
/// Fixed protocol version path segment.
pub const VERSION: &str = "v20";

/// Body format requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    /// Normalize a caller-supplied format name. Matching is case-insensitive
    /// and ignores surrounding whitespace; anything other than `xml` is JSON.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("xml") {
            ResponseFormat::Xml
        } else {
            ResponseFormat::Json
        }
    }

    /// The value sent in the `format` query parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            ResponseFormat::Json => "JSON",
            ResponseFormat::Xml => "XML",
        }
    }
}

impl From<&str> for ResponseFormat {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_key: String,
    format: ResponseFormat,
    endpoint: String,
}

impl ClientConfig {
    /// Build a config for the public endpoint. `format` is normalized with
    /// [`ResponseFormat::from_name`].
    pub fn new(api_key: impl Into<String>, format: impl Into<ResponseFormat>) -> Self {
        Self {
            api_key: api_key.into(),
            format: format.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Read `ZIPTAX_API_KEY`, `ZIPTAX_FORMAT` and `ZIPTAX_ENDPOINT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("ZIPTAX_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let format = lookup("ZIPTAX_FORMAT").unwrap_or_default();
        let config = Self::new(api_key, format.as_str());
        Ok(match lookup("ZIPTAX_ENDPOINT") {
            Some(endpoint) if !endpoint.trim().is_empty() => config.with_endpoint(&endpoint),
            _ => config,
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_format(mut self, format: impl Into<ResponseFormat>) -> Self {
        self.format = format.into();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `<endpoint>/<action>/<version>`, without a query string.
    pub fn base_url(&self) -> String {
        format!("{}/{ACTION}/{VERSION}", self.endpoint)
    }
}

// The key is a credential; keep it out of debug output.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("format", &self.format)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn xml_in_any_case_normalizes_to_xml() {
        for name in ["xml", "XML", "Xml", " xMl "] {
            assert_eq!(ResponseFormat::from_name(name), ResponseFormat::Xml, "{name}");
        }
    }

    #[test]
    fn anything_but_xml_is_json() {
        for name in ["csv", "", "jsonp", "json", "JSON"] {
            assert_eq!(ResponseFormat::from_name(name), ResponseFormat::Json, "{name}");
        }
    }

    #[test]
    fn new_uses_public_endpoint() {
        let config = ClientConfig::new("abc", "xml");
        assert_eq!(config.api_key(), "abc");
        assert_eq!(config.format(), ResponseFormat::Xml);
        assert_eq!(config.base_url(), "http://api.zip-tax.com/request/v20");
    }

    #[test]
    fn endpoint_override_strips_trailing_slash() {
        let config = ClientConfig::new("abc", "json").with_endpoint("http://127.0.0.1:3000/");
        assert_eq!(config.base_url(), "http://127.0.0.1:3000/request/v20");
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = ClientConfig::new("super-secret", "json");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn from_lookup_requires_key() {
        let err = ClientConfig::from_lookup(env(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);

        let err = ClientConfig::from_lookup(env(&[("ZIPTAX_API_KEY", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn from_lookup_reads_format_and_endpoint() {
        let config = ClientConfig::from_lookup(env(&[
            ("ZIPTAX_API_KEY", "k"),
            ("ZIPTAX_FORMAT", "xml"),
            ("ZIPTAX_ENDPOINT", "http://localhost:4000"),
        ]))
        .unwrap();
        assert_eq!(config.format(), ResponseFormat::Xml);
        assert_eq!(config.endpoint(), "http://localhost:4000");
    }

    #[test]
    fn from_lookup_defaults() {
        let config = ClientConfig::from_lookup(env(&[("ZIPTAX_API_KEY", "k")])).unwrap();
        assert_eq!(config.format(), ResponseFormat::Json);
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
    }
}
