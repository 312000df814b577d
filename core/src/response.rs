//! Wire types and response classification.
//!
//! # Design
//! `interpret` walks the outcome of one HTTP exchange through a fixed order
//! of checks: transport failure, non-2xx status, undecodable body, service
//! error code. Whatever survives is a `LookupResult`, possibly with zero
//! records. Decoding failures share the transport channel because in both
//! cases the caller did not get a usable response.
//!
//! `interpret` is pure; updating the last-lookup cache is the client's job.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::ResponseFormat;
use crate::error::{ServiceError, TransportError, ZipTaxError};
use crate::http::HttpResponse;

pub const SUCCESS_CODE: i64 = 100;

/// Service failure codes and their messages.
pub const ERROR_CODES: [(i64, &str); 5] = [
    (101, "Invalid Key"),
    (102, "Invalid State"),
    (103, "Invalid City"),
    (104, "Invalid Postal Code"),
    (105, "Invalid Format"),
];

pub fn error_message(code: i64) -> Option<&'static str> {
    ERROR_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, message)| *message)
}

/// One jurisdiction's rates for a postal code.
///
/// `raw` holds the record exactly as decoded (XML values arrive as strings).
/// The typed fields are read from it leniently: a missing, null or
/// unparsable rate is `None`, a missing or null text field is empty, and a
/// number in a text field is rendered as text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaxRecord {
    pub geo_postal_code: String,
    pub geo_city: String,
    pub geo_county: String,
    pub geo_state: String,
    pub tax_sales: Option<f64>,
    pub tax_use: Option<f64>,
    /// `Y` when services are taxable, `N` otherwise.
    pub txb_service: String,
    pub state_sales_tax: Option<f64>,
    pub state_use_tax: Option<f64>,
    pub city_sales_tax: Option<f64>,
    pub city_use_tax: Option<f64>,
    pub city_tax_code: String,
    pub county_sales_tax: Option<f64>,
    pub county_use_tax: Option<f64>,
    pub county_tax_code: String,
    pub district_sales_tax: Option<f64>,
    pub district_use_tax: Option<f64>,
    pub raw: Map<String, Value>,
}

impl TaxRecord {
    pub fn from_fields(raw: Map<String, Value>) -> Self {
        Self {
            geo_postal_code: text(&raw, "geoPostalCode"),
            geo_city: text(&raw, "geoCity"),
            geo_county: text(&raw, "geoCounty"),
            geo_state: text(&raw, "geoState"),
            tax_sales: rate(&raw, "taxSales"),
            tax_use: rate(&raw, "taxUse"),
            txb_service: text(&raw, "txbService"),
            state_sales_tax: rate(&raw, "stateSalesTax"),
            state_use_tax: rate(&raw, "stateUseTax"),
            city_sales_tax: rate(&raw, "citySalesTax"),
            city_use_tax: rate(&raw, "cityUseTax"),
            city_tax_code: text(&raw, "cityTaxCode"),
            county_sales_tax: rate(&raw, "countySalesTax"),
            county_use_tax: rate(&raw, "countyUseTax"),
            county_tax_code: text(&raw, "countyTaxCode"),
            district_sales_tax: rate(&raw, "districtSalesTax"),
            district_use_tax: rate(&raw, "districtUseTax"),
            raw,
        }
    }

    pub fn services_taxable(&self) -> bool {
        self.txb_service.trim().eq_ignore_ascii_case("Y")
    }
}

fn text(raw: &Map<String, Value>, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn rate(raw: &Map<String, Value>, key: &str) -> Option<f64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A decoded lookup response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LookupResult {
    pub version: String,
    pub r_code: i64,
    pub results: Vec<TaxRecord>,
}

impl LookupResult {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Deserialize)]
struct JsonEnvelope {
    #[serde(default)]
    version: Option<Value>,
    #[serde(rename = "rCode", default)]
    r_code: Option<Value>,
    #[serde(default)]
    results: Option<Vec<Map<String, Value>>>,
}

// XML nests records as <results><result>..</result></results>.
#[derive(Deserialize)]
struct XmlEnvelope {
    #[serde(default)]
    version: String,
    #[serde(rename = "rCode", default)]
    r_code: Option<String>,
    #[serde(default)]
    results: XmlResults,
}

#[derive(Default, Deserialize)]
struct XmlResults {
    #[serde(default)]
    result: Vec<BTreeMap<String, String>>,
}

fn response_code(value: Option<&Value>) -> Result<i64, String> {
    let code = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    code.ok_or_else(|| "missing or non-integer rCode".to_string())
}

/// Decode a response body in the given format. The envelope (`version`,
/// `rCode`, `results`) is checked strictly; record fields are not.
pub fn decode(format: ResponseFormat, body: &str) -> Result<LookupResult, String> {
    match format {
        ResponseFormat::Json => {
            let envelope: JsonEnvelope =
                serde_json::from_str(body).map_err(|e| format!("malformed JSON payload: {e}"))?;
            let r_code = response_code(envelope.r_code.as_ref())
                .map_err(|e| format!("malformed JSON payload: {e}"))?;
            let version = match envelope.version {
                Some(Value::String(v)) => v,
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            Ok(LookupResult {
                version,
                r_code,
                results: envelope
                    .results
                    .unwrap_or_default()
                    .into_iter()
                    .map(TaxRecord::from_fields)
                    .collect(),
            })
        }
        ResponseFormat::Xml => {
            let envelope: XmlEnvelope = quick_xml::de::from_str(body)
                .map_err(|e| format!("malformed XML payload: {e}"))?;
            let r_code = response_code(envelope.r_code.map(Value::String).as_ref())
                .map_err(|e| format!("malformed XML payload: {e}"))?;
            Ok(LookupResult {
                version: envelope.version,
                r_code,
                results: envelope
                    .results
                    .result
                    .into_iter()
                    .map(|fields| {
                        TaxRecord::from_fields(
                            fields.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
                        )
                    })
                    .collect(),
            })
        }
    }
}

/// Classify the outcome of one HTTP exchange.
pub fn interpret(
    format: ResponseFormat,
    outcome: Result<HttpResponse, TransportError>,
) -> Result<LookupResult, ZipTaxError> {
    let response = outcome?;

    if !response.is_success() {
        let detail = Some(response.body.trim().to_string()).filter(|b| !b.is_empty());
        return Err(TransportError::new(Some(response.status), detail).into());
    }

    let result = decode(format, &response.body)
        .map_err(|detail| TransportError::new(Some(response.status), Some(detail)))?;

    if let Some(message) = error_message(result.r_code) {
        return Err(ServiceError {
            code: result.r_code,
            message,
        }
        .into());
    }

    if result.r_code != SUCCESS_CODE {
        tracing::warn!(r_code = result.r_code, "service returned an unrecognized rCode");
    }

    Ok(result)
}
