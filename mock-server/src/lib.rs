use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Key accepted by `app()`.
pub const DEFAULT_API_KEY: &str = "test-key";

/// Postal code that makes the server answer with HTTP 500.
pub const FAULT_POSTAL_CODE: &str = "99999";

/// Postal code that makes the server stall for `SLOW_DELAY` before answering.
pub const SLOW_POSTAL_CODE: &str = "99998";
pub const SLOW_DELAY: Duration = Duration::from_secs(5);

const US_STATES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM",
    "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRecord {
    pub geo_postal_code: String,
    pub geo_city: String,
    pub geo_county: String,
    pub geo_state: String,
    pub tax_sales: f64,
    pub tax_use: f64,
    pub txb_service: String,
    pub state_sales_tax: f64,
    pub state_use_tax: f64,
    pub city_sales_tax: f64,
    pub city_use_tax: f64,
    pub city_tax_code: String,
    pub county_sales_tax: f64,
    pub county_use_tax: f64,
    pub county_tax_code: String,
    pub district_sales_tax: f64,
    pub district_use_tax: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub version: String,
    #[serde(rename = "rCode")]
    pub r_code: i64,
    pub results: Vec<TaxRecord>,
}

#[derive(Serialize)]
struct XmlResponse<'a> {
    version: &'a str,
    #[serde(rename = "rCode")]
    r_code: i64,
    results: XmlResults<'a>,
}

#[derive(Serialize)]
struct XmlResults<'a> {
    result: &'a [TaxRecord],
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LookupQuery {
    pub key: Option<String>,
    pub postalcode: Option<String>,
    pub format: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

struct MockState {
    api_key: String,
    records: Vec<TaxRecord>,
}

type Shared = Arc<MockState>;

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state: Shared = Arc::new(MockState {
        api_key: api_key.to_string(),
        records: fixtures(),
    });
    Router::new()
        .route("/request/v20", get(lookup))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_key(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Xml,
}

async fn lookup(State(state): State<Shared>, Query(query): Query<LookupQuery>) -> Response {
    let format = match query.format.as_deref().map(str::trim) {
        None | Some("JSON") => Format::Json,
        Some("XML") => Format::Xml,
        Some(other) => {
            tracing::debug!(format = other, "rejecting unknown format");
            return render(Format::Json, 105, &[]);
        }
    };

    if query.key.as_deref() != Some(state.api_key.as_str()) {
        return render(format, 101, &[]);
    }

    let postal_code = query.postalcode.as_deref().unwrap_or_default().trim();
    if postal_code == FAULT_POSTAL_CODE {
        return (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response();
    }
    if postal_code == SLOW_POSTAL_CODE {
        tokio::time::sleep(SLOW_DELAY).await;
    }

    let state_code = query.state.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if let Some(code) = state_code {
        if !US_STATES.iter().any(|known| known.eq_ignore_ascii_case(code)) {
            return render(format, 102, &[]);
        }
    }

    if postal_code.len() != 5 || !postal_code.bytes().all(|b| b.is_ascii_digit()) {
        return render(format, 104, &[]);
    }

    let city = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let matches: Vec<TaxRecord> = state
        .records
        .iter()
        .filter(|r| r.geo_postal_code == postal_code)
        .filter(|r| city.map_or(true, |c| r.geo_city.eq_ignore_ascii_case(c)))
        .filter(|r| state_code.map_or(true, |s| r.geo_state.eq_ignore_ascii_case(s)))
        .cloned()
        .collect();

    tracing::debug!(postal_code, records = matches.len(), "lookup served");
    render(format, 100, &matches)
}

fn render(format: Format, r_code: i64, results: &[TaxRecord]) -> Response {
    match format {
        Format::Json => Json(LookupResponse {
            version: "v20".to_string(),
            r_code,
            results: results.to_vec(),
        })
        .into_response(),
        Format::Xml => {
            let body = XmlResponse {
                version: "v20",
                r_code,
                results: XmlResults { result: results },
            };
            match quick_xml::se::to_string_with_root("response", &body) {
                Ok(xml) => ([(header::CONTENT_TYPE, "application/xml")], xml).into_response(),
                Err(e) => {
                    tracing::error!(error = %e, "failed to render XML response");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    postal_code: &str,
    city: &str,
    county: &str,
    state: &str,
    state_rate: f64,
    county_rate: f64,
    city_rate: f64,
    district_rate: f64,
) -> TaxRecord {
    let total = state_rate + county_rate + city_rate + district_rate;
    TaxRecord {
        geo_postal_code: postal_code.to_string(),
        geo_city: city.to_string(),
        geo_county: county.to_string(),
        geo_state: state.to_string(),
        tax_sales: total,
        tax_use: total,
        txb_service: "N".to_string(),
        state_sales_tax: state_rate,
        state_use_tax: state_rate,
        city_sales_tax: city_rate,
        city_use_tax: city_rate,
        city_tax_code: String::new(),
        county_sales_tax: county_rate,
        county_use_tax: county_rate,
        county_tax_code: String::new(),
        district_sales_tax: district_rate,
        district_use_tax: district_rate,
    }
}

fn fixtures() -> Vec<TaxRecord> {
    vec![
        record("90210", "BEVERLY HILLS", "LOS ANGELES", "CA", 0.06, 0.0025, 0.0, 0.0325),
        record("90210", "LOS ANGELES", "LOS ANGELES", "CA", 0.06, 0.0025, 0.0, 0.0325),
        record("37402", "CHATTANOOGA", "HAMILTON", "TN", 0.07, 0.0225, 0.0, 0.0),
        record("00501", "HOLTSVILLE", "SUFFOLK", "NY", 0.04, 0.04625, 0.0, 0.00375),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_wire_names() {
        let json = serde_json::to_value(&fixtures()[0]).unwrap();
        assert_eq!(json["geoPostalCode"], "90210");
        assert_eq!(json["geoCity"], "BEVERLY HILLS");
        assert_eq!(json["txbService"], "N");
        assert!(json.get("districtUseTax").is_some());
    }

    #[test]
    fn record_totals_sum_components() {
        let r = &fixtures()[2];
        assert!((r.tax_sales - 0.0925).abs() < 1e-9);
        assert_eq!(r.tax_sales, r.tax_use);
    }

    #[test]
    fn fixtures_keep_leading_zeros() {
        assert!(fixtures().iter().any(|r| r.geo_postal_code == "00501"));
    }

    #[test]
    fn query_fields_are_optional() {
        let query: LookupQuery = serde_json::from_str("{}").unwrap();
        assert!(query.key.is_none());
        assert!(query.postalcode.is_none());
    }

    #[test]
    fn xml_rendering_wraps_each_record() {
        let records = fixtures();
        let body = XmlResponse {
            version: "v20",
            r_code: 100,
            results: XmlResults {
                result: &records[..2],
            },
        };
        let xml = quick_xml::se::to_string_with_root("response", &body).unwrap();
        assert!(xml.starts_with("<response>"));
        assert!(xml.contains("<rCode>100</rCode>"));
        assert_eq!(xml.matches("<result>").count(), 2);
    }
}
