//! HTTP transport types and the transport seam.
//!
//! # Design
//! Requests and responses are plain data. The client builds an `HttpRequest`,
//! hands it to a `Transport`, and interprets the `HttpResponse` it gets back.
//! Non-2xx statuses are returned as data, not as transport errors, so status
//! classification stays in one place (`response::interpret`). Only failures
//! that produced no response at all (DNS, refused connection, timeout) come
//! back as `TransportError`, with `status: None`.

use std::time::Duration;

use crate::error::TransportError;

/// A GET against an absolute URL, described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes a single blocking HTTP exchange.
///
/// Implementations must return every received response, whatever its status,
/// as `Ok`. `Err` is reserved for exchanges that produced no response.
pub trait Transport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).get(request)
    }
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Production transport backed by a ureq agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Bound the whole exchange (connect, send, receive) by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut response = self
            .agent
            .get(request.url.as_str())
            .call()
            .map_err(|e| TransportError::new(None, Some(e.to_string())))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::new(Some(status), Some(e.to_string())))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_window_is_2xx() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[test]
    fn refused_connection_has_no_status() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = UreqTransport::with_timeout(Duration::from_secs(5));
        let request = HttpRequest {
            url: format!("http://{addr}/request/v20"),
        };
        let err = transport.get(&request).unwrap_err();
        assert_eq!(err.status, None);
        assert!(err.detail.is_some());
    }

    #[test]
    fn silent_server_times_out_without_status() {
        // Accepted by the kernel backlog but never answered.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = UreqTransport::with_timeout(Duration::from_millis(300));
        let request = HttpRequest {
            url: format!("http://{addr}/request/v20"),
        };
        let err = transport.get(&request).unwrap_err();
        assert_eq!(err.status, None);
        assert!(err.detail.as_deref().unwrap_or_default().contains("timeout"), "{err}");
        drop(listener);
    }
}
