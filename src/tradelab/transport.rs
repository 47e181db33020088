//! Raw HTTP exchange with TradeLab.
//!
//! A transport only moves bytes: it never looks at the envelope. That keeps
//! the interpretation logic in [`super::envelope`] testable without a socket.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// Outbound request, relative to the vendor base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorRequest {
    pub method: Method,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl VendorRequest {
    fn new(method: Method, path: &'static str) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: &'static str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &'static str, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: &'static str, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: &'static str) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and raw body of a vendor response.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorReply {
    pub status: u16,
    pub body: String,
}

/// The vendor could not be reached or its body could not be read.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid vendor URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Sends a [`VendorRequest`] and returns whatever came back.
#[async_trait]
pub trait VendorTransport: Send + Sync {
    async fn send(&self, request: &VendorRequest) -> Result<VendorReply, TransportError>;
}

/// [`VendorTransport`] over `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HttpTransport {
    /// Build the shared client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the TLS backend
    /// cannot be initialised.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl VendorTransport for HttpTransport {
    async fn send(&self, request: &VendorRequest) -> Result<VendorReply, TransportError> {
        let url = self.base_url.join(request.path)?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        Ok(VendorReply { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builders_fill_method_query_and_body() {
        let request = VendorRequest::post("/api/v1/funds/payout", json!({ "amount": 10 }))
            .query("client_id", "AB1234");

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.query, vec![("client_id", "AB1234".to_string())]);
        assert_eq!(request.body, Some(json!({ "amount": 10 })));

        let request = VendorRequest::delete("/api/v1/ipo/bid");
        assert_eq!(request.method, Method::DELETE);
        assert!(request.body.is_none());
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = HttpTransport::new("::nope", "t", Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::Url(_)));
    }
}
