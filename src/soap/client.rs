/// Blocking HTTP transport for SOAP calls.
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::decode::{is_fault, response_body};
use super::envelope::{Param, build};
use super::errors::SoapError;
use super::wsdl::Endpoint;

/// Longest response excerpt carried in `SoapError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// A blocking SOAP 1.1 client with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct SoapClient {
    http: Client,
}

impl SoapClient {
    /// Build a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `SoapError::Http` if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, SoapError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// GET a document as text.
    ///
    /// # Errors
    ///
    /// Returns `SoapError::Http` on transport failure and
    /// `SoapError::Status` on a non-success status.
    pub fn get_text(&self, url: &str) -> Result<String, SoapError> {
        let response = self.http.get(url).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), url, &body));
        }
        Ok(body)
    }

    /// POST `params` to `endpoint` and decode the response payload.
    ///
    /// A SOAP fault is reported as `SoapError::Fault` whatever the HTTP
    /// status; other non-success statuses become `SoapError::Status`.
    ///
    /// # Errors
    ///
    /// Returns `SoapError` on transport failure, fault, or undecodable reply.
    pub fn call(&self, endpoint: &Endpoint, params: &[Param]) -> Result<Map<String, Value>, SoapError> {
        let envelope = build(&endpoint.element, params);
        trace!(operation = %endpoint.operation, address = %endpoint.address, "soap request");

        let response = self
            .http
            .post(&endpoint.address)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/xml; charset=utf-8"),
            )
            .header("SOAPAction", format!("\"{}\"", endpoint.soap_action))
            .body(envelope)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        debug!(
            operation = %endpoint.operation,
            status = status.as_u16(),
            bytes = body.len(),
            "soap response"
        );

        if !status.is_success() && !is_fault(&body) {
            return Err(status_error(status.as_u16(), &endpoint.address, &body));
        }
        response_body(&body, &endpoint.operation)
    }
}

fn status_error(status: u16, url: &str, body: &str) -> SoapError {
    let mut excerpt: String = body.chars().take(MAX_ERROR_BODY).collect();
    if excerpt.len() < body.len() {
        excerpt.push('…');
    }
    SoapError::Status {
        status,
        url: url.to_owned(),
        body: excerpt,
    }
}
