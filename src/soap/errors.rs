/// Errors from the SOAP transport layer.
use thiserror::Error;

/// Typed errors from WSDL loading, envelope exchange and response decoding.
#[derive(Debug, Error)]
pub enum SoapError {
    /// Transport failure (DNS, TLS, connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status and no SOAP fault.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Request URL.
        url: String,
        /// Response body, truncated for display.
        body: String,
    },

    /// The service returned a SOAP fault.
    #[error("SOAP fault in {operation} ({code}): {message}")]
    Fault {
        /// Operation that was called.
        operation: String,
        /// `faultcode` text.
        code: String,
        /// `faultstring` text.
        message: String,
    },

    /// The document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// The WSDL does not declare the requested port.
    #[error("WSDL has no port named '{0}'")]
    MissingPort(String),

    /// The port's binding does not declare the requested operation.
    #[error("WSDL port '{port}' has no operation '{operation}'")]
    MissingOperation {
        /// Port name.
        port: String,
        /// Operation name.
        operation: String,
    },

    /// Well-formed XML that does not have the expected SOAP shape.
    #[error("Malformed SOAP response: {0}")]
    MalformedResponse(String),
}

impl From<quick_xml::Error> for SoapError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for SoapError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.to_string())
    }
}
