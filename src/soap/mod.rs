/// SOAP transport layer: WSDL reading, envelopes, HTTP, response decoding.
pub mod client;
pub mod decode;
pub mod envelope;
pub mod errors;
pub mod wsdl;
pub mod xml;

pub use client::SoapClient;
pub use envelope::Param;
pub use errors::SoapError;
pub use wsdl::Wsdl;
