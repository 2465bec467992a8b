/// SOAP response decoding into JSON values.
///
/// Rules:
/// - element with child elements -> object, keys without namespace prefix
/// - a name repeated among siblings -> array in document order
/// - leaf -> its text as a string
/// - `xsi:nil`, empty leaves, and objects that end up empty are dropped
use serde_json::{Map, Value};

use super::errors::SoapError;
use super::xml::{XmlNode, parse_document};

/// Decode a response envelope and return the body's payload element.
///
/// # Errors
///
/// Returns `SoapError::Fault` when the body carries a fault, and
/// `SoapError::MalformedResponse` when the document is not a SOAP envelope.
pub fn response_body(xml: &str, operation: &str) -> Result<Map<String, Value>, SoapError> {
    let root = parse_document(xml)?;
    if root.local_name() != "Envelope" {
        return Err(SoapError::MalformedResponse(format!(
            "{operation}: expected soap Envelope, found <{}>",
            root.qname
        )));
    }
    let body = root
        .child("Body")
        .ok_or_else(|| SoapError::MalformedResponse(format!("{operation}: envelope has no Body")))?;
    let Some(payload) = body.children.first() else {
        return Ok(Map::new());
    };

    if payload.local_name() == "Fault" {
        return Err(fault(payload, operation));
    }

    Ok(match to_value(payload) {
        Some(Value::Object(map)) => map,
        Some(other) => {
            let mut map = Map::new();
            map.insert(payload.local_name().to_owned(), other);
            map
        }
        None => Map::new(),
    })
}

/// Convert an element into a JSON value, or `None` when it carries nothing.
#[must_use]
pub fn to_value(node: &XmlNode) -> Option<Value> {
    if node.is_nil() {
        return None;
    }
    if node.children.is_empty() {
        return (!node.text.is_empty()).then(|| Value::String(node.text.clone()));
    }

    let mut map = Map::new();
    for child in &node.children {
        let name = child.local_name();
        let repeated = node.children_named(name).nth(1).is_some();
        let value = to_value(child);

        if repeated {
            let slot = map
                .entry(name.to_owned())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let (Value::Array(items), Some(v)) = (slot, value) {
                items.push(v);
            }
        } else if let Some(v) = value {
            map.insert(name.to_owned(), v);
        }
    }

    map.retain(|_, v| !matches!(v, Value::Array(items) if items.is_empty()));
    (!map.is_empty()).then_some(Value::Object(map))
}

fn fault(node: &XmlNode, operation: &str) -> SoapError {
    // SOAP 1.1 uses faultcode/faultstring; SOAP 1.2 uses Code/Value and Reason/Text.
    let code = node
        .child("faultcode")
        .map(|c| c.text.clone())
        .or_else(|| {
            node.child("Code")
                .and_then(|c| c.child("Value"))
                .map(|v| v.text.clone())
        })
        .unwrap_or_default();
    let message = node
        .child("faultstring")
        .map(|c| c.text.clone())
        .or_else(|| {
            node.child("Reason")
                .and_then(|r| r.child("Text"))
                .map(|t| t.text.clone())
        })
        .unwrap_or_else(|| "unspecified fault".to_owned());

    SoapError::Fault {
        operation: operation.to_owned(),
        code,
        message,
    }
}

/// Whether a response body looks like a SOAP fault, without failing on bad XML.
#[must_use]
pub fn is_fault(xml: &str) -> bool {
    parse_document(xml)
        .ok()
        .and_then(|root| root.child("Body").and_then(|b| b.children.first().cloned()))
        .is_some_and(|payload| payload.local_name() == "Fault")
}
