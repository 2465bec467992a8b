/// SOAP 1.1 document/literal request envelopes.
use quick_xml::escape::escape;

use super::wsdl::QName;

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// One request parameter, rendered as a child of the request element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Element name.
    pub name: &'static str,
    /// Element content.
    pub value: ParamValue,
}

/// Parameter content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A single text value.
    Text(String),
    /// A single integer value.
    Integer(i64),
    /// The element repeated once per value (`maxOccurs="unbounded"`).
    Repeated(Vec<String>),
}

impl Param {
    /// A text parameter.
    #[must_use]
    pub fn text(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: ParamValue::Text(value.into()),
        }
    }

    /// An integer parameter.
    #[must_use]
    pub fn integer(name: &'static str, value: i64) -> Self {
        Self {
            name,
            value: ParamValue::Integer(value),
        }
    }

    /// A repeated parameter.
    #[must_use]
    pub fn repeated(name: &'static str, values: Vec<String>) -> Self {
        Self {
            name,
            value: ParamValue::Repeated(values),
        }
    }
}

/// Build a request envelope with `params` as children of `element`.
///
/// Children share the request element's namespace via a default `xmlns`.
#[must_use]
pub fn build(element: &QName, params: &[Param]) -> String {
    let mut body = String::new();
    for param in params {
        match &param.value {
            ParamValue::Text(v) => push_leaf(&mut body, param.name, v),
            ParamValue::Integer(v) => push_leaf(&mut body, param.name, &v.to_string()),
            ParamValue::Repeated(values) => {
                for v in values {
                    push_leaf(&mut body, param.name, v);
                }
            }
        }
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="{env}">"#,
            "<soapenv:Header/>",
            "<soapenv:Body>",
            r#"<{local} xmlns="{ns}">{body}</{local}>"#,
            "</soapenv:Body>",
            "</soapenv:Envelope>"
        ),
        env = SOAP_ENV_NS,
        local = element.local,
        ns = escape(element.namespace.as_str()),
        body = body,
    )
}

fn push_leaf(out: &mut String, name: &str, value: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(&escape(value));
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soap::xml::{XmlNode, parse_document};

    fn element() -> QName {
        QName {
            namespace: "urn:mastr".to_owned(),
            local: "GetListe".to_owned(),
        }
    }

    #[test]
    fn test_params_in_order_and_escaped() {
        let xml = build(
            &element(),
            &[
                Param::text("apiKey", "a<b&c"),
                Param::integer("startAb", 4000),
                Param::repeated("Marktrollen", vec!["X".to_owned(), "Y".to_owned()]),
            ],
        );
        let doc = parse_document(&xml).unwrap();
        let request = &doc.child("Body").unwrap().children[0];
        assert_eq!(request.local_name(), "GetListe");
        assert_eq!(request.attr("xmlns"), Some("urn:mastr"));

        let names: Vec<&str> = request.children.iter().map(XmlNode::local_name).collect();
        assert_eq!(names, ["apiKey", "startAb", "Marktrollen", "Marktrollen"]);
        assert_eq!(request.children[0].text, "a<b&c");
        assert_eq!(request.children[1].text, "4000");
        assert_eq!(request.children[3].text, "Y");
    }

    #[test]
    fn test_empty_params() {
        let xml = build(&element(), &[]);
        assert!(xml.contains(r#"<GetListe xmlns="urn:mastr"></GetListe>"#));
        assert!(xml.contains(SOAP_ENV_NS));
    }
}
