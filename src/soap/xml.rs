/// Minimal owned XML tree built on `quick-xml` events.
///
/// Both the WSDL reader and the response decoder walk documents that are
/// small enough to hold in memory, so a tiny DOM keeps them simple.
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::errors::SoapError;

/// An element with its attributes, text content, and child elements.
#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    /// Qualified name as written (e.g. `wsdl:message`).
    pub qname: String,
    /// Attributes in document order, keys as written (e.g. `xmlns:tns`).
    pub attrs: Vec<(String, String)>,
    /// Concatenated, trimmed text content.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Element name without namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        strip_prefix(&self.qname)
    }

    /// Attribute value by its written key.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value by local key, ignoring any prefix (`xsi:nil` -> `nil`).
    #[must_use]
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| strip_prefix(k) == local && !k.starts_with("xmlns"))
            .map(|(_, v)| v.as_str())
    }

    /// Iterate child elements with the given local name.
    pub fn children_named<'a, 'n>(&'a self, local: &'n str) -> impl Iterator<Item = &'a XmlNode> + use<'a, 'n> {
        self.children.iter().filter(move |c| c.local_name() == local)
    }

    /// First child element with the given local name.
    #[must_use]
    pub fn child(&self, local: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.local_name() == local)
    }

    /// Namespace declarations made on this element as `(prefix, uri)`.
    /// The default namespace has an empty prefix.
    pub fn namespace_decls(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().filter_map(|(k, v)| {
            if k == "xmlns" {
                Some(("", v.as_str()))
            } else {
                k.strip_prefix("xmlns:").map(|p| (p, v.as_str()))
            }
        })
    }

    /// Whether the element is marked `xsi:nil="true"`.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self.attr_local("nil"), Some("true" | "1"))
    }
}

/// Strip a namespace prefix from a qualified name.
#[must_use]
pub fn strip_prefix(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

/// Parse a whole document and return its root element.
///
/// # Errors
///
/// Returns `SoapError::Xml` for malformed input and
/// `SoapError::MalformedResponse` when the document has no root element.
pub fn parse_document(xml: &str) -> Result<XmlNode, SoapError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(node_from_start(&e)?),
            Event::Empty(e) => {
                let node = node_from_start(&e)?;
                attach(node, &mut stack, &mut root);
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| SoapError::Xml("unbalanced end tag".to_owned()))?;
                attach(node, &mut stack, &mut root);
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(SoapError::Xml("unexpected end of document".to_owned()));
    }
    root.ok_or_else(|| SoapError::MalformedResponse("document has no root element".to_owned()))
}

fn node_from_start(e: &BytesStart<'_>) -> Result<XmlNode, SoapError> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(XmlNode {
        qname: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        attrs,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(node: XmlNode, stack: &mut [XmlNode], root: &mut Option<XmlNode>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            // Only the first top-level element counts.
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_with_attributes() {
        let doc = parse_document(
            r#"<?xml version="1.0"?>
            <a:root xmlns:a="urn:a" id="1">
              <a:child>hello &amp; bye</a:child>
              <a:empty/>
            </a:root>"#,
        )
        .unwrap();
        assert_eq!(doc.local_name(), "root");
        assert_eq!(doc.attr("id"), Some("1"));
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.child("child").unwrap().text, "hello & bye");
        assert!(doc.child("empty").unwrap().children.is_empty());
        assert_eq!(doc.namespace_decls().collect::<Vec<_>>(), vec![("a", "urn:a")]);
    }

    #[test]
    fn test_child_outlives_lookup_name() {
        let doc = parse_document("<r><Marktakteur><Name>x</Name></Marktakteur><Marktakteur/></r>").unwrap();
        let found = {
            let name = String::from("Marktakteur");
            doc.child(&name)
        };
        assert_eq!(found.unwrap().child("Name").unwrap().text, "x");

        let all: Vec<&XmlNode> = {
            let name = "Marktakteur".to_owned();
            doc.children_named(&name).collect()
        };
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_nil_attribute() {
        let doc = parse_document(
            r#"<r xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><v xsi:nil="true"/></r>"#,
        )
        .unwrap();
        assert!(doc.child("v").unwrap().is_nil());
        assert!(!doc.is_nil());
    }

    #[test]
    fn test_unbalanced_document_is_error() {
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("").is_err());
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("soap:Body"), "Body");
        assert_eq!(strip_prefix("Body"), "Body");
    }
}
