/// WSDL 1.1 reader: just enough to address document/literal operations.
///
/// Resolution chain for a call: `service/port` -> `binding` (address, per-op
/// `soapAction`) -> `portType` operation -> input `message` -> first `part`'s
/// `element`, which names the request wrapper element.
use std::collections::HashMap;

use tracing::debug;

use super::client::SoapClient;
use super::errors::SoapError;
use super::xml::{XmlNode, parse_document, strip_prefix};

/// A namespace-qualified element name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    /// Namespace URI (may be empty).
    pub namespace: String,
    /// Local element name.
    pub local: String,
}

/// Everything needed to POST one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Operation name, used in logs and fault messages.
    pub operation: String,
    /// `soap:address` location of the port.
    pub address: String,
    /// `soapAction` header value (may be empty).
    pub soap_action: String,
    /// Request wrapper element.
    pub element: QName,
}

#[derive(Debug, Clone, Default)]
struct Binding {
    port_type: String,
    actions: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct Port {
    binding: String,
    address: String,
}

/// Parsed service description.
#[derive(Debug, Clone, Default)]
pub struct Wsdl {
    target_namespace: String,
    /// message name -> element of its first part
    messages: HashMap<String, QName>,
    /// portType name -> operation name -> input message name
    port_types: HashMap<String, HashMap<String, String>>,
    bindings: HashMap<String, Binding>,
    ports: HashMap<String, Port>,
}

type Scope = HashMap<String, String>;

impl Wsdl {
    /// Download and parse a WSDL document.
    ///
    /// # Errors
    ///
    /// Returns `SoapError` on transport failure or malformed WSDL.
    pub fn fetch(client: &SoapClient, url: &str) -> Result<Self, SoapError> {
        let body = client.get_text(url)?;
        let wsdl = Self::parse(&body)?;
        debug!(
            url,
            ports = wsdl.ports.len(),
            bindings = wsdl.bindings.len(),
            "loaded WSDL"
        );
        Ok(wsdl)
    }

    /// Parse a WSDL document.
    ///
    /// # Errors
    ///
    /// Returns `SoapError::Xml` for malformed XML and
    /// `SoapError::MalformedResponse` when the root is not `definitions`.
    pub fn parse(xml: &str) -> Result<Self, SoapError> {
        let root = parse_document(xml)?;
        if root.local_name() != "definitions" {
            return Err(SoapError::MalformedResponse(format!(
                "expected WSDL definitions, found <{}>",
                root.qname
            )));
        }

        let mut scope = Scope::new();
        extend_scope(&mut scope, &root);

        let mut wsdl = Self {
            target_namespace: root.attr("targetNamespace").unwrap_or_default().to_owned(),
            ..Self::default()
        };

        for node in &root.children {
            let mut local_scope = scope.clone();
            extend_scope(&mut local_scope, node);
            match node.local_name() {
                "message" => wsdl.read_message(node, &local_scope),
                "portType" => wsdl.read_port_type(node),
                "binding" => wsdl.read_binding(node),
                "service" => wsdl.read_service(node),
                _ => {}
            }
        }
        Ok(wsdl)
    }

    fn read_message(&mut self, node: &XmlNode, scope: &Scope) {
        let Some(name) = node.attr("name") else {
            return;
        };
        if let Some(element) = node.child("part").and_then(|p| p.attr("element")) {
            let qname = resolve_qname(element, scope, &self.target_namespace);
            self.messages.insert(name.to_owned(), qname);
        }
    }

    fn read_port_type(&mut self, node: &XmlNode) {
        let Some(name) = node.attr("name") else {
            return;
        };
        let ops = node
            .children_named("operation")
            .filter_map(|op| {
                let op_name = op.attr("name")?;
                let message = op.child("input")?.attr("message")?;
                Some((op_name.to_owned(), strip_prefix(message).to_owned()))
            })
            .collect();
        self.port_types.insert(name.to_owned(), ops);
    }

    fn read_binding(&mut self, node: &XmlNode) {
        let Some(name) = node.attr("name") else {
            return;
        };
        let actions = node
            .children_named("operation")
            .filter_map(|op| {
                let op_name = op.attr("name")?;
                let action = op
                    .child("operation")
                    .and_then(|soap_op| soap_op.attr("soapAction"))
                    .unwrap_or_default();
                Some((op_name.to_owned(), action.to_owned()))
            })
            .collect();
        let binding = Binding {
            port_type: strip_prefix(node.attr("type").unwrap_or_default()).to_owned(),
            actions,
        };
        self.bindings.insert(name.to_owned(), binding);
    }

    fn read_service(&mut self, node: &XmlNode) {
        for port in node.children_named("port") {
            let (Some(name), Some(binding)) = (port.attr("name"), port.attr("binding")) else {
                continue;
            };
            let Some(address) = port.child("address").and_then(|a| a.attr("location")) else {
                continue;
            };
            self.ports.insert(
                name.to_owned(),
                Port {
                    binding: strip_prefix(binding).to_owned(),
                    address: address.to_owned(),
                },
            );
        }
    }

    /// Resolve the endpoint for `operation` on `port`.
    ///
    /// When the input message cannot be traced, the request element falls
    /// back to `{targetNamespace}operation`.
    ///
    /// # Errors
    ///
    /// Returns `SoapError::MissingPort` or `SoapError::MissingOperation`.
    pub fn endpoint(&self, port: &str, operation: &str) -> Result<Endpoint, SoapError> {
        let port_def = self
            .ports
            .get(port)
            .ok_or_else(|| SoapError::MissingPort(port.to_owned()))?;
        let missing = || SoapError::MissingOperation {
            port: port.to_owned(),
            operation: operation.to_owned(),
        };
        let binding = self.bindings.get(&port_def.binding).ok_or_else(missing)?;
        let soap_action = binding.actions.get(operation).ok_or_else(missing)?;

        let element = self
            .port_types
            .get(&binding.port_type)
            .and_then(|ops| ops.get(operation))
            .and_then(|message| self.messages.get(message))
            .cloned()
            .unwrap_or_else(|| QName {
                namespace: self.target_namespace.clone(),
                local: operation.to_owned(),
            });

        Ok(Endpoint {
            operation: operation.to_owned(),
            address: port_def.address.clone(),
            soap_action: soap_action.clone(),
            element,
        })
    }
}

fn extend_scope(scope: &mut Scope, node: &XmlNode) {
    for (prefix, uri) in node.namespace_decls() {
        scope.insert(prefix.to_owned(), uri.to_owned());
    }
}

fn resolve_qname(value: &str, scope: &Scope, target_namespace: &str) -> QName {
    match value.split_once(':') {
        Some((prefix, local)) => QName {
            namespace: scope
                .get(prefix)
                .cloned()
                .unwrap_or_else(|| target_namespace.to_owned()),
            local: local.to_owned(),
        },
        None => QName {
            namespace: scope
                .get("")
                .cloned()
                .unwrap_or_else(|| target_namespace.to_owned()),
            local: value.to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_WSDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:tns="https://example.test/Services"
    xmlns:akt="https://example.test/Services/Akteur"
    targetNamespace="https://example.test/Services">
  <wsdl:message name="GetMarktakteurIn">
    <wsdl:part name="parameters" element="akt:GetMarktakteur"/>
  </wsdl:message>
  <wsdl:portType name="AkteurPortType">
    <wsdl:operation name="GetMarktakteur">
      <wsdl:input message="tns:GetMarktakteurIn"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="Akteur12Binding" type="tns:AkteurPortType">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="GetMarktakteur">
      <soap:operation soapAction="urn:GetMarktakteur" style="document"/>
    </wsdl:operation>
    <wsdl:operation name="GetLokation">
      <soap:operation style="document"/>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="Marktstammdatenregister">
    <wsdl:port name="Akteur12" binding="tns:Akteur12Binding">
      <soap:address location="https://example.test/MaStRAPI/Akteur"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

    #[test]
    fn test_endpoint_resolves_full_chain() {
        let wsdl = Wsdl::parse(SAMPLE_WSDL).unwrap();
        let ep = wsdl.endpoint("Akteur12", "GetMarktakteur").unwrap();
        assert_eq!(ep.address, "https://example.test/MaStRAPI/Akteur");
        assert_eq!(ep.soap_action, "urn:GetMarktakteur");
        assert_eq!(
            ep.element,
            QName {
                namespace: "https://example.test/Services/Akteur".to_owned(),
                local: "GetMarktakteur".to_owned(),
            }
        );
    }

    #[test]
    fn test_untraced_operation_falls_back_to_target_namespace() {
        let wsdl = Wsdl::parse(SAMPLE_WSDL).unwrap();
        let ep = wsdl.endpoint("Akteur12", "GetLokation").unwrap();
        assert_eq!(ep.soap_action, "");
        assert_eq!(ep.element.namespace, "https://example.test/Services");
        assert_eq!(ep.element.local, "GetLokation");
    }

    #[test]
    fn test_missing_port_and_operation() {
        let wsdl = Wsdl::parse(SAMPLE_WSDL).unwrap();
        assert!(matches!(
            wsdl.endpoint("Anlage12", "GetMarktakteur"),
            Err(SoapError::MissingPort(p)) if p == "Anlage12"
        ));
        assert!(matches!(
            wsdl.endpoint("Akteur12", "GetNothing"),
            Err(SoapError::MissingOperation { .. })
        ));
    }

    #[test]
    fn test_non_wsdl_document_rejected() {
        assert!(matches!(
            Wsdl::parse("<html><body/></html>"),
            Err(SoapError::MalformedResponse(_))
        ));
    }
}
