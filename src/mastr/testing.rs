/// In-memory registry for command tests.
use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use super::api::{PageQuery, Record, RegistryApi};
use super::errors::MastrError;
use super::roles::Role;
use crate::soap::SoapError;

/// A recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Marktakteure {
        start: u64,
        limit: u32,
        datum_ab: Option<String>,
        role: Role,
    },
    Einheiten {
        start: u64,
        limit: u32,
        datum_ab: Option<String>,
    },
    Marktakteur(String),
    EinheitStromspeicher(String),
}

/// Serves fixed data and logs every call.
#[derive(Default)]
pub struct FakeRegistry {
    /// Participants with the role they hold.
    pub actors: Vec<(Role, Record)>,
    /// Unit list entries.
    pub units: Vec<Record>,
    /// Storage details by unit number.
    pub details: HashMap<String, Record>,
    /// Participant details by MaStR number; unknown numbers are not found.
    pub operators: HashMap<String, Record>,
    /// Zero-based index of a call that should fail with a SOAP fault.
    pub fail_at_call: Option<usize>,
    pub calls: RefCell<Vec<Call>>,
}

/// Unwrap a JSON object literal.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

impl FakeRegistry {
    fn log(&self, call: Call) -> Result<(), MastrError> {
        let mut calls = self.calls.borrow_mut();
        let index = calls.len();
        calls.push(call);
        if self.fail_at_call == Some(index) {
            return Err(SoapError::Fault {
                operation: "fake".to_owned(),
                code: "s:Server".to_owned(),
                message: "injected failure".to_owned(),
            }
            .into());
        }
        Ok(())
    }

    fn page<'a>(items: impl Iterator<Item = &'a Record>, query: &PageQuery<'_>) -> Vec<Record> {
        let start = usize::try_from(query.start).unwrap_or(usize::MAX);
        items
            .skip(start)
            .take(query.limit as usize)
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl RegistryApi for FakeRegistry {
    fn marktakteure_page(&self, query: &PageQuery<'_>, role: Role) -> Result<Vec<Record>, MastrError> {
        self.log(Call::Marktakteure {
            start: query.start,
            limit: query.limit,
            datum_ab: query.datum_ab.map(str::to_owned),
            role,
        })?;
        let matching = self
            .actors
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, rec)| rec);
        Ok(Self::page(matching, query))
    }

    fn einheiten_page(&self, query: &PageQuery<'_>) -> Result<Vec<Record>, MastrError> {
        self.log(Call::Einheiten {
            start: query.start,
            limit: query.limit,
            datum_ab: query.datum_ab.map(str::to_owned),
        })?;
        Ok(Self::page(self.units.iter(), query))
    }

    fn marktakteur(&self, mastr_nummer: &str) -> Result<Option<Record>, MastrError> {
        self.log(Call::Marktakteur(mastr_nummer.to_owned()))?;
        Ok(self.operators.get(mastr_nummer).cloned())
    }

    fn einheit_stromspeicher(&self, einheit_mastr_nummer: &str) -> Result<Record, MastrError> {
        self.log(Call::EinheitStromspeicher(einheit_mastr_nummer.to_owned()))?;
        Ok(self
            .details
            .get(einheit_mastr_nummer)
            .cloned()
            .unwrap_or_default())
    }
}

/// A WSDL exposing the registry operations on ports `Akteur12` and `Anlage12`
/// served under `base`.
pub fn registry_wsdl(base: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:tns="urn:mastr"
    targetNamespace="urn:mastr">
  <wsdl:binding name="AkteurBinding" type="tns:Akteur">
    <wsdl:operation name="GetGefilterteListeMarktakteure">
      <soap:operation soapAction="urn:GetGefilterteListeMarktakteure"/>
    </wsdl:operation>
    <wsdl:operation name="GetMarktakteur">
      <soap:operation soapAction="urn:GetMarktakteur"/>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:binding name="AnlageBinding" type="tns:Anlage">
    <wsdl:operation name="GetListeAlleEinheiten">
      <soap:operation soapAction="urn:GetListeAlleEinheiten"/>
    </wsdl:operation>
    <wsdl:operation name="GetEinheitStromSpeicher">
      <soap:operation soapAction="urn:GetEinheitStromSpeicher"/>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="Marktstammdatenregister">
    <wsdl:port name="Akteur12" binding="tns:AkteurBinding">
      <soap:address location="{base}/akteur"/>
    </wsdl:port>
    <wsdl:port name="Anlage12" binding="tns:AnlageBinding">
      <soap:address location="{base}/anlage"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#
    )
}

/// Wrap `payload` in a SOAP 1.1 response envelope.
pub fn soap_envelope(payload: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>{payload}</s:Body></s:Envelope>"#
    )
}

/// A SOAP 1.1 fault envelope.
pub fn soap_fault(code: &str, message: &str) -> String {
    soap_envelope(&format!(
        "<s:Fault><faultcode>{code}</faultcode><faultstring>{message}</faultstring></s:Fault>"
    ))
}

/// Runtime hosting wiremock servers; blocking clients call it from the test thread.
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}
