/// SOAP-backed implementation of [`RegistryApi`] for the public MaStR API.
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use super::api::{PageQuery, Record, RegistryApi, extract_items};
use super::credentials::Credentials;
use super::errors::MastrError;
use super::roles::Role;
use crate::soap::{Param, SoapClient, SoapError, Wsdl};

/// Public WSDL of the registry's web service.
pub const DEFAULT_WSDL_URL: &str = "https://www.marktstammdatenregister.de/MaStRAPI/wsdl/mastr.wsdl";

/// Port serving market participant operations (API version 1.2).
const AKTEUR_PORT: &str = "Akteur12";
/// Port serving unit operations (API version 1.2).
const ANLAGE_PORT: &str = "Anlage12";

/// Market function filter for electricity market participants.
const MARKTFUNKTION_STROMMARKT: &str = "AkteurImStrommarkt";

const OP_GEFILTERTE_MARKTAKTEURE: &str = "GetGefilterteListeMarktakteure";
const OP_ALLE_EINHEITEN: &str = "GetListeAlleEinheiten";
const OP_MARKTAKTEUR: &str = "GetMarktakteur";
const OP_EINHEIT_STROMSPEICHER: &str = "GetEinheitStromSpeicher";

/// Fault markers the registry uses for unknown participant numbers.
const NOT_FOUND_FAULTS: &[&str] = &["MarktakteurNichtGefunden", "MarktakteurUnbekannt"];

/// Registry client bound to a loaded WSDL.
#[derive(Debug)]
pub struct MastrClient {
    soap: SoapClient,
    wsdl: Wsdl,
    credentials: Credentials,
}

impl MastrClient {
    /// Load the WSDL at `wsdl_url` and bind the client to it.
    ///
    /// # Errors
    ///
    /// Returns `MastrError::Soap` when the WSDL cannot be fetched or parsed.
    pub fn connect(wsdl_url: &str, timeout: Duration, credentials: Credentials) -> Result<Self, MastrError> {
        info!(wsdl = wsdl_url, api_key = %credentials.masked_api_key(), "initialising registry client");
        let soap = SoapClient::new(timeout)?;
        let wsdl = Wsdl::fetch(&soap, wsdl_url)?;
        Ok(Self {
            soap,
            wsdl,
            credentials,
        })
    }

    fn call(&self, port: &str, operation: &str, params: &[Param]) -> Result<Record, MastrError> {
        let endpoint = self.wsdl.endpoint(port, operation)?;
        debug!(operation, address = %endpoint.address, "calling registry");
        Ok(self.soap.call(&endpoint, params)?)
    }
}

impl RegistryApi for MastrClient {
    fn marktakteure_page(&self, query: &PageQuery<'_>, role: Role) -> Result<Vec<Record>, MastrError> {
        let params = marktakteure_params(&self.credentials, query, role);
        let response = self.call(AKTEUR_PORT, OP_GEFILTERTE_MARKTAKTEURE, &params)?;
        Ok(extract_items(response, "Marktakteure"))
    }

    fn einheiten_page(&self, query: &PageQuery<'_>) -> Result<Vec<Record>, MastrError> {
        let params = einheiten_params(&self.credentials, query);
        let response = self.call(ANLAGE_PORT, OP_ALLE_EINHEITEN, &params)?;
        Ok(extract_items(response, "Einheiten"))
    }

    fn marktakteur(&self, mastr_nummer: &str) -> Result<Option<Record>, MastrError> {
        let params = marktakteur_params(&self.credentials, mastr_nummer);
        let mut response = match self.call(AKTEUR_PORT, OP_MARKTAKTEUR, &params) {
            Ok(response) => response,
            Err(MastrError::Soap(err)) if is_not_found(&err) => {
                debug!(mastr_nummer, fault = %err, "market participant not found");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        // Newer API versions return the participant fields at the top level.
        let actor = match response.remove("Marktakteur") {
            Some(Value::Object(actor)) => actor,
            _ => response,
        };
        Ok((!actor.is_empty()).then_some(actor))
    }

    fn einheit_stromspeicher(&self, einheit_mastr_nummer: &str) -> Result<Record, MastrError> {
        let mut params = auth_params(&self.credentials);
        params.push(Param::text("einheitMastrNummer", einheit_mastr_nummer));
        self.call(ANLAGE_PORT, OP_EINHEIT_STROMSPEICHER, &params)
    }
}

fn auth_params(credentials: &Credentials) -> Vec<Param> {
    vec![
        Param::text("apiKey", credentials.api_key.as_str()),
        Param::text("marktakteurMastrNummer", credentials.marktakteur.as_str()),
    ]
}

/// Request parameters for `GetMarktakteur`.
fn marktakteur_params(credentials: &Credentials, mastr_nummer: &str) -> Vec<Param> {
    let mut params = auth_params(credentials);
    params.push(Param::text("mastrNummer", mastr_nummer));
    params
}

/// Whether a fault means the requested participant does not exist.
fn is_not_found(err: &SoapError) -> bool {
    match err {
        SoapError::Fault { code, message, .. } => NOT_FOUND_FAULTS
            .iter()
            .any(|marker| code.contains(marker) || message.contains(marker)),
        _ => false,
    }
}

fn paging_params(credentials: &Credentials, query: &PageQuery<'_>) -> Vec<Param> {
    let mut params = auth_params(credentials);
    params.push(Param::integer(
        "startAb",
        i64::try_from(query.start).unwrap_or(i64::MAX),
    ));
    params.push(Param::integer("limit", i64::from(query.limit)));
    if let Some(datum_ab) = query.datum_ab {
        params.push(Param::text("datumAb", datum_ab));
    }
    params
}

/// Request parameters for `GetGefilterteListeMarktakteure`.
fn marktakteure_params(credentials: &Credentials, query: &PageQuery<'_>, role: Role) -> Vec<Param> {
    let mut params = paging_params(credentials, query);
    params.push(Param::text("marktfunktion", MARKTFUNKTION_STROMMARKT));
    params.push(Param::repeated("Marktrollen", vec![role.code().to_owned()]));
    params
}

/// Request parameters for `GetListeAlleEinheiten`.
fn einheiten_params(credentials: &Credentials, query: &PageQuery<'_>) -> Vec<Param> {
    paging_params(credentials, query)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::mastr::testing::{registry_wsdl, runtime, soap_envelope, soap_fault};
    use crate::soap::envelope::ParamValue;

    fn creds() -> Credentials {
        Credentials {
            api_key: "key".to_owned(),
            marktakteur: "SNB1".to_owned(),
        }
    }

    fn names(params: &[Param]) -> Vec<&'static str> {
        params.iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_marktakteure_params_order_and_filter() {
        let query = PageQuery {
            start: 4000,
            limit: 2000,
            datum_ab: Some("2025-01-01T00:00:00"),
        };
        let params = marktakteure_params(&creds(), &query, Role::Mb);
        assert_eq!(
            names(&params),
            [
                "apiKey",
                "marktakteurMastrNummer",
                "startAb",
                "limit",
                "datumAb",
                "marktfunktion",
                "Marktrollen"
            ]
        );
        assert_eq!(params[2].value, ParamValue::Integer(4000));
        assert_eq!(
            params[4].value,
            ParamValue::Text("2025-01-01T00:00:00".to_owned())
        );
        assert_eq!(
            params[6].value,
            ParamValue::Repeated(vec![
                "EnergiemarktakteureMessstellenbetreiberStrom".to_owned()
            ])
        );
    }

    #[test]
    fn test_marktakteur_params_use_mastr_nummer() {
        let params = marktakteur_params(&creds(), "ABR900000000001");
        assert_eq!(names(&params), ["apiKey", "marktakteurMastrNummer", "mastrNummer"]);
        assert_eq!(
            params[2].value,
            ParamValue::Text("ABR900000000001".to_owned())
        );
    }

    #[test]
    fn test_not_found_faults() {
        let fault = |message: &str| SoapError::Fault {
            operation: OP_MARKTAKTEUR.to_owned(),
            code: "s:Client".to_owned(),
            message: message.to_owned(),
        };
        assert!(is_not_found(&fault("MarktakteurNichtGefunden: ABR1")));
        assert!(is_not_found(&fault("Fehler MarktakteurUnbekannt")));
        assert!(!is_not_found(&fault("ToManyRequests")));
        assert!(!is_not_found(&SoapError::MissingPort("Akteur12".to_owned())));
    }

    #[test]
    fn test_datum_ab_omitted_when_absent() {
        let query = PageQuery {
            start: 0,
            limit: 10,
            datum_ab: None,
        };
        let params = einheiten_params(&creds(), &query);
        assert_eq!(
            names(&params),
            ["apiKey", "marktakteurMastrNummer", "startAb", "limit"]
        );
    }

    #[test]
    fn test_datum_ab_passed_verbatim() {
        let raw = "2024-12-31T23:59:59.123+01:00";
        let query = PageQuery {
            start: 0,
            limit: 10,
            datum_ab: Some(raw),
        };
        let params = einheiten_params(&creds(), &query);
        assert_eq!(params[4].value, ParamValue::Text(raw.to_owned()));
    }

    /// Serves the WSDL under `/mastr.wsdl` and connects a client to it.
    fn connected(rt: &tokio::runtime::Runtime, server: &MockServer) -> MastrClient {
        rt.block_on(
            Mock::given(method("GET"))
                .and(path("/mastr.wsdl"))
                .respond_with(ResponseTemplate::new(200).set_body_string(registry_wsdl(&server.uri())))
                .mount(server),
        );
        let url = format!("{}/mastr.wsdl", server.uri());
        MastrClient::connect(&url, Duration::from_secs(5), creds()).unwrap()
    }

    #[test]
    fn test_marktakteure_page_over_http() {
        let rt = runtime();
        let server = rt.block_on(MockServer::start());
        let client = connected(&rt, &server);
        rt.block_on(
            Mock::given(method("POST"))
                .and(path("/akteur"))
                .and(body_string_contains("<startAb>2</startAb>"))
                .and(body_string_contains("<datumAb>2025-01-01</datumAb>"))
                .and(body_string_contains(
                    "<Marktrollen>EnergiemarktakteureStromlieferant</Marktrollen>",
                ))
                .respond_with(ResponseTemplate::new(200).set_body_string(soap_envelope(
                    r#"<GetGefilterteListeMarktakteureAntwort xmlns="urn:mastr"><Ergebniscode>OK</Ergebniscode><Marktakteure><MastrNummer>ABR3</MastrNummer></Marktakteure><Marktakteure><MastrNummer>ABR4</MastrNummer></Marktakteure></GetGefilterteListeMarktakteureAntwort>"#,
                )))
                .mount(&server),
        );

        let query = PageQuery {
            start: 2,
            limit: 2,
            datum_ab: Some("2025-01-01"),
        };
        let page = client.marktakteure_page(&query, Role::Lt).unwrap();
        let nummern: Vec<_> = page.iter().map(|r| r["MastrNummer"].clone()).collect();
        assert_eq!(nummern, ["ABR3", "ABR4"]);
    }

    #[test]
    fn test_marktakteur_over_http() {
        let rt = runtime();
        let server = rt.block_on(MockServer::start());
        let client = connected(&rt, &server);
        rt.block_on(async {
            Mock::given(method("POST"))
                .and(path("/akteur"))
                .and(body_string_contains("<mastrNummer>ABR1</mastrNummer>"))
                .respond_with(ResponseTemplate::new(200).set_body_string(soap_envelope(
                    r#"<GetMarktakteurAntwort xmlns="urn:mastr"><MastrNummer>ABR1</MastrNummer><Personenart>Organisation</Personenart></GetMarktakteurAntwort>"#,
                )))
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path("/akteur"))
                .and(body_string_contains("<mastrNummer>ABR404</mastrNummer>"))
                .respond_with(
                    ResponseTemplate::new(500)
                        .set_body_string(soap_fault("s:Client", "MarktakteurNichtGefunden")),
                )
                .mount(&server)
                .await;
        });

        let found = client.marktakteur("ABR1").unwrap().unwrap();
        assert_eq!(found["Personenart"], "Organisation");
        assert!(client.marktakteur("ABR404").unwrap().is_none());
    }

    #[test]
    fn test_other_faults_are_errors() {
        let rt = runtime();
        let server = rt.block_on(MockServer::start());
        let client = connected(&rt, &server);
        rt.block_on(
            Mock::given(method("POST"))
                .and(path("/anlage"))
                .respond_with(
                    ResponseTemplate::new(500).set_body_string(soap_fault("s:Server", "Wartung")),
                )
                .mount(&server),
        );

        let err = client.einheit_stromspeicher("SEE1").unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
