/// Storage unit selection and optional technical criteria.
///
/// The registry has no server-side filter for unit type, so storage units are
/// picked out of the full unit list, then their details are fetched one by one.
/// Detail responses differ between API versions, so every criterion checks
/// several field names.
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::api::{Record, RegistryApi, get_path, value_text};

/// `Einheittyp` of electricity storage units.
pub const EINHEITTYP_STROMSPEICHER: &str = "Stromspeichereinheit";

const NESTED: &str = "EinheitStromSpeicher";

const TECHNOLOGY_FIELDS: &[&str] = &["TechnologieDerStromspeicherung", "Technologie", "Speichertechnologie"];
const BATTERY_FIELDS: &[&str] = &["Batterietechnologie", "BatterieTechnologie", "BatterieTechnologieEnum"];
const POWER_FIELDS: &[&str] = &["Bruttoleistung", "BruttoleistungEinheit", "BruttoLeistung"];
const UNIT_POWER_FIELDS: &[&str] = &["Bruttoleistung", "Leistung"];
const OPERATOR_NUMBER_FIELDS: &[&str] = &["AnlagenbetreiberMastrNummer", "BetreiberMastrNummer"];
const PERSON_TYPE_FIELDS: &[&str] = &["AnlagenbetreiberTyp", "BetreiberTyp", "Personenart", "Rechtsform", "PersonenArt"];
const OPERATOR_PERSON_FIELDS: &[&str] = &["Personenart", "PersonenArt", "Rechtsform", "Typ"];

/// The storage unit number of a list entry, if it is a storage unit.
#[must_use]
pub fn storage_unit_number(einheit: &Record) -> Option<&str> {
    let is_storage = einheit
        .get("Einheittyp")
        .and_then(Value::as_str)
        .is_some_and(|t| t == EINHEITTYP_STROMSPEICHER);
    if !is_storage {
        return None;
    }
    einheit
        .get("EinheitMastrNummer")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
}

/// Combine a list entry with its details into one output record.
#[must_use]
pub fn storage_record(einheit_mastr_nummer: &str, einheit: Record, details: Record) -> Record {
    let mut out = Record::new();
    out.insert("EinheitMastrNummer".to_owned(), json!(einheit_mastr_nummer));
    out.insert("Einheit".to_owned(), Value::Object(einheit));
    out.insert("Details".to_owned(), Value::Object(details));
    out
}

/// Technical criteria a storage unit must meet. All set criteria must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageCriteria {
    /// Storage technology is a battery.
    pub battery: bool,
    /// Battery chemistry is lithium-ion.
    pub lithium: bool,
    /// Gross power strictly above this many kW.
    pub min_power_kw: Option<f64>,
    /// Operator is not a natural person.
    pub exclude_natural_persons: bool,
}

impl StorageCriteria {
    /// Whether no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.battery && !self.lithium && self.min_power_kw.is_none() && !self.exclude_natural_persons
    }

    /// Check a unit against all set criteria.
    ///
    /// The operator lookup runs only when no direct indicator settles the
    /// natural-person question; a failed lookup counts as "not natural".
    pub fn matches<A>(&self, einheit: &Record, details: &Record, api: &A) -> bool
    where
        A: RegistryApi + ?Sized,
    {
        let unit = einheit
            .get("EinheitMastrNummer")
            .map_or_else(|| "unknown".to_owned(), value_text);

        if self.battery {
            let technology = detail_text(details, TECHNOLOGY_FIELDS);
            if !technology.as_deref().is_some_and(|t| t.contains("Batterie")) {
                debug!(%unit, ?technology, "rejected: not a battery");
                return false;
            }
        }

        if self.lithium {
            let chemistry = detail_text(details, BATTERY_FIELDS);
            if !chemistry.as_deref().is_some_and(|c| c.contains("Lithium")) {
                debug!(%unit, ?chemistry, "rejected: not lithium-ion");
                return false;
            }
        }

        if let Some(min_kw) = self.min_power_kw {
            let power = gross_power_kw(einheit, details);
            if !power.is_some_and(|kw| kw > min_kw) {
                debug!(%unit, ?power, min_kw, "rejected: power at or below minimum");
                return false;
            }
        }

        if self.exclude_natural_persons && operator_is_natural_person(einheit, details, api) {
            debug!(%unit, "rejected: operator is a natural person");
            return false;
        }

        true
    }
}

/// First non-empty value among `fields` at the top level of `details`, then
/// under the nested storage object.
fn detail_text(details: &Record, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|f| non_empty(details.get(*f)))
        .or_else(|| {
            fields
                .iter()
                .find_map(|f| non_empty(get_path(details, &[NESTED, *f])))
        })
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .filter(|v| !v.is_null())
        .map(value_text)
        .filter(|s| !s.is_empty())
}

/// Gross power in kW, from details first, then the list entry.
fn gross_power_kw(einheit: &Record, details: &Record) -> Option<f64> {
    let text = detail_text(details, POWER_FIELDS).or_else(|| {
        UNIT_POWER_FIELDS
            .iter()
            .find_map(|f| non_empty(einheit.get(*f)))
    })?;
    parse_decimal(&text)
}

/// Parse a decimal that may use a comma separator.
fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', ".").parse::<f64>().ok())
}

fn looks_natural(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["natürlich", "natuerlich", "natural"]
        .iter()
        .any(|marker| lower.contains(marker))
}

fn operator_is_natural_person<A>(einheit: &Record, details: &Record, api: &A) -> bool
where
    A: RegistryApi + ?Sized,
{
    for field in PERSON_TYPE_FIELDS {
        let value = non_empty(details.get(*field))
            .or_else(|| non_empty(get_path(details, &[NESTED, *field])))
            .or_else(|| non_empty(einheit.get(*field)));
        if value.as_deref().is_some_and(looks_natural) {
            return true;
        }
    }

    let operator = detail_text(details, OPERATOR_NUMBER_FIELDS).or_else(|| {
        OPERATOR_NUMBER_FIELDS
            .iter()
            .find_map(|f| non_empty(einheit.get(*f)))
    });
    let Some(operator) = operator else {
        return false;
    };

    match api.marktakteur(&operator) {
        Ok(Some(actor)) => OPERATOR_PERSON_FIELDS
            .iter()
            .filter_map(|f| non_empty(actor.get(*f)))
            .any(|v| looks_natural(&v)),
        Ok(None) => {
            debug!(%operator, "operator not registered; keeping unit");
            false
        }
        Err(err) => {
            warn!(%operator, error = %err, "operator lookup failed; keeping unit");
            false
        }
    }
}
