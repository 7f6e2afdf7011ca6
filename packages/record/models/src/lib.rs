#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Establishment record types and the known property vocabulary.
//!
//! A [`Record`] is one geolocated establishment: a validated coordinate
//! pair plus a property bag. Properties the dashboard reasons about are
//! keyed by the closed [`Field`] enumeration; anything else the source
//! spreadsheet carries is kept verbatim in an auxiliary map so exports
//! stay lossless.

use std::borrow::Cow;
use std::collections::BTreeMap;

use etab_map_normalize::{format_number, is_blank, normalize_number, parse_number};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A property name from the known establishment vocabulary.
///
/// The serialized names are the spreadsheet column headers and must not
/// change: they are the keys of every record in the source collection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Field {
    /// Establishment name.
    #[serde(rename = "Etablissement")]
    #[strum(serialize = "Etablissement")]
    Establishment,
    /// Postal address.
    #[serde(rename = "Adresse")]
    #[strum(serialize = "Adresse")]
    Address,
    /// Establishment registration number.
    #[serde(rename = "N° établissement")]
    #[strum(serialize = "N° établissement")]
    EstablishmentNumber,
    /// Active / inactive status.
    #[serde(rename = "Actif inactif")]
    #[strum(serialize = "Actif inactif")]
    ActiveStatus,
    /// Establishment type.
    #[serde(rename = "Type établissement")]
    #[strum(serialize = "Type établissement")]
    EstablishmentType,
    /// Referring sector.
    #[serde(rename = "Secteur référent")]
    #[strum(serialize = "Secteur référent")]
    Sector,
    /// Referring doctor.
    #[serde(rename = "Médecin référent")]
    #[strum(serialize = "Médecin référent")]
    Doctor,
    /// Planned practitioner.
    #[serde(rename = "Intervenant prévu")]
    #[strum(serialize = "Intervenant prévu")]
    Practitioner,
    /// NAF activity code (e.g. `4711D`).
    #[serde(rename = "Code NAF")]
    #[strum(serialize = "Code NAF")]
    NafCode,
    /// NAF activity label.
    #[serde(rename = "NAF")]
    #[strum(serialize = "NAF")]
    NafLabel,
    /// Workforce size category.
    #[serde(rename = "Cat-Eff_Niv")]
    #[strum(serialize = "Cat-Eff_Niv")]
    WorkforceCategory,
    /// Numeric index of the workforce size category.
    #[serde(rename = "Index_Cat-Eff_Niv")]
    #[strum(serialize = "Index_Cat-Eff_Niv")]
    WorkforceIndex,
    /// Number of followed employees.
    #[serde(rename = "Nombre d'individus suivis")]
    #[strum(serialize = "Nombre d'individus suivis")]
    Employees,
    /// Risk level (1-5).
    #[serde(rename = "Niv Risque")]
    #[strum(serialize = "Niv Risque")]
    RiskLevel,
    /// Membership level.
    #[serde(rename = "Niv_Adh")]
    #[strum(serialize = "Niv_Adh")]
    MembershipLevel,
    /// Age in years of the company sheet (from creation or last update).
    #[serde(rename = "Age FE (CREA ou MAJ)")]
    #[strum(serialize = "Age FE (CREA ou MAJ)")]
    SheetAge,
    /// Proposed priority.
    #[serde(rename = "Priorité proposée")]
    #[strum(serialize = "Priorité proposée")]
    ProposedPriority,
    /// Retained priority.
    #[serde(rename = "Priorité retenue")]
    #[strum(serialize = "Priorité retenue")]
    RetainedPriority,
    /// Planned year.
    #[serde(rename = "Année Prévue")]
    #[strum(serialize = "Année Prévue")]
    PlannedYear,
    /// Planned quarter (1-4).
    #[serde(rename = "Trimestre Prévu")]
    #[strum(serialize = "Trimestre Prévu")]
    PlannedQuarter,
    /// Membership date (ISO 8601).
    #[serde(rename = "Date d'adhésion établissement")]
    #[strum(serialize = "Date d'adhésion établissement")]
    MembershipDate,
    /// Company sheet creation date (ISO 8601). Also the creation marker:
    /// establishments without it have no company sheet.
    #[serde(rename = "Date création fiche entreprise")]
    #[strum(serialize = "Date création fiche entreprise")]
    SheetCreatedAt,
    /// Company sheet last update date (ISO 8601).
    #[serde(rename = "Date mise à jour fiche entreprise")]
    #[strum(serialize = "Date mise à jour fiche entreprise")]
    SheetUpdatedAt,
    /// Date the company sheet was sent to the member (ISO 8601).
    #[serde(rename = "Date envoi FE adhérent")]
    #[strum(serialize = "Date envoi FE adhérent")]
    SheetSentAt,
    /// How the company sheet was produced.
    #[serde(rename = "Condition réalisation")]
    #[strum(serialize = "Condition réalisation")]
    Condition,
    /// Follow-up outcome of the company sheet.
    #[serde(rename = "Suite FE")]
    #[strum(serialize = "Suite FE")]
    SheetOutcome,
    /// Sheet writer.
    #[serde(rename = "Rédacteur")]
    #[strum(serialize = "Rédacteur")]
    Writer,
    /// Who created the company sheet.
    #[serde(rename = "Fiche entreprise créée par")]
    #[strum(serialize = "Fiche entreprise créée par")]
    SheetCreatedBy,
    /// Who last updated the company sheet.
    #[serde(rename = "Fiche entreprise mise à jour par")]
    #[strum(serialize = "Fiche entreprise mise à jour par")]
    SheetUpdatedBy,
    /// Geocoder matched label.
    #[serde(rename = "_ban_label")]
    #[strum(serialize = "_ban_label")]
    GeocoderLabel,
    /// Geocoder match score.
    #[serde(rename = "_ban_score")]
    #[strum(serialize = "_ban_score")]
    GeocoderScore,
}

impl Field {
    /// Fields matched by the free-text search.
    pub const SEARCHABLE: &'static [Self] = &[
        Self::Establishment,
        Self::Address,
        Self::EstablishmentNumber,
        Self::NafCode,
        Self::NafLabel,
        Self::Sector,
        Self::Practitioner,
        Self::Doctor,
        Self::EstablishmentType,
    ];

    /// The creation-marker field: a record without a value here has no
    /// company sheet.
    pub const CREATION_MARKER: Self = Self::SheetCreatedAt;

    /// Returns the property name as it appears in the source data.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Establishment => "Etablissement",
            Self::Address => "Adresse",
            Self::EstablishmentNumber => "N° établissement",
            Self::ActiveStatus => "Actif inactif",
            Self::EstablishmentType => "Type établissement",
            Self::Sector => "Secteur référent",
            Self::Doctor => "Médecin référent",
            Self::Practitioner => "Intervenant prévu",
            Self::NafCode => "Code NAF",
            Self::NafLabel => "NAF",
            Self::WorkforceCategory => "Cat-Eff_Niv",
            Self::WorkforceIndex => "Index_Cat-Eff_Niv",
            Self::Employees => "Nombre d'individus suivis",
            Self::RiskLevel => "Niv Risque",
            Self::MembershipLevel => "Niv_Adh",
            Self::SheetAge => "Age FE (CREA ou MAJ)",
            Self::ProposedPriority => "Priorité proposée",
            Self::RetainedPriority => "Priorité retenue",
            Self::PlannedYear => "Année Prévue",
            Self::PlannedQuarter => "Trimestre Prévu",
            Self::MembershipDate => "Date d'adhésion établissement",
            Self::SheetCreatedAt => "Date création fiche entreprise",
            Self::SheetUpdatedAt => "Date mise à jour fiche entreprise",
            Self::SheetSentAt => "Date envoi FE adhérent",
            Self::Condition => "Condition réalisation",
            Self::SheetOutcome => "Suite FE",
            Self::Writer => "Rédacteur",
            Self::SheetCreatedBy => "Fiche entreprise créée par",
            Self::SheetUpdatedBy => "Fiche entreprise mise à jour par",
            Self::GeocoderLabel => "_ban_label",
            Self::GeocoderScore => "_ban_score",
        }
    }

    /// Returns all variants of this enum, in spreadsheet column order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Establishment,
            Self::Address,
            Self::EstablishmentNumber,
            Self::ActiveStatus,
            Self::EstablishmentType,
            Self::Sector,
            Self::Doctor,
            Self::Practitioner,
            Self::NafCode,
            Self::NafLabel,
            Self::WorkforceCategory,
            Self::WorkforceIndex,
            Self::Employees,
            Self::RiskLevel,
            Self::MembershipLevel,
            Self::SheetAge,
            Self::ProposedPriority,
            Self::RetainedPriority,
            Self::PlannedYear,
            Self::PlannedQuarter,
            Self::MembershipDate,
            Self::SheetCreatedAt,
            Self::SheetUpdatedAt,
            Self::SheetSentAt,
            Self::Condition,
            Self::SheetOutcome,
            Self::Writer,
            Self::SheetCreatedBy,
            Self::SheetUpdatedBy,
            Self::GeocoderLabel,
            Self::GeocoderScore,
        ]
    }
}

/// A single property value as found in the source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Explicit `null` (an empty spreadsheet cell).
    Null,
    /// Boolean cell.
    Bool(bool),
    /// Numeric cell.
    Number(f64),
    /// Text cell.
    Text(String),
}

impl PropertyValue {
    /// Returns `true` for null, whitespace-only text and non-finite numbers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(_) => false,
            Self::Number(n) => !n.is_finite(),
            Self::Text(s) => is_blank(s),
        }
    }

    /// Coerces the value to a finite number.
    ///
    /// Text is parsed after trimming; null, booleans, blank text and
    /// anything non-finite yield `None`.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Null | Self::Bool(_) => None,
            Self::Number(n) => normalize_number(*n),
            Self::Text(s) => parse_number(s),
        }
    }

    /// Renders the value as text. Null renders as the empty string.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Self::Number(n) => Cow::Owned(format_number(*n)),
            Self::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Returns the raw string if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value back into JSON. Integral numbers are written
    /// without a fractional part.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Largest magnitude below which every integral `f64` is exact.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[allow(clippy::cast_possible_truncation)]
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
        return serde_json::Value::Number((n as i64).into());
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl From<&serde_json::Value> for PropertyValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            // Nested values are not part of the vocabulary; keep their text.
            other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Text(other.to_string())
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// The property bag of a record.
///
/// Known properties are keyed by [`Field`]; unrecognized ones are kept in
/// an auxiliary map keyed by their raw name. A key that is present with a
/// [`PropertyValue::Null`] value is distinct from an absent key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    known: BTreeMap<Field, PropertyValue>,
    extra: BTreeMap<String, PropertyValue>,
}

impl Properties {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property by its raw name, routing known names to their
    /// [`Field`].
    pub fn insert(&mut self, name: &str, value: PropertyValue) {
        match name.parse::<Field>() {
            Ok(field) => {
                self.known.insert(field, value);
            }
            Err(_) => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    /// Inserts a known property.
    pub fn set(&mut self, field: Field, value: impl Into<PropertyValue>) {
        self.known.insert(field, value.into());
    }

    /// Builder-style variant of [`Self::set`].
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<PropertyValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Returns the value of a known property, if present.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&PropertyValue> {
        self.known.get(&field)
    }

    /// Returns the value of an unrecognized property, if present.
    #[must_use]
    pub fn get_extra(&self, name: &str) -> Option<&PropertyValue> {
        self.extra.get(name)
    }

    /// Returns the text of a known property, or `""` when absent.
    #[must_use]
    pub fn text(&self, field: Field) -> Cow<'_, str> {
        self.get(field).map_or(Cow::Borrowed(""), PropertyValue::as_text)
    }

    /// Returns the finite numeric value of a known property.
    #[must_use]
    pub fn number(&self, field: Field) -> Option<f64> {
        self.get(field).and_then(PropertyValue::as_number)
    }

    /// Returns `true` if the property is absent or empty.
    #[must_use]
    pub fn is_blank(&self, field: Field) -> bool {
        self.get(field).is_none_or(PropertyValue::is_empty)
    }

    /// Iterates over all properties by raw name: known fields in
    /// vocabulary order, then unrecognized fields by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.known
            .iter()
            .map(|(field, value)| (field.name(), value))
            .chain(self.extra.iter().map(|(name, value)| (name.as_str(), value)))
    }

    /// Number of properties present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len() + self.extra.len()
    }

    /// Returns `true` if no property is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.extra.is_empty()
    }
}

/// A WGS84 longitude/latitude pair. Both components are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    lng: f64,
    lat: f64,
}

impl Coordinates {
    /// Creates a coordinate pair, or `None` if either component is not
    /// finite.
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Option<Self> {
        if lng.is_finite() && lat.is_finite() {
            Some(Self { lng, lat })
        } else {
            None
        }
    }

    /// Longitude.
    #[must_use]
    pub const fn lng(self) -> f64 {
        self.lng
    }

    /// Latitude.
    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }
}

/// One geolocated establishment. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    coordinates: Coordinates,
    properties: Properties,
}

impl Record {
    /// Creates a record.
    #[must_use]
    pub const fn new(coordinates: Coordinates, properties: Properties) -> Self {
        Self {
            coordinates,
            properties,
        }
    }

    /// The record's position.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// The record's property bag.
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }
}
