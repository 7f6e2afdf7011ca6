#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Export of a record selection to CSV or `GeoJSON`.
//!
//! An empty selection is refused rather than producing an empty file.

use std::path::{Path, PathBuf};

use etab_map_record_models::{Field, Properties, PropertyValue, Record};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors that can occur while exporting records.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (buffer flush or file write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output was not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// `GeoJSON` `FeatureCollection`.
    #[strum(serialize = "geojson")]
    GeoJson,
}

impl ExportFormat {
    /// Returns all variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Csv, Self::GeoJson]
    }

    /// File name of the exported document.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "etablissements.csv",
            Self::GeoJson => "etablissements.geojson",
        }
    }

    /// MIME type of the exported document.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv;charset=utf-8;",
            Self::GeoJson => "application/geo+json",
        }
    }
}

/// A rendered export document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Format of `contents`.
    pub format: ExportFormat,
    /// Number of records exported.
    pub records: usize,
    /// Document text.
    pub contents: String,
}

impl ExportArtifact {
    /// File name of the document.
    #[must_use]
    pub const fn file_name(&self) -> &'static str {
        self.format.file_name()
    }

    /// MIME type of the document.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Writes the document into `dir` under its file name.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the directory or file cannot be
    /// written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, &self.contents)?;
        log::info!(
            "Wrote {} record(s) to {} ({})",
            self.records,
            path.display(),
            self.mime_type()
        );
        Ok(path)
    }
}

/// Result of an export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The document was produced.
    Exported(ExportArtifact),
    /// Nothing to export; no document was produced.
    Refused,
}

/// Message shown when an export is refused.
pub const NOTHING_TO_EXPORT: &str = "Aucune donnée à exporter";

/// Renders `records` in `format`.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization fails.
pub fn export(records: &[Record], format: ExportFormat) -> Result<ExportOutcome, ExportError> {
    if records.is_empty() {
        log::warn!("{NOTHING_TO_EXPORT}");
        return Ok(ExportOutcome::Refused);
    }

    let contents = match format {
        ExportFormat::Csv => to_csv(records)?,
        ExportFormat::GeoJson => to_geojson(records)?,
    };

    Ok(ExportOutcome::Exported(ExportArtifact {
        format,
        records: records.len(),
        contents,
    }))
}

/// Renders `records` as CSV.
///
/// The header row is the property names of the first record; later
/// records contribute only the columns that header names. Fields holding
/// a comma, a quote or a newline are quoted with quotes doubled.
///
/// # Errors
///
/// Returns [`ExportError`] if writing the CSV fails.
pub fn to_csv(records: &[Record]) -> Result<String, ExportError> {
    let Some(first) = records.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&str> = first.properties().iter().map(|(name, _)| name).collect();

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    writer.write_record(&headers)?;

    for record in records {
        let row = headers.iter().map(|name| {
            property(record.properties(), name)
                .map(|value| value.as_text().into_owned())
                .unwrap_or_default()
        });
        writer.write_record(row)?;
    }

    let bytes = writer.into_inner().map_err(csv::IntoInnerError::into_error)?;
    Ok(String::from_utf8(bytes)?)
}

/// Renders `records` as a pretty-printed `GeoJSON` `FeatureCollection`
/// mirroring the input schema.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_geojson(records: &[Record]) -> Result<String, ExportError> {
    let collection = FeatureCollection {
        bbox: None,
        features: records.iter().map(to_feature).collect(),
        foreign_members: None,
    };
    Ok(serde_json::to_string_pretty(&collection)?)
}

fn to_feature(record: &Record) -> Feature {
    let coordinates = record.coordinates();
    let properties: JsonObject = record
        .properties()
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_json()))
        .collect();

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            coordinates.lng(),
            coordinates.lat(),
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn property<'a>(properties: &'a Properties, name: &str) -> Option<&'a PropertyValue> {
    name.parse::<Field>().map_or_else(
        |_| properties.get_extra(name),
        |field| properties.get(field),
    )
}

#[cfg(test)]
mod tests {
    use etab_map_record_models::Coordinates;

    use super::*;

    fn record(name: &str, employees: f64) -> Record {
        let mut properties = Properties::new()
            .with(Field::Establishment, name)
            .with(Field::Employees, employees);
        properties.insert("Commentaire", PropertyValue::from("ligne 1\nligne 2"));
        Record::new(Coordinates::new(2.5, 48.75).unwrap(), properties)
    }

    #[test]
    fn empty_selection_is_refused() {
        assert_eq!(export(&[], ExportFormat::Csv).unwrap(), ExportOutcome::Refused);
        assert_eq!(
            export(&[], ExportFormat::GeoJson).unwrap(),
            ExportOutcome::Refused
        );
    }

    #[test]
    fn csv_quotes_special_characters() {
        let records = vec![record("Dupont, \"Fils\"", 12.0), record("Martin", 3.5)];
        let csv = to_csv(&records).unwrap();
        let lines: Vec<&str> = csv.split('\n').collect();

        assert_eq!(lines[0], "Etablissement,Nombre d'individus suivis,Commentaire");
        assert_eq!(lines[1], "\"Dupont, \"\"Fils\"\"\",12,\"ligne 1");
        assert_eq!(lines[2], "ligne 2\"");
        assert_eq!(lines[3], "Martin,3.5,\"ligne 1");
    }

    #[test]
    fn csv_columns_follow_first_record() {
        let first = Record::new(
            Coordinates::new(0.0, 0.0).unwrap(),
            Properties::new().with(Field::Establishment, "A"),
        );
        let second = Record::new(
            Coordinates::new(0.0, 0.0).unwrap(),
            Properties::new()
                .with(Field::Establishment, "B")
                .with(Field::Sector, "Nord"),
        );
        let csv = to_csv(&[first, second]).unwrap();
        assert_eq!(csv, "Etablissement\nA\nB\n");
    }

    #[test]
    fn geojson_mirrors_input_schema() {
        let text = to_geojson(&[record("Martin", 3.0)]).unwrap();
        assert!(text.contains("\n  \"features\""));

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        let feature = &json["features"][0];
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["geometry"]["coordinates"][0], 2.5);
        assert_eq!(feature["geometry"]["coordinates"][1], 48.75);
        assert_eq!(feature["properties"]["Etablissement"], "Martin");
        assert_eq!(feature["properties"]["Commentaire"], "ligne 1\nligne 2");
    }

    #[test]
    fn geojson_keeps_integers_integral() {
        let mut properties = Properties::new()
            .with(Field::RiskLevel, 3.0)
            .with(Field::Employees, 12.0);
        properties.insert("Score", PropertyValue::Number(0.87));
        let records = vec![Record::new(Coordinates::new(2.5, 48.75).unwrap(), properties)];

        let text = to_geojson(&records).unwrap();
        assert!(text.contains("\"Niv Risque\": 3,"));
        assert!(text.contains("\"Nombre d'individus suivis\": 12"));
        assert!(!text.contains("12.0"));
        assert!(text.contains("\"Score\": 0.87"));
    }

    #[test]
    fn artifact_carries_file_name_and_mime() {
        let ExportOutcome::Exported(artifact) =
            export(&[record("A", 1.0)], ExportFormat::GeoJson).unwrap()
        else {
            panic!("expected an artifact");
        };
        assert_eq!(artifact.records, 1);
        assert_eq!(artifact.file_name(), "etablissements.geojson");
        assert_eq!(artifact.mime_type(), "application/geo+json");
    }

    #[test]
    fn format_parses_from_str() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("GeoJSON".parse::<ExportFormat>().unwrap(), ExportFormat::GeoJson);
        assert_eq!(ExportFormat::GeoJson.to_string(), "geojson");
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
