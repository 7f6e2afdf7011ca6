#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading of the establishment feature collection.
//!
//! The collection is a `GeoJSON` `FeatureCollection` of points, read once
//! at startup either from a local file or with a single HTTP GET. Features
//! without a usable 2-element coordinate pair are dropped silently; only
//! the retained count is logged.

use std::fmt;
use std::path::{Path, PathBuf};

use etab_map_record_models::{Coordinates, Properties, PropertyValue, Record};
use serde_json::Value;

/// Errors that can occur while loading the record collection.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Unable to load the GeoJSON ({status}) from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is valid JSON but not an object.
    #[error("Expected a GeoJSON FeatureCollection object, found {found}")]
    NotFeatureCollection {
        /// JSON type that was found instead.
        found: String,
    },
}

/// Where the collection is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Local file.
    Path(PathBuf),
    /// `http://` or `https://` URL.
    Url(String),
}

impl DataSource {
    /// Interprets `location` as a URL when it has an HTTP scheme and as a
    /// file path otherwise.
    #[must_use]
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::Path(PathBuf::from(location))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Loads the collection from `source`.
///
/// # Errors
///
/// Returns [`LoadError`] if reading, fetching or parsing fails.
pub async fn load(source: &DataSource) -> Result<Vec<Record>, LoadError> {
    match source {
        DataSource::Path(path) => load_from_path(path).await,
        DataSource::Url(url) => fetch(url).await,
    }
}

/// Reads and parses a collection from a local file.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, or a parse error.
pub async fn load_from_path(path: &Path) -> Result<Vec<Record>, LoadError> {
    log::debug!("Reading feature collection from {}", path.display());
    let text = tokio::fs::read_to_string(path).await?;
    parse_feature_collection(&text)
}

/// Fetches and parses a collection with a single HTTP GET. There is no
/// retry: any failure is terminal.
///
/// # Errors
///
/// Returns [`LoadError::Http`] if the request fails,
/// [`LoadError::Status`] on a non-success status, or a parse error.
pub async fn fetch(url: &str) -> Result<Vec<Record>, LoadError> {
    log::debug!("Fetching feature collection from {url}");
    let response = reqwest::get(url).await?;

    let status = response.status();
    if !status.is_success() {
        log::warn!("Feature collection request to {url} returned {status}");
        return Err(LoadError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let text = response.text().await?;
    parse_feature_collection(&text)
}

/// Parses a `GeoJSON` document into records.
///
/// # Errors
///
/// Returns [`LoadError::Json`] if `text` is not JSON, or
/// [`LoadError::NotFeatureCollection`] if it is not an object.
pub fn parse_feature_collection(text: &str) -> Result<Vec<Record>, LoadError> {
    let document: Value = serde_json::from_str(text)?;
    records_from_value(&document)
}

/// Converts a parsed `GeoJSON` document into records. A document without
/// a `features` array yields no records.
///
/// # Errors
///
/// Returns [`LoadError::NotFeatureCollection`] if `document` is not an
/// object.
pub fn records_from_value(document: &Value) -> Result<Vec<Record>, LoadError> {
    if !document.is_object() {
        return Err(LoadError::NotFeatureCollection {
            found: json_type(document).to_string(),
        });
    }

    let features = document
        .get("features")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);

    let records: Vec<Record> = features.iter().filter_map(record_from_feature).collect();

    log::debug!(
        "Retained {} of {} feature(s)",
        records.len(),
        features.len()
    );

    Ok(records)
}

fn record_from_feature(feature: &Value) -> Option<Record> {
    let coordinates = feature
        .get("geometry")?
        .get("coordinates")?
        .as_array()
        .filter(|pair| pair.len() == 2)?;
    let coordinates = Coordinates::new(coordinates[0].as_f64()?, coordinates[1].as_f64()?)?;

    let mut properties = Properties::new();
    if let Some(object) = feature.get("properties").and_then(Value::as_object) {
        for (name, value) in object {
            properties.insert(name, PropertyValue::from(value));
        }
    }

    Some(Record::new(coordinates, properties))
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
