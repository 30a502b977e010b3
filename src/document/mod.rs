//! Document Loading
//!
//! Reads decision matrix and request documents from YAML or JSON files
//! and renders responses back out.

pub mod matrix;

pub use matrix::*;

use crate::distribution::{DecisionMatrix, DistributionRequest, DistributionResponse};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

// =============================================================================
// Document Format
// =============================================================================

/// Encoding of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            Some("json") => Ok(DocumentFormat::Json),
            _ => Err(Error::Configuration(format!(
                "cannot infer document format of {}",
                path.display()
            ))),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Yaml => write!(f, "yaml"),
            DocumentFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            other => Err(format!("unknown document format: {}", other)),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(content: &str, format: DocumentFormat) -> Result<T> {
    Ok(match format {
        DocumentFormat::Yaml => serde_yaml::from_str(content)?,
        DocumentFormat::Json => serde_json::from_str(content)?,
    })
}

fn read(path: &Path) -> Result<(String, DocumentFormat)> {
    let format = DocumentFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    debug!("Read {} bytes of {} from {}", content.len(), format, path.display());
    Ok((content, format))
}

// =============================================================================
// Loading
// =============================================================================

/// Parse a decision matrix document
pub fn parse_matrix(content: &str, format: DocumentFormat) -> Result<DecisionMatrix> {
    decode::<MatrixDocument>(content, format)?.into_matrix()
}

/// Parse a distribution request document
pub fn parse_request(content: &str, format: DocumentFormat) -> Result<DistributionRequest> {
    decode(content, format)
}

/// Load a decision matrix from a `.yaml`, `.yml` or `.json` file
pub fn load_matrix(path: impl AsRef<Path>) -> Result<DecisionMatrix> {
    let (content, format) = read(path.as_ref())?;
    parse_matrix(&content, format)
}

/// Load a distribution request from a `.yaml`, `.yml` or `.json` file
pub fn load_request(path: impl AsRef<Path>) -> Result<DistributionRequest> {
    let (content, format) = read(path.as_ref())?;
    parse_request(&content, format)
}

/// Render a response document
pub fn render_response(response: &DistributionResponse, format: DocumentFormat) -> Result<String> {
    Ok(match format {
        DocumentFormat::Yaml => serde_yaml::to_string(response)?,
        DocumentFormat::Json => serde_json::to_string_pretty(response)?,
    })
}

// =============================================================================
// Schemas
// =============================================================================

/// JSON Schema of the decision matrix document
pub fn matrix_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(MatrixDocument)).unwrap_or_default()
}

/// JSON Schema of the distribution request document
pub fn request_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(DistributionRequest)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::resolve;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::TempDir;

    const MATRIX_JSON: &str = r#"{
        "rows": [
            {
                "iops": 1000,
                "instanceType": "m5",
                "minDrivesPerInstance": 1,
                "maxDrivesPerInstance": 4,
                "minSize": 100,
                "maxSize": 500,
                "priority": "high",
                "driveType": "gp3"
            }
        ]
    }"#;

    const REQUEST_YAML: &str = r#"
specs:
  - iops: 800
    minCapacity: 900
    maxCapacity: 1200
  - iops: 500
    minCapacity: 100
    maxCapacity: 400
instanceType: m5
instancesPerZone: 1
zoneCount: 1
"#;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("matrix.YAML")).unwrap(),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("req.json")).unwrap(),
            DocumentFormat::Json
        );
        assert_matches!(
            DocumentFormat::from_path(Path::new("matrix.toml")),
            Err(Error::Configuration(_))
        );
    }

    #[test]
    fn test_load_and_resolve() {
        let dir = TempDir::new().unwrap();
        let matrix_path = write_file(&dir, "matrix.json", MATRIX_JSON);
        let request_path = write_file(&dir, "request.yml", REQUEST_YAML);

        let matrix = load_matrix(&matrix_path).unwrap();
        let request = load_request(&request_path).unwrap();
        assert_eq!(request.specs.len(), 2);
        assert_eq!(request.region, None);

        let response = resolve(&request, &matrix).unwrap();
        let rendered = render_response(&response, DocumentFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["instanceStorage"][0]["driveCount"], 2);
        assert_eq!(value["instanceStorage"][0]["driveCapacity"], 450);
        assert_eq!(value["instanceStorage"][1]["driveCapacity"], 100);
        assert_eq!(value["instancesPerZone"], 1);

        let yaml = render_response(&response, DocumentFormat::Yaml).unwrap();
        let reparsed: DistributionResponse = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(reparsed, response);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        assert_matches!(load_matrix(&path), Err(Error::Io(_)));
    }

    #[test]
    fn test_malformed_documents() {
        assert_matches!(
            parse_request("specs: [", DocumentFormat::Yaml),
            Err(Error::Yaml(_))
        );
        assert_matches!(parse_matrix("{", DocumentFormat::Json), Err(Error::Json(_)));
    }

    #[test]
    fn test_schemas_describe_fields() {
        let schema = request_schema();
        assert!(schema["properties"]["instancesPerZone"].is_object());

        let schema = matrix_schema();
        assert!(schema["properties"]["rows"].is_object());
    }
}
