//! Decision Matrix Document
//!
//! Human-editable form of a decision matrix. String labels are mapped onto
//! the typed matrix model here.

use crate::distribution::{DecisionMatrix, DecisionMatrixRow, Priority, Scope};
use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level matrix document
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatrixDocument {
    pub rows: Vec<MatrixRowDocument>,
}

/// One row as written by an operator. Sizes are in GiB.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRowDocument {
    pub iops: u64,
    /// `*` or empty applies to every instance type
    #[serde(default)]
    pub instance_type: String,
    #[serde(alias = "instanceMinDrives")]
    pub min_drives_per_instance: u32,
    #[serde(alias = "instanceMaxDrives")]
    pub max_drives_per_instance: u32,
    /// Empty applies to every region
    #[serde(default)]
    pub region: String,
    pub min_size: u64,
    pub max_size: u64,
    /// `high`, `medium` or `low`
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub thin_provisioning: bool,
    pub drive_type: String,
}

fn default_priority() -> String {
    "medium".to_string()
}

/// Map a priority label onto the ordered enumeration
pub fn parse_priority(label: &str) -> Option<Priority> {
    match label.trim().to_lowercase().as_str() {
        "high" => Some(Priority::High),
        "medium" => Some(Priority::Medium),
        "low" => Some(Priority::Low),
        _ => None,
    }
}

impl MatrixRowDocument {
    fn into_row(self, index: usize) -> Result<DecisionMatrixRow> {
        let priority = parse_priority(&self.priority).ok_or_else(|| {
            Error::Configuration(format!(
                "matrix row {}: unknown priority {:?}",
                index, self.priority
            ))
        })?;

        Ok(DecisionMatrixRow {
            iops: self.iops,
            instance_type: Scope::from_label(&self.instance_type),
            min_drives_per_instance: self.min_drives_per_instance,
            max_drives_per_instance: self.max_drives_per_instance,
            region: Scope::from_label(&self.region),
            min_size_gib: self.min_size,
            max_size_gib: self.max_size,
            priority,
            thin_provisioning: self.thin_provisioning,
            drive_type: self.drive_type,
        })
    }
}

impl MatrixDocument {
    /// Convert into the matrix model and check row invariants
    pub fn into_matrix(self) -> Result<DecisionMatrix> {
        let rows = self
            .rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| row.into_row(index))
            .collect::<Result<Vec<_>>>()?;

        let matrix = DecisionMatrix::new(rows);
        matrix.validate()?;
        Ok(matrix)
    }
}
