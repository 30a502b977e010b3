//! Decision Matrix Model
//!
//! In-memory representation of the drive configurations a cloud provider
//! supports. Rows are scoped by instance type and region, and carry the
//! IOPS, size and striping bounds the allocator works within.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Scope
// =============================================================================

/// Applicability of a row field (instance type, region)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Applies to every value
    Any,
    /// Applies to exactly this value
    Specific(String),
}

impl Scope {
    /// Build a scope from a document label, treating `*` and empty as `Any`
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "" | "*" => Scope::Any,
            value => Scope::Specific(value.to_string()),
        }
    }

    /// Check if this scope covers the given value
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Scope::Any => true,
            Scope::Specific(v) => v == value,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Any
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Any => write!(f, "*"),
            Scope::Specific(v) => write!(f, "{}", v),
        }
    }
}

// =============================================================================
// Priority
// =============================================================================

/// Ranking label of a row. Variant order defines the ranking order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

// =============================================================================
// Decision Matrix Row
// =============================================================================

/// One provider-supported drive configuration. Sizes are in GiB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMatrixRow {
    /// Minimum IOPS this row's drive type delivers
    pub iops: u64,
    /// Instance types this row applies to
    pub instance_type: Scope,
    /// Minimum drives per instance (striping width)
    pub min_drives_per_instance: u32,
    /// Maximum drives per instance (striping width)
    pub max_drives_per_instance: u32,
    /// Region this row applies to
    pub region: Scope,
    /// Minimum size of a single drive
    pub min_size_gib: u64,
    /// Maximum size of a single drive
    pub max_size_gib: u64,
    /// Ranking label among valid rows
    pub priority: Priority,
    /// Passed through to the resulting pool spec
    pub thin_provisioning: bool,
    /// Provider drive class (e.g. gp3, pd-ssd)
    pub drive_type: String,
}

impl DecisionMatrixRow {
    /// Width of the allowed single-drive size window
    pub fn size_window_gib(&self) -> u64 {
        self.max_size_gib.saturating_sub(self.min_size_gib)
    }

    /// Check the row's structural invariants
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.min_size_gib > self.max_size_gib {
            return Err(format!(
                "min size {} GiB exceeds max size {} GiB",
                self.min_size_gib, self.max_size_gib
            ));
        }
        if self.min_drives_per_instance < 1 {
            return Err("min drives per instance must be at least 1".to_string());
        }
        if self.min_drives_per_instance > self.max_drives_per_instance {
            return Err(format!(
                "min drives per instance {} exceeds max drives per instance {}",
                self.min_drives_per_instance, self.max_drives_per_instance
            ));
        }
        Ok(())
    }

    fn label(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.drive_type, self.instance_type, self.region, self.iops
        )
    }
}

// =============================================================================
// Row Identifier
// =============================================================================

/// Identifies a row in diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowId {
    /// Zero-based position in the matrix
    pub index: usize,
    /// drive type / instance type / region / iops
    pub label: String,
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {} ({})", self.index, self.label)
    }
}

/// A row borrowed from a matrix together with its position
#[derive(Debug, Clone, Copy)]
pub struct IndexedRow<'a> {
    pub index: usize,
    pub row: &'a DecisionMatrixRow,
}

impl<'a> IndexedRow<'a> {
    pub fn id(&self) -> RowId {
        RowId {
            index: self.index,
            label: self.row.label(),
        }
    }
}

// =============================================================================
// Decision Matrix
// =============================================================================

/// Ordered collection of rows, read-only for the duration of a resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMatrix {
    rows: Vec<DecisionMatrixRow>,
}

impl DecisionMatrix {
    pub fn new(rows: Vec<DecisionMatrixRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DecisionMatrixRow] {
        &self.rows
    }

    /// Iterate rows with their matrix positions
    pub fn indexed_rows(&self) -> impl Iterator<Item = IndexedRow<'_>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| IndexedRow { index, row })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Validate every row, reporting the first violation
    pub fn validate(&self) -> Result<()> {
        for (index, row) in self.rows.iter().enumerate() {
            row.validate()
                .map_err(|reason| Error::InvalidMatrix { row: index, reason })?;
        }
        Ok(())
    }
}

impl From<Vec<DecisionMatrixRow>> for DecisionMatrix {
    fn from(rows: Vec<DecisionMatrixRow>) -> Self {
        Self::new(rows)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use assert_matches::assert_matches;

    pub(crate) fn make_row(
        iops: u64,
        instance_type: &str,
        drives: (u32, u32),
        sizes: (u64, u64),
        priority: Priority,
    ) -> DecisionMatrixRow {
        DecisionMatrixRow {
            iops,
            instance_type: Scope::from_label(instance_type),
            min_drives_per_instance: drives.0,
            max_drives_per_instance: drives.1,
            region: Scope::Any,
            min_size_gib: sizes.0,
            max_size_gib: sizes.1,
            priority,
            thin_provisioning: false,
            drive_type: "gp3".to_string(),
        }
    }

    #[test]
    fn test_scope_from_label() {
        assert_eq!(Scope::from_label("*"), Scope::Any);
        assert_eq!(Scope::from_label(""), Scope::Any);
        assert_eq!(Scope::from_label("m5"), Scope::Specific("m5".into()));
        assert!(Scope::Any.matches("anything"));
        assert!(!Scope::Specific("m5".into()).matches("c5"));
    }

    #[test]
    fn test_priority_order() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_validate_rejects_inverted_sizes() {
        let matrix = DecisionMatrix::new(vec![
            make_row(1000, "m5", (1, 4), (100, 500), Priority::High),
            make_row(1000, "m5", (1, 4), (600, 500), Priority::High),
        ]);
        assert_matches!(matrix.validate(), Err(Error::InvalidMatrix { row: 1, .. }));
    }

    #[test]
    fn test_validate_rejects_zero_drives() {
        let matrix = DecisionMatrix::new(vec![make_row(
            1000,
            "m5",
            (0, 4),
            (100, 500),
            Priority::High,
        )]);
        assert_matches!(matrix.validate(), Err(Error::InvalidMatrix { row: 0, .. }));

        let matrix = DecisionMatrix::new(vec![make_row(
            1000,
            "m5",
            (5, 4),
            (100, 500),
            Priority::High,
        )]);
        assert_matches!(matrix.validate(), Err(Error::InvalidMatrix { row: 0, .. }));
    }

    #[test]
    fn test_row_id_display() {
        let matrix = DecisionMatrix::new(vec![make_row(
            1000,
            "m5",
            (1, 4),
            (100, 500),
            Priority::High,
        )]);
        let row = matrix.indexed_rows().next().unwrap();
        assert_eq!(row.id().to_string(), "row 0 (gp3/m5/*/1000)");
    }
}
