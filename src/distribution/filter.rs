//! Row Filter
//!
//! Narrows decision matrix rows to those applicable to an instance type,
//! region and IOPS floor.

use super::matrix::{DecisionMatrix, IndexedRow};
use crate::error::{Error, Result};
use tracing::debug;

/// Parameters a row must satisfy to become a candidate
#[derive(Debug, Clone, Copy)]
pub struct RowFilter<'a> {
    pub instance_type: &'a str,
    /// `None` accepts rows of every region
    pub region: Option<&'a str>,
    pub min_iops: u64,
}

impl<'a> RowFilter<'a> {
    pub fn new(instance_type: &'a str, region: Option<&'a str>, min_iops: u64) -> Self {
        Self {
            instance_type,
            region,
            min_iops,
        }
    }

    /// Check if a single row is a candidate
    pub fn accepts(&self, row: &IndexedRow<'_>) -> bool {
        let row = row.row;

        if !row.instance_type.matches(self.instance_type) {
            return false;
        }

        if let Some(region) = self.region {
            if !row.region.matches(region) {
                return false;
            }
        }

        row.iops >= self.min_iops
    }

    /// Collect candidate rows in matrix order.
    ///
    /// `spec_index` is only used to scope the error.
    pub fn apply<'m>(
        &self,
        matrix: &'m DecisionMatrix,
        spec_index: usize,
    ) -> Result<Vec<IndexedRow<'m>>> {
        let candidates: Vec<_> = matrix
            .indexed_rows()
            .filter(|row| self.accepts(row))
            .collect();

        debug!(
            "Filter matched {} of {} rows (instance type {}, region {:?}, iops >= {})",
            candidates.len(),
            matrix.len(),
            self.instance_type,
            self.region,
            self.min_iops
        );

        if candidates.is_empty() {
            return Err(Error::NoMatchingRows {
                spec_index,
                instance_type: self.instance_type.to_string(),
                region: self.region.map(str::to_string),
                iops: self.min_iops,
            });
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::matrix::tests::make_row;
    use crate::distribution::matrix::{Priority, Scope};
    use assert_matches::assert_matches;

    fn make_matrix() -> DecisionMatrix {
        let mut regional = make_row(3000, "*", (1, 8), (100, 16384), Priority::Medium);
        regional.region = Scope::Specific("us-west-2".into());

        DecisionMatrix::new(vec![
            make_row(1000, "m5", (1, 4), (100, 500), Priority::High),
            make_row(500, "m5", (1, 4), (100, 500), Priority::High),
            make_row(16000, "c5", (1, 2), (500, 2000), Priority::Low),
            regional,
        ])
    }

    #[test]
    fn test_filter_by_instance_type_and_iops() {
        let matrix = make_matrix();
        let candidates = RowFilter::new("m5", None, 800).apply(&matrix, 0).unwrap();
        let indices: Vec<_> = candidates.iter().map(|r| r.index).collect();

        // row 1 is below the IOPS floor, row 3 is a wildcard instance type
        assert_eq!(indices, vec![0, 3]);
    }

    #[test]
    fn test_filter_by_region() {
        let matrix = make_matrix();

        let candidates = RowFilter::new("m5", Some("us-east-1"), 0)
            .apply(&matrix, 0)
            .unwrap();
        let indices: Vec<_> = candidates.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1]);

        let candidates = RowFilter::new("m5", Some("us-west-2"), 0)
            .apply(&matrix, 0)
            .unwrap();
        let indices: Vec<_> = candidates.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
    }

    #[test]
    fn test_no_matching_rows() {
        let matrix = make_matrix();
        let err = RowFilter::new("r6i", Some("eu-central-1"), 0)
            .apply(&matrix, 2)
            .unwrap_err();

        assert_matches!(
            err,
            Error::NoMatchingRows { spec_index: 2, ref instance_type, iops: 0, .. }
                if instance_type == "r6i"
        );
    }

    #[test]
    fn test_iops_floor_is_inclusive() {
        let matrix = make_matrix();
        let candidates = RowFilter::new("c5", None, 16000).apply(&matrix, 0).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].index, 2);
    }
}
