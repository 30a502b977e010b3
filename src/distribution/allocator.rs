//! Capacity Allocator
//!
//! Finds the drive count and drive size that satisfy a capacity spec
//! within the bounds of a single decision matrix row.

use super::matrix::IndexedRow;
use super::request::{CapacitySpec, PoolSpec};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

// =============================================================================
// Capacity Shortfall
// =============================================================================

/// Why a row cannot satisfy a capacity spec. Values are cluster-wide GiB,
/// saturated at `u64::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CapacityShortfall {
    /// Even the largest layout the row allows stays below the minimum
    #[serde(rename_all = "camelCase")]
    Shortfall {
        required_gib: u64,
        max_achievable_gib: u64,
    },
    /// Every layout reaching the minimum overshoots the maximum
    #[serde(rename_all = "camelCase")]
    Excess {
        max_capacity_gib: u64,
        min_achievable_gib: u64,
    },
}

impl std::fmt::Display for CapacityShortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapacityShortfall::Shortfall {
                required_gib,
                max_achievable_gib,
            } => write!(
                f,
                "requires {} GiB but at most {} GiB is achievable (short by {} GiB)",
                required_gib,
                max_achievable_gib,
                required_gib.saturating_sub(*max_achievable_gib)
            ),
            CapacityShortfall::Excess {
                max_capacity_gib,
                min_achievable_gib,
            } => write!(
                f,
                "allows at most {} GiB but the smallest fit is {} GiB (over by {} GiB)",
                max_capacity_gib,
                min_achievable_gib,
                min_achievable_gib.saturating_sub(*max_capacity_gib)
            ),
        }
    }
}

// =============================================================================
// Capacity Allocator
// =============================================================================

/// Sizes drives for a row and a capacity spec
pub struct CapacityAllocator;

impl CapacityAllocator {
    /// Pick the smallest drive count, then the smallest drive size, such that
    /// `min_capacity <= size * count * instances_per_zone * zone_count <= max_capacity`.
    ///
    /// Products saturate at `u128::MAX`; a saturated total always exceeds
    /// `max_capacity`.
    pub fn allocate(
        row: &IndexedRow<'_>,
        spec: &CapacitySpec,
        instances_per_zone: u64,
        zone_count: u64,
    ) -> Result<PoolSpec> {
        let instances = instances_per_zone as u128 * zone_count as u128;
        if instances == 0 {
            return Err(Error::InvalidRequest(
                "instances per zone and zone count must be at least 1".to_string(),
            ));
        }

        let r = row.row;
        let min_capacity = spec.min_capacity as u128;
        let max_capacity = spec.max_capacity as u128;
        let min_size = r.min_size_gib as u128;
        let max_size = r.max_size_gib as u128;

        let mut smallest_excess: Option<u128> = None;

        for drive_count in r.min_drives_per_instance.max(1)..=r.max_drives_per_instance {
            let drives = (drive_count as u128).saturating_mul(instances);
            let drive_capacity = min_capacity.div_ceil(drives).max(min_size);

            if drive_capacity > max_size {
                debug!(
                    "{}: {} drives need {} GiB each, above max size {} GiB",
                    row.id(),
                    drive_count,
                    drive_capacity,
                    max_size
                );
                continue;
            }

            let total = drive_capacity.saturating_mul(drives);
            if total > max_capacity {
                debug!(
                    "{}: {} drives of {} GiB give {} GiB, above max capacity {} GiB",
                    row.id(),
                    drive_count,
                    drive_capacity,
                    total,
                    max_capacity
                );
                smallest_excess = Some(smallest_excess.map_or(total, |e| e.min(total)));
                continue;
            }

            return Ok(PoolSpec {
                // bounded by max_size, which came from a u64
                drive_capacity: drive_capacity as u64,
                drive_type: r.drive_type.clone(),
                drive_count,
                iops: r.iops,
                thin_provisioning: r.thin_provisioning,
                instances_per_zone,
            });
        }

        let reason = match smallest_excess {
            Some(min_achievable_gib) => CapacityShortfall::Excess {
                max_capacity_gib: spec.max_capacity,
                min_achievable_gib: saturate(min_achievable_gib),
            },
            None => CapacityShortfall::Shortfall {
                required_gib: spec.min_capacity,
                max_achievable_gib: saturate(
                    max_size
                        .saturating_mul(r.max_drives_per_instance as u128)
                        .saturating_mul(instances),
                ),
            },
        };

        Err(Error::CapacityUnsatisfiable {
            row: row.id(),
            reason,
        })
    }
}

fn saturate(gib: u128) -> u64 {
    u64::try_from(gib).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::matrix::tests::make_row;
    use crate::distribution::matrix::{DecisionMatrixRow, Priority};
    use assert_matches::assert_matches;

    fn indexed(row: &DecisionMatrixRow) -> IndexedRow<'_> {
        IndexedRow { index: 0, row }
    }

    /// Every feasible (count, size) pair, for checking minimality
    fn feasible_pairs(
        row: &DecisionMatrixRow,
        spec: &CapacitySpec,
        instances: u64,
    ) -> Vec<(u32, u64)> {
        let mut pairs = Vec::new();
        for count in row.min_drives_per_instance..=row.max_drives_per_instance {
            for size in row.min_size_gib..=row.max_size_gib {
                let total = size * count as u64 * instances;
                if total >= spec.min_capacity && total <= spec.max_capacity {
                    pairs.push((count, size));
                }
            }
        }
        pairs
    }

    #[test]
    fn test_fewest_drives_then_smallest_size() {
        let row = make_row(1000, "m5", (1, 4), (100, 500), Priority::High);
        let spec = CapacitySpec::new(800, 900, 1200);

        let pool = CapacityAllocator::allocate(&indexed(&row), &spec, 1, 1).unwrap();

        // one drive would need 900 GiB, above the 500 GiB ceiling
        assert_eq!(pool.drive_count, 2);
        assert_eq!(pool.drive_capacity, 450);
        assert_eq!(pool.total_capacity(1), 900);
        assert_eq!(pool.drive_type, "gp3");
        assert_eq!(pool.iops, 1000);
    }

    #[test]
    fn test_matches_exhaustive_minimum() {
        let row = make_row(1000, "m5", (2, 6), (50, 300), Priority::High);
        for (min, max, instances) in [(900, 1200, 1), (1000, 1000, 1), (2000, 2600, 3), (10, 5000, 2)] {
            let spec = CapacitySpec::new(0, min, max);
            let expected = feasible_pairs(&row, &spec, instances).into_iter().min();
            let actual = CapacityAllocator::allocate(&indexed(&row), &spec, instances, 1)
                .ok()
                .map(|p| (p.drive_count, p.drive_capacity));
            assert_eq!(actual, expected, "min={} max={} instances={}", min, max, instances);
        }
    }

    #[test]
    fn test_rounding_overshoot_moves_to_next_count() {
        // 3 drives would need 334 GiB each (1002 GiB total)
        let row = make_row(1000, "m5", (3, 4), (100, 500), Priority::High);
        let spec = CapacitySpec::new(0, 1000, 1000);

        let pool = CapacityAllocator::allocate(&indexed(&row), &spec, 1, 1).unwrap();
        assert_eq!(pool.drive_count, 4);
        assert_eq!(pool.drive_capacity, 250);
    }

    #[test]
    fn test_min_size_floor_applies() {
        let row = make_row(1000, "m5", (1, 4), (100, 500), Priority::High);
        let spec = CapacitySpec::new(0, 10, 1000);

        let pool = CapacityAllocator::allocate(&indexed(&row), &spec, 1, 1).unwrap();
        assert_eq!(pool.drive_count, 1);
        assert_eq!(pool.drive_capacity, 100);
    }

    #[test]
    fn test_capacity_spread_over_zones() {
        let row = make_row(1000, "m5", (1, 4), (100, 500), Priority::High);
        let spec = CapacitySpec::new(0, 3000, 3600);

        // 2 instances per zone x 3 zones = 6 instances, 500 GiB each
        let pool = CapacityAllocator::allocate(&indexed(&row), &spec, 2, 3).unwrap();
        assert_eq!(pool.drive_count, 1);
        assert_eq!(pool.drive_capacity, 500);
        assert_eq!(pool.instances_per_zone, 2);
        assert_eq!(pool.total_capacity(3), 3000);
    }

    #[test]
    fn test_shortfall() {
        let row = make_row(1000, "m5", (1, 4), (100, 500), Priority::High);
        let spec = CapacitySpec::new(800, 2500, 3000);

        let err = CapacityAllocator::allocate(&indexed(&row), &spec, 1, 1).unwrap_err();
        assert_matches!(
            err,
            Error::CapacityUnsatisfiable {
                reason: CapacityShortfall::Shortfall {
                    required_gib: 2500,
                    max_achievable_gib: 2000,
                },
                ..
            }
        );
    }

    #[test]
    fn test_excess() {
        let row = make_row(1000, "m5", (2, 4), (100, 500), Priority::High);
        let spec = CapacitySpec::new(800, 50, 150);

        let err = CapacityAllocator::allocate(&indexed(&row), &spec, 1, 1).unwrap_err();
        assert_matches!(
            err,
            Error::CapacityUnsatisfiable {
                reason: CapacityShortfall::Excess {
                    max_capacity_gib: 150,
                    min_achievable_gib: 200,
                },
                ..
            }
        );
    }

    #[test]
    fn test_huge_instance_counts_saturate() {
        let row = make_row(1000, "m5", (1, 4), (100, 500), Priority::High);
        let spec = CapacitySpec::new(0, 900, 1200);

        let err = CapacityAllocator::allocate(&indexed(&row), &spec, u64::MAX, u64::MAX)
            .unwrap_err();
        assert_matches!(
            err,
            Error::CapacityUnsatisfiable {
                reason: CapacityShortfall::Excess {
                    max_capacity_gib: 1200,
                    min_achievable_gib: u64::MAX,
                },
                ..
            }
        );

        let spec = CapacitySpec::new(0, u64::MAX, u64::MAX);
        let err = CapacityAllocator::allocate(&indexed(&row), &spec, u64::MAX, 1).unwrap_err();
        assert_matches!(
            err,
            Error::CapacityUnsatisfiable {
                reason: CapacityShortfall::Excess { max_capacity_gib: u64::MAX, .. },
                ..
            }
        );
    }

    #[test]
    fn test_large_fleet_fits_exactly() {
        let row = make_row(1000, "m5", (1, 4), (100, 500), Priority::High);
        let instances = 1u64 << 40;
        let spec = CapacitySpec::new(0, 200 * instances, 200 * instances);

        let pool = CapacityAllocator::allocate(&indexed(&row), &spec, instances, 1).unwrap();
        assert_eq!(pool.drive_count, 1);
        assert_eq!(pool.drive_capacity, 200);
        assert_eq!(pool.total_capacity(1), 200 * instances as u128);
    }

    #[test]
    fn test_shortfall_serializes_camel_case() {
        let reason = CapacityShortfall::Shortfall {
            required_gib: 2500,
            max_achievable_gib: 2000,
        };
        let value = serde_json::to_value(&reason).unwrap();
        assert_eq!(value["kind"], "shortfall");
        assert_eq!(value["requiredGib"], 2500);
        assert_eq!(value["maxAchievableGib"], 2000);

        let parsed: CapacityShortfall = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, reason);
    }

    #[test]
    fn test_thin_provisioning_copied() {
        let mut row = make_row(1000, "m5", (1, 1), (100, 500), Priority::High);
        row.thin_provisioning = true;
        row.drive_type = "pd-ssd".into();
        let spec = CapacitySpec::new(0, 200, 200);

        let pool = CapacityAllocator::allocate(&indexed(&row), &spec, 1, 1).unwrap();
        assert!(pool.thin_provisioning);
        assert_eq!(pool.drive_type, "pd-ssd");
        assert_eq!(pool.drive_capacity, 200);
    }
}
