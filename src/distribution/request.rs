//! Requirement Model
//!
//! Cloud-agnostic capacity requirements and the resolved per-instance
//! pool layout returned for them. Capacities are in GiB.

use crate::domain::ports::InstanceGroupInfo;
use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Capacity Spec
// =============================================================================

/// One user-stated requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySpec {
    /// Desired IOPS
    #[serde(default)]
    pub iops: u64,
    /// Minimum total capacity the cluster needs from this spec
    pub min_capacity: u64,
    /// Maximum total capacity the cluster needs from this spec
    pub max_capacity: u64,
}

impl CapacitySpec {
    pub fn new(iops: u64, min_capacity: u64, max_capacity: u64) -> Self {
        Self {
            iops,
            min_capacity,
            max_capacity,
        }
    }
}

// =============================================================================
// Distribution Request
// =============================================================================

/// Normalized ask for one homogeneous instance cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRequest {
    /// Ordered capacity specs; result i answers spec i
    pub specs: Vec<CapacitySpec>,
    /// Instance type shared by every instance in the cluster
    pub instance_type: String,
    /// Region of the cluster; rows of every region apply when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Instances in each zone
    pub instances_per_zone: u64,
    /// Number of zones
    pub zone_count: u64,
}

impl DistributionRequest {
    /// Build a request for the instances of an instance group.
    ///
    /// Zone count comes from the group's zones and instances per zone
    /// from the group's minimum size spread over them.
    pub fn for_instance_group(
        group: &InstanceGroupInfo,
        instance_type: impl Into<String>,
        specs: Vec<CapacitySpec>,
    ) -> Result<Self> {
        let zone_count = group.zones.len() as u64;
        if zone_count == 0 {
            return Err(Error::InvalidRequest(format!(
                "instance group {} has no zones",
                group.resource.name
            )));
        }

        let min_instances = group.min.unwrap_or(0).max(0) as u64;
        let instances_per_zone = ((min_instances + zone_count - 1) / zone_count).max(1);

        Ok(Self {
            specs,
            instance_type: instance_type.into(),
            region: Some(group.resource.region.clone()).filter(|r| !r.is_empty()),
            instances_per_zone,
            zone_count,
        })
    }

    /// Total number of instances the drives are spread over
    pub fn instance_multiplier(&self) -> u128 {
        self.instances_per_zone as u128 * self.zone_count as u128
    }

    /// Check structural invariants before any resolution work
    pub fn validate(&self) -> Result<()> {
        if self.specs.is_empty() {
            return Err(Error::InvalidRequest(
                "at least one capacity spec is required".to_string(),
            ));
        }
        if self.instance_type.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "instance type must not be empty".to_string(),
            ));
        }
        if self.instances_per_zone < 1 {
            return Err(Error::InvalidRequest(
                "instances per zone must be at least 1".to_string(),
            ));
        }
        if self.zone_count < 1 {
            return Err(Error::InvalidRequest(
                "zone count must be at least 1".to_string(),
            ));
        }
        for (index, spec) in self.specs.iter().enumerate() {
            if spec.min_capacity > spec.max_capacity {
                return Err(Error::InvalidRequest(format!(
                    "spec {}: min capacity {} GiB exceeds max capacity {} GiB",
                    index, spec.min_capacity, spec.max_capacity
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Pool Spec / Response
// =============================================================================

/// Resolved per-instance drive configuration for one capacity spec
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    /// Capacity of each drive in GiB
    pub drive_capacity: u64,
    /// Provider drive class
    pub drive_type: String,
    /// Drives per instance
    pub drive_count: u32,
    /// IOPS of the selected drive class
    pub iops: u64,
    /// Whether drives should be thin provisioned
    pub thin_provisioning: bool,
    /// Instances per zone this pool was sized for
    pub instances_per_zone: u64,
}

impl PoolSpec {
    /// Capacity provided by this pool on a single instance
    pub fn capacity_per_instance(&self) -> u128 {
        self.drive_capacity as u128 * self.drive_count as u128
    }

    /// Capacity provided across the whole cluster, saturating at `u128::MAX`
    pub fn total_capacity(&self, zone_count: u64) -> u128 {
        self.capacity_per_instance()
            .saturating_mul(self.instances_per_zone as u128)
            .saturating_mul(zone_count as u128)
    }
}

/// Result of a resolution; `instance_storage[i]` answers `specs[i]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResponse {
    pub instance_storage: Vec<PoolSpec>,
    pub instances_per_zone: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CloudResourceInfo;
    use assert_matches::assert_matches;

    fn make_request(specs: Vec<CapacitySpec>) -> DistributionRequest {
        DistributionRequest {
            specs,
            instance_type: "m5".into(),
            region: None,
            instances_per_zone: 1,
            zone_count: 1,
        }
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        let request = make_request(vec![CapacitySpec::new(800, 900, 1200)]);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_capacity() {
        let request = make_request(vec![
            CapacitySpec::new(800, 900, 1200),
            CapacitySpec::new(800, 2000, 1000),
        ]);
        let err = request.validate().unwrap_err();
        assert_matches!(&err, Error::InvalidRequest(msg) if msg.starts_with("spec 1"));
    }

    #[test]
    fn test_validate_rejects_empty_and_zero_counts() {
        assert_matches!(make_request(vec![]).validate(), Err(Error::InvalidRequest(_)));

        let mut request = make_request(vec![CapacitySpec::new(0, 1, 1)]);
        request.instances_per_zone = 0;
        assert_matches!(request.validate(), Err(Error::InvalidRequest(_)));

        let mut request = make_request(vec![CapacitySpec::new(0, 1, 1)]);
        request.zone_count = 0;
        assert_matches!(request.validate(), Err(Error::InvalidRequest(_)));
    }

    #[test]
    fn test_for_instance_group() {
        let group = InstanceGroupInfo {
            resource: CloudResourceInfo {
                name: "workers".into(),
                region: "us-east-1".into(),
                ..Default::default()
            },
            autoscaling_enabled: true,
            min: Some(7),
            max: Some(12),
            zones: vec!["us-east-1a".into(), "us-east-1b".into(), "us-east-1c".into()],
        };

        let request = DistributionRequest::for_instance_group(
            &group,
            "m5.xlarge",
            vec![CapacitySpec::new(3000, 1024, 4096)],
        )
        .unwrap();

        assert_eq!(request.zone_count, 3);
        assert_eq!(request.instances_per_zone, 3);
        assert_eq!(request.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_for_instance_group_without_zones() {
        let group = InstanceGroupInfo::default();
        assert_matches!(
            DistributionRequest::for_instance_group(&group, "m5", vec![]),
            Err(Error::InvalidRequest(_))
        );
    }

    #[test]
    fn test_pool_total_capacity() {
        let pool = PoolSpec {
            drive_capacity: 300,
            drive_type: "gp3".into(),
            drive_count: 3,
            iops: 1000,
            thin_provisioning: false,
            instances_per_zone: 2,
        };
        assert_eq!(pool.capacity_per_instance(), 900);
        assert_eq!(pool.total_capacity(3), 5400);
    }
}
