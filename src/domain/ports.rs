//! Domain Ports - Cloud driver boundary
//!
//! These traits define the boundary between resolved pool specs and the
//! cloud provider backends that create and manage the actual volumes.
//! Adapters implement these traits to provide concrete functionality.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Set identifier for volumes that do not belong to a resolved pool
pub const SET_IDENTIFIER_NONE: &str = "None";

/// Label key carrying a volume's set identifier
pub const SET_IDENTIFIER_LABEL: &str = "storage-distribution/set";

pub type Labels = BTreeMap<String, String>;

// =============================================================================
// Storage Errors
// =============================================================================

/// Storage operation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageErrorCode {
    /// The volume is detached from the instance
    VolDetached = 5001,
    /// The volume is invalid
    VolInval = 5002,
    /// The volume is attached on a remote node rather than locally
    VolAttachedOnRemoteNode = 5003,
    /// The volume does not exist
    VolNotFound = 5004,
    /// The volume has an invalid device path
    InvalidDevicePath = 5005,
}

impl StorageErrorCode {
    pub fn code(&self) -> u32 {
        *self as u32
    }
}

/// Error returned by storage drivers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StorageError {
    pub code: StorageErrorCode,
    /// Human readable message
    pub message: String,
    /// Instance the error relates to
    pub instance: String,
}

impl StorageError {
    pub fn new(
        code: StorageErrorCode,
        message: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            instance: instance.into(),
        }
    }
}

// =============================================================================
// Cloud Resource Types
// =============================================================================

/// Metadata common to cloud resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudResourceInfo {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub labels: Labels,
    pub zone: String,
    pub region: String,
}

/// A compute instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    #[serde(flatten)]
    pub resource: CloudResourceInfo,
}

/// An instance group (an autoscaling group on AWS)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupInfo {
    #[serde(flatten)]
    pub resource: CloudResourceInfo,
    pub autoscaling_enabled: bool,
    /// Minimum number of instances
    pub min: Option<i64>,
    /// Maximum number of instances
    pub max: Option<i64>,
    /// Zones the group spans
    pub zones: Vec<String>,
}

// =============================================================================
// Volume Types
// =============================================================================

/// Template a driver creates a volume from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeTemplate {
    pub drive_type: String,
    pub capacity_gib: u64,
    pub iops: u64,
    pub thin_provisioning: bool,
    pub zone: String,
}

/// A provisioned volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: String,
    pub drive_type: String,
    pub capacity_gib: u64,
    pub iops: u64,
    pub zone: String,
    #[serde(default)]
    pub labels: Labels,
    /// Instance the volume is attached to
    pub attached_to: Option<String>,
    /// Local device path while attached
    pub device_path: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Volume {
    /// Set identifier label, or `SET_IDENTIFIER_NONE` when unlabelled
    pub fn set_identifier(&self) -> &str {
        self.labels
            .get(SET_IDENTIFIER_LABEL)
            .map(String::as_str)
            .unwrap_or(SET_IDENTIFIER_NONE)
    }
}

/// A point-in-time snapshot of a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    pub readonly: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// =============================================================================
// Compute Port
// =============================================================================

/// Port for compute instance inspection
#[async_trait]
pub trait Compute: Send + Sync {
    /// Instance ID of the instance this driver runs on
    fn instance_id(&self) -> &str;

    /// Inspect the instance with the given ID
    async fn inspect_instance(&self, instance_id: &str) -> Result<InstanceInfo>;

    /// Inspect the instance group the given instance belongs to
    async fn inspect_instance_group_for_instance(
        &self,
        instance_id: &str,
    ) -> Result<InstanceGroupInfo>;
}

// =============================================================================
// Storage Port
// =============================================================================

/// Port for volume operations
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create a volume from a template and apply the given labels
    async fn create(&self, template: &VolumeTemplate, labels: Labels) -> Result<Volume>;

    /// Attach a volume to the local instance, returning the device path
    async fn attach(&self, volume_id: &str) -> Result<String>;

    /// Detach a volume from the local instance
    async fn detach(&self, volume_id: &str) -> Result<()>;

    /// Detach a volume from the given instance
    async fn detach_from(&self, volume_id: &str, instance_id: &str) -> Result<()>;

    /// Delete a volume
    async fn delete(&self, volume_id: &str) -> Result<()>;

    /// Delete a volume attached to the given instance
    async fn delete_from(&self, volume_id: &str, instance_id: &str) -> Result<()>;

    /// Inspect the given volumes
    async fn inspect(&self, volume_ids: &[String]) -> Result<Vec<Volume>>;

    /// Map of local device path to volume ID
    async fn device_mappings(&self) -> Result<BTreeMap<String, String>>;

    /// Enumerate volumes matching the filters, grouped by set identifier.
    ///
    /// Empty `volume_ids` and `labels` match every volume. A `None` set
    /// identifier keeps every group.
    async fn enumerate(
        &self,
        volume_ids: &[String],
        labels: &Labels,
        set_identifier: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<Volume>>>;

    /// Path where the volume is attached
    async fn device_path(&self, volume_id: &str) -> Result<String>;

    /// Snapshot a volume
    async fn snapshot(&self, volume_id: &str, readonly: bool) -> Result<Snapshot>;

    /// Delete a snapshot
    async fn snapshot_delete(&self, snapshot_id: &str) -> Result<()>;

    /// Apply labels to a volume
    async fn apply_tags(&self, volume_id: &str, labels: Labels) -> Result<()>;

    /// Remove labels from a volume
    async fn remove_tags(&self, volume_id: &str, labels: &Labels) -> Result<()>;

    /// Labels currently on a volume
    async fn tags(&self, volume_id: &str) -> Result<Labels>;
}

// =============================================================================
// Ops Port
// =============================================================================

/// Combined cloud operations driver
pub trait Ops: Storage + Compute {
    /// Name of the driver
    fn name(&self) -> &str;
}

pub type OpsRef = Arc<dyn Ops>;
