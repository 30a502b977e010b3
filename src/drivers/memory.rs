//! In-Memory Cloud Driver
//!
//! Implements the cloud driver ports against in-process state. Used for
//! dry runs and tests; no provider API is called.

use crate::domain::ports::{
    Compute, InstanceGroupInfo, InstanceInfo, Labels, Ops, Snapshot, Storage, StorageError,
    StorageErrorCode, Volume, VolumeTemplate,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    volumes: BTreeMap<String, Volume>,
    snapshots: BTreeMap<String, Snapshot>,
}

// =============================================================================
// Memory Ops
// =============================================================================

/// Cloud driver backed by in-process maps
pub struct MemoryOps {
    instance: InstanceInfo,
    group: Option<InstanceGroupInfo>,
    volume_limit: Option<usize>,
    state: RwLock<MemoryState>,
    id_counter: AtomicU64,
    device_counter: AtomicU64,
}

impl MemoryOps {
    /// Create a driver running on the given instance
    pub fn new(instance: InstanceInfo) -> Self {
        Self {
            instance,
            group: None,
            volume_limit: None,
            state: RwLock::new(MemoryState::default()),
            id_counter: AtomicU64::new(0),
            device_counter: AtomicU64::new(0),
        }
    }

    /// Report the given group for the local instance
    pub fn with_group(mut self, group: InstanceGroupInfo) -> Self {
        self.group = Some(group);
        self
    }

    /// Refuse to create volumes once `limit` volumes exist
    pub fn with_volume_limit(mut self, limit: usize) -> Self {
        self.volume_limit = Some(limit);
        self
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{:08x}", prefix, n)
    }

    fn next_device_path(&self) -> String {
        let n = self.device_counter.fetch_add(1, Ordering::SeqCst);
        // xvda is the root device
        match n {
            0..=24 => format!("/dev/xvd{}", (b'b' + n as u8) as char),
            _ => format!("/dev/xvd{}", n),
        }
    }

    fn local_id(&self) -> &str {
        &self.instance.resource.id
    }

    fn not_found(&self, volume_id: &str) -> Error {
        StorageError::new(
            StorageErrorCode::VolNotFound,
            format!("volume {} not found", volume_id),
            self.local_id(),
        )
        .into()
    }

    /// Number of volumes currently tracked
    pub fn volume_count(&self) -> usize {
        self.state.read().volumes.len()
    }
}

#[async_trait]
impl Compute for MemoryOps {
    fn instance_id(&self) -> &str {
        self.local_id()
    }

    async fn inspect_instance(&self, instance_id: &str) -> Result<InstanceInfo> {
        if instance_id == self.local_id() {
            Ok(self.instance.clone())
        } else {
            Err(Error::Unsupported(format!(
                "memory driver cannot inspect remote instance {}",
                instance_id
            )))
        }
    }

    async fn inspect_instance_group_for_instance(
        &self,
        instance_id: &str,
    ) -> Result<InstanceGroupInfo> {
        match &self.group {
            Some(group) if instance_id == self.local_id() => Ok(group.clone()),
            _ => Err(Error::Unsupported(format!(
                "no instance group known for instance {}",
                instance_id
            ))),
        }
    }
}

#[async_trait]
impl Storage for MemoryOps {
    async fn create(&self, template: &VolumeTemplate, labels: Labels) -> Result<Volume> {
        let mut state = self.state.write();
        if let Some(limit) = self.volume_limit {
            if state.volumes.len() >= limit {
                return Err(StorageError::new(
                    StorageErrorCode::VolInval,
                    format!("volume limit of {} reached", limit),
                    self.local_id(),
                )
                .into());
            }
        }

        let volume = Volume {
            id: self.next_id("vol"),
            drive_type: template.drive_type.clone(),
            capacity_gib: template.capacity_gib,
            iops: template.iops,
            zone: template.zone.clone(),
            labels,
            attached_to: None,
            device_path: None,
            created_at: chrono::Utc::now(),
        };

        info!(
            "Created volume {} ({} GiB {})",
            volume.id, volume.capacity_gib, volume.drive_type
        );

        state.volumes.insert(volume.id.clone(), volume.clone());
        Ok(volume)
    }

    async fn attach(&self, volume_id: &str) -> Result<String> {
        let mut state = self.state.write();
        let local = self.local_id().to_string();
        let volume = state
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| self.not_found(volume_id))?;

        match (&volume.attached_to, &volume.device_path) {
            (Some(owner), Some(path)) if *owner == local => return Ok(path.clone()),
            (Some(owner), _) if *owner != local => {
                return Err(StorageError::new(
                    StorageErrorCode::VolAttachedOnRemoteNode,
                    format!("volume {} is attached on {}", volume_id, owner),
                    owner.as_str(),
                )
                .into());
            }
            _ => {}
        }

        let path = self.next_device_path();
        volume.attached_to = Some(local);
        volume.device_path = Some(path.clone());
        debug!("Attached volume {} at {}", volume_id, path);
        Ok(path)
    }

    async fn detach(&self, volume_id: &str) -> Result<()> {
        let local = self.local_id().to_string();
        self.detach_from(volume_id, &local).await
    }

    async fn detach_from(&self, volume_id: &str, instance_id: &str) -> Result<()> {
        let mut state = self.state.write();
        let volume = state
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| self.not_found(volume_id))?;

        let owner = volume.attached_to.clone();
        match owner.as_deref() {
            None => Err(StorageError::new(
                StorageErrorCode::VolDetached,
                format!("volume {} is detached", volume_id),
                instance_id,
            )
            .into()),
            Some(owner) if owner != instance_id => Err(StorageError::new(
                StorageErrorCode::VolAttachedOnRemoteNode,
                format!("volume {} is attached on {}", volume_id, owner),
                owner,
            )
            .into()),
            Some(_) => {
                volume.attached_to = None;
                volume.device_path = None;
                debug!("Detached volume {} from {}", volume_id, instance_id);
                Ok(())
            }
        }
    }

    async fn delete(&self, volume_id: &str) -> Result<()> {
        let mut state = self.state.write();
        let volume = state
            .volumes
            .get(volume_id)
            .ok_or_else(|| self.not_found(volume_id))?;

        if let Some(owner) = &volume.attached_to {
            return Err(StorageError::new(
                StorageErrorCode::VolInval,
                format!("volume {} is still attached", volume_id),
                owner.as_str(),
            )
            .into());
        }

        state.volumes.remove(volume_id);
        info!("Deleted volume {}", volume_id);
        Ok(())
    }

    async fn delete_from(&self, volume_id: &str, instance_id: &str) -> Result<()> {
        self.detach_from(volume_id, instance_id).await?;
        self.delete(volume_id).await
    }

    async fn inspect(&self, volume_ids: &[String]) -> Result<Vec<Volume>> {
        let state = self.state.read();
        volume_ids
            .iter()
            .map(|id| {
                state
                    .volumes
                    .get(id)
                    .cloned()
                    .ok_or_else(|| self.not_found(id))
            })
            .collect()
    }

    async fn device_mappings(&self) -> Result<BTreeMap<String, String>> {
        let local = self.local_id();
        Ok(self
            .state
            .read()
            .volumes
            .values()
            .filter(|v| v.attached_to.as_deref() == Some(local))
            .filter_map(|v| v.device_path.clone().map(|path| (path, v.id.clone())))
            .collect())
    }

    async fn enumerate(
        &self,
        volume_ids: &[String],
        labels: &Labels,
        set_identifier: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<Volume>>> {
        let state = self.state.read();
        let mut sets: BTreeMap<String, Vec<Volume>> = BTreeMap::new();

        for volume in state.volumes.values() {
            if !volume_ids.is_empty() && !volume_ids.contains(&volume.id) {
                continue;
            }
            if !labels
                .iter()
                .all(|(k, v)| volume.labels.get(k) == Some(v))
            {
                continue;
            }
            let set = volume.set_identifier();
            if set_identifier.map_or(false, |wanted| wanted != set) {
                continue;
            }
            sets.entry(set.to_string()).or_default().push(volume.clone());
        }

        Ok(sets)
    }

    async fn device_path(&self, volume_id: &str) -> Result<String> {
        let state = self.state.read();
        let volume = state
            .volumes
            .get(volume_id)
            .ok_or_else(|| self.not_found(volume_id))?;

        match (&volume.attached_to, &volume.device_path) {
            (None, _) => Err(StorageError::new(
                StorageErrorCode::VolDetached,
                format!("volume {} is detached", volume_id),
                self.local_id(),
            )
            .into()),
            (Some(owner), _) if owner != self.local_id() => Err(StorageError::new(
                StorageErrorCode::VolAttachedOnRemoteNode,
                format!("volume {} is attached on {}", volume_id, owner),
                owner.as_str(),
            )
            .into()),
            (Some(_), Some(path)) => Ok(path.clone()),
            (Some(_), None) => Err(StorageError::new(
                StorageErrorCode::InvalidDevicePath,
                format!("volume {} has no device path", volume_id),
                self.local_id(),
            )
            .into()),
        }
    }

    async fn snapshot(&self, volume_id: &str, readonly: bool) -> Result<Snapshot> {
        let mut state = self.state.write();
        if !state.volumes.contains_key(volume_id) {
            return Err(self.not_found(volume_id));
        }

        let snapshot = Snapshot {
            id: self.next_id("snap"),
            volume_id: volume_id.to_string(),
            readonly,
            created_at: chrono::Utc::now(),
        };
        state
            .snapshots
            .insert(snapshot.id.clone(), snapshot.clone());
        Ok(snapshot)
    }

    async fn snapshot_delete(&self, snapshot_id: &str) -> Result<()> {
        match self.state.write().snapshots.remove(snapshot_id) {
            Some(_) => Ok(()),
            None => Err(StorageError::new(
                StorageErrorCode::VolNotFound,
                format!("snapshot {} not found", snapshot_id),
                self.local_id(),
            )
            .into()),
        }
    }

    async fn apply_tags(&self, volume_id: &str, labels: Labels) -> Result<()> {
        let mut state = self.state.write();
        let volume = state
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| self.not_found(volume_id))?;
        volume.labels.extend(labels);
        Ok(())
    }

    async fn remove_tags(&self, volume_id: &str, labels: &Labels) -> Result<()> {
        let mut state = self.state.write();
        let volume = state
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| self.not_found(volume_id))?;
        for key in labels.keys() {
            volume.labels.remove(key);
        }
        Ok(())
    }

    async fn tags(&self, volume_id: &str) -> Result<Labels> {
        self.state
            .read()
            .volumes
            .get(volume_id)
            .map(|v| v.labels.clone())
            .ok_or_else(|| self.not_found(volume_id))
    }
}

impl Ops for MemoryOps {
    fn name(&self) -> &str {
        "memory"
    }
}
