//! Pool Provisioner
//!
//! Realizes a resolved distribution on the local instance by creating and
//! attaching the drives of every pool spec through a cloud driver.

use crate::distribution::{DistributionResponse, PoolSpec};
use crate::domain::ports::{
    Compute, Labels, OpsRef, Storage, Volume, VolumeTemplate, SET_IDENTIFIER_LABEL,
    SET_IDENTIFIER_NONE,
};
use crate::error::Result;
use tracing::{info, warn};

/// Volumes created for one pool spec
#[derive(Debug, Clone)]
pub struct ProvisionedPool {
    /// Position of the pool in the response
    pub index: usize,
    pub set_identifier: String,
    pub pool: PoolSpec,
    /// Attached volumes, in creation order
    pub volumes: Vec<Volume>,
}

/// Creates the drives of a distribution response on the local instance
pub struct PoolProvisioner {
    ops: OpsRef,
    set_prefix: Option<String>,
    labels: Labels,
}

impl PoolProvisioner {
    pub fn new(ops: OpsRef) -> Self {
        Self {
            ops,
            set_prefix: None,
            labels: Labels::new(),
        }
    }

    /// Group each pool's volumes under `<prefix>-<pool index>`
    pub fn with_set_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.set_prefix = Some(prefix.into());
        self
    }

    /// Labels applied to every created volume
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Set identifier of the pool at `index`
    pub fn set_identifier(&self, index: usize) -> String {
        match &self.set_prefix {
            Some(prefix) => format!("{}-{}", prefix, index),
            None => SET_IDENTIFIER_NONE.to_string(),
        }
    }

    fn labels_for(&self, index: usize) -> Labels {
        let mut labels = self.labels.clone();
        if self.set_prefix.is_some() {
            labels.insert(SET_IDENTIFIER_LABEL.to_string(), self.set_identifier(index));
        }
        labels
    }

    /// Create and attach `drive_count` volumes per pool.
    ///
    /// Volumes created by a failed call are detached and deleted before the
    /// error is returned.
    pub async fn provision(&self, response: &DistributionResponse) -> Result<Vec<ProvisionedPool>> {
        let instance = self
            .ops
            .inspect_instance(self.ops.instance_id())
            .await?;
        let zone = instance.resource.zone;

        info!(
            "Provisioning {} pools on {} via {} driver",
            response.instance_storage.len(),
            self.ops.instance_id(),
            self.ops.name()
        );

        let mut provisioned = Vec::new();
        let mut created = Vec::new();

        for (index, pool) in response.instance_storage.iter().enumerate() {
            let template = VolumeTemplate {
                drive_type: pool.drive_type.clone(),
                capacity_gib: pool.drive_capacity,
                iops: pool.iops,
                thin_provisioning: pool.thin_provisioning,
                zone: zone.clone(),
            };

            let mut volumes = Vec::new();
            for _ in 0..pool.drive_count {
                match self.create_attached(&template, index, &mut created).await {
                    Ok(volume) => volumes.push(volume),
                    Err(e) => {
                        self.rollback(&created).await;
                        return Err(e);
                    }
                }
            }

            provisioned.push(ProvisionedPool {
                index,
                set_identifier: self.set_identifier(index),
                pool: pool.clone(),
                volumes,
            });
        }

        Ok(provisioned)
    }

    async fn create_attached(
        &self,
        template: &VolumeTemplate,
        index: usize,
        created: &mut Vec<String>,
    ) -> Result<Volume> {
        let volume = self.ops.create(template, self.labels_for(index)).await?;
        created.push(volume.id.clone());
        self.ops.attach(&volume.id).await?;

        let mut volumes = self.ops.inspect(&[volume.id.clone()]).await?;
        Ok(volumes.pop().unwrap_or(volume))
    }

    async fn rollback(&self, created: &[String]) {
        for id in created.iter().rev() {
            if self.ops.device_path(id).await.is_ok() {
                if let Err(e) = self.ops.detach(id).await {
                    warn!("Rollback: failed to detach {}: {}", id, e);
                }
            }
            if let Err(e) = self.ops.delete(id).await {
                warn!("Rollback: failed to delete {}: {}", id, e);
            }
        }
    }

    /// Volumes already provisioned for the pool at `index`
    pub async fn existing(&self, index: usize) -> Result<Vec<Volume>> {
        let set = self.set_identifier(index);
        let mut sets = self
            .ops
            .enumerate(&[], &self.labels, Some(&set))
            .await?;
        Ok(sets.remove(&set).unwrap_or_default())
    }
}
