//! Resolution Engine
//!
//! Resolves every capacity spec of a request against a decision matrix:
//! filter the rows, rank them, then allocate against each ranked row in
//! turn until one fits.

use super::allocator::{CapacityAllocator, CapacityShortfall};
use super::filter::RowFilter;
use super::matrix::{DecisionMatrix, RowId};
use super::ranker::RankPolicy;
use super::request::{CapacitySpec, DistributionRequest, DistributionResponse, PoolSpec};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Ordering of candidate rows
    #[serde(default)]
    pub rank_policy: RankPolicy,
}

// =============================================================================
// Row Attempt
// =============================================================================

/// A ranked row that was tried for a spec and why it failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAttempt {
    pub row: RowId,
    pub reason: CapacityShortfall,
}

// =============================================================================
// Resolver
// =============================================================================

/// Stateless resolution engine; share freely across threads
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Resolve a request into one pool spec per capacity spec, in order
    pub fn resolve(
        &self,
        request: &DistributionRequest,
        matrix: &DecisionMatrix,
    ) -> Result<DistributionResponse> {
        request.validate()?;
        matrix.validate()?;

        info!(
            "Resolving {} capacity specs for {} ({} per zone x {} zones) against {} rows",
            request.specs.len(),
            request.instance_type,
            request.instances_per_zone,
            request.zone_count,
            matrix.len()
        );

        let instance_storage = request
            .specs
            .iter()
            .enumerate()
            .map(|(index, spec)| self.resolve_spec(index, spec, request, matrix))
            .collect::<Result<Vec<_>>>()?;

        info!("Resolved {} pools", instance_storage.len());

        Ok(DistributionResponse {
            instance_storage,
            instances_per_zone: request.instances_per_zone,
        })
    }

    fn resolve_spec(
        &self,
        spec_index: usize,
        spec: &CapacitySpec,
        request: &DistributionRequest,
        matrix: &DecisionMatrix,
    ) -> Result<PoolSpec> {
        let filter = RowFilter::new(&request.instance_type, request.region.as_deref(), spec.iops);
        let candidates = filter.apply(matrix, spec_index)?;
        let ranked = self.config.rank_policy.rank(candidates);

        debug!(
            "Spec {}: ranked candidates {:?}",
            spec_index,
            ranked.iter().map(|r| r.index).collect::<Vec<_>>()
        );

        let mut attempts = Vec::new();

        for row in &ranked {
            match CapacityAllocator::allocate(
                row,
                spec,
                request.instances_per_zone,
                request.zone_count,
            ) {
                Ok(pool) => {
                    debug!(
                        "Spec {}: {} -> {} x {} GiB {}",
                        spec_index,
                        row.id(),
                        pool.drive_count,
                        pool.drive_capacity,
                        pool.drive_type
                    );
                    return Ok(pool);
                }
                Err(Error::CapacityUnsatisfiable { row, reason }) => {
                    warn!("Spec {}: skipping {}: {}", spec_index, row, reason);
                    attempts.push(RowAttempt { row, reason });
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::NoFeasibleConfiguration {
            spec_index,
            attempts,
        })
    }
}

/// Resolve with the default ranking policy
pub fn resolve(
    request: &DistributionRequest,
    matrix: &DecisionMatrix,
) -> Result<DistributionResponse> {
    Resolver::default().resolve(request, matrix)
}
