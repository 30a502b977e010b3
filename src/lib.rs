//! Cloud Storage Distribution
//!
//! Recommends a concrete cloud drive layout (drive type, size, count per
//! instance) for cloud-agnostic capacity and IOPS requirements, using a
//! provider-specific decision matrix of supported configurations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          Resolution Engine                                   │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │   Row Filter    │─▶│   Row Ranker    │─▶│    Capacity Allocator       │  │
//! │  │ (type/region/   │  │ (priority, tie- │  │ (fewest drives, smallest    │  │
//! │  │  IOPS floor)    │  │  break policy)  │  │  size within row bounds)    │  │
//! │  └────────▲────────┘  └─────────────────┘  └─────────────┬───────────────┘  │
//! │           │                                              │                   │
//! │  ┌────────┴────────┐                        ┌────────────▼────────────────┐ │
//! │  │ Decision Matrix │                        │  DistributionResponse       │ │
//! │  │ + Request       │                        │  (one PoolSpec per spec)    │ │
//! │  └─────────────────┘                        └────────────┬────────────────┘ │
//! ├──────────────────────────────────────────────────────────┼──────────────────┤
//! │                        Cloud Driver Boundary              ▼                  │
//! │  ┌─────────────────────────────┐  ┌─────────────────────────────────────┐   │
//! │  │   Pool Provisioner          │─▶│  Ops (Storage + Compute) drivers    │   │
//! │  │   (set identifiers)         │  │  (memory driver for dry runs)       │   │
//! │  └─────────────────────────────┘  └─────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`distribution`]: Matrix and requirement models, filter, ranker, allocator, engine
//! - [`document`]: YAML/JSON document loading and rendering
//! - [`domain`]: Cloud driver ports
//! - [`drivers`]: Driver adapters and the pool provisioner
//! - [`error`]: Error types and handling

pub mod distribution;
pub mod document;
pub mod domain;
pub mod drivers;
pub mod error;

// Re-export commonly used types
pub use distribution::{
    resolve, CapacityAllocator, CapacityShortfall, CapacitySpec, DecisionMatrix,
    DecisionMatrixRow, DistributionRequest, DistributionResponse, PoolSpec, Priority,
    RankPolicy, Resolver, ResolverConfig, RowAttempt, RowFilter, RowId, Scope, TieBreak,
};

pub use document::{load_matrix, load_request, render_response, DocumentFormat};

pub use domain::ports::{
    CloudResourceInfo, Compute, InstanceGroupInfo, InstanceInfo, Ops, OpsRef, Storage,
    StorageError, StorageErrorCode, SET_IDENTIFIER_NONE,
};

pub use drivers::{MemoryOps, PoolProvisioner, ProvisionedPool};

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
