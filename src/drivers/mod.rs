//! Cloud Driver Adapters
//!
//! Provides implementations of the cloud driver ports and the provisioner
//! that hands resolved pool specs to them:
//! - Memory: in-process driver for dry runs and tests
//! - Provisioner: creates, labels and attaches the drives of each pool

pub mod memory;
pub mod provisioner;

pub use memory::*;
pub use provisioner::*;
