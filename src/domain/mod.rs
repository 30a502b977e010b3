//! Domain layer - Cloud driver port definitions
//!
//! This module defines the traits (ports) that cloud driver adapters
//! implement, following hexagonal architecture principles.

pub mod ports;

pub use ports::*;
