//! Storage Distribution Module
//!
//! Resolves cloud-agnostic capacity requirements into concrete per-instance
//! drive layouts using a provider decision matrix.

pub mod allocator;
pub mod engine;
pub mod filter;
pub mod matrix;
pub mod ranker;
pub mod request;

pub use allocator::*;
pub use engine::*;
pub use filter::*;
pub use matrix::*;
pub use ranker::*;
pub use request::*;
