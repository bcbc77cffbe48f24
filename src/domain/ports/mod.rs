//! Port trait definitions (Hexagonal Architecture)
//!
//! - NodeAdapter: read-only fetch + normalization of one upstream resource
//!
//! These traits define the contracts that allow the aggregation tree to be
//! independent of specific upstream implementations.

pub mod adapter;

pub use adapter::NodeAdapter;
