//! Domain layer for pipewatch
//!
//! Canonical task taxonomy, the summary monoid, node scopes, and the
//! adapter port. Nothing in here performs I/O.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{FetchError, FetchResult};
