//! Upstream adapter port.
//!
//! Every node in the aggregation tree talks to its external system
//! exclusively through this trait, which keeps the tree independent of
//! any particular CI provider's schema.

use async_trait::async_trait;

use crate::domain::errors::FetchResult;
use crate::domain::models::{NodeScope, NormalizedBatch, UpstreamKind};

/// Port for adapters that read one upstream resource and normalize it.
///
/// Adapters are read-only: a fetch never mutates the upstream system.
/// The returned batch carries the scope's raw records, its child entity
/// set (each with a stable id), and the node's fresh local contribution.
#[async_trait]
pub trait NodeAdapter: Send + Sync {
    /// The upstream kind this adapter serves.
    fn kind(&self) -> UpstreamKind;

    /// Fetch and normalize the resource identified by `scope`.
    ///
    /// A scope of the wrong kind is an [`InvalidTarget`] error.
    ///
    /// [`InvalidTarget`]: crate::domain::errors::FetchError::InvalidTarget
    async fn fetch(&self, scope: &NodeScope) -> FetchResult<NormalizedBatch>;
}
