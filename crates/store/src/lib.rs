//! Read-only access to the node-tree facts.
//!
//! The tree itself is owned and mutated by administrative tooling outside
//! this workspace; this crate only exposes the queries the hierarchy
//! resolver needs, plus an in-memory backend for file-backed deployments
//! and tests.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use vigil_primitives::node::NodeId;

mod memory;
pub mod topology;

pub use memory::InMemoryNodeStore;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The referenced node id does not exist in the tree.
    #[error("node {id} not found")]
    NotFound { id: NodeId },
    /// The store could not be queried at all.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Read-only queries over the node tree.
///
/// `children_of` cannot distinguish an unknown id from a childless node;
/// both come back empty. Callers that need existence go through
/// `master_of`.
#[async_trait]
pub trait NodeRepository: Send + Sync {
    /// Master of `id`, or `None` if `id` is a root.
    async fn master_of(&self, id: NodeId) -> Result<Option<NodeId>, StoreError>;

    /// Direct children of `id`, unordered.
    async fn children_of(&self, id: NodeId) -> Result<Vec<NodeId>, StoreError>;

    /// True iff `candidate` exists and its master is exactly `own`.
    ///
    /// Kept as a single round trip; it sits on the inbound-connection
    /// validation path.
    async fn is_direct_child_of(
        &self,
        candidate: NodeId,
        own: NodeId,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
impl<T> NodeRepository for Arc<T>
where
    T: NodeRepository + ?Sized,
{
    async fn master_of(&self, id: NodeId) -> Result<Option<NodeId>, StoreError> {
        (**self).master_of(id).await
    }

    async fn children_of(&self, id: NodeId) -> Result<Vec<NodeId>, StoreError> {
        (**self).children_of(id).await
    }

    async fn is_direct_child_of(
        &self,
        candidate: NodeId,
        own: NodeId,
    ) -> Result<bool, StoreError> {
        (**self).is_direct_child_of(candidate, own).await
    }
}
