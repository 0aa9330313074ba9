//! Ancestor/descendant/direct-child resolution over the node tree.
//!
//! Every call re-derives its answer from the repository, so answers always
//! reflect the current tree shape at the cost of repeated round trips.
//! Absence of a node is a legitimate "no relation" outcome and never
//! surfaces as an error; store connectivity failures do.

use std::collections::HashSet;

use thiserror::Error;
use vigil_primitives::node::NodeId;
use vigil_store::{NodeRepository, StoreError};

/// Upper bound on the master-chain walk. Real deployments are a handful of
/// levels deep; anything approaching this bound is malformed data.
pub const MAX_WALK_DEPTH: usize = 1024;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HierarchyError {
    /// The master chain or a children list loops back on itself.
    #[error("hierarchy cycle detected at node {id}")]
    CycleDetected { id: NodeId },
    /// The master chain exceeds [`MAX_WALK_DEPTH`] levels.
    #[error("hierarchy walk exceeded {MAX_WALK_DEPTH} levels")]
    DepthExceeded,
    #[error(transparent)]
    Store(StoreError),
}

/// Stateless relationship queries over a [`NodeRepository`].
///
/// `own_id` is this instance's identifier, threaded in at construction
/// rather than read from ambient configuration.
#[derive(Clone, Debug)]
pub struct HierarchyResolver<R> {
    repo: R,
    own_id: NodeId,
}

impl<R: NodeRepository> HierarchyResolver<R> {
    pub const fn new(repo: R, own_id: NodeId) -> Self {
        Self { repo, own_id }
    }

    #[must_use]
    pub const fn own_id(&self) -> NodeId {
        self.own_id
    }

    /// True iff `master` appears on the master chain from `node` up to its
    /// root, excluding `node` itself. Unknown nodes have no ancestors.
    pub async fn is_ancestor(
        &self,
        node: NodeId,
        master: NodeId,
    ) -> Result<bool, HierarchyError> {
        if node == master {
            // A node is never its own ancestor, malformed data included.
            return Ok(false);
        }

        let mut visited = HashSet::new();
        let _ = visited.insert(node);
        let mut current = node;

        loop {
            if visited.len() > MAX_WALK_DEPTH {
                return Err(HierarchyError::DepthExceeded);
            }

            let next = match self.repo.master_of(current).await {
                Ok(Some(next)) => next,
                Ok(None) => return Ok(false),
                Err(StoreError::NotFound { .. }) => return Ok(false),
                Err(err) => return Err(HierarchyError::Store(err)),
            };

            if next == master {
                return Ok(true);
            }

            if !visited.insert(next) {
                return Err(HierarchyError::CycleDetected { id: next });
            }

            current = next;
        }
    }

    /// True iff `slave` appears anywhere in the subtree below `node`.
    /// Depth-first and short-circuiting: the walk stops at the first match.
    pub async fn is_descendant(
        &self,
        node: NodeId,
        slave: NodeId,
    ) -> Result<bool, HierarchyError> {
        let mut visited = HashSet::new();
        let _ = visited.insert(node);
        let mut pending = vec![node];

        while let Some(current) = pending.pop() {
            let children = match self.repo.children_of(current).await {
                Ok(children) => children,
                Err(StoreError::NotFound { .. }) => continue,
                Err(err) => return Err(HierarchyError::Store(err)),
            };

            for child in children {
                if child == slave {
                    return Ok(true);
                }

                if !visited.insert(child) {
                    // Each node has one master, so a child can only show
                    // up twice if the facts are cyclic.
                    return Err(HierarchyError::CycleDetected { id: child });
                }

                pending.push(child);
            }
        }

        Ok(false)
    }

    /// True iff `candidate`'s master is exactly this node. Used to vet an
    /// inbound peer claiming to be a configured direct slave.
    pub async fn is_direct_child(&self, candidate: NodeId) -> Result<bool, HierarchyError> {
        match self.repo.is_direct_child_of(candidate, self.own_id).await {
            Ok(answer) => Ok(answer),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(err) => Err(HierarchyError::Store(err)),
        }
    }
}
