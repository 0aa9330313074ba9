use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use vigil_primitives::node::{Node, NodeId};

use crate::{NodeRepository, StoreError};

type NodeMap = BTreeMap<NodeId, Option<NodeId>>;

/// Map-backed node store for file-backed deployments and tests.
///
/// Values are the master reference; `None` marks a root.
#[derive(Debug, Default)]
pub struct InMemoryNodeStore {
    inner: RwLock<NodeMap>,
}

impl InMemoryNodeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let inner = nodes
            .into_iter()
            .map(|node| (node.id, node.master))
            .collect();

        Self {
            inner: RwLock::new(inner),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, NodeMap>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Unavailable {
            reason: "node map lock poisoned".to_owned(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, NodeMap>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Unavailable {
            reason: "node map lock poisoned".to_owned(),
        })
    }

    pub fn insert(&self, node: Node) -> Result<(), StoreError> {
        let _ = self.write()?.insert(node.id, node.master);
        Ok(())
    }

    /// Replaces the whole tree in one swap; readers never observe a
    /// partially loaded topology.
    pub fn replace_all(&self, nodes: impl IntoIterator<Item = Node>) -> Result<(), StoreError> {
        let fresh = nodes
            .into_iter()
            .map(|node| (node.id, node.master))
            .collect();

        *self.write()? = fresh;
        Ok(())
    }

    pub fn roots(&self) -> Result<Vec<NodeId>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .filter_map(|(id, master)| master.is_none().then_some(*id))
            .collect())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.is_empty())
    }
}

#[async_trait]
impl NodeRepository for InMemoryNodeStore {
    async fn master_of(&self, id: NodeId) -> Result<Option<NodeId>, StoreError> {
        match self.read()?.get(&id) {
            Some(master) => Ok(*master),
            None => Err(StoreError::NotFound { id }),
        }
    }

    async fn children_of(&self, id: NodeId) -> Result<Vec<NodeId>, StoreError> {
        // Unknown ids and leaves both come back empty; the facts cannot
        // tell them apart.
        Ok(self
            .read()?
            .iter()
            .filter_map(|(child, master)| (*master == Some(id)).then_some(*child))
            .collect())
    }

    async fn is_direct_child_of(
        &self,
        candidate: NodeId,
        own: NodeId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .read()?
            .get(&candidate)
            .is_some_and(|master| *master == Some(own)))
    }
}

#[cfg(test)]
mod tests {
    use vigil_primitives::node::master_from_raw;

    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    fn tree(facts: &[(u64, u64)]) -> InMemoryNodeStore {
        InMemoryNodeStore::from_nodes(
            facts
                .iter()
                .map(|&(node, master)| Node::new(id(node), master_from_raw(master))),
        )
    }

    #[tokio::test]
    async fn master_of_resolves_roots_and_children() {
        let store = tree(&[(1, 0), (2, 1), (3, 2)]);

        assert_eq!(store.master_of(id(1)).await.unwrap(), None);
        assert_eq!(store.master_of(id(3)).await.unwrap(), Some(id(2)));
        assert!(matches!(
            store.master_of(id(9)).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn children_of_unknown_is_indistinguishable_from_leaf() {
        let store = tree(&[(1, 0), (2, 1), (3, 1)]);

        let mut children = store.children_of(id(1)).await.unwrap();
        children.sort_unstable();
        assert_eq!(children, vec![id(2), id(3)]);

        assert!(store.children_of(id(3)).await.unwrap().is_empty());
        assert!(store.children_of(id(9)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn direct_child_is_one_hop_only() {
        let store = tree(&[(1, 0), (2, 1), (3, 2)]);

        assert!(store.is_direct_child_of(id(2), id(1)).await.unwrap());
        assert!(!store.is_direct_child_of(id(3), id(1)).await.unwrap());
        assert!(!store.is_direct_child_of(id(9), id(1)).await.unwrap());
    }

    #[tokio::test]
    async fn replace_all_swaps_the_tree() {
        let store = tree(&[(1, 0), (2, 1)]);

        store
            .replace_all([Node::new(id(5), None), Node::new(id(6), Some(id(5)))])
            .unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.roots().unwrap(), vec![id(5)]);
        assert!(matches!(
            store.master_of(id(1)).await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
