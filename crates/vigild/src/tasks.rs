//! Collaborator implementations for the file-backed deployment.
//!
//! The real reconciliation and history-upload routines live with the
//! central store and the collector pipeline; these stand in for them when
//! the hierarchy comes from a topology file on disk.

use std::sync::Arc;

use async_trait::async_trait;
use camino::Utf8PathBuf;
use eyre::{Result as EyreResult, WrapErr};
use tracing::{debug, info, warn};
use vigil_node::hierarchy::HierarchyResolver;
use vigil_node::sync::{ForwardData, FullSync};
use vigil_store::topology::TopologyFile;
use vigil_store::{InMemoryNodeStore, NodeRepository};

/// Full-sync collaborator: re-reads the topology file, swaps the store
/// contents in one go, and audits this node's placement in the refreshed
/// tree.
pub struct TopologyRefresh {
    dir: Utf8PathBuf,
    store: Arc<InMemoryNodeStore>,
    resolver: HierarchyResolver<Arc<InMemoryNodeStore>>,
}

impl TopologyRefresh {
    pub const fn new(
        dir: Utf8PathBuf,
        store: Arc<InMemoryNodeStore>,
        resolver: HierarchyResolver<Arc<InMemoryNodeStore>>,
    ) -> Self {
        Self {
            dir,
            store,
            resolver,
        }
    }
}

#[async_trait]
impl FullSync for TopologyRefresh {
    async fn run(&self) -> EyreResult<()> {
        let topology = TopologyFile::load(&self.dir).wrap_err("topology refresh failed")?;
        self.store.replace_all(topology.into_nodes()?)?;

        let own = self.resolver.own_id();

        // Our own record disappearing from the tree is a configuration
        // error worth failing the sync over.
        let master = self.store.master_of(own).await?;
        let roots = self.store.roots()?;

        if let Some(master) = master {
            // A cycle anywhere on our master chain surfaces here as an
            // error from the resolver.
            let mut anchored = false;
            for root in &roots {
                if self.resolver.is_ancestor(own, *root).await? {
                    anchored = true;
                    break;
                }
            }

            if !anchored {
                warn!(%own, %master, "master chain does not reach any root");
            }
        }

        let slaves = self.store.children_of(own).await?;

        info!(
            nodes = self.store.len()?,
            roots = roots.len(),
            slaves = slaves.len(),
            "node hierarchy refreshed"
        );

        Ok(())
    }
}

/// Forward collaborator for a node with no collectors attached: there is
/// never anything to upload.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardIdle;

#[async_trait]
impl ForwardData for ForwardIdle {
    async fn run(&self) -> EyreResult<()> {
        debug!("no collected history to forward");
        Ok(())
    }
}
