//! TOML topology ingestion for file-backed deployments.
//!
//! Entries follow the raw dump convention where `master = 0` (or an absent
//! field) means the node is a root.

use std::fs::{read_to_string, write};

use camino::Utf8Path;
use eyre::{bail, Result as EyreResult, WrapErr};
use serde::{Deserialize, Serialize};
use vigil_primitives::node::{master_from_raw, Node, NodeId};

pub const TOPOLOGY_FILE: &str = "topology.toml";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TopologyFile {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
}

/// One raw node fact as it appears on disk.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct NodeEntry {
    pub id: u64,
    #[serde(default)]
    pub master: u64,
}

impl TopologyFile {
    pub fn exists(dir: &Utf8Path) -> bool {
        dir.join(TOPOLOGY_FILE).is_file()
    }

    pub fn load(dir: &Utf8Path) -> EyreResult<Self> {
        let path = dir.join(TOPOLOGY_FILE);
        let content = read_to_string(&path)
            .wrap_err_with(|| format!("failed to read topology from {path:?}"))?;

        toml::from_str(&content).map_err(Into::into)
    }

    pub fn save(&self, dir: &Utf8Path) -> EyreResult<()> {
        let path = dir.join(TOPOLOGY_FILE);
        let content = toml::to_string_pretty(self)?;

        write(&path, content).wrap_err_with(|| format!("failed to write topology to {path:?}"))?;

        Ok(())
    }

    /// Validates ids and folds the `0` sentinel into "no master".
    pub fn into_nodes(self) -> EyreResult<Vec<Node>> {
        let mut nodes = Vec::with_capacity(self.nodes.len());

        for entry in self.nodes {
            let Some(id) = NodeId::new(entry.id) else {
                bail!("node id 0 is reserved for \"no master\"");
            };

            nodes.push(Node::new(id, master_from_raw(entry.master)));
        }

        Ok(nodes)
    }
}
