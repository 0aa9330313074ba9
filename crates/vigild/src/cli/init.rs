use std::fs::create_dir_all;

use clap::Parser;
use eyre::{bail, Result as EyreResult, WrapErr};
use tracing::info;
use vigil_config::{ConfigFile, SyncConfig, TopologyConfig};
use vigil_primitives::node::NodeId;
use vigil_store::topology::{NodeEntry, TopologyFile};

use crate::cli::RootArgs;

/// Initialize a node workspace: default config and a seed topology
#[derive(Debug, Parser)]
pub struct InitCommand {
    /// This node's identifier in the hierarchy
    #[arg(long, default_value_t = 1)]
    pub node_id: u64,

    /// Overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

impl InitCommand {
    pub fn run(self, args: &RootArgs) -> EyreResult<()> {
        let home = &args.home;

        create_dir_all(home).wrap_err_with(|| format!("failed to create {home:?}"))?;

        if ConfigFile::exists(home) && !self.force {
            bail!("node is already initialized in {home:?}, use --force to overwrite");
        }

        let Some(node_id) = NodeId::new(self.node_id) else {
            bail!("node id 0 is reserved for \"no master\"");
        };

        let config = ConfigFile::new(
            node_id,
            SyncConfig::default(),
            TopologyConfig::new(home.clone()),
        );
        config.save(home)?;

        if !TopologyFile::exists(home) || self.force {
            // A one-node seed; administrative tooling maintains the real
            // tree.
            let topology = TopologyFile {
                nodes: vec![NodeEntry {
                    id: self.node_id,
                    master: 0,
                }],
            };
            topology.save(home)?;
        }

        info!("initialized node {node_id} in {home}");

        Ok(())
    }
}
