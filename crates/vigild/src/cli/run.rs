use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use eyre::{bail, Result as EyreResult};
use tokio::signal;
use tracing::info;
use vigil_config::ConfigFile;
use vigil_node::hierarchy::HierarchyResolver;
use vigil_node::sync::{SyncManager, TracingReporter};
use vigil_store::topology::TopologyFile;
use vigil_store::InMemoryNodeStore;

use crate::cli::RootArgs;
use crate::tasks::{ForwardIdle, TopologyRefresh};

/// Run the nodewatcher loop
#[derive(Debug, Parser)]
pub struct RunCommand {
    /// Override the topology directory from config.toml
    #[arg(long, value_name = "PATH")]
    pub topology: Option<Utf8PathBuf>,
}

impl RunCommand {
    pub async fn run(self, root_args: RootArgs) -> EyreResult<()> {
        let home = root_args.home;

        if !ConfigFile::exists(&home) {
            bail!("node is not initialized in {home:?}");
        }

        let config = ConfigFile::load(&home)?;
        let topology_dir = self.topology.unwrap_or(config.topology.path);

        let topology = TopologyFile::load(&topology_dir)?;
        let store = Arc::new(InMemoryNodeStore::from_nodes(topology.into_nodes()?));

        let resolver = HierarchyResolver::new(Arc::clone(&store), config.node_id);

        info!(
            node_id = %config.node_id,
            nodes = store.len()?,
            "node hierarchy loaded"
        );

        let full_sync = Arc::new(TopologyRefresh::new(
            topology_dir,
            Arc::clone(&store),
            resolver,
        ));

        let manager = SyncManager::new(
            config.sync.into(),
            full_sync,
            Arc::new(ForwardIdle),
            Arc::new(TracingReporter),
        );

        tokio::select! {
            result = manager.start() => result,
            () = shutdown_signal() => Ok(()),
        }
    }
}

/// Wait for a shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping node");
}
