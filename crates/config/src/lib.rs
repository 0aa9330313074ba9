//! On-disk configuration for a vigil node instance.

use core::time::Duration;
use std::fs::{read_to_string, write};

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result as EyreResult, WrapErr};
use serde::{Deserialize, Serialize};
use vigil_node::sync::FailurePolicy;
use vigil_primitives::node::NodeId;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct ConfigFile {
    /// This instance's identifier in the node tree.
    pub node_id: NodeId,

    #[serde(default)]
    pub sync: SyncConfig,

    pub topology: TopologyConfig,
}

impl ConfigFile {
    #[must_use]
    pub const fn new(node_id: NodeId, sync: SyncConfig, topology: TopologyConfig) -> Self {
        Self {
            node_id,
            sync,
            topology,
        }
    }

    pub fn exists(dir: &Utf8Path) -> bool {
        dir.join(CONFIG_FILE).is_file()
    }

    pub fn load(dir: &Utf8Path) -> EyreResult<Self> {
        let path = dir.join(CONFIG_FILE);
        let content = read_to_string(&path)
            .wrap_err_with(|| format!("failed to read configuration from {path:?}"))?;

        toml::from_str(&content).map_err(Into::into)
    }

    pub fn save(&self, dir: &Utf8Path) -> EyreResult<()> {
        let path = dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)?;

        write(&path, content)
            .wrap_err_with(|| format!("failed to write configuration to {path:?}"))?;

        Ok(())
    }
}

/// Serde twin of [`vigil_node::sync::SyncConfig`], with durations stored
/// as integer milliseconds.
#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Minimum spacing between two full hierarchy syncs.
    #[serde(rename = "full_sync_interval_ms", with = "serde_duration")]
    pub full_sync_interval: Duration,

    /// Target cycle length the scheduler paces itself to.
    #[serde(rename = "cycle_ms", with = "serde_duration")]
    pub cycle: Duration,

    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        vigil_node::sync::SyncConfig::default().into()
    }
}

impl From<SyncConfig> for vigil_node::sync::SyncConfig {
    fn from(config: SyncConfig) -> Self {
        Self {
            full_sync_interval: config.full_sync_interval,
            cycle: config.cycle,
            on_failure: config.on_failure,
        }
    }
}

impl From<vigil_node::sync::SyncConfig> for SyncConfig {
    fn from(config: vigil_node::sync::SyncConfig) -> Self {
        Self {
            full_sync_interval: config.full_sync_interval,
            cycle: config.cycle,
            on_failure: config.on_failure,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct TopologyConfig {
    /// Directory holding `topology.toml`.
    pub path: Utf8PathBuf,
}

impl TopologyConfig {
    #[must_use]
    pub const fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

mod serde_duration {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
