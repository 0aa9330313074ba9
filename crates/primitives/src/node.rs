use core::fmt;
use core::num::{NonZeroU64, ParseIntError};
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw value node-fact dumps use to mean "no master".
///
/// It is never a valid node identifier; conversions fold it into `None`
/// so it can never be matched as if it were a real node.
pub const NO_MASTER: u64 = 0;

/// Identifier of one monitoring-server instance, unique across the
/// deployment.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct NodeId(NonZeroU64);

impl NodeId {
    /// Returns `None` for the reserved [`NO_MASTER`] value.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl From<NonZeroU64> for NodeId {
    fn from(id: NonZeroU64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvalidNodeId {
    #[error("node id is not a number")]
    NotANumber(#[from] ParseIntError),
    #[error("node id 0 is reserved for \"no master\"")]
    Reserved,
}

impl FromStr for NodeId {
    type Err = InvalidNodeId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.parse()?).ok_or(InvalidNodeId::Reserved)
    }
}

/// Folds a raw master reference into an optional id, mapping the
/// [`NO_MASTER`] sentinel to `None`.
#[must_use]
pub const fn master_from_raw(raw: u64) -> Option<NodeId> {
    NodeId::new(raw)
}

/// One monitoring-server instance in the hierarchy.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Node {
    pub id: NodeId,
    /// Direct parent in the hierarchy; `None` marks a root.
    #[serde(default)]
    pub master: Option<NodeId>,
}

impl Node {
    #[must_use]
    pub const fn new(id: NodeId, master: Option<NodeId>) -> Self {
        Self { id, master }
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.master.is_none()
    }
}
