//! Error types for connection tracking and group lifecycle

use thiserror::Error;

use crate::check::CheckResult;
use crate::config::ConfigError;
use crate::connection::{BlockId, ConnectionId, GroupId, Point};

/// Errors returned by [`ConnectionManager`](crate::manager::ConnectionManager)
/// and [`BlockGraph`](crate::graph::BlockGraph) operations.
///
/// Every operation that fails leaves the manager unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConnectionError {
    /// The main group lives as long as the manager
    #[error("the main group cannot be deleted")]
    MainGroupDeletion,

    /// Groups must be merged or emptied before deletion
    #[error("{group} still holds {remaining} connection(s)")]
    GroupNotEmpty { group: GroupId, remaining: usize },

    #[error("unknown group {0}")]
    UnknownGroup(GroupId),

    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("unknown block {0}")]
    UnknownBlock(BlockId),

    /// Sorted lists cannot order NaN or infinite coordinates
    #[error("{0} cannot be placed at non-finite position {1:?}")]
    InvalidPosition(ConnectionId, Point),

    /// A connect request failed its compatibility check
    #[error("cannot connect {from} to {to}: {reason}")]
    Incompatible {
        from: ConnectionId,
        to: ConnectionId,
        reason: CheckResult,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ConnectionError {
    /// Create an incompatibility error from a failed check
    pub fn incompatible(from: ConnectionId, to: ConnectionId, reason: CheckResult) -> Self {
        Self::Incompatible { from, to, reason }
    }
}
