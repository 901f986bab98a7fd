//! # Block Connections
//!
//! Connection management for a block-editing canvas. Blocks expose typed
//! connection points (value outputs and inputs, previous and next statement
//! slots); this crate keeps them indexed by Y coordinate so the host can
//! answer "what is the nearest compatible connection to this point" quickly
//! while a block is being dragged.
//!
//! ## Features
//!
//! - **Y-sorted indexes** - One sorted list per connection type, searched by
//!   binary search plus an outward scan
//! - **Groups** - Dragged subtrees live in their own group so they never snap
//!   onto themselves
//! - **Compatibility rules** - [`CheckResult`] reports exactly why a pair is
//!   rejected
//! - **Shadow wiring** - Shadow blocks use a parallel set of links
//!
//! ## Quick Start
//!
//! ```
//! use block_connections::{ConnectionManager, ConnectionType, Point, TypeChecks};
//!
//! let mut manager = ConnectionManager::new();
//! let print = manager.graph_mut().add_block(false);
//! let input = manager
//!     .add_connection(print, ConnectionType::InputValue, Point::new(40.0, 10.0), TypeChecks::any())
//!     .unwrap();
//!
//! let text = manager.graph_mut().add_block(false);
//! let output = manager
//!     .add_connection(text, ConnectionType::OutputValue, Point::new(44.0, 13.0), TypeChecks::any())
//!     .unwrap();
//!
//! assert!(manager.can_connect(output, Some(input), 10.0, false).is_ok());
//! manager.connect(output, input).unwrap();
//! assert_eq!(manager.graph().connection(input).unwrap().target, Some(output));
//! ```
//!
//! ## Core Types
//!
//! - [`ConnectionManager`] - Owns the graph and every connection group
//! - [`SortedConnectionList`] - Y-ordered index with radius queries
//! - [`ConnectionGroup`] - Four sorted lists, one per [`ConnectionType`]
//! - [`DragSession`] - Drives a drag from pick-up to drop
//! - [`ConnectionTracker`] - Shares a manager with layout callbacks

pub mod check;
pub mod config;
pub mod connection;
pub mod drag;
pub mod error;
pub mod graph;
pub mod group;
pub mod manager;
pub mod sorted_list;
pub mod tracking;

pub use check::{check_pair, mode_for, CheckResult, ConnectMode};
pub use config::{ConfigError, ConnectionConfig};
pub use connection::{
    BlockId, Connection, ConnectionId, ConnectionType, GroupId, Point, TypeChecks,
};
pub use drag::DragSession;
pub use error::ConnectionError;
pub use graph::{Block, BlockGraph};
pub use group::ConnectionGroup;
pub use manager::{Candidate, ConnectionManager};
pub use sorted_list::{ListEntry, SortedConnectionList};
pub use tracking::ConnectionTracker;
