//! Convenience helpers for wiring layout callbacks into the manager.
//!
//! This module provides [`ConnectionTracker`], a wrapper around a shared
//! [`ConnectionManager`] that hands out ready-to-use closures for the host's
//! layout notifications.
//!
//! # Example
//!
//! ```ignore
//! use block_connections::ConnectionTracker;
//!
//! let tracker = ConnectionTracker::new();
//!
//! // Wire up callbacks (one-time setup)
//! layout.on_connection_moved(tracker.connection_moved_callback());
//! layout.on_block_moved(tracker.block_moved_callback());
//!
//! // Get the manager for use elsewhere
//! let manager = tracker.manager();
//! ```

use crate::connection::{BlockId, ConnectionId, Point};
use crate::manager::ConnectionManager;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// Shares a [`ConnectionManager`] with layout callbacks.
///
/// This eliminates the boilerplate of wrapping the manager in
/// `Rc<RefCell<_>>` and forwarding every position report by hand.
#[derive(Clone, Default)]
pub struct ConnectionTracker {
    manager: Rc<RefCell<ConnectionManager>>,
}

impl ConnectionTracker {
    /// Create a new tracker with an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker wrapping an existing manager.
    ///
    /// Useful when the manager is populated before callbacks are connected.
    pub fn with_manager(manager: Rc<RefCell<ConnectionManager>>) -> Self {
        Self { manager }
    }

    /// Get a clone of the shared manager reference.
    pub fn manager(&self) -> Rc<RefCell<ConnectionManager>> {
        self.manager.clone()
    }

    /// Callback for absolute connection positions: `(connection, x, y)`.
    ///
    /// Reports for unknown connections are logged and ignored.
    pub fn connection_moved_callback(&self) -> impl Fn(ConnectionId, f32, f32) + Clone {
        let manager = self.manager.clone();
        move |id, x, y| {
            if let Err(err) = manager.borrow_mut().move_connection(id, Point::new(x, y)) {
                warn!(%err, "ignored connection position report");
            }
        }
    }

    /// Callback for block translations: `(block, dx, dy)`.
    ///
    /// Moves every connection of the block by the delta.
    pub fn block_moved_callback(&self) -> impl Fn(BlockId, f32, f32) + Clone {
        let manager = self.manager.clone();
        move |block, dx, dy| {
            if let Err(err) = manager.borrow_mut().move_block(block, dx, dy) {
                warn!(%err, "ignored block move report");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionType, TypeChecks};

    fn tracked_block(tracker: &ConnectionTracker) -> (BlockId, ConnectionId) {
        let manager = tracker.manager();
        let mut manager = manager.borrow_mut();
        let block = manager.graph_mut().add_block(false);
        let conn = manager
            .add_connection(block, ConnectionType::OutputValue, Point::new(0.0, 0.0), TypeChecks::any())
            .unwrap();
        (block, conn)
    }

    #[test]
    fn test_tracker_new_creates_empty_manager() {
        let tracker = ConnectionTracker::new();
        let manager = tracker.manager();
        assert_eq!(manager.borrow().graph().connection_count(), 0);
        assert!(manager.borrow().group(manager.borrow().main_group()).unwrap().is_empty());
    }

    #[test]
    fn test_tracker_with_existing_manager() {
        let manager = Rc::new(RefCell::new(ConnectionManager::new()));
        manager.borrow_mut().graph_mut().add_block(false);

        let tracker = ConnectionTracker::with_manager(manager.clone());

        // Should share the same manager
        assert_eq!(tracker.manager().borrow().graph().block_count(), 1);
    }

    #[test]
    fn test_connection_moved_callback_repositions() {
        let tracker = ConnectionTracker::new();
        let (_, conn) = tracked_block(&tracker);
        let callback = tracker.connection_moved_callback();

        callback(conn, 12.0, 30.0);

        let manager = tracker.manager();
        let manager = manager.borrow();
        assert_eq!(manager.graph().connection(conn).unwrap().position, Point::new(12.0, 30.0));
        let list = manager
            .group(manager.main_group())
            .unwrap()
            .list_for(ConnectionType::OutputValue);
        assert_eq!(list.get(0).unwrap().position, Point::new(12.0, 30.0));
    }

    #[test]
    fn test_block_moved_callback_translates() {
        let tracker = ConnectionTracker::new();
        let (block, conn) = tracked_block(&tracker);
        let callback = tracker.block_moved_callback();

        callback(block, 5.0, -5.0);
        callback(block, 5.0, -5.0);

        let manager = tracker.manager();
        assert_eq!(
            manager.borrow().graph().connection(conn).unwrap().position,
            Point::new(10.0, -10.0)
        );
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let tracker = ConnectionTracker::new();
        let (_, conn) = tracked_block(&tracker);

        tracker.connection_moved_callback()(ConnectionId(999), 1.0, 1.0);
        tracker.block_moved_callback()(BlockId(999), 1.0, 1.0);

        let manager = tracker.manager();
        assert_eq!(manager.borrow().graph().connection(conn).unwrap().position, Point::default());
    }

    #[test]
    fn test_callback_is_clone() {
        let tracker = ConnectionTracker::new();
        let (_, conn) = tracked_block(&tracker);

        let cb1 = tracker.connection_moved_callback();
        let cb2 = cb1.clone();

        cb1(conn, 1.0, 2.0);
        cb2(conn, 3.0, 4.0);

        let manager = tracker.manager();
        assert_eq!(manager.borrow().graph().connection(conn).unwrap().position, Point::new(3.0, 4.0));
        assert!(manager.borrow().group(manager.borrow().main_group()).unwrap().is_sorted());
    }
}
