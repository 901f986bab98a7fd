//! Drag controller for moving a block subtree across the canvas.
//!
//! A [`DragSession`] holds the dragged subtree in its own connection group so
//! that it is never matched against itself, asks the manager for the best
//! snap target on every pointer move, keeps the highlight on that target up
//! to date and, when the drag ends, either wires the snap or simply returns
//! the subtree to the main group.
//!
//! # Example
//!
//! ```
//! use block_connections::{ConnectionManager, ConnectionType, DragSession, Point, TypeChecks};
//!
//! let mut manager = ConnectionManager::new();
//! let parent = manager.graph_mut().add_block(false);
//! let next = manager
//!     .add_connection(parent, ConnectionType::NextStatement, Point::new(0.0, 20.0), TypeChecks::any())
//!     .unwrap();
//! let child = manager.graph_mut().add_block(false);
//! let previous = manager
//!     .add_connection(child, ConnectionType::PreviousStatement, Point::new(0.0, 100.0), TypeChecks::any())
//!     .unwrap();
//!
//! let mut drag = DragSession::start(&mut manager, child).unwrap();
//! let candidate = drag.drag_by(&mut manager, 0.0, -75.0).unwrap();
//! assert_eq!(candidate.map(|c| c.to), Some(next));
//! assert!(manager.graph().connection(next).unwrap().highlighted);
//!
//! drag.finish(&mut manager).unwrap();
//! assert_eq!(manager.graph().connection(previous).unwrap().target, Some(next));
//! ```

use crate::connection::{BlockId, ConnectionId, GroupId};
use crate::error::ConnectionError;
use crate::manager::{Candidate, ConnectionManager};
use tracing::{debug, warn};

/// State of one in-progress drag.
#[derive(Debug)]
pub struct DragSession {
    root: BlockId,
    group: GroupId,
    lifted_from: Option<ConnectionId>,
    candidate: Option<Candidate>,
}

impl DragSession {
    /// Lift `root` off its parent and move its subtree into a fresh group.
    pub fn start(manager: &mut ConnectionManager, root: BlockId) -> Result<Self, ConnectionError> {
        if manager.graph().block(root).is_none() {
            return Err(ConnectionError::UnknownBlock(root));
        }

        let inferior = manager.graph().attached_inferior(root);
        let lifted_from = inferior.and_then(|inferior| manager.disconnect(inferior));

        let group = manager.start_group(Some(root));
        let connections = manager.graph().subtree_connections(root);
        if let Err(err) = Self::hold(manager, group, &connections) {
            if let (Some(inferior), Some(parent)) = (inferior, lifted_from) {
                if let Err(relink) = manager.connect(inferior, parent) {
                    warn!(%relink, "could not reattach block after failed drag start");
                }
            }
            return Err(err);
        }
        debug!(%root, %group, ?lifted_from, "drag started");

        Ok(Self {
            root,
            group,
            lifted_from,
            candidate: None,
        })
    }

    /// Track `connections` into `group` and enter drag mode.
    ///
    /// On failure the group is merged back into the main group and deleted.
    fn hold(
        manager: &mut ConnectionManager,
        group: GroupId,
        connections: &[ConnectionId],
    ) -> Result<(), ConnectionError> {
        let held = connections
            .iter()
            .try_for_each(|&id| manager.track_connection(id, Some(group)).map(|_| ()))
            .and_then(|()| manager.set_drag_mode(group, true));
        if let Err(err) = held {
            warn!(%group, %err, "releasing drag group after failed start");
            manager.set_drag_mode(group, false)?;
            manager.merge_group(group, None)?;
            manager.delete_group(group)?;
            return Err(err);
        }
        Ok(())
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    /// Group holding the dragged subtree.
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Superior connection the root was attached to before the drag, if any.
    pub fn lifted_from(&self) -> Option<ConnectionId> {
        self.lifted_from
    }

    /// Current best snap target.
    pub fn candidate(&self) -> Option<Candidate> {
        self.candidate
    }

    /// Move the subtree by `(dx, dy)` and refresh the snap candidate.
    pub fn drag_by(
        &mut self,
        manager: &mut ConnectionManager,
        dx: f32,
        dy: f32,
    ) -> Result<Option<Candidate>, ConnectionError> {
        manager.move_subtree(self.root, dx, dy)?;
        let best = manager.find_best_connection(self.group, manager.config().snap_radius);
        self.set_candidate(manager, best)?;
        Ok(best)
    }

    /// Swap the highlight when the best target changes.
    fn set_candidate(
        &mut self,
        manager: &mut ConnectionManager,
        best: Option<Candidate>,
    ) -> Result<(), ConnectionError> {
        let previous = self.candidate.map(|c| c.to);
        let next = best.map(|c| c.to);
        if previous != next {
            if let Some(previous) = previous {
                manager.set_highlighted(previous, false)?;
            }
            if let Some(next) = next {
                manager.set_highlighted(next, true)?;
            }
        }
        self.candidate = best;
        Ok(())
    }

    /// End the drag, wiring the current candidate if there is one.
    ///
    /// The subtree is first moved so that the snapped connections coincide.
    /// A candidate that no longer passes its check is dropped and the subtree
    /// stays where it was released. Returns the candidate that was connected.
    pub fn finish(self, manager: &mut ConnectionManager) -> Result<Option<Candidate>, ConnectionError> {
        self.end(manager, true)
    }

    /// End the drag without connecting anything.
    pub fn cancel(self, manager: &mut ConnectionManager) -> Result<(), ConnectionError> {
        self.end(manager, false).map(|_| ())
    }

    fn end(mut self, manager: &mut ConnectionManager, commit: bool) -> Result<Option<Candidate>, ConnectionError> {
        let candidate = self.candidate;
        self.set_candidate(manager, None)?;
        manager.set_drag_mode(self.group, false)?;

        let mut connected = None;
        if let Some(candidate) = candidate.filter(|_| commit) {
            let result = manager.check(candidate.from, Some(candidate.to), candidate.mode);
            if result.is_ok() {
                self.snap_onto(manager, &candidate)?;
                manager.connect_candidate(&candidate)?;
                connected = Some(candidate);
            } else {
                warn!(%result, from = %candidate.from, to = %candidate.to, "snap candidate became invalid before drop");
            }
        }

        manager.merge_group(self.group, None)?;
        manager.delete_group(self.group)?;
        debug!(root = %self.root, connected = connected.is_some(), "drag ended");
        Ok(connected)
    }

    fn snap_onto(&self, manager: &mut ConnectionManager, candidate: &Candidate) -> Result<(), ConnectionError> {
        let graph = manager.graph();
        let (Some(from), Some(to)) = (graph.connection(candidate.from), graph.connection(candidate.to)) else {
            return Ok(());
        };
        let dx = to.position.x - from.position.x;
        let dy = to.position.y - from.position.y;
        manager.move_subtree(self.root, dx, dy)
    }
}
