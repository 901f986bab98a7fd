//! The connection registry and snap search.
//!
//! [`ConnectionManager`] owns the block/connection arena, the permanent main
//! group and any number of ephemeral groups. It is the single entry point for
//! tracking, repositioning and wiring connections, and answers "what should
//! this dragged subtree snap to?" via [`find_best_connection`].
//!
//! The manager is an ordinary value owned by the canvas context; create it
//! when the canvas is created and call [`teardown`] when it is disposed.
//!
//! # Example
//!
//! ```
//! use block_connections::{ConnectionManager, ConnectionType, Point, TypeChecks};
//!
//! let mut manager = ConnectionManager::new();
//! let parent = manager.graph_mut().add_block(false);
//! let child = manager.graph_mut().add_block(false);
//! let input = manager
//!     .add_connection(parent, ConnectionType::InputValue, Point::new(100.0, 40.0), TypeChecks::any())
//!     .unwrap();
//! let output = manager
//!     .add_connection(child, ConnectionType::OutputValue, Point::new(0.0, 0.0), TypeChecks::any())
//!     .unwrap();
//!
//! // Hold the child out of the main group while it is dragged
//! let drag = manager.start_group(Some(child));
//! manager.track_connection(output, Some(drag)).unwrap();
//! manager.move_connection(output, Point::new(104.0, 43.0)).unwrap();
//!
//! let best = manager.find_best_connection(drag, 25.0).unwrap();
//! assert_eq!((best.from, best.to), (output, input));
//! ```
//!
//! [`find_best_connection`]: ConnectionManager::find_best_connection
//! [`teardown`]: ConnectionManager::teardown

use crate::check::{check_pair, mode_for, CheckResult, ConnectMode};
use crate::config::ConnectionConfig;
use crate::connection::{BlockId, ConnectionId, ConnectionType, GroupId, Point, TypeChecks};
use crate::error::ConnectionError;
use crate::graph::BlockGraph;
use crate::group::ConnectionGroup;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Best snap target found for a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Connection in the searched group
    pub from: ConnectionId,
    /// Compatible connection in another group
    pub to: ConnectionId,
    /// Group holding `to`
    pub to_group: GroupId,
    pub distance: f32,
    /// Slot the pair was judged for
    pub mode: ConnectMode,
}

#[derive(Debug, Clone)]
pub struct ConnectionManager {
    graph: BlockGraph,
    groups: BTreeMap<GroupId, ConnectionGroup>,
    main_group: GroupId,
    next_group: u32,
    config: ConnectionConfig,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::with_config(ConnectionConfig::default())
    }

    pub fn with_config(config: ConnectionConfig) -> Self {
        let main_group = GroupId(0);
        let mut groups = BTreeMap::new();
        groups.insert(
            main_group,
            ConnectionGroup::with_capacity(main_group, None, config.list_capacity),
        );
        Self {
            graph: BlockGraph::new(),
            groups,
            main_group,
            next_group: 1,
            config,
        }
    }

    /// Build a manager from a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConnectionError> {
        Ok(Self::with_config(ConnectionConfig::load(path)?))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn graph(&self) -> &BlockGraph {
        &self.graph
    }

    /// Mutable access for structural edits that cannot desynchronize the
    /// sorted lists (adding blocks, type checks, detaching).
    pub fn graph_mut(&mut self) -> &mut BlockGraph {
        &mut self.graph
    }

    pub fn main_group(&self) -> GroupId {
        self.main_group
    }

    pub fn group(&self, id: GroupId) -> Option<&ConnectionGroup> {
        self.groups.get(&id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &ConnectionGroup> + '_ {
        self.groups.values()
    }

    /// Group currently tracking `id`, if any.
    pub fn group_of(&self, id: ConnectionId) -> Option<GroupId> {
        self.graph.connection(id).and_then(|c| c.group)
    }

    pub fn is_tracked(&self, id: ConnectionId) -> bool {
        self.group_of(id).is_some()
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut ConnectionGroup, ConnectionError> {
        self.groups.get_mut(&id).ok_or(ConnectionError::UnknownGroup(id))
    }

    // === Block lifecycle ===

    /// Create a connection on `block` and track it in the main group.
    ///
    /// Fails with [`ConnectionError::InvalidPosition`] for a NaN or infinite
    /// position, leaving the graph untouched.
    pub fn add_connection(
        &mut self,
        block: BlockId,
        connection_type: ConnectionType,
        position: Point,
        type_checks: TypeChecks,
    ) -> Result<ConnectionId, ConnectionError> {
        let id = self
            .graph
            .add_connection(block, connection_type, position, type_checks)?;
        self.track_connection(id, None)?;
        Ok(id)
    }

    /// Disconnect and untrack every connection of `block`, then drop it.
    pub fn remove_block(&mut self, block: BlockId) -> Result<(), ConnectionError> {
        let connections = self
            .graph
            .block(block)
            .ok_or(ConnectionError::UnknownBlock(block))?
            .connections
            .clone();
        for id in connections {
            self.untrack_connection(id);
            self.graph.unlink(id, ConnectMode::Real);
            self.graph.unlink(id, ConnectMode::Shadow);
        }
        self.graph.remove_block(block)?;
        debug!(%block, "removed block");
        Ok(())
    }

    // === Tracking ===

    /// Track `id` in `group` (the main group when `None`).
    ///
    /// Returns `Ok(false)` when the connection is already tracked there. A
    /// connection tracked elsewhere is untracked from its old group first.
    pub fn track_connection(
        &mut self,
        id: ConnectionId,
        group: Option<GroupId>,
    ) -> Result<bool, ConnectionError> {
        let group = group.unwrap_or(self.main_group);
        if !self.groups.contains_key(&group) {
            return Err(ConnectionError::UnknownGroup(group));
        }
        let connection = self
            .graph
            .connection(id)
            .ok_or(ConnectionError::UnknownConnection(id))?;
        let (connection_type, position, current) =
            (connection.connection_type, connection.position, connection.group);

        if current == Some(group) {
            return Ok(false);
        }
        if current.is_some() {
            self.untrack_connection(id);
        }

        self.group_mut(group)?
            .list_for_mut(connection_type)
            .insert(id, position);
        self.graph.set_group(id, Some(group));
        trace!(%id, %group, "tracked connection");
        Ok(true)
    }

    /// Remove `id` from whichever group holds it. Returns `false` if untracked.
    pub fn untrack_connection(&mut self, id: ConnectionId) -> bool {
        let Some(connection) = self.graph.connection(id) else {
            return false;
        };
        let Some(group) = connection.group else {
            return false;
        };
        let (connection_type, y) = (connection.connection_type, connection.position.y);

        if let Some(owner) = self.groups.get_mut(&group) {
            let list = owner.list_for_mut(connection_type);
            if !list.remove(id, y) {
                warn!(%id, %group, y, "tracked connection missing from its sorted list");
                list.purge(id);
            }
        }
        self.graph.set_group(id, None);
        trace!(%id, %group, "untracked connection");
        true
    }

    // === Positions ===

    /// Move a connection, keeping its group's list sorted.
    ///
    /// Non-finite positions are rejected and the connection stays put.
    pub fn move_connection(&mut self, id: ConnectionId, position: Point) -> Result<(), ConnectionError> {
        if self.graph.connection(id).is_none() {
            return Err(ConnectionError::UnknownConnection(id));
        }
        if !position.is_finite() {
            return Err(ConnectionError::InvalidPosition(id, position));
        }
        let old = self.graph.set_position(id, position)?;
        let Some(connection) = self.graph.connection(id) else {
            return Err(ConnectionError::UnknownConnection(id));
        };
        let (connection_type, group, highlighted) =
            (connection.connection_type, connection.group, connection.highlighted);

        let Some(group) = group.and_then(|g| self.groups.get_mut(&g)) else {
            if highlighted {
                self.graph.set_highlighted(id, false)?;
            }
            return Ok(());
        };

        let group_id = group.id();
        let list = group.list_for_mut(connection_type);
        if !list.reposition(id, old.y, position) {
            warn!(%id, group = %group_id, y = old.y, "reposition of untracked list entry");
            list.purge(id);
            list.insert(id, position);
        }

        if group.is_drag_mode() {
            group.defer(id);
        } else if highlighted {
            self.graph.set_highlighted(id, false)?;
        }
        Ok(())
    }

    /// Translate every connection of `block` by `(dx, dy)`.
    pub fn move_block(&mut self, block: BlockId, dx: f32, dy: f32) -> Result<(), ConnectionError> {
        let connections = self
            .graph
            .block(block)
            .ok_or(ConnectionError::UnknownBlock(block))?
            .connections
            .clone();
        self.translate(&connections, dx, dy)
    }

    /// Translate every connection in `root`'s subtree by `(dx, dy)`.
    pub fn move_subtree(&mut self, root: BlockId, dx: f32, dy: f32) -> Result<(), ConnectionError> {
        if self.graph.block(root).is_none() {
            return Err(ConnectionError::UnknownBlock(root));
        }
        let connections = self.graph.subtree_connections(root);
        self.translate(&connections, dx, dy)
    }

    /// Every target position is validated before anything moves.
    fn translate(&mut self, connections: &[ConnectionId], dx: f32, dy: f32) -> Result<(), ConnectionError> {
        let mut moves = Vec::with_capacity(connections.len());
        for &id in connections {
            let position = self
                .graph
                .connection(id)
                .ok_or(ConnectionError::UnknownConnection(id))?
                .position
                .offset(dx, dy);
            if !position.is_finite() {
                return Err(ConnectionError::InvalidPosition(id, position));
            }
            moves.push((id, position));
        }
        for (id, position) in moves {
            self.move_connection(id, position)?;
        }
        Ok(())
    }

    pub fn set_highlighted(&mut self, id: ConnectionId, highlighted: bool) -> Result<(), ConnectionError> {
        self.graph.set_highlighted(id, highlighted)?;
        Ok(())
    }

    /// Toggle drag mode on `group`.
    ///
    /// Switching it off clears the stale highlight of every connection that
    /// moved while it was on.
    pub fn set_drag_mode(&mut self, group: GroupId, drag_mode: bool) -> Result<(), ConnectionError> {
        let deferred = self.group_mut(group)?.set_drag_mode(drag_mode);
        let cleared = self.graph.clear_highlights(&deferred);
        debug!(%group, drag_mode, deferred = deferred.len(), cleared, "drag mode changed");
        Ok(())
    }

    // === Group lifecycle ===

    /// Register a new empty group for the subtree rooted at `block`.
    ///
    /// The caller tracks the subtree's connections into it.
    pub fn start_group(&mut self, block: Option<BlockId>) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        self.groups.insert(
            id,
            ConnectionGroup::with_capacity(id, block, self.config.list_capacity),
        );
        debug!(group = %id, ?block, "started group");
        id
    }

    /// Move everything in `source` into `destination` (the main group when
    /// `None`). Returns the number of connections moved.
    ///
    /// Highlight clearing deferred by `source` stays deferred only if
    /// `destination` is in drag mode too; otherwise it happens now.
    pub fn merge_group(
        &mut self,
        source: GroupId,
        destination: Option<GroupId>,
    ) -> Result<usize, ConnectionError> {
        let destination = destination.unwrap_or(self.main_group);
        if !self.groups.contains_key(&destination) {
            return Err(ConnectionError::UnknownGroup(destination));
        }
        if source == destination {
            return if self.groups.contains_key(&source) {
                Ok(0)
            } else {
                Err(ConnectionError::UnknownGroup(source))
            };
        }

        let mut from = self
            .groups
            .remove(&source)
            .ok_or(ConnectionError::UnknownGroup(source))?;
        let moved_ids: Vec<ConnectionId> = from.all_connections().collect();
        let deferred = from.take_deferred();
        let (moved, flush) = match self.groups.get_mut(&destination) {
            Some(into) if into.is_drag_mode() => {
                for &id in &deferred {
                    into.defer(id);
                }
                (from.transfer_all_to(into), Vec::new())
            }
            Some(into) => (from.transfer_all_to(into), deferred),
            None => (0, deferred),
        };
        self.groups.insert(source, from);

        for id in moved_ids {
            self.graph.set_group(id, Some(destination));
        }
        let cleared = self.graph.clear_highlights(&flush);
        debug!(%source, %destination, moved, cleared, "merged group");
        Ok(moved)
    }

    /// Forget an empty ephemeral group.
    pub fn delete_group(&mut self, group: GroupId) -> Result<(), ConnectionError> {
        if group == self.main_group {
            return Err(ConnectionError::MainGroupDeletion);
        }
        let remaining = self
            .groups
            .get(&group)
            .ok_or(ConnectionError::UnknownGroup(group))?
            .len();
        if remaining > 0 {
            return Err(ConnectionError::GroupNotEmpty { group, remaining });
        }
        self.groups.remove(&group);
        debug!(%group, "deleted group");
        Ok(())
    }

    /// Untrack everything, clear their highlights and drop every ephemeral group.
    pub fn teardown(&mut self) {
        let ids: Vec<ConnectionId> = self
            .groups
            .values()
            .flat_map(|g| g.all_connections())
            .collect();
        for id in &ids {
            self.graph.set_group(*id, None);
        }
        self.graph.clear_highlights(&ids);
        let main_group = self.main_group;
        self.groups.retain(|id, _| *id == main_group);
        if let Some(main) = self.groups.get_mut(&main_group) {
            main.clear();
            main.set_drag_mode(false);
        }
        debug!(untracked = ids.len(), "connection manager torn down");
    }

    // === Compatibility ===

    /// Evaluate the rule state machine for `mode` without the distance rule.
    pub fn check(&self, a: ConnectionId, b: Option<ConnectionId>, mode: ConnectMode) -> CheckResult {
        check_pair(&self.graph, a, b, mode)
    }

    /// Whether `a` may connect to `b` within `max_radius`.
    ///
    /// The pair is judged as a shadow connect when `allow_shadows` is set and
    /// either side lives on a shadow block, otherwise as a real connect. The
    /// distance is checked after every other rule.
    pub fn can_connect(
        &self,
        a: ConnectionId,
        b: Option<ConnectionId>,
        max_radius: f32,
        allow_shadows: bool,
    ) -> CheckResult {
        let mode = match b {
            Some(b) => mode_for(&self.graph, a, b, allow_shadows),
            None => ConnectMode::Real,
        };
        let result = self.check(a, b, mode);
        if !result.is_ok() {
            return result;
        }
        match (self.graph.connection(a), b.and_then(|b| self.graph.connection(b))) {
            (Some(a), Some(b)) if a.position.distance_to(&b.position) <= max_radius => {
                CheckResult::CanConnect
            }
            _ => CheckResult::ReasonOutOfRange,
        }
    }

    // === Search ===

    /// Closest compatible pair between `group` and any other group, using the
    /// configured shadow policy.
    pub fn find_best_connection(&self, group: GroupId, max_radius: f32) -> Option<Candidate> {
        self.find_best_connection_with(group, max_radius, self.config.allow_shadow_snapping)
    }

    /// Closest compatible pair between `group` and any other group.
    ///
    /// Connections are never matched against their own group, so a dragged
    /// subtree cannot snap to itself. The search radius shrinks to the best
    /// distance found so far; on a tie the first pair found is kept.
    pub fn find_best_connection_with(
        &self,
        group: GroupId,
        max_radius: f32,
        allow_shadows: bool,
    ) -> Option<Candidate> {
        let searched = self.groups.get(&group)?;
        let mut best: Option<Candidate> = None;
        let mut radius = max_radius;

        for from in searched.all_connections() {
            let Some(connection) = self.graph.connection(from) else {
                continue;
            };
            let wanted = connection.connection_type.opposite();

            for other in self.groups.values().filter(|g| g.id() != group) {
                let found = other.list_for(wanted).closest_matching(connection.position, radius, |to| {
                    let mode = mode_for(&self.graph, from, to, allow_shadows);
                    check_pair(&self.graph, from, Some(to), mode).is_ok()
                });
                let Some((to, distance)) = found else {
                    continue;
                };
                if best.map_or(true, |b| distance < b.distance) {
                    radius = distance;
                    best = Some(Candidate {
                        from,
                        to,
                        to_group: other.id(),
                        distance,
                        mode: mode_for(&self.graph, from, to, allow_shadows),
                    });
                }
            }
        }

        trace!(%group, max_radius, ?best, "searched for best connection");
        best
    }

    // === Pair wiring ===

    /// Wire `a` and `b` as a real connection.
    pub fn connect(&mut self, a: ConnectionId, b: ConnectionId) -> Result<(), ConnectionError> {
        self.connect_with_mode(a, b, ConnectMode::Real)
    }

    /// Wire `a` and `b` through their shadow slots.
    pub fn connect_shadow(&mut self, a: ConnectionId, b: ConnectionId) -> Result<(), ConnectionError> {
        self.connect_with_mode(a, b, ConnectMode::Shadow)
    }

    /// Wire a candidate returned by [`find_best_connection`](Self::find_best_connection).
    pub fn connect_candidate(&mut self, candidate: &Candidate) -> Result<(), ConnectionError> {
        self.connect_with_mode(candidate.from, candidate.to, candidate.mode)
    }

    fn connect_with_mode(
        &mut self,
        a: ConnectionId,
        b: ConnectionId,
        mode: ConnectMode,
    ) -> Result<(), ConnectionError> {
        let result = self.check(a, Some(b), mode);
        if !result.is_ok() {
            return Err(ConnectionError::incompatible(a, b, result));
        }
        self.graph.link(a, b, mode);
        debug!(from = %a, to = %b, ?mode, "connected");
        Ok(())
    }

    /// Clear `a`'s real connection. Returns the former partner.
    pub fn disconnect(&mut self, a: ConnectionId) -> Option<ConnectionId> {
        let partner = self.graph.unlink(a, ConnectMode::Real);
        if let Some(partner) = partner {
            debug!(from = %a, to = %partner, "disconnected");
        }
        partner
    }

    /// Clear `a`'s shadow connection. Returns the former partner.
    pub fn disconnect_shadow(&mut self, a: ConnectionId) -> Option<ConnectionId> {
        let partner = self.graph.unlink(a, ConnectMode::Shadow);
        if let Some(partner) = partner {
            debug!(from = %a, to = %partner, "disconnected shadow");
        }
        partner
    }
}
