//! Arena of blocks and their connections.
//!
//! Blocks own connections; connections refer to each other, to their block
//! and to their group purely by handle, so the block graph can contain
//! parent/child cycles without any ownership cycles.
//!
//! Anything that would invalidate the manager's sorted lists (positions,
//! group back-references, block removal, target wiring) is crate-private and
//! goes through [`ConnectionManager`](crate::manager::ConnectionManager).

use crate::check::ConnectMode;
use crate::connection::{BlockId, Connection, ConnectionId, ConnectionType, GroupId, Point, TypeChecks};
use crate::error::ConnectionError;
use std::collections::{HashMap, HashSet};

/// A block on the canvas and the connectors it exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    /// Shadow blocks are default placeholders shown when no real block is plugged in.
    pub shadow: bool,
    pub connections: Vec<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockGraph {
    blocks: HashMap<BlockId, Block>,
    connections: HashMap<ConnectionId, Connection>,
    next_block: u32,
    next_connection: u32,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self, shadow: bool) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        self.blocks.insert(
            id,
            Block {
                id,
                shadow,
                connections: Vec::new(),
            },
        );
        id
    }

    /// Create a connection on `block`. The new connection is not tracked by any group.
    ///
    /// Positions must be finite so the connection can later be sorted by Y.
    pub fn add_connection(
        &mut self,
        block: BlockId,
        connection_type: ConnectionType,
        position: Point,
        type_checks: TypeChecks,
    ) -> Result<ConnectionId, ConnectionError> {
        let owner = self
            .blocks
            .get_mut(&block)
            .ok_or(ConnectionError::UnknownBlock(block))?;
        let id = ConnectionId(self.next_connection);
        if !position.is_finite() {
            return Err(ConnectionError::InvalidPosition(id, position));
        }
        self.next_connection += 1;
        owner.connections.push(id);

        let mut connection = Connection::new(id, connection_type, position, block);
        connection.type_checks = type_checks;
        self.connections.insert(id, connection);
        Ok(id)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.values()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.values()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn set_type_checks(
        &mut self,
        id: ConnectionId,
        type_checks: TypeChecks,
    ) -> Result<(), ConnectionError> {
        self.connection_mut(id)?.type_checks = type_checks;
        Ok(())
    }

    /// Sever a connection from its block. Returns the former owner.
    ///
    /// The connection stays in the arena (and in its group, if tracked) but
    /// can no longer pass a compatibility check.
    pub fn detach_connection(&mut self, id: ConnectionId) -> Result<Option<BlockId>, ConnectionError> {
        let owner = self.connection_mut(id)?.source_block.take();
        if let Some(block) = owner.and_then(|b| self.blocks.get_mut(&b)) {
            block.connections.retain(|c| *c != id);
        }
        Ok(owner)
    }

    /// Whether the connection lives on a shadow block.
    pub fn is_shadow(&self, id: ConnectionId) -> bool {
        self.connection(id)
            .and_then(|c| c.source_block)
            .and_then(|b| self.blocks.get(&b))
            .is_some_and(|b| b.shadow)
    }

    /// The superior connection that `block`'s inferior connection is attached to.
    pub fn parent_connection(&self, block: BlockId) -> Option<ConnectionId> {
        self.blocks
            .get(&block)?
            .connections
            .iter()
            .filter_map(|id| self.connections.get(id))
            .find(|c| c.connection_type.is_inferior() && c.target.is_some())
            .and_then(|c| c.target)
    }

    /// The inferior connection of `block` that is currently attached to a parent.
    pub fn attached_inferior(&self, block: BlockId) -> Option<ConnectionId> {
        self.blocks
            .get(&block)?
            .connections
            .iter()
            .copied()
            .find(|id| {
                self.connections
                    .get(id)
                    .is_some_and(|c| c.connection_type.is_inferior() && c.target.is_some())
            })
    }

    /// `root` followed by every block reachable through the real and shadow
    /// targets of superior connections, depth first.
    pub fn subtree_blocks(&self, root: BlockId) -> Vec<BlockId> {
        let mut order = Vec::new();
        if !self.blocks.contains_key(&root) {
            return order;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(block_id) = stack.pop() {
            if !seen.insert(block_id) {
                continue;
            }
            order.push(block_id);
            let Some(block) = self.blocks.get(&block_id) else {
                continue;
            };
            for conn in block.connections.iter().rev().filter_map(|id| self.connections.get(id)) {
                if !conn.connection_type.is_superior() {
                    continue;
                }
                for child in [conn.shadow_target, conn.target].into_iter().flatten() {
                    if let Some(child_block) = self.connections.get(&child).and_then(|c| c.source_block) {
                        stack.push(child_block);
                    }
                }
            }
        }
        order
    }

    /// All connections of the blocks in `root`'s subtree.
    pub fn subtree_connections(&self, root: BlockId) -> Vec<ConnectionId> {
        self.subtree_blocks(root)
            .into_iter()
            .filter_map(|b| self.blocks.get(&b))
            .flat_map(|b| b.connections.iter().copied())
            .collect()
    }

    /// Connections whose highlight flag is set, ordered by id.
    pub fn highlighted_connections(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.highlighted)
            .map(|c| c.id)
            .collect();
        ids.sort();
        ids
    }

    // === Crate-private mutation ===

    pub(crate) fn connection_mut(&mut self, id: ConnectionId) -> Result<&mut Connection, ConnectionError> {
        self.connections
            .get_mut(&id)
            .ok_or(ConnectionError::UnknownConnection(id))
    }

    pub(crate) fn set_position(&mut self, id: ConnectionId, position: Point) -> Result<Point, ConnectionError> {
        let connection = self.connection_mut(id)?;
        Ok(std::mem::replace(&mut connection.position, position))
    }

    pub(crate) fn set_group(&mut self, id: ConnectionId, group: Option<GroupId>) {
        if let Some(connection) = self.connections.get_mut(&id) {
            connection.group = group;
        }
    }

    pub(crate) fn set_highlighted(&mut self, id: ConnectionId, highlighted: bool) -> Result<bool, ConnectionError> {
        let connection = self.connection_mut(id)?;
        Ok(std::mem::replace(&mut connection.highlighted, highlighted))
    }

    /// Clear the highlight of every listed connection. Returns how many were lit.
    pub(crate) fn clear_highlights(&mut self, ids: &[ConnectionId]) -> usize {
        let mut cleared = 0;
        for id in ids {
            if let Some(connection) = self.connections.get_mut(id) {
                if std::mem::replace(&mut connection.highlighted, false) {
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Wire both sides of a pair in the slot selected by `mode`.
    pub(crate) fn link(&mut self, a: ConnectionId, b: ConnectionId, mode: ConnectMode) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(connection) = self.connections.get_mut(&from) {
                match mode {
                    ConnectMode::Real => connection.target = Some(to),
                    ConnectMode::Shadow => connection.shadow_target = Some(to),
                }
            }
        }
    }

    /// Clear both sides of `id`'s slot. Returns the former partner.
    pub(crate) fn unlink(&mut self, id: ConnectionId, mode: ConnectMode) -> Option<ConnectionId> {
        let slot = |c: &mut Connection| match mode {
            ConnectMode::Real => c.target.take(),
            ConnectMode::Shadow => c.shadow_target.take(),
        };
        let partner = self.connections.get_mut(&id).and_then(slot)?;
        if let Some(other) = self.connections.get_mut(&partner) {
            let back = slot(other);
            debug_assert!(back.is_none() || back == Some(id));
        }
        Some(partner)
    }

    /// Remove a block and its connections from the arena.
    pub(crate) fn remove_block(&mut self, id: BlockId) -> Result<Vec<Connection>, ConnectionError> {
        let block = self.blocks.remove(&id).ok_or(ConnectionError::UnknownBlock(id))?;
        Ok(block
            .connections
            .iter()
            .filter_map(|c| self.connections.remove(c))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Statement block with previous/next connectors and one value input.
    fn statement_block(graph: &mut BlockGraph, y: f32) -> (BlockId, ConnectionId, ConnectionId, ConnectionId) {
        let block = graph.add_block(false);
        let prev = graph
            .add_connection(block, ConnectionType::PreviousStatement, Point::new(0.0, y), TypeChecks::any())
            .unwrap();
        let input = graph
            .add_connection(block, ConnectionType::InputValue, Point::new(50.0, y + 5.0), TypeChecks::any())
            .unwrap();
        let next = graph
            .add_connection(block, ConnectionType::NextStatement, Point::new(0.0, y + 20.0), TypeChecks::any())
            .unwrap();
        (block, prev, input, next)
    }

    #[test]
    fn test_add_block_and_connection() {
        let mut graph = BlockGraph::new();
        let (block, prev, input, next) = statement_block(&mut graph, 0.0);

        assert_eq!(graph.block_count(), 1);
        assert_eq!(graph.connection_count(), 3);
        assert_eq!(graph.block(block).unwrap().connections, vec![prev, input, next]);

        let conn = graph.connection(input).unwrap();
        assert_eq!(conn.source_block, Some(block));
        assert_eq!(conn.connection_type, ConnectionType::InputValue);
        assert!(!conn.is_tracked());
    }

    #[test]
    fn test_add_connection_unknown_block() {
        let mut graph = BlockGraph::new();
        let result = graph.add_connection(
            BlockId(99),
            ConnectionType::OutputValue,
            Point::default(),
            TypeChecks::any(),
        );
        assert_eq!(result, Err(ConnectionError::UnknownBlock(BlockId(99))));
    }

    #[test]
    fn test_add_connection_rejects_non_finite_position() {
        let mut graph = BlockGraph::new();
        let block = graph.add_block(false);
        for position in [Point::new(0.0, f32::NAN), Point::new(f32::INFINITY, 0.0)] {
            let result = graph.add_connection(block, ConnectionType::InputValue, position, TypeChecks::any());
            assert!(matches!(result, Err(ConnectionError::InvalidPosition(ConnectionId(0), _))));
        }
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.block(block).unwrap().connections.is_empty());

        // The rejected id is not burned
        let id = graph
            .add_connection(block, ConnectionType::InputValue, Point::default(), TypeChecks::any())
            .unwrap();
        assert_eq!(id, ConnectionId(0));
    }

    #[test]
    fn test_link_and_unlink_both_sides() {
        let mut graph = BlockGraph::new();
        let (_, _, _, next) = statement_block(&mut graph, 0.0);
        let (_, prev, _, _) = statement_block(&mut graph, 20.0);

        graph.link(next, prev, ConnectMode::Real);
        assert_eq!(graph.connection(next).unwrap().target, Some(prev));
        assert_eq!(graph.connection(prev).unwrap().target, Some(next));
        assert_eq!(graph.connection(prev).unwrap().shadow_target, None);

        assert_eq!(graph.unlink(prev, ConnectMode::Real), Some(next));
        assert_eq!(graph.connection(next).unwrap().target, None);
        assert_eq!(graph.unlink(prev, ConnectMode::Real), None);
    }

    #[test]
    fn test_real_and_shadow_slots_are_independent() {
        let mut graph = BlockGraph::new();
        let (_, _, input, _) = statement_block(&mut graph, 0.0);
        let shadow = graph.add_block(true);
        let shadow_out = graph
            .add_connection(shadow, ConnectionType::OutputValue, Point::default(), TypeChecks::any())
            .unwrap();

        graph.link(input, shadow_out, ConnectMode::Shadow);
        assert_eq!(graph.connection(input).unwrap().shadow_target, Some(shadow_out));
        assert_eq!(graph.connection(input).unwrap().target, None);
        assert_eq!(graph.unlink(input, ConnectMode::Real), None);
        assert_eq!(graph.connection(input).unwrap().shadow_target, Some(shadow_out));
    }

    #[test]
    fn test_subtree_follows_real_and_shadow_children() {
        let mut graph = BlockGraph::new();
        let (top, _, top_input, top_next) = statement_block(&mut graph, 0.0);
        let (middle, middle_prev, _, _) = statement_block(&mut graph, 20.0);
        let (unrelated, _, _, _) = statement_block(&mut graph, 200.0);
        let shadow = graph.add_block(true);
        let shadow_out = graph
            .add_connection(shadow, ConnectionType::OutputValue, Point::default(), TypeChecks::any())
            .unwrap();

        graph.link(top_next, middle_prev, ConnectMode::Real);
        graph.link(top_input, shadow_out, ConnectMode::Shadow);

        let blocks = graph.subtree_blocks(top);
        assert_eq!(blocks[0], top);
        assert!(blocks.contains(&middle));
        assert!(blocks.contains(&shadow));
        assert!(!blocks.contains(&unrelated));

        // The child's subtree does not climb back to the parent
        assert_eq!(graph.subtree_blocks(middle), vec![middle]);
        assert_eq!(graph.subtree_connections(middle).len(), 3);
        assert_eq!(graph.subtree_connections(top).len(), 7);
    }

    #[test]
    fn test_parent_connection() {
        let mut graph = BlockGraph::new();
        let (top, _, _, top_next) = statement_block(&mut graph, 0.0);
        let (child, child_prev, _, _) = statement_block(&mut graph, 20.0);
        assert_eq!(graph.parent_connection(child), None);

        graph.link(top_next, child_prev, ConnectMode::Real);
        assert_eq!(graph.parent_connection(child), Some(top_next));
        assert_eq!(graph.attached_inferior(child), Some(child_prev));
        assert_eq!(graph.parent_connection(top), None);
    }

    #[test]
    fn test_detach_connection() {
        let mut graph = BlockGraph::new();
        let (block, prev, _, _) = statement_block(&mut graph, 0.0);
        assert_eq!(graph.detach_connection(prev), Ok(Some(block)));
        assert_eq!(graph.connection(prev).unwrap().source_block, None);
        assert!(!graph.block(block).unwrap().connections.contains(&prev));
        assert_eq!(graph.detach_connection(prev), Ok(None));
    }

    #[test]
    fn test_is_shadow() {
        let mut graph = BlockGraph::new();
        let (_, prev, _, _) = statement_block(&mut graph, 0.0);
        let shadow = graph.add_block(true);
        let shadow_out = graph
            .add_connection(shadow, ConnectionType::OutputValue, Point::default(), TypeChecks::any())
            .unwrap();
        assert!(!graph.is_shadow(prev));
        assert!(graph.is_shadow(shadow_out));
        assert!(!graph.is_shadow(ConnectionId(999)));
    }

    #[test]
    fn test_highlighted_connections_sorted() {
        let mut graph = BlockGraph::new();
        let (_, prev, input, next) = statement_block(&mut graph, 0.0);
        graph.set_highlighted(next, true).unwrap();
        graph.set_highlighted(prev, true).unwrap();
        assert_eq!(graph.highlighted_connections(), vec![prev, next]);
        assert_eq!(graph.set_highlighted(prev, false), Ok(true));
        assert_eq!(graph.highlighted_connections(), vec![next]);
        assert!(!graph.highlighted_connections().contains(&input));
    }

    #[test]
    fn test_clear_highlights_counts_lit_connections() {
        let mut graph = BlockGraph::new();
        let (_, prev, input, next) = statement_block(&mut graph, 0.0);
        graph.set_highlighted(prev, true).unwrap();
        graph.set_highlighted(next, true).unwrap();

        assert_eq!(graph.clear_highlights(&[prev, input, next, ConnectionId(99)]), 2);
        assert!(graph.highlighted_connections().is_empty());
    }

    #[test]
    fn test_remove_block_returns_connections() {
        let mut graph = BlockGraph::new();
        let (block, _, _, _) = statement_block(&mut graph, 0.0);
        let removed = graph.remove_block(block).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(graph.remove_block(block), Err(ConnectionError::UnknownBlock(block)));
    }
}
