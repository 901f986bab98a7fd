//! Common test utilities for integration tests.

#![allow(dead_code)]

use block_connections::{
    BlockId, ConnectionId, ConnectionManager, ConnectionType, GroupId, Point, TypeChecks,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic RNG so failures reproduce.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A block with a single connection, tracked in the main group.
pub fn single(
    manager: &mut ConnectionManager,
    ty: ConnectionType,
    at: Point,
) -> (BlockId, ConnectionId) {
    single_checked(manager, ty, at, TypeChecks::any())
}

pub fn single_checked(
    manager: &mut ConnectionManager,
    ty: ConnectionType,
    at: Point,
    checks: TypeChecks,
) -> (BlockId, ConnectionId) {
    let block = manager.graph_mut().add_block(false);
    let id = manager.add_connection(block, ty, at, checks).unwrap();
    (block, id)
}

/// A shadow block with a single connection, tracked in the main group.
pub fn shadow_single(
    manager: &mut ConnectionManager,
    ty: ConnectionType,
    at: Point,
) -> (BlockId, ConnectionId) {
    let block = manager.graph_mut().add_block(true);
    let id = manager.add_connection(block, ty, at, TypeChecks::any()).unwrap();
    (block, id)
}

/// A statement block with previous and next connections 20 units apart.
pub struct Statement {
    pub block: BlockId,
    pub previous: ConnectionId,
    pub next: ConnectionId,
}

pub fn statement(manager: &mut ConnectionManager, x: f32, y: f32) -> Statement {
    let block = manager.graph_mut().add_block(false);
    let previous = manager
        .add_connection(block, ConnectionType::PreviousStatement, Point::new(x, y), TypeChecks::any())
        .unwrap();
    let next = manager
        .add_connection(block, ConnectionType::NextStatement, Point::new(x, y + 20.0), TypeChecks::any())
        .unwrap();
    Statement { block, previous, next }
}

/// Scatter `count` single-connection blocks of random type over a square canvas.
pub fn scatter(manager: &mut ConnectionManager, rng: &mut StdRng, count: usize, extent: f32) -> Vec<ConnectionId> {
    (0..count)
        .map(|_| {
            let ty = ConnectionType::ALL[rng.gen_range(0..ConnectionType::ALL.len())];
            let at = Point::new(rng.gen_range(0.0..extent), rng.gen_range(0.0..extent));
            single(manager, ty, at).1
        })
        .collect()
}

/// Check that every group's lists are sorted and agree with the graph's
/// back-references and positions.
pub fn assert_consistent(manager: &ConnectionManager) {
    let mut listed = 0;
    for group in manager.groups() {
        assert!(group.is_sorted(), "{} is not sorted", group.id());
        for ty in ConnectionType::ALL {
            for entry in group.list_for(ty).iter() {
                let connection = manager.graph().connection(entry.id).unwrap();
                assert_eq!(connection.connection_type, ty);
                assert_eq!(connection.group, Some(group.id()));
                assert_eq!(connection.position, entry.position);
                listed += 1;
            }
        }
    }
    let tracked = manager.graph().connections().filter(|c| c.is_tracked()).count();
    assert_eq!(listed, tracked, "tracked connections missing from lists");
}

/// Number of connections tracked in `group`.
pub fn group_len(manager: &ConnectionManager, group: GroupId) -> usize {
    manager.group(group).map_or(0, |g| g.len())
}
