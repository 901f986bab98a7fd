//! Connection value types: handles, connector kinds, positions and type checks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Handle of a block in the [`BlockGraph`](crate::graph::BlockGraph) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

/// Handle of a connection in the [`BlockGraph`](crate::graph::BlockGraph) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

/// Handle of a [`ConnectionGroup`](crate::group::ConnectionGroup) owned by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// The four connector kinds a block can expose.
///
/// They pair up categorically: a previous-statement connector attaches to a
/// next-statement connector, and an input-value connector to an output-value
/// connector. The "superior" side of each pair belongs to the parent block,
/// the "inferior" side to the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    PreviousStatement,
    NextStatement,
    InputValue,
    OutputValue,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 4] = [
        ConnectionType::PreviousStatement,
        ConnectionType::NextStatement,
        ConnectionType::InputValue,
        ConnectionType::OutputValue,
    ];

    /// The only kind this kind may connect to.
    pub fn opposite(self) -> ConnectionType {
        match self {
            ConnectionType::PreviousStatement => ConnectionType::NextStatement,
            ConnectionType::NextStatement => ConnectionType::PreviousStatement,
            ConnectionType::InputValue => ConnectionType::OutputValue,
            ConnectionType::OutputValue => ConnectionType::InputValue,
        }
    }

    /// Parent-side connector (next statement or input value).
    pub fn is_superior(self) -> bool {
        matches!(self, ConnectionType::NextStatement | ConnectionType::InputValue)
    }

    /// Child-side connector (previous statement or output value).
    pub fn is_inferior(self) -> bool {
        !self.is_superior()
    }

    /// Dense index used to address per-type storage.
    pub fn index(self) -> usize {
        match self {
            ConnectionType::PreviousStatement => 0,
            ConnectionType::NextStatement => 1,
            ConnectionType::InputValue => 2,
            ConnectionType::OutputValue => 3,
        }
    }
}

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        self.distance_sq_to(other).sqrt()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Neither coordinate is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Optional set of type-check tags restricting which connections may pair.
///
/// `TypeChecks::any()` carries no constraint at all. A present but empty set
/// accepts nothing, not even another empty set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeChecks(Option<BTreeSet<String>>);

impl TypeChecks {
    /// No constraint: compatible with everything.
    pub fn any() -> Self {
        Self(None)
    }

    /// Constraint that no tag satisfies.
    pub fn none() -> Self {
        Self(Some(BTreeSet::new()))
    }

    pub fn is_constrained(&self) -> bool {
        self.0.is_some()
    }

    pub fn tags(&self) -> Option<&BTreeSet<String>> {
        self.0.as_ref()
    }

    pub fn compatible_with(&self, other: &TypeChecks) -> bool {
        match (&self.0, &other.0) {
            (None, _) | (_, None) => true,
            (Some(ours), Some(theirs)) => ours.intersection(theirs).next().is_some(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for TypeChecks {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(Some(iter.into_iter().map(Into::into).collect()))
    }
}

/// A single connector belonging to one block.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub connection_type: ConnectionType,
    pub position: Point,
    pub type_checks: TypeChecks,
    /// Owning block; `None` once the connection has been detached.
    pub source_block: Option<BlockId>,
    pub target: Option<ConnectionId>,
    pub shadow_target: Option<ConnectionId>,
    /// Visual feedback flag read by the renderer.
    pub highlighted: bool,
    /// Group currently tracking this connection. Lookup only, never ownership.
    pub group: Option<GroupId>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        connection_type: ConnectionType,
        position: Point,
        source_block: BlockId,
    ) -> Self {
        Self {
            id,
            connection_type,
            position,
            type_checks: TypeChecks::any(),
            source_block: Some(source_block),
            target: None,
            shadow_target: None,
            highlighted: false,
            group: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_shadow_connected(&self) -> bool {
        self.shadow_target.is_some()
    }

    pub fn is_tracked(&self) -> bool {
        self.group.is_some()
    }
}
