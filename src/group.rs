//! Partition of tracked connections into independently queryable sets.

use crate::connection::{BlockId, ConnectionId, ConnectionType, GroupId};
use crate::sorted_list::SortedConnectionList;

/// Four [`SortedConnectionList`]s, one per [`ConnectionType`].
///
/// The manager keeps one long-lived main group for settled blocks and creates
/// short-lived groups for subtrees held out of it (typically the subtree being
/// dragged), so that a dragged subtree never matches its own connections.
#[derive(Debug, Clone)]
pub struct ConnectionGroup {
    id: GroupId,
    owner: Option<BlockId>,
    lists: [SortedConnectionList; 4],
    drag_mode: bool,
    deferred: Vec<ConnectionId>,
}

impl ConnectionGroup {
    pub fn new(id: GroupId, owner: Option<BlockId>) -> Self {
        Self::with_capacity(id, owner, 0)
    }

    pub fn with_capacity(id: GroupId, owner: Option<BlockId>, capacity: usize) -> Self {
        Self {
            id,
            owner,
            lists: std::array::from_fn(|_| SortedConnectionList::with_capacity(capacity)),
            drag_mode: false,
            deferred: Vec::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Root block of the subtree this group was started for.
    pub fn owner(&self) -> Option<BlockId> {
        self.owner
    }

    pub fn list_for(&self, connection_type: ConnectionType) -> &SortedConnectionList {
        &self.lists[connection_type.index()]
    }

    pub fn list_for_mut(&mut self, connection_type: ConnectionType) -> &mut SortedConnectionList {
        &mut self.lists[connection_type.index()]
    }

    /// Every connection in the group, list by list.
    pub fn all_connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.lists.iter().flat_map(|list| list.ids())
    }

    pub fn len(&self) -> usize {
        self.lists.iter().map(SortedConnectionList::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(SortedConnectionList::is_empty)
    }

    pub fn is_drag_mode(&self) -> bool {
        self.drag_mode
    }

    /// Toggle drag mode.
    ///
    /// Leaving drag mode returns the connections whose housekeeping was
    /// deferred while it was on.
    pub fn set_drag_mode(&mut self, drag_mode: bool) -> Vec<ConnectionId> {
        self.drag_mode = drag_mode;
        if drag_mode {
            Vec::new()
        } else {
            std::mem::take(&mut self.deferred)
        }
    }

    /// Queue a moved connection for housekeeping once drag mode ends.
    pub(crate) fn defer(&mut self, id: ConnectionId) {
        if !self.deferred.contains(&id) {
            self.deferred.push(id);
        }
    }

    pub fn deferred(&self) -> &[ConnectionId] {
        &self.deferred
    }

    /// Hand over the deferred queue without leaving drag mode.
    pub(crate) fn take_deferred(&mut self) -> Vec<ConnectionId> {
        std::mem::take(&mut self.deferred)
    }

    /// Merge every list into the matching list of `other`.
    ///
    /// Only the lists move; the deferred queue stays behind for the caller
    /// to settle. Returns the number of connections moved.
    pub fn transfer_all_to(&mut self, other: &mut ConnectionGroup) -> usize {
        let mut moved = 0;
        for (ours, theirs) in self.lists.iter_mut().zip(other.lists.iter_mut()) {
            moved += ours.transfer_all_to(theirs);
        }
        moved
    }

    pub(crate) fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
        self.deferred.clear();
    }

    /// Check the sortedness invariant of every list.
    pub fn is_sorted(&self) -> bool {
        self.lists.iter().all(SortedConnectionList::is_sorted)
    }
}
