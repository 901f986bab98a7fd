//! Y-sorted list of connections of a single type.
//!
//! [`SortedConnectionList`] keeps its entries ordered by vertical canvas
//! coordinate so that proximity queries only need to look at the slice of
//! entries whose Y lies within the search radius. Each entry records the
//! position it was inserted with; a connection that moves must be removed at
//! its old position and re-inserted at the new one.
//!
//! # Example
//!
//! ```
//! use block_connections::{ConnectionId, Point, SortedConnectionList};
//!
//! let mut list = SortedConnectionList::new();
//! list.insert(ConnectionId(1), Point::new(0.0, 5.0));
//! list.insert(ConnectionId(2), Point::new(0.0, 1.0));
//!
//! let (closest, distance) = list.closest(Point::new(0.0, 2.0), 10.0).unwrap();
//! assert_eq!(closest, ConnectionId(2));
//! assert_eq!(distance, 1.0);
//! ```

use crate::connection::{ConnectionId, Point};

/// A tracked connection together with the position it was sorted by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListEntry {
    pub id: ConnectionId,
    pub position: Point,
}

/// Connections of one type ordered by non-decreasing Y.
#[derive(Debug, Clone, Default)]
pub struct SortedConnectionList {
    entries: Vec<ListEntry>,
}

impl SortedConnectionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ListEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListEntry> + '_ {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.entries.iter().map(|entry| entry.id)
    }

    /// Index at which an entry with the given Y would be inserted.
    ///
    /// Returns the first index whose Y is not less than `y`, so an insert
    /// lands before any existing entries with an identical Y.
    pub fn index_for_insertion(&self, y: f32) -> usize {
        self.entries.partition_point(|entry| entry.position.y < y)
    }

    /// Insert a connection at its sorted position.
    pub fn insert(&mut self, id: ConnectionId, position: Point) {
        let index = self.index_for_insertion(position.y);
        self.entries.insert(index, ListEntry { id, position });
    }

    /// Index of a tracked connection, given the Y it was inserted with.
    ///
    /// Binary search only lands on the run of entries sharing that Y, so the
    /// run is scanned for the matching id.
    pub fn find(&self, id: ConnectionId, y: f32) -> Option<usize> {
        let start = self.index_for_insertion(y);
        self.entries[start..]
            .iter()
            .take_while(|entry| entry.position.y == y)
            .position(|entry| entry.id == id)
            .map(|offset| start + offset)
    }

    pub fn contains(&self, id: ConnectionId, y: f32) -> bool {
        self.find(id, y).is_some()
    }

    /// Remove a connection. Returns `false` if it was not found at `y`.
    pub fn remove(&mut self, id: ConnectionId, y: f32) -> bool {
        match self.find(id, y) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every entry for `id` wherever it sits. Linear; used only to
    /// recover when an entry is not found at its recorded Y.
    pub fn purge(&mut self, id: ConnectionId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before - self.entries.len()
    }

    /// Move a tracked connection from `old_y` to a new position.
    pub fn reposition(&mut self, id: ConnectionId, old_y: f32, position: Point) -> bool {
        if !self.remove(id, old_y) {
            return false;
        }
        self.insert(id, position);
        true
    }

    /// Index range of entries whose Y lies within `[y - radius, y + radius]`.
    fn window(&self, y: f32, max_radius: f32) -> (usize, usize) {
        let low = self
            .entries
            .partition_point(|entry| entry.position.y < y - max_radius);
        let high = self
            .entries
            .partition_point(|entry| entry.position.y <= y + max_radius);
        (low, high.max(low))
    }

    /// All connections within `max_radius` of `probe`, in list order.
    pub fn neighbors(&self, probe: Point, max_radius: f32) -> Vec<ConnectionId> {
        if max_radius < 0.0 {
            return Vec::new();
        }
        let (low, high) = self.window(probe.y, max_radius);
        let radius_sq = max_radius * max_radius;
        self.entries[low..high]
            .iter()
            .filter(|entry| entry.position.distance_sq_to(&probe) <= radius_sq)
            .map(|entry| entry.id)
            .collect()
    }

    /// Closest connection within `max_radius` of `probe`.
    pub fn closest(&self, probe: Point, max_radius: f32) -> Option<(ConnectionId, f32)> {
        self.closest_matching(probe, max_radius, |_| true)
    }

    /// Closest connection within `max_radius` of `probe` that passes `accept`.
    ///
    /// Scans outward from the probe's insertion point in both directions and
    /// stops each direction once the vertical gap alone exceeds the best
    /// distance found so far. On equal distances the first candidate seen
    /// wins.
    pub fn closest_matching<F>(
        &self,
        probe: Point,
        max_radius: f32,
        mut accept: F,
    ) -> Option<(ConnectionId, f32)>
    where
        F: FnMut(ConnectionId) -> bool,
    {
        if self.entries.is_empty() || max_radius < 0.0 {
            return None;
        }

        let mut best: Option<(ConnectionId, f32)> = None;
        let mut radius = max_radius;
        let start = self.index_for_insertion(probe.y);

        let mut consider = |entry: &ListEntry, best: &mut Option<(ConnectionId, f32)>, radius: &mut f32| {
            let distance = entry.position.distance_to(&probe);
            let better = match best {
                Some((_, best_distance)) => distance < *best_distance,
                None => distance <= *radius,
            };
            if better && accept(entry.id) {
                *best = Some((entry.id, distance));
                *radius = distance;
            }
        };

        for entry in &self.entries[start..] {
            if entry.position.y - probe.y > radius {
                break;
            }
            consider(entry, &mut best, &mut radius);
        }
        for entry in self.entries[..start].iter().rev() {
            if probe.y - entry.position.y > radius {
                break;
            }
            consider(entry, &mut best, &mut radius);
        }

        best
    }

    /// Move every entry into `other`, leaving this list empty.
    ///
    /// Both lists are already sorted, so this is a linear merge. Returns the
    /// number of entries moved.
    pub fn transfer_all_to(&mut self, other: &mut SortedConnectionList) -> usize {
        let moved = self.entries.len();
        if moved == 0 {
            return 0;
        }
        if other.entries.is_empty() {
            std::mem::swap(&mut self.entries, &mut other.entries);
            return moved;
        }

        let ours = std::mem::take(&mut self.entries);
        let theirs = std::mem::take(&mut other.entries);
        let mut merged = Vec::with_capacity(ours.len() + theirs.len());
        let mut ours = ours.into_iter().peekable();
        let mut theirs = theirs.into_iter().peekable();

        loop {
            let take_ours = match (ours.peek(), theirs.peek()) {
                (Some(a), Some(b)) => a.position.y < b.position.y,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let next = if take_ours { ours.next() } else { theirs.next() };
            merged.extend(next);
        }

        other.entries = merged;
        moved
    }

    /// Check the non-decreasing Y invariant.
    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].position.y <= pair[1].position.y)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
