//! Changelog behind board snapshots
//!
//! While a snapshot is open every mutation is recorded; restoring replays
//! the recorded changes in reverse. Releasing the last open snapshot drops
//! the log.

use super::error::BoardError;
use super::item::{BoardItem, ComponentId, ItemId};
use crate::planar::VectorInt;

#[derive(Debug, Clone)]
pub enum Change {
    Inserted(ItemId),
    /// Removed item and its former position in the item store
    Removed { item: BoardItem, index: usize },
    ComponentMoved { id: ComponentId, delta: VectorInt },
}

/// Opaque checkpoint handed out by the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a snapshot must be restored or released"]
pub struct Snapshot {
    id: u64,
}

impl Snapshot {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Default)]
pub struct UndoLog {
    changes: Vec<Change>,
    /// (snapshot id, log position) of open snapshots, oldest first
    open: Vec<(u64, usize)>,
    next_id: u64,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Snapshot {
        self.next_id += 1;
        self.open.push((self.next_id, self.changes.len()));
        Snapshot { id: self.next_id }
    }

    pub fn is_recording(&self) -> bool {
        !self.open.is_empty()
    }

    pub fn record(&mut self, change: Change) {
        if self.is_recording() {
            self.changes.push(change);
        }
    }

    fn position_of(&self, snapshot: Snapshot) -> Result<usize, BoardError> {
        self.open
            .iter()
            .position(|(id, _)| *id == snapshot.id)
            .ok_or(BoardError::StaleSnapshot(snapshot.id))
    }

    /// Closes `snapshot` and every snapshot opened after it, returning the
    /// changes made since it was taken, newest first.
    pub fn take_back_to(&mut self, snapshot: Snapshot) -> Result<Vec<Change>, BoardError> {
        let index = self.position_of(snapshot)?;
        let log_position = self.open[index].1;
        self.open.truncate(index);
        let mut undone = self.changes.split_off(log_position);
        undone.reverse();
        Ok(undone)
    }

    /// Keeps the changes; the log is dropped once no snapshot is open
    pub fn release(&mut self, snapshot: Snapshot) -> Result<(), BoardError> {
        let index = self.position_of(snapshot)?;
        self.open.truncate(index);
        if self.open.is_empty() {
            self.changes.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_snapshots() {
        let mut log = UndoLog::new();
        // not recorded, no snapshot open
        log.record(Change::Inserted(ItemId(1)));

        let outer = log.begin();
        log.record(Change::Inserted(ItemId(2)));
        let inner = log.begin();
        log.record(Change::Inserted(ItemId(3)));
        log.record(Change::Inserted(ItemId(4)));

        let undone = log.take_back_to(inner).unwrap();
        assert!(matches!(undone[0], Change::Inserted(ItemId(4))));
        assert_eq!(undone.len(), 2);
        assert!(matches!(log.take_back_to(inner), Err(BoardError::StaleSnapshot(_))));

        let rest = log.take_back_to(outer).unwrap();
        assert_eq!(rest.len(), 1);
        assert!(matches!(rest[0], Change::Inserted(ItemId(2))));
        assert!(!log.is_recording());
    }

    #[test]
    fn test_release_drops_changes() {
        let mut log = UndoLog::new();
        let first = log.begin();
        log.record(Change::Inserted(ItemId(1)));
        log.release(first).unwrap();
        assert!(!log.is_recording());

        let second = log.begin();
        assert!(log.take_back_to(second).unwrap().is_empty());
    }
}
