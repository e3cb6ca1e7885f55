//! Snapshot-based undo for the scheduler.
//!
//! Every committed mutation pushes a [`SchedulerMemento`] — a deep copy of
//! the diary map and the shared-resource list — onto an unbounded LIFO
//! history. Undo pops the most recent snapshot and swaps it back in wholesale.
//! There is no redo: once a new mutation is recorded after an undo, the
//! discarded future is gone.

use crate::diary::Diary;
use crate::types::{Professional, Resource};
use std::collections::BTreeMap;

/// An immutable deep snapshot of scheduler state at one instant.
///
/// All captured data is owned, so `Clone` is the deep copy; a memento is
/// only ever consumed by restoration, never mutated.
#[derive(Clone, Debug)]
pub struct SchedulerMemento {
    diaries: BTreeMap<Professional, Diary>,
    shared_resources: Vec<Resource>,
}

impl SchedulerMemento {
    pub(crate) fn capture(
        diaries: &BTreeMap<Professional, Diary>,
        shared_resources: &[Resource],
    ) -> Self {
        Self {
            diaries: diaries.clone(),
            shared_resources: shared_resources.to_vec(),
        }
    }

    pub(crate) fn into_state(self) -> (BTreeMap<Professional, Diary>, Vec<Resource>) {
        (self.diaries, self.shared_resources)
    }
}

/// LIFO history of scheduler snapshots.
#[derive(Debug, Default)]
pub struct UndoManager {
    history: Vec<SchedulerMemento>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn save(&mut self, memento: SchedulerMemento) {
        self.history.push(memento);
        tracing::debug!(depth = self.history.len(), "saved undo point");
    }

    /// Takes the most recent snapshot off the history, if any.
    pub(crate) fn pop(&mut self) -> Option<SchedulerMemento> {
        self.history.pop()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
