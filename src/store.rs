//! Summary store.
//!
//! Memoizes exploration results per method. A slot is reserved in the
//! [`Pending`][Slot::Pending] state *before* the engine is invoked and overwritten
//! with the summary only if the invocation succeeds. A method whose slot is still
//! pending after a run was attempted but did not produce a result; a method with no
//! slot at all was never attempted.
//!
//! Entries are kept in insertion order, so iterating the store replays the order in
//! which methods were explored.

use indexmap::IndexMap;
use log::debug;

use crate::image::MethodHandle;

/// State of a store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<T> {
    /// Invocation started but did not complete.
    Pending,
    /// Invocation completed with a summary.
    Done(T),
}

impl<T> Slot<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending)
    }

    pub fn summary(&self) -> Option<&T> {
        match self {
            Slot::Pending => None,
            Slot::Done(summary) => Some(summary),
        }
    }
}

/// Mapping from method handle to [`Slot`].
#[derive(Debug, Clone)]
pub struct SummaryStore<T> {
    slots: IndexMap<MethodHandle, Slot<T>>,
}

impl<T> Default for SummaryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SummaryStore<T> {
    pub fn new() -> Self {
        Self { slots: IndexMap::new() }
    }

    /// Returns the number of slots, pending ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Reserve a pending slot for `method`.
    ///
    /// Reserving an existing slot resets it to pending; its position is kept.
    pub fn reserve(&mut self, method: &MethodHandle) {
        debug!("reserve({})", method);
        self.slots.insert(method.clone(), Slot::Pending);
    }

    /// Record the summary of `method`, overwriting its slot.
    pub fn record(&mut self, method: &MethodHandle, summary: T) {
        debug!("record({})", method);
        self.slots.insert(method.clone(), Slot::Done(summary));
    }

    pub fn slot(&self, method: &MethodHandle) -> Option<&Slot<T>> {
        self.slots.get(method)
    }

    /// Get the recorded summary of `method`, if its invocation completed.
    pub fn get(&self, method: &MethodHandle) -> Option<&T> {
        self.slot(method)?.summary()
    }

    /// Check whether `method` was ever attempted.
    pub fn is_attempted(&self, method: &MethodHandle) -> bool {
        self.slots.contains_key(method)
    }

    /// Check whether `method` was attempted without producing a summary.
    pub fn is_pending(&self, method: &MethodHandle) -> bool {
        self.slot(method).is_some_and(Slot::is_pending)
    }

    /// Iterate over all slots in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&MethodHandle, &Slot<T>)> {
        self.slots.iter()
    }

    /// Methods attempted without producing a summary.
    pub fn pending(&self) -> impl Iterator<Item = &MethodHandle> {
        self.slots.iter().filter(|(_, slot)| slot.is_pending()).map(|(m, _)| m)
    }

    /// Methods with a recorded summary.
    pub fn completed(&self) -> impl Iterator<Item = (&MethodHandle, &T)> {
        self.slots.iter().filter_map(|(m, slot)| slot.summary().map(|s| (m, s)))
    }
}
