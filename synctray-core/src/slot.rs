use tracing::debug;

/// One reusable display position in the popup's file list.
///
/// Invariant: across a pool, at most one slot holds a given `bound_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub index: usize,
    pub bound_id: Option<String>,
    pub done: bool,
}

/// Fixed-capacity pool of display slots with a recycling policy.
///
/// The pool is smaller than the unbounded stream of item ids, so a `done`
/// slot may be handed to a new id once no free slot remains. When neither
/// a free nor a done slot exists, `claim` reports exhaustion and the
/// caller drops the event — backpressure, not an error.
#[derive(Debug)]
pub struct SlotPool {
    slots: Vec<Slot>,
}

impl SlotPool {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|index| Slot {
                index,
                bound_id: None,
                done: false,
            })
            .collect();
        Self { slots }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Claim a slot for `id`. Scan order is fixed and deterministic:
    /// 1. a slot already bound to `id` (idempotent re-claim),
    /// 2. the lowest-index free slot,
    /// 3. the lowest-index `done` slot, reset and rebound to `id`,
    /// 4. `None` — pool exhausted, the event is simply not rendered.
    pub fn claim(&mut self, id: &str) -> Option<usize> {
        if let Some(slot) = self
            .slots
            .iter()
            .find(|slot| slot.bound_id.as_deref() == Some(id))
        {
            return Some(slot.index);
        }

        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.bound_id.is_none()) {
            slot.bound_id = Some(id.to_owned());
            return Some(slot.index);
        }

        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.done) {
            debug!(index = slot.index, new_id = id, "recycling done slot");
            slot.bound_id = Some(id.to_owned());
            slot.done = false;
            return Some(slot.index);
        }

        debug!(id, "slot pool exhausted, dropping event");
        None
    }

    /// Mark a slot done. The binding survives until a future `claim`
    /// recycles the slot, so late events for the same id still match.
    pub fn mark_done(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.done = true;
        }
    }
}
