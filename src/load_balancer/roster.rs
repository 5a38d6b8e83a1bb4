//! Per-slot liveness shared between the supervisor and the router.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of one pool slot.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Live = 0,
    /// Worker crashed and is being recreated; its mailbox still queues.
    Restarting = 1,
    /// Restart budget exhausted; no new dispatch.
    Disabled = 2,
}

impl From<u8> for SlotState {
    fn from(val: u8) -> Self {
        match val {
            1 => SlotState::Restarting,
            2 => SlotState::Disabled,
            _ => SlotState::Live,
        }
    }
}

/// Fixed-size table of slot states.
#[derive(Debug)]
pub struct WorkerRoster {
    slots: Box<[AtomicU8]>,
}

impl WorkerRoster {
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(|_| AtomicU8::new(SlotState::Live as u8)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn state(&self, index: usize) -> SlotState {
        self.slots
            .get(index)
            .map(|s| SlotState::from(s.load(Ordering::Acquire)))
            .unwrap_or(SlotState::Disabled)
    }

    pub fn set(&self, index: usize, state: SlotState) {
        if let Some(slot) = self.slots.get(index) {
            slot.store(state as u8, Ordering::Release);
        }
    }

    /// True if the slot takes new messages (live or mid-restart).
    pub fn is_accepting(&self, index: usize) -> bool {
        self.state(index) != SlotState::Disabled
    }

    pub fn accepting_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_accepting(i)).count()
    }

    pub fn disable_all(&self) {
        for slot in self.slots.iter() {
            slot.store(SlotState::Disabled as u8, Ordering::Release);
        }
    }
}
