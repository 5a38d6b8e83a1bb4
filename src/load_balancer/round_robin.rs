//! Round-robin slot selection.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::{roster::WorkerRoster, LoadBalancer};

/// Round-robin selector.
/// Stores an internal counter to rotate through slots.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_slot(&self, roster: &WorkerRoster) -> Option<usize> {
        let len = roster.len();
        if len == 0 {
            return None;
        }

        // One step per call, kept below `len` so the rotation never jumps at overflow.
        let start = match self
            .counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| Some((c % len + 1) % len))
        {
            Ok(prev) | Err(prev) => prev % len,
        };
        (0..len)
            .map(|i| (start + i) % len)
            .find(|&index| roster.is_accepting(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::SlotState;

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let roster = WorkerRoster::new(3);

        let picks: Vec<_> = (0..5).map(|_| lb.next_slot(&roster).unwrap()).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_rotation_is_continuous_from_large_counter() {
        let lb = RoundRobin {
            counter: AtomicUsize::new(usize::MAX),
        };
        let roster = WorkerRoster::new(3);

        // usize::MAX % 3 == 0
        let picks: Vec<_> = (0..4).map(|_| lb.next_slot(&roster).unwrap()).collect();
        assert_eq!(picks, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_skips_disabled_slots() {
        let lb = RoundRobin::new();
        let roster = WorkerRoster::new(3);
        roster.set(1, SlotState::Disabled);

        let picks: Vec<_> = (0..4).map(|_| lb.next_slot(&roster).unwrap()).collect();
        assert_eq!(picks, vec![0, 2, 2, 0]);
    }

    #[test]
    fn test_restarting_slot_still_selected() {
        let lb = RoundRobin::new();
        let roster = WorkerRoster::new(2);
        roster.set(0, SlotState::Restarting);
        assert_eq!(lb.next_slot(&roster), Some(0));
    }

    #[test]
    fn test_none_when_all_disabled() {
        let lb = RoundRobin::new();
        let roster = WorkerRoster::new(2);
        roster.disable_all();
        assert_eq!(lb.next_slot(&roster), None);
        assert_eq!(lb.next_slot(&WorkerRoster::new(0)), None);
    }
}
