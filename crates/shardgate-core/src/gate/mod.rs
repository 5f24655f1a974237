//! Sliding-window admission control expressed as dependency edges.
//!
//! The gate never runs anything. For every new job it answers one question: which earlier job must
//! finish before this one may start. Chaining job `i` to job `i - W` bounds the backlog of
//! outstanding jobs to `W` on any executor that honours "B depends on A" edges.
use std::collections::{VecDeque, vec_deque};

use tracing::trace;

use crate::error::CoreError;

/// Bounded FIFO of the most recently registered job handles.
///
/// The window holds at most `capacity` handles, oldest first. It is a queue, not a set:
/// registering the same handle twice stores it twice.
///
/// Not synchronized; a driver that submits from several tasks must serialize `register` calls itself.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate<H> {
    window: VecDeque<H>,
    capacity: usize,
    registered: u64,
}

impl<H: Clone> ConcurrencyGate<H> {
    /// Create a gate admitting at most `max_parallel` outstanding jobs.
    ///
    /// `max_parallel == 0` is rejected: every job would have to wait on itself.
    pub fn new(max_parallel: usize) -> Result<Self, CoreError> {
        if max_parallel == 0 {
            return Err(CoreError::Configuration(
                "max parallel jobs must be at least 1".into(),
            ));
        }
        Ok(Self {
            window: VecDeque::with_capacity(max_parallel),
            capacity: max_parallel,
            registered: 0,
        })
    }

    /// Register a freshly minted handle and return the job it must wait for.
    ///
    /// The dependency set is either empty (`None`, the first `capacity` registrations) or exactly
    /// the oldest handle in the window, which is evicted in the same step.
    pub fn register(&mut self, handle: H) -> Option<H> {
        let after = if self.window.len() >= self.capacity {
            self.window.pop_front()
        } else {
            None
        };
        self.window.push_back(handle);
        self.registered += 1;

        trace!(
            seq = self.registered,
            window = self.window.len(),
            gated = after.is_some(),
            "handle registered"
        );
        after
    }

    /// The handle the next `register` call would return, without changing the window.
    ///
    /// Lets a caller submit a job first and register it only once the submission succeeded.
    pub fn next_dependency(&self) -> Option<&H> {
        if self.window.len() >= self.capacity {
            self.window.front()
        } else {
            None
        }
    }

    /// Configured maximum number of outstanding jobs.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of handles currently in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Total number of handles registered over the gate's lifetime.
    #[inline]
    pub fn registered(&self) -> u64 {
        self.registered
    }

    /// Handles in the window, oldest first.
    pub fn window(&self) -> vec_deque::Iter<'_, H> {
        self.window.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_a_configuration_error() {
        let res = ConcurrencyGate::<&str>::new(0);
        assert!(matches!(res, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn window_of_two_chains_to_second_previous_job() {
        let mut gate = ConcurrencyGate::new(2).unwrap();

        let deps: Vec<_> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|h| gate.register(h))
            .collect();

        assert_eq!(deps, vec![None, None, Some("A"), Some("B")]);
        assert_eq!(gate.window().copied().collect::<Vec<_>>(), vec!["C", "D"]);
        assert_eq!(gate.registered(), 4);
    }

    #[test]
    fn next_dependency_matches_register_without_mutating() {
        let mut gate = ConcurrencyGate::new(2).unwrap();
        assert_eq!(gate.next_dependency(), None);

        gate.register("A");
        gate.register("B");
        assert_eq!(gate.next_dependency(), Some(&"A"));
        assert_eq!(gate.next_dependency(), Some(&"A"));
        assert_eq!(gate.len(), 2);

        assert_eq!(gate.register("C"), Some("A"));
        assert_eq!(gate.next_dependency(), Some(&"B"));
    }

    #[test]
    fn window_of_one_serializes_jobs() {
        let mut gate = ConcurrencyGate::new(1).unwrap();

        assert_eq!(gate.register(1), None);
        assert_eq!(gate.register(2), Some(1));
        assert_eq!(gate.register(3), Some(2));
        assert_eq!(gate.len(), 1);
    }

    #[test]
    fn first_capacity_registrations_are_free() {
        let mut gate = ConcurrencyGate::new(5).unwrap();
        for i in 0..5 {
            assert_eq!(gate.register(i), None, "registration {i} must not be gated");
        }
        assert_eq!(gate.register(5), Some(0));
    }

    #[test]
    fn duplicate_handles_are_kept_as_separate_entries() {
        let mut gate = ConcurrencyGate::new(2).unwrap();

        gate.register("X");
        gate.register("X");
        assert_eq!(gate.len(), 2);
        assert_eq!(gate.register("Y"), Some("X"));
        assert_eq!(gate.register("Z"), Some("X"));
    }

    #[test]
    fn new_gate_is_empty() {
        let gate = ConcurrencyGate::<u32>::new(3).unwrap();
        assert!(gate.is_empty());
        assert_eq!(gate.capacity(), 3);
        assert_eq!(gate.registered(), 0);
    }
}
