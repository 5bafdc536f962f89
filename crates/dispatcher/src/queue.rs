//! Submission queue and cycle state machine
//!
//! Both live behind the dispatcher's single mutex. Every transition
//! (`Dormant -> Active` on push, `Active -> Dormant` at the end of a window)
//! happens while that lock is held, so "is the cycle running" is never
//! ambiguous for a concurrent submitter.

use std::collections::VecDeque;
use tokio::time::Instant;

/// Cycle controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    /// No controller task exists
    #[default]
    Dormant,
    /// A controller task is ticking
    Active,
}

/// Queued document plus its arrival order
#[derive(Debug)]
pub struct PendingItem<D> {
    /// Enqueue order, strictly increasing per dispatcher
    pub sequence: u64,
    /// Enqueue time (used for queue-wait statistics)
    pub enqueued_at: Instant,
    pub document: D,
}

/// Result of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    pub sequence: u64,
    /// Queue length after the push
    pub queue_len: usize,
    /// The push moved the cycle from `Dormant` to `Active`; the caller owns
    /// starting the controller.
    pub activated: bool,
}

/// What the controller must do after a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    /// Items remain, keep ticking
    Continue { remaining: usize },
    /// Queue observed empty, cycle is now `Dormant`; stop the controller
    Deactivated,
}

/// FIFO queue + cycle state
#[derive(Debug)]
pub struct SubmissionQueue<D> {
    items: VecDeque<PendingItem<D>>,
    cycle: CycleState,
    next_sequence: u64,
}

impl<D> SubmissionQueue<D> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            cycle: CycleState::Dormant,
            next_sequence: 0,
        }
    }

    /// Append to the tail, activating the cycle if it was dormant
    pub fn push(&mut self, document: D) -> Enqueued {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.items.push_back(PendingItem {
            sequence,
            enqueued_at: Instant::now(),
            document,
        });

        Enqueued {
            sequence,
            queue_len: self.items.len(),
            activated: self.activate(),
        }
    }

    /// Pop the head item
    ///
    /// The drain pops one item per dispatch, so documents pushed while a
    /// window is in flight can still be picked up by that window.
    pub fn pop(&mut self) -> Option<PendingItem<D>> {
        self.items.pop_front()
    }

    /// Dormancy decision taken after a window's bounded drain
    pub fn finish_window(&mut self) -> WindowOutcome {
        if self.items.is_empty() {
            self.deactivate();
            WindowOutcome::Deactivated
        } else {
            WindowOutcome::Continue {
                remaining: self.items.len(),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cycle(&self) -> CycleState {
        self.cycle
    }

    /// Returns true only on an actual `Dormant -> Active` transition
    fn activate(&mut self) -> bool {
        match self.cycle {
            CycleState::Dormant => {
                self.cycle = CycleState::Active;
                true
            }
            CycleState::Active => false,
        }
    }

    fn deactivate(&mut self) {
        self.cycle = CycleState::Dormant;
    }

    /// Force `Dormant` after the controller task vanished without finishing
    /// a window; queued items stay for the next activation.
    ///
    /// Returns true if the cycle was `Active`.
    pub fn abandon_cycle(&mut self) -> bool {
        let was_active = self.cycle == CycleState::Active;
        self.deactivate();
        was_active
    }
}

impl<D> Default for SubmissionQueue<D> {
    fn default() -> Self {
        Self::new()
    }
}
