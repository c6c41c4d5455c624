use crate::synth::note::NoteId;
use std::collections::VecDeque;
use std::time::Instant;

/// A released voice waiting for its release ramp to finish.
///
/// Owns the handle it will free, so a later voice for the same note can never
/// be reached through it.
#[derive(Debug)]
pub struct PendingCleanup<H> {
    pub note: NoteId,
    pub handle: H,
    pub due: Instant,
}

/// One-shot cleanup tasks in the order they were scheduled.
///
/// Every task is scheduled with the same delay, so deadlines never decrease
/// from front to back.
#[derive(Debug)]
pub struct CleanupQueue<H> {
    tasks: VecDeque<PendingCleanup<H>>,
}

impl<H> CleanupQueue<H> {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    pub fn schedule(&mut self, note: NoteId, handle: H, due: Instant) {
        debug_assert!(self.tasks.back().map_or(true, |last| last.due <= due));
        self.tasks.push_back(PendingCleanup { note, handle, due });
    }

    /// Removes and returns every task whose deadline is at or before `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<PendingCleanup<H>> {
        let ready = self.tasks.iter().take_while(|task| task.due <= now).count();
        self.tasks.drain(..ready).collect()
    }

    /// Removes every task regardless of its deadline.
    pub fn take_all(&mut self) -> Vec<PendingCleanup<H>> {
        self.tasks.drain(..).collect()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.front().map(|task| task.due)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<H> Default for CleanupQueue<H> {
    fn default() -> Self {
        Self::new()
    }
}
