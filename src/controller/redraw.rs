//! Redraw request coalescing.
//!
//! Many state changes can land between two animation frames (drag-over moves, decodes
//! finishing, edits). [`RedrawScheduler`] collapses them into a single pending flag that the host
//! consumes once per frame with [`RedrawScheduler::take_due`].

/// Latest-wins redraw flag plus counters for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct RedrawScheduler {
    pending: bool,
    requested: u64,
    drawn: u64,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a redraw on the next frame. Repeated requests before that frame coalesce.
    pub fn request(&mut self) {
        self.pending = true;
        self.requested += 1;
    }

    /// Consume the pending request, if any. Call once per animation frame.
    pub fn take_due(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.drawn += 1;
        true
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Total `request()` calls so far.
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Total frames that actually redrew.
    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}

#[cfg(test)]
#[path = "../../tests/unit/controller/redraw.rs"]
mod tests;
