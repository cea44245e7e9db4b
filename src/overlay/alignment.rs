/// Holds the alignment flag shown to the user; changes only on a real flip
#[derive(Debug, Clone, Default)]
pub struct AlignmentTracker {
    aligned: bool,
    changes: u64,
}

impl AlignmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    /// Record the latest match result; returns whether the value changed
    pub fn update(&mut self, aligned: bool) -> bool {
        if self.aligned == aligned {
            return false;
        }
        self.aligned = aligned;
        self.changes += 1;
        true
    }

    /// Back to "not aligned", e.g. when the template or camera changes
    pub fn reset(&mut self) -> bool {
        self.update(false)
    }

    /// Number of value changes so far
    pub fn changes(&self) -> u64 {
        self.changes
    }
}
