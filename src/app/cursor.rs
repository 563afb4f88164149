//! Inbound update cursor.
//!
//! Marks the last consumed update id.  Only ever moves forward; it resets
//! only when the process restarts.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    last: Option<u64>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the last consumed update.
    pub fn last(&self) -> Option<u64> {
        self.last
    }

    /// Offset to request from the bot API: one past the last consumed id.
    pub fn next_offset(&self) -> Option<u64> {
        self.last.map(|id| id.saturating_add(1))
    }

    /// Whether `id` has not been consumed yet.
    pub fn is_fresh(&self, id: u64) -> bool {
        self.last.is_none_or(|last| id > last)
    }

    /// Consume `id`.  Returns `false` (and stays put) for an id at or
    /// behind the cursor.
    pub fn advance(&mut self, id: u64) -> bool {
        if !self.is_fresh(id) {
            return false;
        }
        self.last = Some(id);
        true
    }
}
