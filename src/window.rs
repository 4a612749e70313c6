/// Stop-and-wait block sequencing: exactly one block is ever outstanding.
///
/// Block numbers are a single byte, start at 1 and wrap from 255 to 0.
/// The sender uses `current` as the block awaiting acknowledgment and spends
/// the retry budget on it; the receiver uses `current` as the block it
/// expects next and `last_acked` as the block to re-acknowledge on duplicates.
#[derive(Debug, Clone)]
pub struct Window {
    current: u8,
    last_acked: u8,
    retries: u8,
    max_retries: u8,
    completed: u64,
}

impl Window {
    pub fn new(max_retries: u8) -> Self {
        Self {
            current: 1,
            last_acked: 0,
            retries: 0,
            max_retries,
            completed: 0,
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn last_acked(&self) -> u8 {
        self.last_acked
    }

    pub fn retries(&self) -> u8 {
        self.retries
    }

    /// Number of blocks that have made it through the window.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn is_current(&self, block: u8) -> bool {
        block == self.current
    }

    /// Move past the current block and reset the retry budget.
    pub fn advance(&mut self) {
        self.last_acked = self.current;
        self.current = self.current.wrapping_add(1);
        self.retries = 0;
        self.completed += 1;
    }

    /// Record one timeout for the current block.
    ///
    /// Returns `false` once the retry budget is spent.
    pub fn timed_out(&mut self) -> bool {
        self.retries = self.retries.saturating_add(1);
        self.retries < self.max_retries
    }
}
