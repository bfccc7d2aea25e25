//! Ordering configuration.

/// Tunables of the ordering layer, separate from the room parameters every
/// peer must agree on.
#[derive(Debug, Clone)]
pub struct OrderingConfig {
    /// Delay between a peer connecting and the `SYNC_CLOCK` hint sent to
    /// it, letting the new connection settle first.
    pub clock_sync_settle_ms: i64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            clock_sync_settle_ms: 100,
        }
    }
}

impl OrderingConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clock-sync settle delay.
    pub fn with_clock_sync_settle_ms(mut self, ms: i64) -> Self {
        self.clock_sync_settle_ms = ms;
        self
    }
}
