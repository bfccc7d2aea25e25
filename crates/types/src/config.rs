//! Room configuration.

/// Immutable per-session room configuration.
///
/// All peers in a room must share identical values; divergence is a fatal
/// configuration error and is not recovered at runtime. `t0_ms` is the
/// nominal session origin — the live origin is owned by
/// [`TickClock`](crate::TickClock) and may move forward under clock warp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// Room identifier carried on every protocol message.
    pub room_id: String,

    /// Wall-clock origin of tick 0, in epoch milliseconds.
    pub t0_ms: i64,

    /// Duration of one ordering tick in milliseconds. Typical values for
    /// human-interactive applications are 50–1000 ms.
    pub tick_ms: i64,

    /// Author-imposed lag between local submission and target tick, in
    /// ticks. Must be at least 1 so proposals have time to propagate before
    /// the target tick is sealed.
    pub input_delay_ticks: i64,
}

impl RoomConfig {
    /// Create a configuration with the default tick length (100 ms) and
    /// input delay (1 tick).
    pub fn new(room_id: impl Into<String>, t0_ms: i64) -> Self {
        Self {
            room_id: room_id.into(),
            t0_ms,
            tick_ms: 100,
            input_delay_ticks: 1,
        }
    }

    /// Set the tick length in milliseconds.
    pub fn with_tick_ms(mut self, tick_ms: i64) -> Self {
        assert!(tick_ms > 0, "tick_ms must be positive");
        self.tick_ms = tick_ms;
        self
    }

    /// Set the input delay in ticks (minimum 1).
    pub fn with_input_delay_ticks(mut self, ticks: i64) -> Self {
        assert!(ticks >= 1, "input_delay_ticks must be at least 1");
        self.input_delay_ticks = ticks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RoomConfig::new("room", 0);
        assert_eq!(config.tick_ms, 100);
        assert_eq!(config.input_delay_ticks, 1);
    }

    #[test]
    #[should_panic(expected = "input_delay_ticks")]
    fn rejects_zero_input_delay() {
        let _ = RoomConfig::new("room", 0).with_input_delay_ticks(0);
    }
}
