//! Simulation configuration.

use lockmesh_types::RoomConfig;

/// Network model parameters.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Minimum one-way latency in milliseconds.
    pub latency_min_ms: i64,
    /// Maximum one-way latency in milliseconds.
    pub latency_max_ms: i64,
    /// Seed for latency sampling.
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            latency_min_ms: 5,
            latency_max_ms: 30,
            seed: 42,
        }
    }
}

impl NetworkConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latency range.
    pub fn with_latency_ms(mut self, min: i64, max: i64) -> Self {
        assert!(min >= 0 && max >= min, "latency range must be ordered");
        self.latency_min_ms = min;
        self.latency_max_ms = max;
        self
    }

    /// Set the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Top-level simulation parameters.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Room parameters shared by every simulated node.
    pub room: RoomConfig,
    /// Interval between ticker deliveries to each node.
    pub tick_interval_ms: i64,
    /// Network model.
    pub network: NetworkConfig,
}

impl SimulationConfig {
    /// Create a configuration around a room, with a 50 ms ticker and the
    /// default network.
    pub fn new(room: RoomConfig) -> Self {
        Self {
            room,
            tick_interval_ms: 50,
            network: NetworkConfig::default(),
        }
    }

    /// Set the ticker interval.
    pub fn with_tick_interval_ms(mut self, ms: i64) -> Self {
        assert!(ms > 0, "tick interval must be positive");
        self.tick_interval_ms = ms;
        self
    }

    /// Set the network model.
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }
}
