//! Seeded latency model.

use crate::NetworkConfig;
use lockmesh_types::PeerId;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// Samples per-message latency and enforces per-link delivery order.
///
/// Random latency alone could reorder two messages on the same link, which
/// would violate the transport contract (ordered within channel) and with
/// it the protocol's assumptions — a seal must never overtake the
/// proposals it covers. Each link therefore carries a monotone delivery
/// floor: a message never arrives before one sent earlier on the same
/// link.
#[derive(Debug)]
pub struct SimulatedNetwork {
    latency_min_ms: i64,
    latency_max_ms: i64,
    rng: ChaCha8Rng,
    last_delivery: HashMap<(PeerId, PeerId), i64>,
}

impl SimulatedNetwork {
    /// Create a network from its configuration.
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            latency_min_ms: config.latency_min_ms,
            latency_max_ms: config.latency_max_ms,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            last_delivery: HashMap::new(),
        }
    }

    /// Delivery time for a message sent `from → to` at `now_ms`.
    pub fn delivery_time(&mut self, from: &PeerId, to: &PeerId, now_ms: i64) -> i64 {
        let latency = if self.latency_max_ms > self.latency_min_ms {
            self.rng.gen_range(self.latency_min_ms..=self.latency_max_ms)
        } else {
            self.latency_min_ms
        };

        let link = (from.clone(), to.clone());
        let floor = self.last_delivery.get(&link).copied().unwrap_or(i64::MIN);
        let due = (now_ms + latency).max(floor);
        self.last_delivery.insert(link, due);
        due
    }
}
