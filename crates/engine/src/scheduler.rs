//! Tick-gated jobs.

use lockmesh_types::{Tick, TickMeta};

/// When a scheduler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Run every `every_ticks` ticks, starting at `start_tick`.
    Every {
        /// Period in ticks; must be at least 1.
        every_ticks: i64,
        /// First tick the period is anchored to.
        start_tick: Tick,
    },
    /// Run exactly once, at `at_tick`.
    Once {
        /// The tick to run at.
        at_tick: Tick,
    },
    /// Run whenever [`Scheduler::should_run`] says so.
    Manual,
}

impl Schedule {
    /// A periodic schedule anchored at tick 0.
    pub fn every(every_ticks: i64) -> Self {
        Schedule::Every {
            every_ticks,
            start_tick: Tick(0),
        }
    }

    /// A one-shot schedule.
    pub fn once(at_tick: Tick) -> Self {
        Schedule::Once { at_tick }
    }
}

/// A deterministic tick-gated job.
///
/// Schedulers run in the catch-up loop after each commit: for every tick
/// the commit closed, each due scheduler applies, sorted by id
/// (lexicographic, stable) so all peers agree on the order. The catch-up
/// guarantees no tick is skipped even when commits arrive in bursts.
pub trait Scheduler<S> {
    /// Stable identifier; the cross-scheduler execution order key.
    fn id(&self) -> &str;

    /// When this scheduler runs.
    fn schedule(&self) -> Schedule;

    /// Suppression hook for `Every`/`Once` schedules: return `true` to skip
    /// an otherwise-due tick. Must be pure.
    fn except(&self, _state: &S, _meta: &TickMeta) -> bool {
        false
    }

    /// Trigger predicate for [`Schedule::Manual`]. Must be pure.
    fn should_run(&self, _state: &S, _meta: &TickMeta) -> bool {
        false
    }

    /// Produce the next state for a due tick.
    fn apply(&self, state: &S, meta: &TickMeta) -> S;

    /// Whether this scheduler is due at `meta.tick`. Pure predicate over
    /// the schedule, the state, and the tick.
    fn is_due(&self, state: &S, meta: &TickMeta) -> bool {
        match self.schedule() {
            Schedule::Every {
                every_ticks,
                start_tick,
            } => {
                meta.tick >= start_tick
                    && every_ticks > 0
                    && (meta.tick.0 - start_tick.0) % every_ticks == 0
                    && !self.except(state, meta)
            }
            Schedule::Once { at_tick } => meta.tick == at_tick && !self.except(state, meta),
            Schedule::Manual => self.should_run(state, meta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Decay;

    impl Scheduler<u64> for Decay {
        fn id(&self) -> &str {
            "decay"
        }

        fn schedule(&self) -> Schedule {
            Schedule::Every {
                every_ticks: 3,
                start_tick: Tick(2),
            }
        }

        fn except(&self, state: &u64, _meta: &TickMeta) -> bool {
            *state == 0
        }

        fn apply(&self, state: &u64, _meta: &TickMeta) -> u64 {
            state.saturating_sub(1)
        }
    }

    #[test]
    fn every_is_anchored_at_start_tick() {
        let decay = Decay;
        let due: Vec<i64> = (0..12)
            .filter(|t| {
                decay.is_due(
                    &10,
                    &TickMeta { tick: Tick(*t) },
                )
            })
            .collect();
        assert_eq!(due, vec![2, 5, 8, 11]);
    }

    #[test]
    fn except_suppresses_due_ticks() {
        let decay = Decay;
        assert!(!decay.is_due(&0, &TickMeta { tick: Tick(2) }));
        assert!(decay.is_due(&1, &TickMeta { tick: Tick(2) }));
    }

    struct OneShot;

    impl Scheduler<u64> for OneShot {
        fn id(&self) -> &str {
            "one-shot"
        }

        fn schedule(&self) -> Schedule {
            Schedule::once(Tick(7))
        }

        fn apply(&self, state: &u64, _meta: &TickMeta) -> u64 {
            state + 100
        }
    }

    #[test]
    fn once_fires_on_exactly_one_tick() {
        let job = OneShot;
        let due: Vec<i64> = (0..20)
            .filter(|t| job.is_due(&0, &TickMeta { tick: Tick(*t) }))
            .collect();
        assert_eq!(due, vec![7]);
    }
}
