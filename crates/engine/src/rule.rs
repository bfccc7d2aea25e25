//! The rule kernel: validation and state transition.

use lockmesh_types::ActionMeta;
use std::fmt;

/// Why an action was rejected by [`Rule::is_legal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation(pub String);

impl RuleViolation {
    /// Create a violation with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The application's validation and transition kernel.
///
/// Both operations must be referentially transparent: no I/O, no wall time,
/// no ambient RNG. Any randomness must come from
/// [`DeterministicRng`](crate::DeterministicRng), seeded from the state and
/// `meta.tick` — anything else diverges across peers.
pub trait Rule<S, A> {
    /// Cheap validity check. Illegal actions are skipped by the engine; the
    /// state is left untouched.
    fn is_legal(&self, state: &S, action: &A, meta: &ActionMeta) -> Result<(), RuleViolation>;

    /// Produce the next state. Only called after `is_legal` passed. Shared
    /// substructure may be reused; callers never rely on deep-copy
    /// semantics.
    fn apply(&self, state: &S, action: &A, meta: &ActionMeta) -> S;
}
