//! Post-apply passes and per-viewer projection.

use lockmesh_types::{ActionMeta, PeerId};

/// A deterministic pass run after every successful rule application, in
/// registration order. Same purity constraints as [`Rule`](crate::Rule).
pub trait System<S> {
    /// Produce the next state from the post-apply state.
    fn update(&self, state: &S, meta: &ActionMeta) -> S;
}

/// Per-viewer projection of the state.
///
/// The projection is what subscribers for `viewer` are allowed to see —
/// hidden information stays on the authoritative side.
pub trait View<S> {
    /// Project `state` for `viewer`.
    fn observe(&self, state: &S, viewer: &PeerId) -> serde_json::Value;
}
