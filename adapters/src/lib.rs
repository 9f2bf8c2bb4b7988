//! Reference state-store backends for the statebench harness
//!
//! Three backends spanning the update models the harness is built to
//! compare:
//!
//! - [`mutable::MutableAdapter`] — manual mutation with per-entity sharing
//!   and coarse collection invalidation
//! - [`snapshot::SnapshotAdapter`] — immutable copies: every mutation
//!   produces a fresh view of the whole board
//! - [`indexed::IndexedAdapter`] — incrementally maintained parent-child
//!   indexes with fine-grained reference replacement
//!
//! All three satisfy the full hook/action surface; their render fan-out
//! under identical workloads is what the benchmark matrix contrasts.

pub mod indexed;
pub mod mutable;
pub mod snapshot;

use std::sync::Arc;

use statebench_harness::AdapterRegistry;

pub use indexed::IndexedAdapter;
pub use mutable::MutableAdapter;
pub use snapshot::SnapshotAdapter;

/// The standard registry: registration order is display order.
pub fn default_registry() -> AdapterRegistry {
    AdapterRegistry::new(vec![
        Arc::new(MutableAdapter),
        Arc::new(SnapshotAdapter),
        Arc::new(IndexedAdapter),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_all_backends_in_order() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            vec!["manual-mutation", "immutable-snapshot", "indexed-collections"]
        );
    }
}
