//! Validation harness integration tests

use std::sync::Arc;

use statebench_adapters::{default_registry, MutableAdapter};
use statebench_adapters::mutable::MutableStore;
use statebench_harness::adapter::{ActionRequest, StoreAdapter, StoreHandle};
use statebench_harness::dataset::{
    Card, Comment, DatasetSpec, Deck, EntityId, RootState, Tag, User,
};
use statebench_harness::error::StoreError;
use statebench_harness::{validate_all, AdapterRegistry};

/// Delegates everything to a correct store except comment edits, which
/// panic the way a buggy binding would.
struct BrokenStore {
    inner: MutableStore,
}

impl StoreHandle for BrokenStore {
    fn deck(&self, id: &str) -> Option<Arc<Deck>> {
        self.inner.deck(id)
    }

    fn card(&self, id: &str) -> Option<Arc<Card>> {
        self.inner.card(id)
    }

    fn comment(&self, id: &str) -> Option<Arc<Comment>> {
        self.inner.comment(id)
    }

    fn user(&self, id: &str) -> Option<Arc<User>> {
        self.inner.user(id)
    }

    fn tag(&self, id: &str) -> Option<Arc<Tag>> {
        self.inner.tag(id)
    }

    fn decks_order(&self) -> Arc<[EntityId]> {
        self.inner.decks_order()
    }

    fn card_ids(&self, deck_id: &str) -> Arc<[EntityId]> {
        self.inner.card_ids(deck_id)
    }

    fn comment_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        self.inner.comment_ids(card_id)
    }

    fn tag_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        self.inner.tag_ids(card_id)
    }

    fn assignee_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        self.inner.assignee_ids(card_id)
    }

    fn apply(&self, action: &ActionRequest) -> Result<(), StoreError> {
        if matches!(action, ActionRequest::UpdateCommentText { .. }) {
            panic!("updateCommentText exploded");
        }
        self.inner.apply(action)
    }
}

struct BrokenAdapter;

impl StoreAdapter for BrokenAdapter {
    fn name(&self) -> &str {
        "broken-binding"
    }

    fn create_store(&self, initial: RootState) -> Result<Arc<dyn StoreHandle>, StoreError> {
        Ok(Arc::new(BrokenStore {
            inner: MutableStore::new(initial),
        }))
    }
}

#[test]
fn all_reference_adapters_pass_validation() {
    let results = validate_all(&default_registry());
    assert_eq!(results.len(), 3);
    for result in results {
        assert!(
            result.passed,
            "{} failed: {:?}",
            result.adapter_name, result.errors
        );
        assert!(result.errors.is_empty());
    }
}

#[test]
fn broken_adapter_fails_without_affecting_others() {
    let registry = AdapterRegistry::new(vec![
        Arc::new(MutableAdapter),
        Arc::new(BrokenAdapter),
    ]);
    let results = validate_all(&registry);
    assert_eq!(results.len(), 2);

    let healthy = &results[0];
    assert_eq!(healthy.adapter_name, "manual-mutation");
    assert!(healthy.passed, "healthy adapter failed: {:?}", healthy.errors);

    let broken = &results[1];
    assert_eq!(broken.adapter_name, "broken-binding");
    assert!(!broken.passed);
    assert!(!broken.errors.is_empty());
    assert!(
        broken
            .errors
            .iter()
            .any(|e| e.contains("updateCommentText")),
        "errors should reference the failing action: {:?}",
        broken.errors
    );
}

#[test]
fn validation_catches_a_store_that_cannot_construct() {
    struct Unconstructable;

    impl StoreAdapter for Unconstructable {
        fn name(&self) -> &str {
            "unconstructable"
        }

        fn create_store(
            &self,
            _initial: RootState,
        ) -> Result<Arc<dyn StoreHandle>, StoreError> {
            Err(StoreError::Construction("backend unavailable".into()))
        }
    }

    let result = statebench_harness::validate::validate_adapter(
        &Unconstructable,
        &DatasetSpec::small().generate(),
    );
    assert!(!result.passed);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("createStore"));
}
