//! Adapter validation harness
//!
//! Pre-flight correctness gate: every registered adapter is driven through
//! the same hook reads and action sequence against a small fixed dataset.
//! Failures are collected per adapter instead of stopping at the first, and
//! a panicking action is converted into a structured error rather than
//! tearing the pass down. Comparative numbers from adapters that fail here
//! are not to be trusted.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapter::{ActionRequest, AdapterRegistry, StoreAdapter, StoreHandle};
use crate::dataset::{DatasetSpec, RootState};

/// Validation outcome for one adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterTestResult {
    pub adapter_name: String,
    pub passed: bool,
    pub errors: Vec<String>,
}

/// Validates every registered adapter against the same fixed dataset.
pub fn validate_all(registry: &AdapterRegistry) -> Vec<AdapterTestResult> {
    let dataset = DatasetSpec::small().generate();
    registry
        .iter()
        .map(|adapter| validate_adapter(adapter.as_ref(), &dataset))
        .collect()
}

/// Exercises every hook and every action of one adapter with representative
/// arguments and asserts read-your-write invariants.
pub fn validate_adapter(adapter: &dyn StoreAdapter, dataset: &RootState) -> AdapterTestResult {
    let name = adapter.name().to_string();
    let mut errors = Vec::new();

    let handle = match adapter.create_store(dataset.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            return AdapterTestResult {
                adapter_name: name,
                passed: false,
                errors: vec![format!("createStore: {e}")],
            };
        }
    };

    let first_deck = dataset
        .first_deck_id()
        .cloned()
        .unwrap_or_default();
    let cards = dataset.cards_in(&first_deck);
    let first_card = cards.first().cloned().unwrap_or_default();
    let comments = dataset.comments_in(&first_card);
    let first_comment = comments.first().cloned().unwrap_or_default();
    let first_user = dataset.first_user_id().unwrap_or_default();
    let first_tag = dataset
        .sorted_tag_ids()
        .first()
        .cloned()
        .unwrap_or_default();

    check(&mut errors, "decksOrder hook", || {
        let order = handle.decks_order();
        if order.as_ref() == dataset.decks_order.as_slice() {
            Ok(())
        } else {
            Err("deck order does not match the initial data".into())
        }
    });

    check(&mut errors, "deck hook", || {
        match handle.deck(&first_deck) {
            Some(deck) if deck.id == first_deck => Ok(()),
            Some(_) => Err("returned a different deck".into()),
            None => Err(format!("deck '{first_deck}' not found")),
        }
    });

    check(&mut errors, "card hook", || {
        match handle.card(&first_card) {
            Some(card) if card.id == first_card => Ok(()),
            Some(_) => Err("returned a different card".into()),
            None => Err(format!("card '{first_card}' not found")),
        }
    });

    check(&mut errors, "cardIds hook", || {
        let ids = handle.card_ids(&first_deck);
        if ids.as_ref() == cards.as_slice() {
            Ok(())
        } else {
            Err("card ids do not match the canonical child order".into())
        }
    });

    check(&mut errors, "user hook", || {
        handle
            .user(&first_user)
            .map(|_| ())
            .ok_or_else(|| format!("user '{first_user}' not found"))
    });

    check(&mut errors, "tag hook", || {
        handle
            .tag(&first_tag)
            .map(|_| ())
            .ok_or_else(|| format!("tag '{first_tag}' not found"))
    });

    check(&mut errors, "hook referential stability", || {
        let a = handle.card_ids(&first_deck);
        let b = handle.card_ids(&first_deck);
        if !Arc::ptr_eq(&a, &b) {
            return Err("cardIds returned a fresh reference with unchanged data".into());
        }
        match (handle.card(&first_card), handle.card(&first_card)) {
            (Some(a), Some(b)) if Arc::ptr_eq(&a, &b) => Ok(()),
            (Some(_), Some(_)) => {
                Err("card returned a fresh reference with unchanged data".into())
            }
            _ => Err("card lookup failed during stability check".into()),
        }
    });

    check(&mut errors, "updateCommentText action", || {
        handle
            .apply(&ActionRequest::UpdateCommentText {
                comment_id: first_comment.clone(),
                text: "validation edit".into(),
            })
            .map_err(|e| e.to_string())?;
        match handle.comment(&first_comment) {
            Some(comment) if comment.text == "validation edit" => Ok(()),
            Some(_) => Err("edit is not visible through the read path".into()),
            None => Err("comment vanished after the edit".into()),
        }
    });

    check(&mut errors, "toggleCardTag action", || {
        let before = handle.tag_ids(&first_card).contains(&first_tag);
        let toggle = ActionRequest::ToggleCardTag {
            card_id: first_card.clone(),
            tag_id: first_tag.clone(),
        };
        handle.apply(&toggle).map_err(|e| e.to_string())?;
        let after = handle.tag_ids(&first_card).contains(&first_tag);
        if before == after {
            return Err("toggle did not change tag membership".into());
        }
        handle.apply(&toggle).map_err(|e| e.to_string())?;
        let restored = handle.tag_ids(&first_card).contains(&first_tag);
        if restored != before {
            return Err("second toggle did not restore membership".into());
        }
        Ok(())
    });

    check(&mut errors, "beginChurn/endChurn actions", || {
        handle
            .apply(&ActionRequest::BeginChurn {
                card_ids: vec![first_card.clone()],
            })
            .map_err(|e| e.to_string())?;
        match handle.card(&first_card) {
            Some(card) if card.busy => {}
            Some(_) => return Err("beginChurn did not mark the card busy".into()),
            None => return Err("card vanished during churn".into()),
        }
        handle
            .apply(&ActionRequest::EndChurn)
            .map_err(|e| e.to_string())?;
        match handle.card(&first_card) {
            Some(card) if !card.busy => Ok(()),
            Some(_) => Err("endChurn left the card busy".into()),
            None => Err("card vanished during churn".into()),
        }
    });

    check(&mut errors, "renameUser action", || {
        handle
            .apply(&ActionRequest::RenameUser {
                user_id: first_user.clone(),
                name: "Validated User".into(),
            })
            .map_err(|e| e.to_string())?;
        match handle.user(&first_user) {
            Some(user) if user.name == "Validated User" => Ok(()),
            Some(_) => Err("rename is not visible through the read path".into()),
            None => Err("user vanished after rename".into()),
        }
    });

    check(&mut errors, "setVisibleCards action", || {
        handle
            .apply(&ActionRequest::SetVisibleCards {
                card_ids: vec![first_card.clone()],
            })
            .map_err(|e| e.to_string())?;
        match handle.card(&first_card) {
            Some(card) if card.visible => Ok(()),
            Some(_) => Err("visibility window did not mark the card visible".into()),
            None => Err("card vanished after visibility change".into()),
        }
    });

    check(&mut errors, "unknown-id handling", || {
        match handle.apply(&ActionRequest::UpdateCommentText {
            comment_id: "comment_does_not_exist".into(),
            text: "x".into(),
        }) {
            Err(_) => Ok(()),
            Ok(()) => Err("edit of a nonexistent comment reported success".into()),
        }
    });

    let passed = errors.is_empty();
    info!(adapter = %name, passed, issues = errors.len(), "adapter validation finished");
    AdapterTestResult {
        adapter_name: name,
        passed,
        errors,
    }
}

fn check(
    errors: &mut Vec<String>,
    what: &str,
    run: impl FnOnce() -> Result<(), String>,
) {
    match catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(())) => {}
        Ok(Err(message)) => errors.push(format!("{what}: {message}")),
        Err(panic) => errors.push(format!("{what}: panicked: {}", panic_text(&panic))),
    }
}

fn panic_text(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}
