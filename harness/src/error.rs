//! Error handling for the benchmark harness
//!
//! Configuration errors (unknown adapter or scenario names, missing workload
//! targets) are fatal to the invocation that raised them and carry the valid
//! options in their message. Store-level failures propagate out of the runner
//! untouched; the validation harness converts them into structured results
//! instead.

use std::fmt;
use std::io;

use thiserror::Error;

/// The main error type for harness operations
#[derive(Error, Debug)]
pub enum HarnessError {
    /// No adapter registered under the requested name
    #[error("unknown adapter '{name}' (available: {available})")]
    UnknownAdapter { name: String, available: String },

    /// No scenario in the fixed catalogue under the requested name
    #[error("unknown scenario '{name}' (available: {available})")]
    UnknownScenario { name: String, available: String },

    /// The dataset lacks an entity the scenario needs as a target
    #[error("scenario '{scenario}' requires {required}, but the dataset has none")]
    MissingTarget {
        scenario: String,
        required: &'static str,
    },

    /// A store rejected an action or lookup mid-run
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration file or override errors
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by a store backend through the capability interface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A lookup or mutation referenced an entity that does not exist
    #[error("{kind} '{id}' does not exist")]
    UnknownEntity { kind: EntityKind, id: String },

    /// The backend could not construct a store from the initial data
    #[error("store construction failed: {0}")]
    Construction(String),

    /// The backend failed to apply an otherwise valid action
    #[error("action failed: {0}")]
    Action(String),
}

impl StoreError {
    pub fn unknown(kind: EntityKind, id: impl Into<String>) -> Self {
        StoreError::UnknownEntity {
            kind,
            id: id.into(),
        }
    }
}

/// Entity kinds addressable through the hook surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Deck,
    Card,
    Comment,
    User,
    Tag,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Deck => write!(f, "deck"),
            EntityKind::Card => write!(f, "card"),
            EntityKind::Comment => write!(f, "comment"),
            EntityKind::User => write!(f, "user"),
            EntityKind::Tag => write!(f, "tag"),
        }
    }
}

/// Convenience result alias used across the harness
pub type Result<T> = std::result::Result<T, HarnessError>;
