//! Seams to the wordnet databases the reconciler reads from.
//!
//! The classifier only sees these traits, so tests can plug in
//! [`MemoryRepository`] and production callers can wrap a real database.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::ReconcileError,
    synset::{Source, Synset, SynsetId},
};

/// In-memory store implementing every seam.
pub mod memory;
/// JSON snapshots of a source.
pub mod snapshot;

pub use memory::{EditRow, MemoryRepository};
pub use snapshot::Snapshot;

/// Read-only access to the synsets of one source.
#[async_trait]
pub trait SynsetRepository: Send + Sync {
    /// Source served by this repository.
    fn source(&self) -> Source;

    /// Fetches a synset, failing with `NotFound` when it does not exist.
    async fn get_synset(&self, id: &SynsetId) -> Result<Synset, ReconcileError>;

    /// Every id known to the source.
    async fn list_synset_ids(&self) -> Result<BTreeSet<SynsetId>, ReconcileError>;
}

/// A gloss row matched by surface text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossHit {
    /// Synset owning the gloss.
    pub synset_id: SynsetId,
    /// Stored surface text.
    pub surface: String,
}

/// Lookup of reference glosses by their exact surface.
#[async_trait]
pub trait GlossIndex: Send + Sync {
    /// Every gloss whose surface equals `surface`.
    async fn find_by_surface(&self, surface: &str) -> Result<Vec<GlossHit>, ReconcileError>;
}

/// Side-table recording who edited a synset's definition.
#[async_trait]
pub trait EditHistory: Send + Sync {
    /// Users that touched the definition of `id` in language `lang`.
    async fn editors(&self, id: &SynsetId, lang: &str) -> Result<BTreeSet<String>, ReconcileError>;
}
