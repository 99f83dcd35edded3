use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{EditHistory, GlossHit, GlossIndex, SynsetRepository};
use crate::{
    error::ReconcileError,
    normalizer::Normalizer,
    synset::{Source, Synset, SynsetId},
};

/// One row of the definition edit side-table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRow {
    /// Edited synset.
    pub synset: SynsetId,
    /// Language of the edited definition.
    #[serde(default = "default_lang")]
    pub lang: String,
    /// User that made the edit, when recorded.
    #[serde(default)]
    pub user: Option<String>,
}

fn default_lang() -> String {
    "eng".into()
}

/// Thread-safe in-memory repository. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    source: Source,
    synsets: Arc<RwLock<IndexMap<SynsetId, Synset>>>,
    edits: Arc<RwLock<Vec<EditRow>>>,
    online: Arc<AtomicBool>,
}

impl MemoryRepository {
    /// Creates an empty repository for `source`.
    #[must_use]
    pub fn new(source: Source) -> Self {
        Self {
            source,
            synsets: Arc::new(RwLock::new(IndexMap::new())),
            edits: Arc::new(RwLock::new(Vec::new())),
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Inserts or replaces a synset. The synset is re-owned by this source.
    pub fn insert(&self, mut synset: Synset) {
        synset.source = self.source;
        self.synsets.write().insert(synset.id, synset);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_synset(self, synset: Synset) -> Self {
        self.insert(synset);
        self
    }

    /// Appends an edit side-table row.
    pub fn record_edit(&self, row: EditRow) {
        self.edits.write().push(row);
    }

    /// Number of stored synsets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.synsets.read().len()
    }

    /// True when no synset is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.synsets.read().is_empty()
    }

    /// Simulates the backing database going away (or coming back).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), ReconcileError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ReconcileError::RepositoryUnavailable {
                repo: self.source,
                reason: "repository is offline".into(),
            })
        }
    }
}

#[async_trait]
impl SynsetRepository for MemoryRepository {
    fn source(&self) -> Source {
        self.source
    }

    async fn get_synset(&self, id: &SynsetId) -> Result<Synset, ReconcileError> {
        self.ensure_online()?;
        self.synsets
            .read()
            .get(id)
            .cloned()
            .ok_or(ReconcileError::NotFound {
                repo: self.source,
                id: *id,
            })
    }

    async fn list_synset_ids(&self) -> Result<BTreeSet<SynsetId>, ReconcileError> {
        self.ensure_online()?;
        Ok(self.synsets.read().keys().copied().collect())
    }
}

#[async_trait]
impl GlossIndex for MemoryRepository {
    async fn find_by_surface(&self, surface: &str) -> Result<Vec<GlossHit>, ReconcileError> {
        self.ensure_online()?;
        let normalizer = Normalizer::global();
        let wanted = normalizer.normalize_reference(surface);
        Ok(self
            .synsets
            .read()
            .values()
            .filter(|synset| !synset.definitions.is_empty())
            .filter(|synset| normalizer.normalize_reference(synset.definition_surface()) == wanted)
            .map(|synset| GlossHit {
                synset_id: synset.id,
                surface: synset.definition_surface().to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl EditHistory for MemoryRepository {
    async fn editors(&self, id: &SynsetId, lang: &str) -> Result<BTreeSet<String>, ReconcileError> {
        self.ensure_online()?;
        Ok(self
            .edits
            .read()
            .iter()
            .filter(|row| &row.synset == id && row.lang == lang)
            .filter_map(|row| row.user.as_deref())
            .filter(|user| !user.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}
