use std::{
    collections::BTreeSet,
    fmt,
    future::Future,
    sync::Arc,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::{
    error::ReconcileError,
    joiner::join_definitions,
    normalizer::Normalizer,
    repository::{EditHistory, GlossIndex, SynsetRepository},
    synset::{Source, Synset, SynsetId},
    tags::{Tag, TagSet},
};

/// Outcome of comparing one synset across both sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Compared synset.
    pub synset_id: SynsetId,
    /// Every tag that fired.
    pub tags: TagSet,
    /// OMW definition after joining and normalization.
    pub canonical_omw_def: String,
    /// GWN definition after whitespace and trailing `;` cleanup.
    pub canonical_gwn_def: String,
    /// Attribution for `DIFF` results.
    pub reason: Option<String>,
    /// Raw OMW fragments joined for display in reports.
    pub omw_display: String,
}

impl ComparisonResult {
    /// Shorthand for `tags.contains(tag)`.
    #[must_use]
    pub fn has(&self, tag: Tag) -> bool {
        self.tags.contains(tag)
    }
}

/// Repository-free part of the classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionComparison {
    /// Tags derived from the two definitions alone.
    pub tags: TagSet,
    /// Normalized OMW definition.
    pub omw_def: String,
    /// Normalized GWN definition.
    pub gwn_def: String,
    /// OMW fragments folded into the longest one.
    pub elided: BTreeSet<String>,
}

/// Compares a synset's OMW fragments with the GWN definition surface.
///
/// Tag precedence: `REP` from joining, then an exact comparison; only when
/// that fails are `SCINAME` and `TYPO` normalizations tried before settling
/// on `SAME` or `DIFF`. A synset with no finding at all is `IDENT`.
#[must_use]
pub fn compare_definitions<S: AsRef<str>>(
    omw_definitions: &[S],
    gwn_surface: &str,
) -> DefinitionComparison {
    let normalizer = Normalizer::global();
    let gwn_def = normalizer.normalize_reference(gwn_surface);
    let joined = join_definitions(omw_definitions);

    let mut tags = TagSet::new();
    if joined.has_repetition() {
        tags.insert(Tag::Rep);
    }

    let mut omw_def = joined.text;
    if omw_def == gwn_def {
        // matched before any normalization; only a REP finding can precede this
        if !tags.is_empty() {
            tags.insert(Tag::Same);
        }
    } else {
        if normalizer.has_scientific_name(&omw_def) {
            tags.insert(Tag::Sciname);
            omw_def = normalizer.remove_scientific_name(&omw_def);
        }
        let fixed = normalizer.fix_typo(&omw_def);
        if fixed != omw_def {
            tags.insert(Tag::Typo);
            omw_def = fixed;
        }
        tags.insert(if omw_def == gwn_def { Tag::Same } else { Tag::Diff });
    }

    if tags.is_empty() {
        tags.insert(Tag::Ident);
    }

    DefinitionComparison {
        tags,
        omw_def,
        gwn_def,
        elided: joined.elided,
    }
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Classifies synsets by fetching them from both sources.
#[derive(Clone)]
pub struct DefinitionClassifier {
    omw: Arc<dyn SynsetRepository>,
    gwn: Arc<dyn SynsetRepository>,
    glosses: Arc<dyn GlossIndex>,
    history: Arc<dyn EditHistory>,
    fetch_timeout: Duration,
    lang: String,
}

impl fmt::Debug for DefinitionClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionClassifier")
            .field("fetch_timeout", &self.fetch_timeout)
            .field("lang", &self.lang)
            .finish_non_exhaustive()
    }
}

impl DefinitionClassifier {
    /// Creates a classifier over the two sources, the GWN gloss index and the
    /// OMW edit side-table.
    #[must_use]
    pub fn new(
        omw: Arc<dyn SynsetRepository>,
        gwn: Arc<dyn SynsetRepository>,
        glosses: Arc<dyn GlossIndex>,
        history: Arc<dyn EditHistory>,
    ) -> Self {
        Self {
            omw,
            gwn,
            glosses,
            history,
            fetch_timeout: DEFAULT_TIMEOUT,
            lang: "eng".into(),
        }
    }

    /// Bounds every repository call.
    #[must_use]
    pub const fn with_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Language of the edit side-table rows to consult.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// The OMW repository.
    #[must_use]
    pub fn omw(&self) -> &Arc<dyn SynsetRepository> {
        &self.omw
    }

    /// The GWN repository.
    #[must_use]
    pub fn gwn(&self) -> &Arc<dyn SynsetRepository> {
        &self.gwn
    }

    /// Classifies a single synset.
    pub async fn classify(&self, id: &SynsetId) -> Result<ComparisonResult, ReconcileError> {
        let omw_synset = self.fetch(self.omw.as_ref(), id).await?;
        let gwn_synset = self.fetch(self.gwn.as_ref(), id).await?;

        let comparison =
            compare_definitions(&omw_synset.definitions, gwn_synset.definition_surface());
        let mut tags = comparison.tags;
        let mut reason = None;
        if tags.contains(Tag::Diff) {
            let (tag, why) = self.attribute(id, &comparison.gwn_def).await?;
            tags.insert(tag);
            reason = Some(why);
        }

        Ok(ComparisonResult {
            synset_id: *id,
            tags,
            canonical_omw_def: comparison.omw_def,
            canonical_gwn_def: comparison.gwn_def,
            reason,
            omw_display: omw_synset.display_definition(),
        })
    }

    async fn fetch(
        &self,
        repository: &dyn SynsetRepository,
        id: &SynsetId,
    ) -> Result<Synset, ReconcileError> {
        self.bounded(repository.source(), id, repository.get_synset(id))
            .await
    }

    async fn bounded<T>(
        &self,
        repo: Source,
        id: &SynsetId,
        call: impl Future<Output = Result<T, ReconcileError>> + Send,
    ) -> Result<T, ReconcileError> {
        timeout(self.fetch_timeout, call)
            .await
            .map_err(|_| ReconcileError::Timeout { repo, id: *id })?
    }

    /// A gloss shared by several synset ids points at upstream duplication
    /// (`DUP`); otherwise the edit is credited to OMW annotators (`OMW`).
    async fn attribute(
        &self,
        id: &SynsetId,
        gwn_def: &str,
    ) -> Result<(Tag, String), ReconcileError> {
        let hits = self
            .bounded(Source::Gwn, id, self.glosses.find_by_surface(gwn_def))
            .await?;
        let sharers: BTreeSet<SynsetId> = hits.iter().map(|hit| hit.synset_id).collect();
        if sharers.len() > 1 {
            let listed = sharers
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            return Ok((
                Tag::Dup,
                format!("Not unique (shared among {listed}) so OMW team changed it"),
            ));
        }

        let editors = self
            .bounded(Source::Omw, id, self.history.editors(id, &self.lang))
            .await?;
        let who = if editors.is_empty() {
            "someone".to_string()
        } else {
            editors.into_iter().collect::<Vec<_>>().join(", ")
        };
        Ok((Tag::Omw, format!("{who} made this change.")))
    }
}
