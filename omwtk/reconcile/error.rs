use thiserror::Error;

use crate::synset::{Source, SynsetId};

/// Failures surfaced by repository access and id parsing. String operations
/// never fail and have no variant here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// The synset does not exist in the source.
    #[error("synset {id} not found in {repo}")]
    NotFound {
        /// Source that was queried.
        repo: Source,
        /// Requested id.
        id: SynsetId,
    },
    /// The source did not answer within the configured timeout.
    #[error("fetching synset {id} from {repo} timed out")]
    Timeout {
        /// Source that was queried.
        repo: Source,
        /// Requested id.
        id: SynsetId,
    },
    /// A raw identifier could not be parsed.
    #[error("malformed synset id {0:?}")]
    MalformedId(String),
    /// The source cannot be reached or opened.
    #[error("{repo} repository unavailable: {reason}")]
    RepositoryUnavailable {
        /// Unreachable source.
        repo: Source,
        /// Underlying cause.
        reason: String,
    },
}

impl ReconcileError {
    /// True when the error only affects a single synset and the batch may
    /// continue with the remaining ids.
    #[must_use]
    pub const fn is_per_synset(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Timeout { .. })
    }

    /// The synset the error refers to, if any.
    #[must_use]
    pub const fn synset_id(&self) -> Option<SynsetId> {
        match self {
            Self::NotFound { id, .. } | Self::Timeout { id, .. } => Some(*id),
            Self::MalformedId(_) | Self::RepositoryUnavailable { .. } => None,
        }
    }
}
