#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Definition reconciliation between the Open Multilingual Wordnet (OMW) and
//! the glossed reference wordnet (GWN).
//!
//! For every synset known to both sources the classifier decides whether the
//! two definitions describe the same concept and, when they do not, explains
//! the divergence with a set of [`Tag`]s.

/// Synset identifiers and records.
#[path = "../synset.rs"]
pub mod synset;

/// Text cleanup applied to single definitions.
#[path = "../normalizer.rs"]
pub mod normalizer;

/// Merging of multi-fragment definitions.
#[path = "../joiner.rs"]
pub mod joiner;

/// Classification tags and counters.
#[path = "../tags.rs"]
pub mod tags;

/// Error taxonomy.
#[path = "../error.rs"]
pub mod error;

/// Repository seams, in-memory stores and snapshots.
#[path = "../repository/main.rs"]
pub mod repository;

/// Per-synset classification.
#[path = "../classifier.rs"]
pub mod classifier;

/// Batch orchestration over a set of synset ids.
#[path = "../batch.rs"]
pub mod batch;

/// Working set construction and source summaries.
#[path = "../working_set.rs"]
pub mod working_set;

/// Report buckets and sinks.
#[path = "../report.rs"]
pub mod report;

/// Telemetry helpers.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// TOML configuration.
#[path = "../config.rs"]
pub mod config;

pub use batch::{BatchComparator, BatchFailure, BatchReport};
pub use classifier::{compare_definitions, ComparisonResult, DefinitionClassifier, DefinitionComparison};
pub use config::ReconcileConfig;
pub use error::ReconcileError;
pub use joiner::{join_definitions, JoinedDefinition};
pub use normalizer::Normalizer;
pub use report::{MemoryReportSink, ReportBucket, ReportSection, ReportSink};
pub use repository::{
    EditHistory, GlossHit, GlossIndex, MemoryRepository, Snapshot, SynsetRepository,
};
pub use synset::{PartOfSpeech, Source, Synset, SynsetId};
pub use tags::{Tag, TagCounter, TagSet};
pub use telemetry::{ReconcileTelemetry, ReconcileTelemetryBuilder};
pub use working_set::{NewSynsetEntry, SourceCounts, WorkingSet};
