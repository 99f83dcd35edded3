use std::{
    collections::BTreeSet,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use serde_json::json;
use shared_logging::LogLevel;
use uuid::Uuid;

use crate::{
    classifier::{ComparisonResult, DefinitionClassifier},
    config::ReconcileConfig,
    error::ReconcileError,
    report::{ReportBucket, ReportSection, ReportSink},
    synset::SynsetId,
    tags::{Tag, TagCounter},
    telemetry::ReconcileTelemetry,
};

/// A synset the batch could not classify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Synset that failed.
    pub synset_id: SynsetId,
    /// Cause.
    pub error: ReconcileError,
}

/// Everything a run produced. Results, failures and skipped ids together
/// account for every scheduled id.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// Start of the run.
    pub started_at: DateTime<Utc>,
    /// End of the run.
    pub finished_at: DateTime<Utc>,
    /// Classified synsets ordered by id.
    pub results: Vec<ComparisonResult>,
    /// Failed synsets ordered by id.
    pub failures: Vec<BatchFailure>,
    /// Ids never classified because a fail-fast stop came first, ordered.
    pub skipped: Vec<SynsetId>,
    /// Tag tallies.
    pub counts: TagCounter,
}

impl BatchReport {
    /// Ids tagged `DIFF`.
    #[must_use]
    pub fn diff_ids(&self) -> Vec<SynsetId> {
        self.results
            .iter()
            .filter(|result| result.has(Tag::Diff))
            .map(|result| result.synset_id)
            .collect()
    }

    /// Result for `id`, if it was classified.
    #[must_use]
    pub fn result(&self, id: &SynsetId) -> Option<&ComparisonResult> {
        self.results
            .binary_search_by(|result| result.synset_id.cmp(id))
            .ok()
            .map(|index| &self.results[index])
    }

    /// Counter summary lines.
    #[must_use]
    pub fn summary(&self) -> Vec<String> {
        self.counts.summary()
    }
}

/// Classifies a set of synsets concurrently and tallies the tags.
#[derive(Clone)]
pub struct BatchComparator {
    classifier: DefinitionClassifier,
    concurrency: usize,
    fail_fast: bool,
    sink: Option<Arc<dyn ReportSink>>,
    telemetry: Option<ReconcileTelemetry>,
}

impl fmt::Debug for BatchComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchComparator")
            .field("classifier", &self.classifier)
            .field("concurrency", &self.concurrency)
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

impl BatchComparator {
    /// Creates a comparator with default concurrency and continue-on-error
    /// semantics.
    #[must_use]
    pub fn new(classifier: DefinitionClassifier) -> Self {
        let defaults = ReconcileConfig::default();
        Self {
            classifier,
            concurrency: defaults.concurrency,
            fail_fast: defaults.fail_fast,
            sink: None,
            telemetry: None,
        }
    }

    /// Applies run settings, including the classifier's timeout and language.
    #[must_use]
    pub fn from_config(classifier: DefinitionClassifier, config: &ReconcileConfig) -> Self {
        let classifier = classifier
            .with_timeout(config.fetch_timeout())
            .with_lang(config.lang.clone());
        Self::new(classifier)
            .with_concurrency(config.concurrency)
            .with_fail_fast(config.fail_fast)
    }

    /// Maximum synsets in flight.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Stop scheduling after the first per-synset failure.
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Forwards report sections to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: ReconcileTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Classifies every id.
    ///
    /// `NotFound` and `Timeout` are recorded per synset and the run goes on.
    /// With fail-fast set, classifications already under way still finish and
    /// every id not yet started lands in `skipped`. An unavailable repository
    /// aborts the run and nothing is forwarded to the sink.
    pub async fn run(&self, ids: &BTreeSet<SynsetId>) -> Result<BatchReport, ReconcileError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        self.log(
            LogLevel::Info,
            "reconcile.batch.start",
            json!({ "run_id": run_id, "synsets": ids.len(), "concurrency": self.concurrency }),
        );

        let classifier = &self.classifier;
        let halted = AtomicBool::new(false);
        let halted = &halted;
        let mut outcomes = stream::iter(ids.iter().copied())
            .map(|id| async move {
                if halted.load(Ordering::Acquire) {
                    return (id, None);
                }
                (id, Some(classifier.classify(&id).await))
            })
            .buffer_unordered(self.concurrency);

        let mut counts = TagCounter::new();
        let mut results = Vec::with_capacity(ids.len());
        let mut failures = Vec::new();
        let mut skipped = Vec::new();
        while let Some((id, outcome)) = outcomes.next().await {
            let Some(outcome) = outcome else {
                skipped.push(id);
                continue;
            };
            match outcome {
                Ok(result) => {
                    counts.record(&result.tags);
                    self.log(
                        LogLevel::Debug,
                        "reconcile.synset.classified",
                        json!({ "synset": id, "tags": result.tags }),
                    );
                    results.push(result);
                }
                Err(error) if error.is_per_synset() => {
                    self.log(
                        LogLevel::Warn,
                        "reconcile.synset.failed",
                        json!({ "synset": id, "error": error.to_string() }),
                    );
                    failures.push(BatchFailure { synset_id: id, error });
                    if self.fail_fast {
                        halted.store(true, Ordering::Release);
                    }
                }
                Err(error) => {
                    self.log(
                        LogLevel::Error,
                        "reconcile.batch.aborted",
                        json!({ "run_id": run_id, "synset": id, "error": error.to_string() }),
                    );
                    return Err(error);
                }
            }
        }

        results.sort_by(|a, b| a.synset_id.cmp(&b.synset_id));
        failures.sort_by(|a, b| a.synset_id.cmp(&b.synset_id));
        skipped.sort_unstable();
        let report = BatchReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            results,
            failures,
            skipped,
            counts,
        };
        self.forward(&report);
        self.log(
            LogLevel::Info,
            "reconcile.batch.complete",
            json!({
                "run_id": run_id,
                "classified": report.results.len(),
                "failed": report.failures.len(),
                "skipped": report.skipped.len(),
                "diff": report.counts.get(Tag::Diff),
            }),
        );
        Ok(report)
    }

    fn forward(&self, report: &BatchReport) {
        let Some(sink) = &self.sink else {
            return;
        };
        let summary = ReportSection {
            bucket: ReportBucket::Master,
            header: "Summary".into(),
            lines: report.summary(),
        };
        let sections = report
            .results
            .iter()
            .flat_map(ReportSection::for_result)
            .chain(std::iter::once(summary));
        for section in sections {
            if let Err(err) = sink.append(section) {
                self.log(
                    LogLevel::Warn,
                    "reconcile.report.append_failed",
                    json!({ "run_id": report.run_id, "error": err.to_string() }),
                );
            }
        }
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        report::MemoryReportSink,
        repository::MemoryRepository,
        synset::{Source, Synset},
        tags::TagSet,
    };

    fn id(raw: &str) -> SynsetId {
        raw.parse().unwrap()
    }

    struct Corpus {
        omw: MemoryRepository,
        gwn: MemoryRepository,
    }

    impl Corpus {
        fn new() -> Self {
            let corpus = Self {
                omw: MemoryRepository::new(Source::Omw),
                gwn: MemoryRepository::new(Source::Gwn),
            };
            corpus.pair("00000001-n", &["a simplified form of English"], "a simplified form of English");
            corpus.pair(
                "00000002-n",
                &[
                    "canvasback",
                    "redhead",
                    "pochard",
                    "canvasback; redhead; pochard; etc. ❲Aythya❳",
                ],
                "canvasback; redhead; pochard; etc.",
            );
            corpus.pair("00000003-a", &["able to act"], "having the ability");
            corpus.pair("00000004-a", &["capable"], "having the ability");
            corpus.pair("00000005-n", &["a small , round fruit"], "a small, round fruit");
            corpus.pair("00000006-v", &["to run quickly"], "to move fast on foot");
            corpus
        }

        fn pair(&self, raw: &str, omw_defs: &[&str], gwn_def: &str) {
            let mut omw = Synset::new(Source::Omw, id(raw));
            for definition in omw_defs {
                omw = omw.with_definition(*definition);
            }
            self.omw.insert(omw);
            self.gwn
                .insert(Synset::new(Source::Gwn, id(raw)).with_definition(gwn_def));
        }

        fn comparator(&self) -> BatchComparator {
            BatchComparator::new(DefinitionClassifier::new(
                Arc::new(self.omw.clone()),
                Arc::new(self.gwn.clone()),
                Arc::new(self.gwn.clone()),
                Arc::new(self.omw.clone()),
            ))
            .with_concurrency(3)
        }

        fn ids(&self) -> BTreeSet<SynsetId> {
            (1..=6)
                .map(|n| {
                    let pos = match n {
                        3 | 4 => 'a',
                        6 => 'v',
                        _ => 'n',
                    };
                    id(&format!("{n:08}-{pos}"))
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn tallies_every_tag() {
        let corpus = Corpus::new();
        let report = corpus.comparator().run(&corpus.ids()).await.unwrap();
        assert_eq!(report.results.len(), 6);
        assert!(report.failures.is_empty());
        assert_eq!(report.counts.total(), 6);
        assert_eq!(report.counts.get(Tag::Ident), 1);
        assert_eq!(report.counts.get(Tag::Same), 2);
        assert_eq!(report.counts.get(Tag::Diff), 3);
        assert_eq!(report.counts.get(Tag::Dup), 2);
        assert_eq!(report.counts.get(Tag::Omw), 1);
        assert_eq!(report.counts.get(Tag::Typo), 1);
        assert_eq!(
            report.diff_ids(),
            vec![id("00000003-a"), id("00000004-a"), id("00000006-v")]
        );
        let dup = report.result(&id("00000004-a")).unwrap();
        assert!(dup.has(Tag::Dup) && !dup.has(Tag::Omw));
    }

    #[tokio::test]
    async fn repeated_runs_agree() {
        let corpus = Corpus::new();
        let comparator = corpus.comparator();
        let first = comparator.run(&corpus.ids()).await.unwrap();
        let second = comparator.run(&corpus.ids()).await.unwrap();
        let tags = |report: &BatchReport| -> Vec<(SynsetId, TagSet)> {
            report
                .results
                .iter()
                .map(|result| (result.synset_id, result.tags.clone()))
                .collect()
        };
        assert_eq!(tags(&first), tags(&second));
        assert_eq!(first.counts, second.counts);
        assert_ne!(first.run_id, second.run_id);
    }

    #[tokio::test]
    async fn missing_synsets_are_reported_not_dropped() {
        let corpus = Corpus::new();
        let mut ids = corpus.ids();
        ids.insert(id("09999999-n"));
        let report = corpus.comparator().run(&ids).await.unwrap();
        assert_eq!(report.results.len() + report.failures.len(), ids.len());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].error,
            ReconcileError::NotFound {
                repo: Source::Omw,
                id: id("09999999-n"),
            }
        );
    }

    #[tokio::test]
    async fn fail_fast_stops_scheduling() {
        let corpus = Corpus::new();
        let ids: BTreeSet<SynsetId> = (10..20).map(|n| id(&format!("{n:08}-n"))).collect();
        let report = corpus
            .comparator()
            .with_concurrency(1)
            .with_fail_fast(true)
            .run(&ids)
            .await
            .unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.results.is_empty());
        assert_eq!(report.skipped.len(), 9);
    }

    #[tokio::test]
    async fn fail_fast_accounts_for_every_id() {
        let corpus = Corpus::new();
        let mut ids = corpus.ids();
        ids.extend((10..20).map(|n| id(&format!("{n:08}-n"))));
        let report = corpus
            .comparator()
            .with_concurrency(4)
            .with_fail_fast(true)
            .run(&ids)
            .await
            .unwrap();
        assert!(!report.failures.is_empty());
        assert!(!report.skipped.is_empty());

        let mut seen: Vec<SynsetId> = report
            .results
            .iter()
            .map(|result| result.synset_id)
            .chain(report.failures.iter().map(|failure| failure.synset_id))
            .chain(report.skipped.iter().copied())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, ids.into_iter().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn unavailable_repository_aborts_without_output() {
        let corpus = Corpus::new();
        corpus.gwn.set_online(false);
        let sink = Arc::new(MemoryReportSink::new());
        let result = corpus
            .comparator()
            .with_sink(sink.clone())
            .run(&corpus.ids())
            .await;
        assert!(matches!(
            result,
            Err(ReconcileError::RepositoryUnavailable { repo: Source::Gwn, .. })
        ));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn routes_sections_and_logs_progress() {
        let corpus = Corpus::new();
        let sink = Arc::new(MemoryReportSink::new());
        let (telemetry, logger) = ReconcileTelemetry::in_memory("reconcile");
        corpus
            .comparator()
            .with_sink(sink.clone())
            .with_telemetry(telemetry)
            .run(&corpus.ids())
            .await
            .unwrap();

        // six synsets plus the summary
        assert_eq!(sink.sections(ReportBucket::Master).len(), 7);
        assert_eq!(sink.sections(ReportBucket::Diff).len(), 3);
        assert_eq!(sink.sections(ReportBucket::Sciname).len(), 1);
        assert_eq!(sink.sections(ReportBucket::TypoOrRep).len(), 2);
        let summary = sink.sections(ReportBucket::Master).pop().unwrap();
        assert_eq!(summary.header, "Summary");
        assert_eq!(summary.lines[0], "total: 6");

        assert_eq!(logger.by_message("reconcile.synset.classified").len(), 6);
        assert_eq!(logger.by_message("reconcile.batch.complete").len(), 1);
    }
}
