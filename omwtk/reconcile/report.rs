use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{classifier::ComparisonResult, tags::Tag};

/// Partition of the comparison report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportBucket {
    /// Every synset.
    Master,
    /// Synsets tagged `DIFF`, with attribution.
    Diff,
    /// Synsets tagged `SCINAME`.
    Sciname,
    /// Synsets tagged `TYPO` or `REP`.
    TypoOrRep,
}

impl ReportBucket {
    /// Every bucket.
    pub const ALL: [Self; 4] = [Self::Master, Self::Diff, Self::Sciname, Self::TypoOrRep];

    /// Conventional file name for the bucket.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Master => "omw_gwn_report.txt",
            Self::Diff => "omw_gwn_diff.txt",
            Self::Sciname => "omw_gwn_sciname.txt",
            Self::TypoOrRep => "omw_gwn_typo.txt",
        }
    }

    /// Buckets a result is routed to. The master bucket is always last.
    #[must_use]
    pub fn route(result: &ComparisonResult) -> Vec<Self> {
        let mut buckets = Vec::with_capacity(4);
        if result.has(Tag::Diff) {
            buckets.push(Self::Diff);
        }
        if result.has(Tag::Sciname) {
            buckets.push(Self::Sciname);
        }
        if result.has(Tag::Typo) || result.has(Tag::Rep) {
            buckets.push(Self::TypoOrRep);
        }
        buckets.push(Self::Master);
        buckets
    }
}

/// A header followed by body lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Destination bucket.
    pub bucket: ReportBucket,
    /// Section header, e.g. `[OMW] [DIFF] 02084071-n`.
    pub header: String,
    /// Body lines.
    pub lines: Vec<String>,
}

impl ReportSection {
    /// Sections describing one result, one per routed bucket.
    #[must_use]
    pub fn for_result(result: &ComparisonResult) -> Vec<Self> {
        let header = format!("{} {}", result.tags, result.synset_id);
        ReportBucket::route(result)
            .into_iter()
            .map(|bucket| {
                let mut lines = vec![
                    format!("OMW: {}", result.omw_display),
                    format!("GWN: {}", result.canonical_gwn_def),
                ];
                if bucket == ReportBucket::Diff {
                    if let Some(reason) = &result.reason {
                        lines.push(format!("Reason: {reason}"));
                    }
                }
                Self {
                    bucket,
                    header: header.clone(),
                    lines,
                }
            })
            .collect()
    }
}

/// Receiver of formatted report sections.
pub trait ReportSink: Send + Sync {
    /// Appends a section to its bucket.
    fn append(&self, section: ReportSection) -> Result<()>;
}

/// Sink keeping sections in memory.
#[derive(Debug, Default)]
pub struct MemoryReportSink {
    sections: Mutex<Vec<ReportSection>>,
}

impl MemoryReportSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sections appended to `bucket`, in order.
    #[must_use]
    pub fn sections(&self, bucket: ReportBucket) -> Vec<ReportSection> {
        self.sections
            .lock()
            .iter()
            .filter(|section| section.bucket == bucket)
            .cloned()
            .collect()
    }

    /// Total number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.lock().len()
    }

    /// True when nothing was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.lock().is_empty()
    }
}

impl ReportSink for MemoryReportSink {
    fn append(&self, section: ReportSection) -> Result<()> {
        self.sections.lock().push(section);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagSet;

    fn result(tags: &[Tag], reason: Option<&str>) -> ComparisonResult {
        ComparisonResult {
            synset_id: "02084071-n".parse().unwrap(),
            tags: tags.iter().copied().collect::<TagSet>(),
            canonical_omw_def: "omw".into(),
            canonical_gwn_def: "gwn".into(),
            reason: reason.map(String::from),
            omw_display: "omw raw".into(),
        }
    }

    #[test]
    fn routes_by_tag() {
        use ReportBucket::{Diff, Master, Sciname, TypoOrRep};
        assert_eq!(ReportBucket::route(&result(&[Tag::Ident], None)), vec![Master]);
        assert_eq!(
            ReportBucket::route(&result(&[Tag::Rep, Tag::Sciname, Tag::Same], None)),
            vec![Sciname, TypoOrRep, Master]
        );
        assert_eq!(
            ReportBucket::route(&result(&[Tag::Typo, Tag::Diff, Tag::Omw], Some("x"))),
            vec![Diff, TypoOrRep, Master]
        );
    }

    #[test]
    fn only_diff_sections_carry_the_reason() {
        let sections =
            ReportSection::for_result(&result(&[Tag::Dup, Tag::Diff], Some("shared gloss")));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].bucket, ReportBucket::Diff);
        assert_eq!(sections[0].header, "[DUP] [DIFF] 02084071-n");
        assert_eq!(
            sections[0].lines,
            vec!["OMW: omw raw", "GWN: gwn", "Reason: shared gloss"]
        );
        assert_eq!(sections[1].lines.len(), 2);
    }

    #[test]
    fn identical_result_header_names_its_tag() {
        let sections = ReportSection::for_result(&result(&[Tag::Ident], None));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].header, "[IDENT] 02084071-n");
    }

    #[test]
    fn memory_sink_filters_by_bucket() {
        let sink = MemoryReportSink::new();
        for section in ReportSection::for_result(&result(&[Tag::Sciname, Tag::Same], None)) {
            sink.append(section).unwrap();
        }
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.sections(ReportBucket::Sciname).len(), 1);
        assert!(sink.sections(ReportBucket::Diff).is_empty());
    }
}
