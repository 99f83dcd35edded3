use std::{collections::BTreeSet, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Classification tags. Declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// Changed by an OMW annotator.
    Omw,
    /// The reference gloss is shared by several synsets.
    Dup,
    /// Fragments duplicated into the longest fragment by import tooling.
    Rep,
    /// Scientific name annotation present.
    Sciname,
    /// Typographic noise such as a space before a comma.
    Typo,
    /// Content differs after normalization.
    Diff,
    /// Content matches after normalization.
    Same,
    /// Identical without any normalization or finding.
    Ident,
}

impl Tag {
    /// Every tag in report order.
    pub const ORDER: [Self; 8] = [
        Self::Omw,
        Self::Dup,
        Self::Rep,
        Self::Sciname,
        Self::Typo,
        Self::Diff,
        Self::Same,
        Self::Ident,
    ];

    /// Lowercase label used as a counter key.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Omw => "omw",
            Self::Dup => "dup",
            Self::Rep => "rep",
            Self::Sciname => "sciname",
            Self::Typo => "typo",
            Self::Diff => "diff",
            Self::Same => "same",
            Self::Ident => "ident",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.label().to_uppercase())
    }
}

/// Set of tags attached to one synset, iterated in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    /// Empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Adds a tag; returns false if it was already present.
    pub fn insert(&mut self, tag: Tag) -> bool {
        self.0.insert(tag)
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, tag: Tag) -> bool {
        self.0.contains(&tag)
    }

    /// True when no tag fired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Tags in report order.
    pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for tag in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{tag}")?;
            first = false;
        }
        Ok(())
    }
}

const TOTAL: &str = "total";

/// Per-tag tallies plus a running total, kept in report order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCounter {
    counts: IndexMap<String, usize>,
}

impl Default for TagCounter {
    fn default() -> Self {
        let mut counts = IndexMap::with_capacity(Tag::ORDER.len() + 1);
        counts.insert(TOTAL.to_string(), 0);
        for tag in Tag::ORDER {
            counts.insert(tag.label().to_string(), 0);
        }
        Self { counts }
    }
}

impl TagCounter {
    /// Counter with every tag at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one classified synset.
    pub fn record(&mut self, tags: &TagSet) {
        *self.counts.entry(TOTAL.to_string()).or_insert(0) += 1;
        for tag in tags.iter() {
            *self.counts.entry(tag.label().to_string()).or_insert(0) += 1;
        }
    }

    /// Adds another counter's tallies to this one.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.counts {
            *self.counts.entry(key.clone()).or_insert(0) += value;
        }
    }

    /// Tally for a tag.
    #[must_use]
    pub fn get(&self, tag: Tag) -> usize {
        self.counts.get(tag.label()).copied().unwrap_or(0)
    }

    /// Number of synsets recorded.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.get(TOTAL).copied().unwrap_or(0)
    }

    /// `label: count` lines, total first then tags in report order.
    #[must_use]
    pub fn summary(&self) -> Vec<String> {
        self.counts
            .iter()
            .map(|(label, count)| format!("{label}: {count}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_sets_render_in_report_order() {
        let tags: TagSet = [Tag::Same, Tag::Rep, Tag::Sciname].into_iter().collect();
        assert_eq!(tags.to_string(), "[REP] [SCINAME] [SAME]");
        assert_eq!(TagSet::new().to_string(), "");
    }

    #[test]
    fn tag_sets_serialize_as_labels() {
        let tags: TagSet = [Tag::Diff, Tag::Omw].into_iter().collect();
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["omw","diff"]"#);
    }

    #[test]
    fn counter_tracks_every_tag_and_total() {
        let mut counter = TagCounter::new();
        counter.record(&[Tag::Diff, Tag::Dup].into_iter().collect());
        counter.record(&[Tag::Ident].into_iter().collect());
        assert_eq!(counter.total(), 2);
        assert_eq!(counter.get(Tag::Diff), 1);
        assert_eq!(counter.get(Tag::Dup), 1);
        assert_eq!(counter.get(Tag::Same), 0);

        let mut other = TagCounter::new();
        other.record(&[Tag::Diff].into_iter().collect());
        counter.merge(&other);
        assert_eq!(counter.get(Tag::Diff), 2);
        assert_eq!(counter.total(), 3);
    }

    #[test]
    fn summary_starts_with_total() {
        let summary = TagCounter::new().summary();
        assert_eq!(summary.len(), 9);
        assert_eq!(summary[0], "total: 0");
        assert_eq!(summary[1], "omw: 0");
        assert_eq!(summary[8], "ident: 0");
    }
}
