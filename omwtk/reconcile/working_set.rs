use std::{collections::BTreeSet, fs, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::ReconcileError,
    repository::SynsetRepository,
    synset::SynsetId,
};

/// Ids selected for a run, plus the raw entries that failed to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSet {
    /// Parsed ids.
    pub ids: BTreeSet<SynsetId>,
    /// Entries excluded because they are not valid ids.
    pub malformed: Vec<ReconcileError>,
}

impl WorkingSet {
    /// Parses one id per line; blank lines are skipped.
    #[must_use]
    pub fn parse_id_list(text: &str) -> Self {
        let mut set = Self::default();
        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            match SynsetId::parse(line) {
                Ok(id) => {
                    set.ids.insert(id);
                }
                Err(err) => set.malformed.push(err),
            }
        }
        set
    }

    /// Reads an id list file.
    pub fn read_id_file(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::parse_id_list(&fs::read_to_string(path)?))
    }

    /// Ids known to both sources.
    pub async fn intersection(
        omw: &dyn SynsetRepository,
        gwn: &dyn SynsetRepository,
    ) -> Result<Self, ReconcileError> {
        let omw_ids = omw.list_synset_ids().await?;
        let gwn_ids = gwn.list_synset_ids().await?;
        Ok(Self {
            ids: omw_ids.intersection(&gwn_ids).copied().collect(),
            malformed: Vec::new(),
        })
    }

    /// The caller's subset when given, the intersection of both sources
    /// otherwise.
    pub async fn resolve(
        omw: &dyn SynsetRepository,
        gwn: &dyn SynsetRepository,
        subset: Option<Self>,
    ) -> Result<Self, ReconcileError> {
        match subset {
            Some(subset) => Ok(subset),
            None => Self::intersection(omw, gwn).await,
        }
    }

    /// Number of usable ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when no usable id is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A synset present in OMW but missing from GWN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSynsetEntry {
    /// Synset id.
    pub id: SynsetId,
    /// First lemma, or a placeholder.
    pub lemma: String,
    /// Raw definitions.
    pub definitions: Vec<String>,
}

impl NewSynsetEntry {
    /// Tab-separated listing lines; extra definitions go on indented lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut definitions = self.definitions.iter();
        let first = definitions.next().map_or("** no def **", String::as_str);
        let mut lines = vec![format!("{}\t{}\t{}", self.id, self.lemma, first)];
        lines.extend(definitions.map(|definition| format!("\t\t{definition}")));
        lines
    }
}

/// Synsets only OMW knows about.
pub async fn omw_only(
    omw: &dyn SynsetRepository,
    gwn: &dyn SynsetRepository,
) -> Result<Vec<NewSynsetEntry>, ReconcileError> {
    let omw_ids = omw.list_synset_ids().await?;
    let gwn_ids = gwn.list_synset_ids().await?;
    let mut entries = Vec::new();
    for id in omw_ids.difference(&gwn_ids) {
        let synset = omw.get_synset(id).await?;
        entries.push(NewSynsetEntry {
            id: *id,
            lemma: synset.lemma().unwrap_or("** no lex **").to_string(),
            definitions: synset.definitions,
        });
    }
    Ok(entries)
}

const SAMPLE_SIZE: usize = 5;

/// Per-source synset counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    /// Synsets in OMW.
    pub omw: usize,
    /// Synsets in GWN.
    pub gwn: usize,
    /// Synsets in both.
    pub shared: usize,
    /// First ids of OMW.
    pub omw_sample: Vec<SynsetId>,
    /// First ids of GWN.
    pub gwn_sample: Vec<SynsetId>,
}

impl SourceCounts {
    /// Counts both sources.
    pub async fn collect(
        omw: &dyn SynsetRepository,
        gwn: &dyn SynsetRepository,
    ) -> Result<Self, ReconcileError> {
        let omw_ids = omw.list_synset_ids().await?;
        let gwn_ids = gwn.list_synset_ids().await?;
        Ok(Self {
            omw: omw_ids.len(),
            gwn: gwn_ids.len(),
            shared: omw_ids.intersection(&gwn_ids).count(),
            omw_sample: omw_ids.iter().take(SAMPLE_SIZE).copied().collect(),
            gwn_sample: gwn_ids.iter().take(SAMPLE_SIZE).copied().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repository::MemoryRepository,
        synset::{Source, Synset},
    };

    fn id(raw: &str) -> SynsetId {
        raw.parse().unwrap()
    }

    fn repositories() -> (MemoryRepository, MemoryRepository) {
        let omw = MemoryRepository::new(Source::Omw)
            .with_synset(Synset::new(Source::Omw, id("00000001-n")).with_definition("one"))
            .with_synset(
                Synset::new(Source::Omw, id("00000002-n"))
                    .with_lemma("two")
                    .with_definition("second")
                    .with_definition("deuxième"),
            )
            .with_synset(Synset::new(Source::Omw, id("00000003-v")));
        let gwn = MemoryRepository::new(Source::Gwn)
            .with_synset(Synset::new(Source::Gwn, id("00000001-n")).with_definition("one"))
            .with_synset(Synset::new(Source::Gwn, id("00000004-n")).with_definition("four"));
        (omw, gwn)
    }

    #[test]
    fn id_list_excludes_malformed_lines() {
        let set = WorkingSet::parse_id_list("02084071-n\n\n  n00001740 \nnot-an-id\n02084071-n\n123\n");
        assert_eq!(set.len(), 2);
        assert_eq!(set.malformed.len(), 2);
        assert!(matches!(&set.malformed[0], ReconcileError::MalformedId(raw) if raw == "not-an-id"));
    }

    #[tokio::test]
    async fn intersection_keeps_shared_ids() {
        let (omw, gwn) = repositories();
        let set = WorkingSet::resolve(&omw, &gwn, None).await.unwrap();
        assert_eq!(set.ids.into_iter().collect::<Vec<_>>(), vec![id("00000001-n")]);

        let subset = WorkingSet::parse_id_list("00000004-n");
        let chosen = WorkingSet::resolve(&omw, &gwn, Some(subset.clone())).await.unwrap();
        assert_eq!(chosen, subset);
    }

    #[tokio::test]
    async fn lists_omw_only_synsets_with_placeholders() {
        let (omw, gwn) = repositories();
        let entries = omw_only(&omw, &gwn).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].lines(),
            vec!["00000002-n\ttwo\tsecond", "\t\tdeuxième"]
        );
        assert_eq!(entries[1].lines(), vec!["00000003-v\t** no lex **\t** no def **"]);
    }

    #[tokio::test]
    async fn counts_each_source() {
        let (omw, gwn) = repositories();
        let counts = SourceCounts::collect(&omw, &gwn).await.unwrap();
        assert_eq!((counts.omw, counts.gwn, counts.shared), (3, 2, 1));
        assert_eq!(counts.omw_sample.len(), 3);
    }
}
