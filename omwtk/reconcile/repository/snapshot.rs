use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use super::memory::{EditRow, MemoryRepository};
use crate::{
    error::ReconcileError,
    synset::{Source, Synset, SynsetId},
};

/// Synset entry as written in a snapshot file. Ids are kept as raw strings
/// so that a bad id is reported as such instead of as a JSON error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSynset {
    /// Raw synset id.
    pub id: String,
    /// Lemmas in display order.
    #[serde(default)]
    pub lemmas: Vec<String>,
    /// Raw definition fragments.
    #[serde(default)]
    pub definitions: Vec<String>,
}

/// Edit row as written in a snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEdit {
    /// Raw synset id.
    pub synset: String,
    /// Definition language.
    #[serde(default)]
    pub lang: Option<String>,
    /// Editing user.
    #[serde(default)]
    pub user: Option<String>,
}

/// JSON dump of one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Source the dump was taken from.
    pub source: Source,
    /// Every synset of the source.
    #[serde(default)]
    pub synsets: Vec<SnapshotSynset>,
    /// Definition edit side-table.
    #[serde(default)]
    pub editors: Vec<SnapshotEdit>,
}

impl Snapshot {
    /// Reads a snapshot and checks that it belongs to `expected`.
    ///
    /// An unreadable or unparsable file means the source cannot be opened and
    /// is reported as `RepositoryUnavailable`.
    pub fn load(path: impl AsRef<Path>, expected: Source) -> Result<Self, ReconcileError> {
        let path = path.as_ref();
        let unavailable = |reason: String| ReconcileError::RepositoryUnavailable {
            repo: expected,
            reason,
        };
        let raw = fs::read_to_string(path)
            .map_err(|err| unavailable(format!("reading {}: {err}", path.display())))?;
        let snapshot: Self = serde_json::from_str(&raw)
            .map_err(|err| unavailable(format!("parsing {}: {err}", path.display())))?;
        if snapshot.source != expected {
            return Err(unavailable(format!(
                "{} holds a {} snapshot",
                path.display(),
                snapshot.source
            )));
        }
        Ok(snapshot)
    }

    /// Builds an in-memory repository from the dump.
    ///
    /// Entries and edit rows with a malformed id are left out and returned
    /// next to the repository; everything else is loaded.
    #[must_use]
    pub fn into_repository(self) -> (MemoryRepository, Vec<ReconcileError>) {
        let repository = MemoryRepository::new(self.source);
        let mut malformed = Vec::new();
        for entry in self.synsets {
            let id = match SynsetId::parse(&entry.id) {
                Ok(id) => id,
                Err(err) => {
                    malformed.push(err);
                    continue;
                }
            };
            let mut synset = Synset::new(self.source, id);
            for lemma in entry.lemmas {
                synset.push_lemma(lemma);
            }
            synset.definitions = entry.definitions;
            repository.insert(synset);
        }
        for edit in self.editors {
            match SynsetId::parse(&edit.synset) {
                Ok(synset) => repository.record_edit(EditRow {
                    synset,
                    lang: edit.lang.unwrap_or_else(|| "eng".into()),
                    user: edit.user,
                }),
                Err(err) => malformed.push(err),
            }
        }
        (repository, malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{EditHistory, SynsetRepository};
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn loads_snapshot_into_repository() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("omw.json");
        let document = json!({
            "source": "omw",
            "synsets": [
                { "id": "02084071-n", "lemmas": ["dog", "dog"], "definitions": ["a domesticated canid"] },
                { "id": "n00001740", "definitions": [] }
            ],
            "editors": [ { "synset": "02084071-n", "user": "fcbond" } ]
        });
        fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

        let (repository, malformed) = Snapshot::load(&path, Source::Omw)
            .unwrap()
            .into_repository();
        assert!(malformed.is_empty());
        assert_eq!(repository.len(), 2);
        let dog = repository
            .get_synset(&"02084071-n".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(dog.lemmas, vec!["dog"]);
        let editors = repository
            .editors(&"02084071-n".parse().unwrap(), "eng")
            .await
            .unwrap();
        assert!(editors.contains("fcbond"));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempdir().unwrap();
        let result = Snapshot::load(dir.path().join("absent.json"), Source::Gwn);
        assert!(matches!(
            result,
            Err(ReconcileError::RepositoryUnavailable { repo: Source::Gwn, .. })
        ));
    }

    #[test]
    fn wrong_source_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gwn.json");
        fs::write(&path, r#"{ "source": "omw" }"#).unwrap();
        assert!(Snapshot::load(&path, Source::Gwn).is_err());
    }

    #[tokio::test]
    async fn malformed_ids_are_skipped_and_reported() {
        let snapshot = Snapshot {
            source: Source::Omw,
            synsets: vec![
                SnapshotSynset {
                    id: "02084071-n".into(),
                    lemmas: vec!["dog".into()],
                    definitions: vec!["a domesticated canid".into()],
                },
                SnapshotSynset {
                    id: "bogus".into(),
                    lemmas: Vec::new(),
                    definitions: Vec::new(),
                },
            ],
            editors: vec![SnapshotEdit {
                synset: "02084071".into(),
                lang: None,
                user: Some("fcbond".into()),
            }],
        };
        let (repository, malformed) = snapshot.into_repository();
        assert_eq!(
            malformed,
            vec![
                ReconcileError::MalformedId("bogus".into()),
                ReconcileError::MalformedId("02084071".into()),
            ]
        );
        assert_eq!(repository.len(), 1);
        let dog = repository
            .get_synset(&"02084071-n".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(dog.definitions, vec!["a domesticated canid"]);
    }
}
