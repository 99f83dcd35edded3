use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A synset's definition fragments reduced to a single string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedDefinition {
    /// Surviving fragments joined with `"; "`.
    pub text: String,
    /// Fragments dropped because the longest fragment already contains them.
    pub elided: BTreeSet<String>,
}

impl JoinedDefinition {
    /// True when at least one fragment was folded into the longest one.
    #[must_use]
    pub fn has_repetition(&self) -> bool {
        !self.elided.is_empty()
    }
}

/// Joins definition fragments, eliding any fragment `d` for which `d;`
/// already occurs inside the longest fragment.
///
/// The longest fragment is measured in characters; on a tie the first one
/// wins. Identical fragments are not deduplicated.
#[must_use]
pub fn join_definitions<S: AsRef<str>>(definitions: &[S]) -> JoinedDefinition {
    let Some(longest) = longest_fragment(definitions) else {
        return JoinedDefinition::default();
    };

    let mut elided = BTreeSet::new();
    let mut kept = Vec::with_capacity(definitions.len());
    for fragment in definitions.iter().map(AsRef::as_ref) {
        if fragment != longest && longest.contains(&format!("{fragment};")) {
            elided.insert(fragment.to_string());
        } else {
            kept.push(fragment);
        }
    }

    JoinedDefinition {
        text: kept.join("; "),
        elided,
    }
}

fn longest_fragment<S: AsRef<str>>(definitions: &[S]) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for fragment in definitions.iter().map(AsRef::as_ref) {
        let length = fragment.chars().count();
        if best.map_or(true, |(_, best_len)| length > best_len) {
            best = Some((fragment, length));
        }
    }
    best.map(|(fragment, _)| fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_fragments_into_the_longest() {
        let definitions = [
            "canvasback",
            "redhead",
            "pochard",
            "canvasback; redhead; pochard; etc. ❲Aythya❳",
        ];
        let joined = join_definitions(&definitions);
        assert_eq!(joined.text, "canvasback; redhead; pochard; etc. ❲Aythya❳");
        let expected: BTreeSet<String> = ["canvasback", "redhead", "pochard"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(joined.elided, expected);
        assert!(joined.has_repetition());
    }

    #[test]
    fn empty_definitions_join_to_nothing() {
        let joined = join_definitions::<&str>(&[]);
        assert_eq!(joined.text, "");
        assert!(joined.elided.is_empty());
    }

    #[test]
    fn independent_fragments_are_all_kept() {
        let joined = join_definitions(&["a domesticated carnivore", "bred in many varieties"]);
        assert_eq!(joined.text, "a domesticated carnivore; bred in many varieties");
        assert!(!joined.has_repetition());
    }

    #[test]
    fn fragment_needs_a_trailing_semicolon_to_be_elided() {
        // "pochard" only ends the longest fragment, so it is not followed by ';'.
        let joined = join_definitions(&["pochard", "canvasback; redhead; pochard"]);
        assert_eq!(joined.text, "pochard; canvasback; redhead; pochard");
        assert!(joined.elided.is_empty());
    }

    #[test]
    fn first_longest_wins_ties_and_identical_copies_survive() {
        let joined = join_definitions(&["same text", "same text", "x"]);
        assert_eq!(joined.text, "same text; same text; x");
        assert!(joined.elided.is_empty());
    }

    #[test]
    fn length_is_counted_in_characters() {
        // "❲❲❲❲" is 12 bytes but only 4 characters.
        let joined = join_definitions(&["ab", "ab; c", "❲❲❲❲"]);
        assert_eq!(joined.text, "ab; c; ❲❲❲❲");
        assert!(joined.elided.contains("ab"));
    }
}
