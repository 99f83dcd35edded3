use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

/// Data source a synset was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Open Multilingual Wordnet, the edited source.
    Omw,
    /// Glossed reference wordnet, the comparison baseline.
    Gwn,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Omw => f.write_str("OMW"),
            Self::Gwn => f.write_str("GWN"),
        }
    }
}

/// Wordnet part of speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartOfSpeech {
    /// `n`
    Noun,
    /// `v`
    Verb,
    /// `a`
    Adjective,
    /// `r`
    Adverb,
    /// `s`, an adjective satellite.
    Satellite,
}

impl PartOfSpeech {
    /// Single-letter code used in identifiers.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Noun => 'n',
            Self::Verb => 'v',
            Self::Adjective => 'a',
            Self::Adverb => 'r',
            Self::Satellite => 's',
        }
    }

    /// Parses a single-letter code.
    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'n' => Some(Self::Noun),
            'v' => Some(Self::Verb),
            'a' => Some(Self::Adjective),
            'r' => Some(Self::Adverb),
            's' => Some(Self::Satellite),
            _ => None,
        }
    }
}

const OFFSET_DIGITS: usize = 8;
const MAX_OFFSET: u32 = 99_999_999;

/// Canonical synset identifier: an 8-digit offset plus a part-of-speech letter.
///
/// Accepted input forms are `00998674-a`, `00998674a` and `a00998674`; the
/// canonical output is always `00998674-a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SynsetId {
    offset: u32,
    pos: PartOfSpeech,
}

impl SynsetId {
    /// Builds an id from its parts; `None` when the offset needs more than
    /// eight digits.
    #[must_use]
    pub const fn new(offset: u32, pos: PartOfSpeech) -> Option<Self> {
        if offset > MAX_OFFSET {
            return None;
        }
        Some(Self { offset, pos })
    }

    /// Parses any accepted textual form.
    pub fn parse(raw: &str) -> Result<Self, ReconcileError> {
        let malformed = || ReconcileError::MalformedId(raw.to_string());
        let text = raw.trim();
        let (digits, letter) = if let Some((digits, letter)) = text.split_once('-') {
            (digits, letter)
        } else if text.starts_with(|c: char| c.is_ascii_alphabetic()) {
            let (letter, digits) = text.split_at(1);
            (digits, letter)
        } else if text.ends_with(|c: char| c.is_ascii_alphabetic()) {
            text.split_at(text.len() - 1)
        } else {
            return Err(malformed());
        };

        let mut letters = letter.chars();
        let pos = match (letters.next(), letters.next()) {
            (Some(c), None) => PartOfSpeech::from_letter(c).ok_or_else(malformed)?,
            _ => return Err(malformed()),
        };
        if digits.is_empty()
            || digits.len() > OFFSET_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }
        let offset = digits.parse().map_err(|_| malformed())?;
        Ok(Self { offset, pos })
    }

    /// Numeric offset.
    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Part of speech.
    #[must_use]
    pub const fn pos(&self) -> PartOfSpeech {
        self.pos
    }
}

impl fmt::Display for SynsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}-{}", self.offset, self.pos.letter())
    }
}

impl FromStr for SynsetId {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SynsetId {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SynsetId> for String {
    fn from(id: SynsetId) -> Self {
        id.to_string()
    }
}

/// A synset as stored by one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synset {
    /// Owning source.
    pub source: Source,
    /// Identifier.
    pub id: SynsetId,
    /// Lemmas in display order, without duplicates.
    #[serde(default)]
    pub lemmas: Vec<String>,
    /// Raw definition fragments in stored order.
    #[serde(default)]
    pub definitions: Vec<String>,
}

impl Synset {
    /// Creates a synset with no lemmas or definitions.
    #[must_use]
    pub const fn new(source: Source, id: SynsetId) -> Self {
        Self {
            source,
            id,
            lemmas: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// Appends a lemma unless it is already present.
    #[must_use]
    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.push_lemma(lemma);
        self
    }

    /// Appends a raw definition fragment.
    #[must_use]
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definitions.push(definition.into());
        self
    }

    /// Appends a lemma unless it is already present.
    pub fn push_lemma(&mut self, lemma: impl Into<String>) {
        let lemma = lemma.into();
        if !self.lemmas.contains(&lemma) {
            self.lemmas.push(lemma);
        }
    }

    /// First lemma, if any.
    #[must_use]
    pub fn lemma(&self) -> Option<&str> {
        self.lemmas.first().map(String::as_str)
    }

    /// The single definition surface a reference synset carries; empty when
    /// nothing is stored.
    #[must_use]
    pub fn definition_surface(&self) -> &str {
        self.definitions.first().map_or("", String::as_str)
    }

    /// Raw fragments joined for display.
    #[must_use]
    pub fn display_definition(&self) -> String {
        self.definitions.join("; ")
    }
}
