use std::sync::OnceLock;

use regex::Regex;

/// Literal substitutions applied by [`Normalizer::fix_typo`].
const TYPO_FIXES: &[(&str, &str)] = &[(" ,", ","), (" )", ")")];

/// Pattern-based cleanup of single definition strings.
///
/// Scientific names are marked in the resource with the `❲ ❳` bracket pair,
/// e.g. `triggerfishes ❲Balistidae❳`. Every method is total: no input makes
/// them fail, and the empty string maps to the empty string.
#[derive(Debug, Clone)]
pub struct Normalizer {
    scientific_name: Regex,
    repeated_spaces: Regex,
}

impl Normalizer {
    /// Compiles the patterns.
    ///
    /// # Panics
    ///
    /// Never in practice: both patterns are compile-time constants.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scientific_name: Regex::new(r"(?s)❲.+❳").expect("scientific name pattern is valid"),
            repeated_spaces: Regex::new(r" {2,}").expect("whitespace pattern is valid"),
        }
    }

    /// Shared instance, compiled on first use.
    #[must_use]
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<Normalizer> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    /// True iff the text carries a `❲ … ❳` span.
    #[must_use]
    pub fn has_scientific_name(&self, text: &str) -> bool {
        self.scientific_name.is_match(text)
    }

    /// Removes the span running from the first `❲` to the last `❳` after it
    /// and trims the result. Text without a span is returned unchanged.
    #[must_use]
    pub fn remove_scientific_name(&self, text: &str) -> String {
        match self.scientific_name.find(text) {
            Some(span) => {
                let mut stripped = String::with_capacity(text.len());
                stripped.push_str(&text[..span.start()]);
                stripped.push_str(&text[span.end()..]);
                stripped.trim().to_string()
            }
            None => text.to_string(),
        }
    }

    /// Drops spaces in front of commas and closing parentheses, everywhere.
    #[must_use]
    pub fn fix_typo(&self, text: &str) -> String {
        let mut fixed = text.to_string();
        for (typo, replacement) in TYPO_FIXES {
            while fixed.contains(typo) {
                fixed = fixed.replace(typo, replacement);
            }
        }
        fixed
    }

    /// Collapses runs of spaces into one.
    #[must_use]
    pub fn normalize_whitespace(&self, text: &str) -> String {
        self.repeated_spaces.replace_all(text, " ").into_owned()
    }

    /// Removes a single trailing `;` and the whitespace it leaves behind.
    #[must_use]
    pub fn strip_trailing_semicolon(&self, text: &str) -> String {
        text.strip_suffix(';')
            .map_or_else(|| text.to_string(), |rest| rest.trim().to_string())
    }

    /// Canonical form of a reference (GWN) definition surface.
    #[must_use]
    pub fn normalize_reference(&self, surface: &str) -> String {
        self.strip_trailing_semicolon(&self.normalize_whitespace(surface))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// See [`Normalizer::has_scientific_name`].
#[must_use]
pub fn has_scientific_name(text: &str) -> bool {
    Normalizer::global().has_scientific_name(text)
}

/// See [`Normalizer::remove_scientific_name`].
#[must_use]
pub fn remove_scientific_name(text: &str) -> String {
    Normalizer::global().remove_scientific_name(text)
}

/// See [`Normalizer::fix_typo`].
#[must_use]
pub fn fix_typo(text: &str) -> String {
    Normalizer::global().fix_typo(text)
}
