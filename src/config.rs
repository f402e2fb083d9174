use serde::{Deserialize, Serialize};

/// Tokenizer configuration
///
/// Gates the recognizers that not every deployment wants. Disabling a
/// recognizer removes its rule from the tokenizer's table, so the affected
/// syntax tokenizes as ordinary words instead.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Recognize `field:` prefixes on words, phrases and groups
    pub domains: bool,
    /// Recognize `@user` terms
    pub users: bool,
    /// Recognize `#tag` terms
    pub tags: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            domains: true,
            users: true,
            tags: true,
        }
    }
}

impl TokenizerConfig {
    /// Plain-text preset: words, phrases, groups and operators only
    pub fn text() -> Self {
        Self {
            domains: false,
            users: false,
            tags: false,
        }
    }
}
