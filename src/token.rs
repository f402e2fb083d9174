//! Token model for the Galach query language
//!
//! Every token carries the exact substring it was matched from (`lexeme`)
//! and its byte offset in the source (`position`), so syntax trees and
//! correction logs can always be traced back to the input.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Category payload of a token
///
/// Each variant carries only the fields that category needs; the surface
/// form common to all tokens lives on [`Token`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenKind {
    /// Run of inter-token spacing
    Whitespace,
    /// Unquoted term, optionally qualified as `domain:word`
    Word {
        word: String,
        domain: Option<String>,
    },
    /// Quoted term, optionally qualified as `domain:"..."`
    ///
    /// `phrase` is the inner content with escape sequences decoded.
    Phrase {
        phrase: String,
        domain: Option<String>,
        quote: char,
    },
    /// `@user` term
    User { name: String, marker: char },
    /// `#tag` term
    Tag { name: String, marker: char },
    /// Opening of a group, possibly domain-qualified: `(` or `domain:(`
    GroupBegin {
        domain: Option<String>,
        delimiter: char,
    },
    /// Closing `)`
    GroupEnd,
    /// Textual `AND`
    LogicalAnd,
    /// Textual `OR`
    LogicalOr,
    /// Textual `NOT`
    LogicalNot,
    /// Symbolic `!`, prefix to a single term or group
    LogicalNot2,
    /// `+` prefix
    Include,
    /// `-` prefix
    Exclude,
    /// Catch-all for input no rule matched; always stripped by the parser
    Bailout,
}

impl TokenKind {
    /// Bit flag identifying this category
    pub const fn flags(&self) -> TokenFlags {
        match self {
            TokenKind::Whitespace => TokenFlags::WHITESPACE,
            TokenKind::Word { .. } => TokenFlags::WORD,
            TokenKind::Phrase { .. } => TokenFlags::PHRASE,
            TokenKind::User { .. } => TokenFlags::USER,
            TokenKind::Tag { .. } => TokenFlags::TAG,
            TokenKind::GroupBegin { .. } => TokenFlags::GROUP_BEGIN,
            TokenKind::GroupEnd => TokenFlags::GROUP_END,
            TokenKind::LogicalAnd => TokenFlags::LOGICAL_AND,
            TokenKind::LogicalOr => TokenFlags::LOGICAL_OR,
            TokenKind::LogicalNot => TokenFlags::LOGICAL_NOT,
            TokenKind::LogicalNot2 => TokenFlags::LOGICAL_NOT_2,
            TokenKind::Include => TokenFlags::INCLUDE,
            TokenKind::Exclude => TokenFlags::EXCLUDE,
            TokenKind::Bailout => TokenFlags::BAILOUT,
        }
    }
}

/// Power-of-two token category flags
///
/// The parser's shift and reduce rules test set membership with a single
/// bitwise AND instead of matching on every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenFlags(pub u16);

impl TokenFlags {
    pub const WHITESPACE: TokenFlags = TokenFlags(1);
    pub const WORD: TokenFlags = TokenFlags(1 << 1);
    pub const PHRASE: TokenFlags = TokenFlags(1 << 2);
    pub const USER: TokenFlags = TokenFlags(1 << 3);
    pub const TAG: TokenFlags = TokenFlags(1 << 4);
    pub const GROUP_BEGIN: TokenFlags = TokenFlags(1 << 5);
    pub const GROUP_END: TokenFlags = TokenFlags(1 << 6);
    pub const LOGICAL_AND: TokenFlags = TokenFlags(1 << 7);
    pub const LOGICAL_OR: TokenFlags = TokenFlags(1 << 8);
    pub const LOGICAL_NOT: TokenFlags = TokenFlags(1 << 9);
    pub const LOGICAL_NOT_2: TokenFlags = TokenFlags(1 << 10);
    pub const INCLUDE: TokenFlags = TokenFlags(1 << 11);
    pub const EXCLUDE: TokenFlags = TokenFlags(1 << 12);
    pub const BAILOUT: TokenFlags = TokenFlags(1 << 13);

    /// Terminals that become `Term` nodes
    pub const TERM: TokenFlags =
        TokenFlags(Self::WORD.0 | Self::PHRASE.0 | Self::USER.0 | Self::TAG.0);
    /// `NOT` and `!`
    pub const OPERATOR_NOT: TokenFlags =
        TokenFlags(Self::LOGICAL_NOT.0 | Self::LOGICAL_NOT_2.0);
    /// `+` and `-`
    pub const OPERATOR_INCLUSIVITY: TokenFlags =
        TokenFlags(Self::INCLUDE.0 | Self::EXCLUDE.0);
    /// Operators glued to the operand that follows: `+`, `-`, `!`
    pub const OPERATOR_PREFIX: TokenFlags =
        TokenFlags(Self::OPERATOR_INCLUSIVITY.0 | Self::LOGICAL_NOT_2.0);
    /// All unary operators
    pub const OPERATOR_UNARY: TokenFlags =
        TokenFlags(Self::OPERATOR_INCLUSIVITY.0 | Self::OPERATOR_NOT.0);
    /// `AND` and `OR`
    pub const OPERATOR_BINARY: TokenFlags =
        TokenFlags(Self::LOGICAL_AND.0 | Self::LOGICAL_OR.0);
    /// Every operator
    pub const OPERATOR: TokenFlags =
        TokenFlags(Self::OPERATOR_UNARY.0 | Self::OPERATOR_BINARY.0);
    /// `(` and `)`
    pub const GROUP_DELIMITER: TokenFlags =
        TokenFlags(Self::GROUP_BEGIN.0 | Self::GROUP_END.0);

    /// Whether this flag set shares any bit with `other`
    pub const fn intersects(self, other: TokenFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for TokenFlags {
    type Output = TokenFlags;

    fn bitor(self, rhs: TokenFlags) -> TokenFlags {
        TokenFlags(self.0 | rhs.0)
    }
}

/// A single token: category payload plus the matched source substring
/// and its 0-based byte offset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }

    /// Whether this token belongs to any of the given categories
    pub fn is_any(&self, flags: TokenFlags) -> bool {
        self.kind.flags().intersects(flags)
    }
}

/// Ordered token list together with the source it was produced from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSequence {
    pub tokens: Vec<Token>,
    pub source: String,
}

impl TokenSequence {
    pub fn new(tokens: Vec<Token>, source: impl Into<String>) -> Self {
        Self {
            tokens,
            source: source.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_distinct_powers_of_two() {
        let all = [
            TokenFlags::WHITESPACE,
            TokenFlags::WORD,
            TokenFlags::PHRASE,
            TokenFlags::USER,
            TokenFlags::TAG,
            TokenFlags::GROUP_BEGIN,
            TokenFlags::GROUP_END,
            TokenFlags::LOGICAL_AND,
            TokenFlags::LOGICAL_OR,
            TokenFlags::LOGICAL_NOT,
            TokenFlags::LOGICAL_NOT_2,
            TokenFlags::INCLUDE,
            TokenFlags::EXCLUDE,
            TokenFlags::BAILOUT,
        ];
        for (i, a) in all.iter().enumerate() {
            assert_eq!(a.0.count_ones(), 1);
            for b in &all[i + 1..] {
                assert!(!a.intersects(*b));
            }
        }
    }

    #[test]
    fn test_operator_composites() {
        assert!(TokenFlags::LOGICAL_NOT.intersects(TokenFlags::OPERATOR_NOT));
        assert!(TokenFlags::LOGICAL_NOT_2.intersects(TokenFlags::OPERATOR_PREFIX));
        assert!(!TokenFlags::LOGICAL_NOT.intersects(TokenFlags::OPERATOR_PREFIX));
        assert!(TokenFlags::INCLUDE.intersects(TokenFlags::OPERATOR));
        assert!(!TokenFlags::GROUP_BEGIN.intersects(TokenFlags::OPERATOR));
        assert!(TokenFlags::GROUP_END.intersects(TokenFlags::GROUP_DELIMITER));
    }

    #[test]
    fn test_token_membership() {
        let token = Token::new(
            TokenKind::Word {
                word: "rust".to_string(),
                domain: None,
            },
            "rust",
            0,
        );
        assert!(token.is_any(TokenFlags::TERM));
        assert!(!token.is_any(TokenFlags::OPERATOR));
    }

    #[test]
    fn test_token_serialization_round_trip() {
        let token = Token::new(
            TokenKind::Phrase {
                phrase: "hello world".to_string(),
                domain: Some("title".to_string()),
                quote: '"',
            },
            "title:\"hello world\"",
            3,
        );
        let json = serde_json::to_string(&token).unwrap();
        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(token, back);
    }
}
