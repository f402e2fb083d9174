//! Correction log for parser error recovery
//!
//! The parser never rejects input; instead every repair it makes is
//! appended here, in the order the defects were noticed. Downstream
//! consumers key on the stable ordinals to explain to users what was
//! dropped from their query.

use crate::token::Token;
use serde::{Deserialize, Serialize};

/// Kind of recovery action the parser took
///
/// The discriminant values are a stable part of the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum CorrectionKind {
    /// Unary operator dropped because an operator followed it
    UnaryOperatorPrecedingOperatorIgnored = 0,
    /// Unary operator dropped because nothing usable followed it
    UnaryOperatorMissingOperandIgnored = 1,
    /// Binary operator dropped because it had no left operand
    BinaryOperatorMissingLeftOperandIgnored = 2,
    /// Binary operator dropped because it had no right operand
    BinaryOperatorMissingRightOperandIgnored = 3,
    /// Binary operator dropped because it directly followed an operator
    BinaryOperatorFollowingOperatorIgnored = 4,
    /// `NOT`/`!` dropped because negating `+`/`-` is not meaningful
    LogicalNotPrecedingInclusivityIgnored = 5,
    /// Empty group dropped together with the operators bound to it
    EmptyGroupIgnored = 6,
    /// `(` without a matching `)` dropped
    UnmatchedGroupLeftDelimiterIgnored = 7,
    /// `)` without a matching `(` dropped
    UnmatchedGroupRightDelimiterIgnored = 8,
    /// Unrecognizable input dropped
    BailoutTokenIgnored = 9,
}

impl CorrectionKind {
    /// Stable numeric identifier of this kind
    pub const fn ordinal(self) -> u8 {
        self as u8
    }
}

/// A single recovery action and the tokens it removed from the query
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub kind: CorrectionKind,
    pub tokens: Vec<Token>,
}

impl Correction {
    pub fn new(kind: CorrectionKind, tokens: Vec<Token>) -> Self {
        Self { kind, tokens }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn test_ordinals_are_stable() {
        assert_eq!(
            CorrectionKind::UnaryOperatorPrecedingOperatorIgnored.ordinal(),
            0
        );
        assert_eq!(
            CorrectionKind::UnaryOperatorMissingOperandIgnored.ordinal(),
            1
        );
        assert_eq!(
            CorrectionKind::BinaryOperatorMissingLeftOperandIgnored.ordinal(),
            2
        );
        assert_eq!(
            CorrectionKind::BinaryOperatorMissingRightOperandIgnored.ordinal(),
            3
        );
        assert_eq!(
            CorrectionKind::BinaryOperatorFollowingOperatorIgnored.ordinal(),
            4
        );
        assert_eq!(
            CorrectionKind::LogicalNotPrecedingInclusivityIgnored.ordinal(),
            5
        );
        assert_eq!(CorrectionKind::EmptyGroupIgnored.ordinal(), 6);
        assert_eq!(
            CorrectionKind::UnmatchedGroupLeftDelimiterIgnored.ordinal(),
            7
        );
        assert_eq!(
            CorrectionKind::UnmatchedGroupRightDelimiterIgnored.ordinal(),
            8
        );
        assert_eq!(CorrectionKind::BailoutTokenIgnored.ordinal(), 9);
    }

    #[test]
    fn test_serialization_uses_screaming_snake_case() {
        let correction = Correction::new(
            CorrectionKind::BailoutTokenIgnored,
            vec![Token::new(TokenKind::Bailout, "\u{1}", 0)],
        );
        let json = serde_json::to_string(&correction).unwrap();
        assert!(json.contains("BAILOUT_TOKEN_IGNORED"));
        let back: Correction = serde_json::from_str(&json).unwrap();
        assert_eq!(correction, back);
    }
}
