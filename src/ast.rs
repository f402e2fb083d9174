//! Abstract syntax tree for parsed queries
//!
//! Nodes own their subtrees outright; the tree has no sharing and no
//! cycles. Operator and delimiter tokens are kept on the nodes they
//! produced so a tree can always be rendered back to query text.

use crate::token::Token;
use serde::{Deserialize, Serialize};

/// A node in the query syntax tree
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    /// A single terminal: word, phrase, `@user` or `#tag`
    Term { token: Token },
    /// `+` applied to a term or group
    Include { operand: Box<Node>, token: Token },
    /// `-` applied to a term or group
    Exclude { operand: Box<Node>, token: Token },
    /// `NOT` or `!` applied to an operand
    LogicalNot { operand: Box<Node>, token: Token },
    /// `left AND right`
    LogicalAnd {
        left: Box<Node>,
        right: Box<Node>,
        token: Token,
    },
    /// `left OR right`
    LogicalOr {
        left: Box<Node>,
        right: Box<Node>,
        token: Token,
    },
    /// Parenthesized subquery, possibly domain-qualified
    Group {
        nodes: Vec<Node>,
        token_left: Token,
        token_right: Token,
    },
    /// Root node; children are implicitly joined at rendering time
    Query { nodes: Vec<Node> },
}

impl Node {
    /// Snake_case name of this node kind, for dispatch and diagnostics
    pub const fn kind(&self) -> &'static str {
        match self {
            Node::Term { .. } => "term",
            Node::Include { .. } => "include",
            Node::Exclude { .. } => "exclude",
            Node::LogicalNot { .. } => "logical_not",
            Node::LogicalAnd { .. } => "logical_and",
            Node::LogicalOr { .. } => "logical_or",
            Node::Group { .. } => "group",
            Node::Query { .. } => "query",
        }
    }

    /// Visit every token embedded in this subtree, depth-first
    pub fn for_each_token(&self, f: &mut impl FnMut(&Token)) {
        match self {
            Node::Term { token } => f(token),
            Node::Include { operand, token }
            | Node::Exclude { operand, token }
            | Node::LogicalNot { operand, token } => {
                f(token);
                operand.for_each_token(f);
            }
            Node::LogicalAnd { left, right, token }
            | Node::LogicalOr { left, right, token } => {
                left.for_each_token(f);
                f(token);
                right.for_each_token(f);
            }
            Node::Group {
                nodes,
                token_left,
                token_right,
            } => {
                f(token_left);
                for node in nodes {
                    node.for_each_token(f);
                }
                f(token_right);
            }
            Node::Query { nodes } => {
                for node in nodes {
                    node.for_each_token(f);
                }
            }
        }
    }

    /// All tokens embedded in this subtree, in source order
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        match self {
            Node::Term { token } => out.push(token),
            Node::Include { operand, token }
            | Node::Exclude { operand, token }
            | Node::LogicalNot { operand, token } => {
                out.push(token);
                operand.collect_tokens(out);
            }
            Node::LogicalAnd { left, right, token }
            | Node::LogicalOr { left, right, token } => {
                left.collect_tokens(out);
                out.push(token);
                right.collect_tokens(out);
            }
            Node::Group {
                nodes,
                token_left,
                token_right,
            } => {
                out.push(token_left);
                for node in nodes {
                    node.collect_tokens(out);
                }
                out.push(token_right);
            }
            Node::Query { nodes } => {
                for node in nodes {
                    node.collect_tokens(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn word(text: &str, position: usize) -> Token {
        Token::new(
            TokenKind::Word {
                word: text.to_string(),
                domain: None,
            },
            text,
            position,
        )
    }

    #[test]
    fn test_kind_names() {
        let term = Node::Term {
            token: word("a", 0),
        };
        assert_eq!(term.kind(), "term");
        assert_eq!(Node::Query { nodes: vec![] }.kind(), "query");
    }

    #[test]
    fn test_token_walk_is_in_source_order() {
        let and = Token::new(TokenKind::LogicalAnd, "AND", 2);
        let tree = Node::Query {
            nodes: vec![Node::LogicalAnd {
                left: Box::new(Node::Term {
                    token: word("a", 0),
                }),
                right: Box::new(Node::Term {
                    token: word("b", 6),
                }),
                token: and,
            }],
        };
        let positions: Vec<usize> = tree.tokens().iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 2, 6]);
    }
}
