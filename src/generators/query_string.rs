//! QueryString generator: renders a syntax tree to Elasticsearch
//! `query_string` syntax
//!
//! Operators are canonicalized (`NOT` for both negation spellings) and
//! the characters that syntax reserves are backslash-escaped inside
//! terms, so repaired user input can be handed to the backend verbatim.

use super::{AggregateVisitor, NodeVisitor};
use crate::ast::Node;
use crate::error::{GalachError, Result};
use crate::parser::SyntaxTree;
use crate::token::TokenKind;

/// Renders a syntax tree to Elasticsearch `query_string` text
pub struct QueryStringGenerator {
    visitor: AggregateVisitor,
}

impl Default for QueryStringGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryStringGenerator {
    pub fn new() -> Self {
        Self {
            visitor: AggregateVisitor::new(vec![
                Box::new(QueryVisitor),
                Box::new(GroupVisitor),
                Box::new(LogicalAndVisitor),
                Box::new(LogicalOrVisitor),
                Box::new(LogicalNotVisitor),
                Box::new(IncludeVisitor),
                Box::new(ExcludeVisitor),
                Box::new(TermVisitor),
            ]),
        }
    }

    pub fn generate(&self, tree: &SyntaxTree) -> Result<String> {
        self.generate_node(&tree.root)
    }

    pub fn generate_node(&self, node: &Node) -> Result<String> {
        self.visitor.dispatch(node)
    }
}

/// Characters reserved by the query_string syntax
const RESERVED: &str = r#"+-=><!(){}[]^"~*?:\/&|"#;

/// Backslash-escape every reserved character
fn escape_term(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape phrase content for quoting
fn escape_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

struct TermVisitor;

impl NodeVisitor for TermVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::Term { .. })
    }

    fn visit(&self, node: &Node, _dispatch: &AggregateVisitor) -> Result<String> {
        let Node::Term { token } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        match &token.kind {
            TokenKind::Word { word, domain } => {
                let escaped = escape_term(word);
                Ok(match domain {
                    Some(domain) => format!("{domain}:{escaped}"),
                    None => escaped,
                })
            }
            TokenKind::Phrase { phrase, domain, .. } => {
                let escaped = escape_quoted(phrase);
                Ok(match domain {
                    Some(domain) => format!("{domain}:\"{escaped}\""),
                    None => format!("\"{escaped}\""),
                })
            }
            TokenKind::User { name, marker } | TokenKind::Tag { name, marker } => {
                Ok(format!("{marker}{}", escape_term(name)))
            }
            other => Err(GalachError::RenderFailed {
                kind: node.kind(),
                reason: format!("non-terminal token {other:?} in term node"),
            }),
        }
    }
}

struct IncludeVisitor;

impl NodeVisitor for IncludeVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::Include { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::Include { operand, .. } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        Ok(format!("+{}", dispatch.dispatch(operand)?))
    }
}

struct ExcludeVisitor;

impl NodeVisitor for ExcludeVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::Exclude { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::Exclude { operand, .. } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        Ok(format!("-{}", dispatch.dispatch(operand)?))
    }
}

struct LogicalNotVisitor;

impl NodeVisitor for LogicalNotVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::LogicalNot { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::LogicalNot { operand, .. } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        Ok(format!("NOT {}", dispatch.dispatch(operand)?))
    }
}

struct LogicalAndVisitor;

impl NodeVisitor for LogicalAndVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::LogicalAnd { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::LogicalAnd { left, right, .. } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        Ok(format!(
            "{} AND {}",
            dispatch.dispatch(left)?,
            dispatch.dispatch(right)?
        ))
    }
}

struct LogicalOrVisitor;

impl NodeVisitor for LogicalOrVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::LogicalOr { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::LogicalOr { left, right, .. } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        Ok(format!(
            "{} OR {}",
            dispatch.dispatch(left)?,
            dispatch.dispatch(right)?
        ))
    }
}

struct GroupVisitor;

impl NodeVisitor for GroupVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::Group { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::Group {
            nodes, token_left, ..
        } = node
        else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        let members = nodes
            .iter()
            .map(|n| dispatch.dispatch(n))
            .collect::<Result<Vec<_>>>()?
            .join(" ");
        Ok(match &token_left.kind {
            TokenKind::GroupBegin {
                domain: Some(domain),
                ..
            } => format!("{domain}:({members})"),
            _ => format!("({members})"),
        })
    }
}

struct QueryVisitor;

impl NodeVisitor for QueryVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::Query { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::Query { nodes } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        Ok(nodes
            .iter()
            .map(|n| dispatch.dispatch(n))
            .collect::<Result<Vec<_>>>()?
            .join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::tokenizer::Tokenizer;

    fn render(input: &str) -> String {
        let tree = Parser::new().parse(Tokenizer::new().tokenize(input));
        QueryStringGenerator::new().generate(&tree).unwrap()
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        assert_eq!(render("c++"), r"c\+\+");
        assert_eq!(render("what?"), r"what\?");
        assert_eq!(render("a/b"), r"a\/b");
    }

    #[test]
    fn test_negation_is_canonicalized() {
        assert_eq!(render("NOT a"), "NOT a");
        assert_eq!(render("!a"), "NOT a");
    }

    #[test]
    fn test_domains_and_groups() {
        assert_eq!(render("title:rust"), "title:rust");
        assert_eq!(render("field:(a b)"), "field:(a b)");
    }

    #[test]
    fn test_phrase_rendering() {
        assert_eq!(render(r#""hello world""#), r#""hello world""#);
    }

    #[test]
    fn test_inclusivity_prefixes() {
        assert_eq!(render("+foo -bar"), "+foo -bar");
    }
}
