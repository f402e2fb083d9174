//! Native generator: renders a syntax tree back to Galach query text
//!
//! The output is parseable and yields a structurally equal tree, which
//! makes this generator the canonical way to serialize a repaired query
//! back to the user.

use super::{AggregateVisitor, NodeVisitor};
use crate::ast::Node;
use crate::error::{GalachError, Result};
use crate::parser::SyntaxTree;
use crate::token::TokenKind;

/// Renders a syntax tree to Galach query text
pub struct NativeGenerator {
    visitor: AggregateVisitor,
}

impl Default for NativeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeGenerator {
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

/// Escape phrase content for quoting: `\` and `"` get a backslash
fn escape_phrase(phrase: &str) -> String {
    let mut out = String::with_capacity(phrase.len());
    for c in phrase.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub struct TermVisitor;

impl NodeVisitor for TermVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::Term { .. })
    }

    fn visit(&self, node: &Node, _dispatch: &AggregateVisitor) -> Result<String> {
        let Node::Term { token } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        match &token.kind {
            TokenKind::Word { word, domain } => Ok(match domain {
                Some(domain) => format!("{domain}:{word}"),
                None => word.clone(),
            }),
            TokenKind::Phrase {
                phrase,
                domain,
                quote,
            } => {
                let escaped = escape_phrase(phrase);
                Ok(match domain {
                    Some(domain) => format!("{domain}:{quote}{escaped}{quote}"),
                    None => format!("{quote}{escaped}{quote}"),
                })
            }
            TokenKind::User { name, marker } | TokenKind::Tag { name, marker } => {
                Ok(format!("{marker}{name}"))
            }
            other => Err(GalachError::RenderFailed {
                kind: node.kind(),
                reason: format!("non-terminal token {other:?} in term node"),
            }),
        }
    }
}

pub struct IncludeVisitor;

impl NodeVisitor for IncludeVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::Include { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::Include { operand, token } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        Ok(format!("{}{}", token.lexeme, dispatch.dispatch(operand)?))
    }
}

pub struct ExcludeVisitor;

impl NodeVisitor for ExcludeVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::Exclude { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::Exclude { operand, token } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        Ok(format!("{}{}", token.lexeme, dispatch.dispatch(operand)?))
    }
}

pub struct LogicalNotVisitor;

impl NodeVisitor for LogicalNotVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::LogicalNot { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::LogicalNot { operand, token } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        let operand = dispatch.dispatch(operand)?;
        // Textual NOT needs a separator, symbolic ! glues to its operand
        Ok(match token.kind {
            TokenKind::LogicalNot2 => format!("!{operand}"),
            _ => format!("NOT {operand}"),
        })
    }
}

pub struct LogicalAndVisitor;

impl NodeVisitor for LogicalAndVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::LogicalAnd { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::LogicalAnd { left, right, token } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        Ok(format!(
            "{} {} {}",
            dispatch.dispatch(left)?,
            token.lexeme,
            dispatch.dispatch(right)?
        ))
    }
}

pub struct LogicalOrVisitor;

impl NodeVisitor for LogicalOrVisitor {
    fn accepts(&self, node: &Node) -> bool {
        matches!(node, Node::LogicalOr { .. })
    }

    fn visit(&self, node: &Node, dispatch: &AggregateVisitor) -> Result<String> {
        let Node::LogicalOr { left, right, token } = node else {
            return Err(GalachError::UnhandledNode(node.kind()));
        };
        Ok(format!(
            "{} {} {}",
            dispatch.dispatch(left)?,
            token.lexeme,
            dispatch.dispatch(right)?
        ))
    }
}

pub struct GroupVisitor;

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

pub struct QueryVisitor;

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
        NativeGenerator::new().generate(&tree).unwrap()
    }

    #[test]
    fn test_terms_and_prefixes() {
        assert_eq!(render("one two three"), "one two three");
        assert_eq!(render("+foo -bar"), "+foo -bar");
        assert_eq!(render("title:rust @alice #tag"), "title:rust @alice #tag");
    }

    #[test]
    fn test_operators_keep_their_spelling() {
        assert_eq!(render("a AND b OR c"), "a AND b OR c");
        assert_eq!(render("NOT a !b"), "NOT a !b");
    }

    #[test]
    fn test_groups() {
        assert_eq!(render("field:(a b) OR c"), "field:(a b) OR c");
        assert_eq!(render("(a OR b) AND c"), "(a OR b) AND c");
    }

    #[test]
    fn test_phrase_is_requoted_and_escaped() {
        assert_eq!(render(r#"title:"say \"hi\"""#), r#"title:"say \"hi\"""#);
    }

    #[test]
    fn test_repaired_query_renders_without_dropped_tokens() {
        assert_eq!(render("foo AND"), "foo");
        assert_eq!(render("a () b"), "a b");
    }
}
