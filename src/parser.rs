//! Shift/reduce parser with error recovery
//!
//! # Grammar
//!
//! ```text
//! query      := item ( ws item )*
//! item       := group | incl | excl | not_expr | binary_expr | term
//! group      := [domain ':'] '(' query ')'
//! incl       := '+' atom
//! excl       := '-' atom
//! not_expr   := ('NOT' ws | '!') atom
//! binary_expr:= item ws ('AND'|'OR') ws item     // AND binds tighter than OR
//! atom       := term | group
//! term       := [domain ':'] (word | phrase) | user | tag
//! ```
//!
//! The parser never rejects input. Tokens that cannot take part in a valid
//! expression are dropped and each drop is recorded as a [`Correction`],
//! so callers can both use the repaired tree and explain the repairs.
//!
//! The engine drains the token queue through per-kind shift routines. A
//! shift either pushes a token (operators, group openers) or produces a
//! node (terms, closed groups); each produced node then walks its
//! reduction chain until no rule applies and lands on the stack. A
//! pre-pass removes unmatched group delimiters so the main loop can treat
//! `(`/`)` as balanced.

use crate::ast::Node;
use crate::correction::{Correction, CorrectionKind};
use crate::token::{Token, TokenFlags, TokenKind, TokenSequence};
use serde::{Deserialize, Serialize};

/// Result of a parse: the repaired tree, the original tokens, and the log
/// of every repair made
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxTree {
    pub root: Node,
    pub tokens: TokenSequence,
    pub corrections: Vec<Correction>,
}

impl SyntaxTree {
    /// Whether the input parsed without any repair
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty()
    }
}

/// Reusable parser handle
///
/// `parse` is a pure function of its input; independent instances can be
/// used freely from different threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a token sequence into a syntax tree; never fails
    pub fn parse(&self, tokens: TokenSequence) -> SyntaxTree {
        let mut run = ParseRun::new(tokens.tokens.clone());
        run.balance_delimiters();
        while let Some(token) = run.next_token() {
            run.shift(token);
        }
        let (root, corrections) = run.finish();
        SyntaxTree {
            root,
            tokens,
            corrections,
        }
    }
}

/// The parse stack holds completed subtrees interleaved with operator and
/// delimiter tokens still waiting for operands
#[derive(Debug)]
enum StackEntry {
    Token(Token),
    Node(Node),
}

/// Outcome of one reduction attempt
enum Reduction {
    /// The rule fired; restart the chain of the new node
    Changed(Node),
    /// The rule did not apply (or only consumed stack tokens); try the
    /// next rule in the chain
    Unchanged(Node),
    /// The node was disposed of by the rule itself; stop reducing
    Consumed,
}

type ReduceFn = fn(&mut ParseRun, Node) -> Reduction;

/// Reduction chains per node kind, attempted in order. A fired rule
/// restarts the chain of its result.
const OPERAND_REDUCTIONS: &[ReduceFn] = &[
    ParseRun::reduce_inclusivity,
    ParseRun::reduce_logical_not,
    ParseRun::reduce_logical_and,
    ParseRun::reduce_logical_or,
];
const NEGATION_REDUCTIONS: &[ReduceFn] = &[
    ParseRun::reduce_logical_not,
    ParseRun::reduce_logical_and,
    ParseRun::reduce_logical_or,
];
const CONJUNCTION_REDUCTIONS: &[ReduceFn] = &[ParseRun::reduce_logical_or];
const NO_REDUCTIONS: &[ReduceFn] = &[];

struct ParseRun {
    queue: Vec<Token>,
    cursor: usize,
    stack: Vec<StackEntry>,
    corrections: Vec<Correction>,
}

impl ParseRun {
    fn new(queue: Vec<Token>) -> Self {
        Self {
            queue,
            cursor: 0,
            stack: Vec::new(),
            corrections: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Input queue
    // ------------------------------------------------------------------

    fn next_token(&mut self) -> Option<Token> {
        let token = self.queue.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(token)
    }

    /// Look at the next queued token without consuming it
    fn peek(&self, skip_whitespace: bool) -> Option<&Token> {
        let mut at = self.cursor;
        if skip_whitespace {
            while self
                .queue
                .get(at)
                .is_some_and(|t| t.is_any(TokenFlags::WHITESPACE))
            {
                at += 1;
            }
        }
        self.queue.get(at)
    }

    // ------------------------------------------------------------------
    // Stack
    // ------------------------------------------------------------------

    fn top_token_is(&self, flags: TokenFlags) -> bool {
        matches!(self.stack.last(), Some(StackEntry::Token(t)) if t.is_any(flags))
    }

    fn top_is_node(&self) -> bool {
        matches!(self.stack.last(), Some(StackEntry::Node(_)))
    }

    fn pop_token(&mut self) -> Token {
        match self.stack.pop() {
            Some(StackEntry::Token(token)) => token,
            other => unreachable!("internal parser error: expected token on stack, found {other:?}"),
        }
    }

    fn pop_node(&mut self) -> Node {
        match self.stack.pop() {
            Some(StackEntry::Node(node)) => node,
            other => unreachable!("internal parser error: expected node on stack, found {other:?}"),
        }
    }

    fn record(&mut self, kind: CorrectionKind, tokens: Vec<Token>) {
        tracing::debug!(kind = ?kind, dropped = tokens.len(), "query repaired");
        self.corrections.push(Correction::new(kind, tokens));
    }

    // ------------------------------------------------------------------
    // Pre-pass: group delimiter balancing
    // ------------------------------------------------------------------

    /// Remove unmatched `(` and `)` so the main loop can rely on every
    /// group opener having a closer. Closest delimiters pair up first.
    fn balance_delimiters(&mut self) {
        let mut open: Vec<usize> = Vec::new();
        let mut removed = vec![false; self.queue.len()];
        let mut unmatched_right: Vec<usize> = Vec::new();

        for (index, token) in self.queue.iter().enumerate() {
            if token.is_any(TokenFlags::GROUP_BEGIN) {
                open.push(index);
            } else if token.is_any(TokenFlags::GROUP_END) && open.pop().is_none() {
                unmatched_right.push(index);
            }
        }

        for &index in &unmatched_right {
            removed[index] = true;
            let token = self.queue[index].clone();
            self.record(
                CorrectionKind::UnmatchedGroupRightDelimiterIgnored,
                vec![token],
            );
        }
        for &index in &open {
            removed[index] = true;
            let token = self.queue[index].clone();
            self.record(
                CorrectionKind::UnmatchedGroupLeftDelimiterIgnored,
                vec![token],
            );
        }

        if unmatched_right.is_empty() && open.is_empty() {
            return;
        }
        let mut index = 0;
        self.queue.retain(|_| {
            let keep = !removed[index];
            index += 1;
            keep
        });
    }

    // ------------------------------------------------------------------
    // Shift routines
    // ------------------------------------------------------------------

    fn shift(&mut self, token: Token) {
        match &token.kind {
            TokenKind::Whitespace => self.shift_whitespace(),
            TokenKind::Word { .. }
            | TokenKind::Phrase { .. }
            | TokenKind::User { .. }
            | TokenKind::Tag { .. } => self.reduce(Node::Term { token }),
            TokenKind::GroupBegin { .. } => self.stack.push(StackEntry::Token(token)),
            TokenKind::GroupEnd => self.shift_group_end(token),
            TokenKind::LogicalAnd | TokenKind::LogicalOr => self.shift_binary(token),
            TokenKind::LogicalNot => self.stack.push(StackEntry::Token(token)),
            TokenKind::LogicalNot2 => self.shift_symbolic_not(token),
            TokenKind::Include | TokenKind::Exclude => self.shift_inclusivity(token),
            TokenKind::Bailout => {
                self.record(CorrectionKind::BailoutTokenIgnored, vec![token]);
            }
        }
    }

    /// Whitespace separates tokens and additionally invalidates a prefix
    /// operator left waiting on the stack with nothing glued to it
    fn shift_whitespace(&mut self) {
        if self.top_token_is(TokenFlags::OPERATOR_PREFIX) {
            let operator = self.pop_token();
            self.record(
                CorrectionKind::UnaryOperatorMissingOperandIgnored,
                vec![operator],
            );
        }
    }

    fn shift_group_end(&mut self, token: Token) {
        self.stack.push(StackEntry::Token(token));
        if let Some(group) = self.complete_group() {
            self.reduce(group);
        }
    }

    /// A binary operator needs a completed operand on its left and must
    /// not follow another operator
    fn shift_binary(&mut self, token: Token) {
        if self.stack.is_empty() || self.top_token_is(TokenFlags::GROUP_BEGIN) {
            self.record(
                CorrectionKind::BinaryOperatorMissingLeftOperandIgnored,
                vec![token],
            );
        } else if self.top_token_is(TokenFlags::OPERATOR) {
            self.record(
                CorrectionKind::BinaryOperatorFollowingOperatorIgnored,
                vec![token],
            );
        } else {
            self.stack.push(StackEntry::Token(token));
        }
    }

    /// `!` binds to the term or group glued after it; any other operator
    /// there makes it meaningless (a further `!` is fine)
    fn shift_symbolic_not(&mut self, token: Token) {
        let invalid = self.peek(false).is_some_and(|next| {
            next.is_any(TokenFlags::OPERATOR) && !next.is_any(TokenFlags::LOGICAL_NOT_2)
        });
        if invalid {
            self.record(
                CorrectionKind::UnaryOperatorPrecedingOperatorIgnored,
                vec![token],
            );
        } else {
            self.stack.push(StackEntry::Token(token));
        }
    }

    /// `+`/`-` bind to the term or group glued after them; an operator
    /// there makes them meaningless
    fn shift_inclusivity(&mut self, token: Token) {
        let invalid = self
            .peek(false)
            .is_some_and(|next| next.is_any(TokenFlags::OPERATOR));
        if invalid {
            self.record(
                CorrectionKind::UnaryOperatorPrecedingOperatorIgnored,
                vec![token],
            );
        } else {
            self.stack.push(StackEntry::Token(token));
        }
    }

    // ------------------------------------------------------------------
    // Reductions
    // ------------------------------------------------------------------

    fn reductions_for(node: &Node) -> &'static [ReduceFn] {
        match node {
            Node::Term { .. } | Node::Group { .. } => OPERAND_REDUCTIONS,
            Node::Include { .. } | Node::Exclude { .. } | Node::LogicalNot { .. } => {
                NEGATION_REDUCTIONS
            }
            Node::LogicalAnd { .. } => CONJUNCTION_REDUCTIONS,
            Node::LogicalOr { .. } | Node::Query { .. } => NO_REDUCTIONS,
        }
    }

    /// Walk the node's reduction chain until no rule applies, then push
    /// the result
    fn reduce(&mut self, node: Node) {
        let mut node = node;
        'restart: loop {
            for rule in Self::reductions_for(&node) {
                match rule(self, node) {
                    Reduction::Changed(reduced) => {
                        node = reduced;
                        continue 'restart;
                    }
                    Reduction::Unchanged(unchanged) => node = unchanged,
                    Reduction::Consumed => return,
                }
            }
            self.stack.push(StackEntry::Node(node));
            return;
        }
    }

    /// `+`/`-` waiting on the stack wraps the finished operand
    fn reduce_inclusivity(&mut self, node: Node) -> Reduction {
        if !self.top_token_is(TokenFlags::OPERATOR_INCLUSIVITY) {
            return Reduction::Unchanged(node);
        }
        let token = self.pop_token();
        let operand = Box::new(node);
        Reduction::Changed(match token.kind {
            TokenKind::Include => Node::Include { operand, token },
            _ => Node::Exclude { operand, token },
        })
    }

    /// `NOT`/`!` waiting on the stack wraps the finished operand.
    /// An operand already `+`/`-`-wrapped cannot be negated; the whole
    /// run of pending negations is then dropped as one correction.
    fn reduce_logical_not(&mut self, node: Node) -> Reduction {
        if !self.top_token_is(TokenFlags::OPERATOR_NOT) {
            return Reduction::Unchanged(node);
        }
        if matches!(node, Node::Include { .. } | Node::Exclude { .. }) {
            let mut dropped = Vec::new();
            while self.top_token_is(TokenFlags::OPERATOR_NOT) {
                dropped.push(self.pop_token());
            }
            dropped.reverse();
            self.record(CorrectionKind::LogicalNotPrecedingInclusivityIgnored, dropped);
            return Reduction::Unchanged(node);
        }
        let token = self.pop_token();
        Reduction::Changed(Node::LogicalNot {
            operand: Box::new(node),
            token,
        })
    }

    fn reduce_logical_and(&mut self, node: Node) -> Reduction {
        if self.stack.len() < 2 || !self.top_token_is(TokenFlags::LOGICAL_AND) {
            return Reduction::Unchanged(node);
        }
        let token = self.pop_token();
        let left = self.pop_node();
        Reduction::Changed(Node::LogicalAnd {
            left: Box::new(left),
            right: Box::new(node),
            token,
        })
    }

    fn reduce_logical_or(&mut self, node: Node) -> Reduction {
        if self.stack.len() < 2 || !self.top_token_is(TokenFlags::LOGICAL_OR) {
            return Reduction::Unchanged(node);
        }
        // An AND ahead binds tighter than the pending OR; park the operand
        // and let the AND claim it first. The parked chain is folded when
        // the enclosing group or the query ends.
        let and_ahead = self
            .peek(true)
            .is_some_and(|next| next.is_any(TokenFlags::LOGICAL_AND));
        if and_ahead {
            self.stack.push(StackEntry::Node(node));
            return Reduction::Consumed;
        }
        let token = self.pop_token();
        let left = self.pop_node();
        Reduction::Changed(Node::LogicalOr {
            left: Box::new(left),
            right: Box::new(node),
            token,
        })
    }

    /// Fold an OR chain left parked on the stack (its right-hand AND
    /// never materialized) into the topmost node
    fn fold_pending_or(&mut self) {
        if !self.top_is_node() {
            return;
        }
        let mut last = self.pop_node();
        while self.stack.len() >= 2 && self.top_token_is(TokenFlags::LOGICAL_OR) {
            let token = self.pop_token();
            let left = self.pop_node();
            last = Node::LogicalOr {
                left: Box::new(left),
                right: Box::new(last),
                token,
            };
        }
        self.stack.push(StackEntry::Node(last));
    }

    /// Close the group whose `)` was just pushed. Returns the completed
    /// `Group` node, or `None` when the group was empty and dissolved.
    fn complete_group(&mut self) -> Option<Node> {
        let token_right = self.pop_token();

        // Operators left dangling before the closing delimiter
        while self.top_token_is(TokenFlags::OPERATOR) {
            let operator = self.pop_token();
            let kind = if operator.is_any(TokenFlags::OPERATOR_BINARY) {
                CorrectionKind::BinaryOperatorMissingRightOperandIgnored
            } else {
                CorrectionKind::UnaryOperatorMissingOperandIgnored
            };
            self.record(kind, vec![operator]);
        }

        // An empty group dissolves together with every operator bound to
        // it, recorded as a single correction in source order
        if self.top_token_is(TokenFlags::GROUP_BEGIN) {
            let token_left = self.pop_token();
            let mut dropped = Vec::new();
            while self.top_token_is(TokenFlags::OPERATOR) {
                dropped.push(self.pop_token());
            }
            dropped.reverse();
            dropped.push(token_left);
            dropped.push(token_right);
            loop {
                let mut at = self.cursor;
                while self
                    .queue
                    .get(at)
                    .is_some_and(|t| t.is_any(TokenFlags::WHITESPACE))
                {
                    at += 1;
                }
                match self.queue.get(at) {
                    Some(next) if next.is_any(TokenFlags::OPERATOR_BINARY) => {
                        dropped.push(next.clone());
                        self.cursor = at + 1;
                    }
                    _ => break,
                }
            }
            self.record(CorrectionKind::EmptyGroupIgnored, dropped);
            return None;
        }

        self.fold_pending_or();

        // Collect the members down to the opening delimiter, which the
        // balancing pre-pass guarantees is there
        let mut nodes = Vec::new();
        while self.top_is_node() {
            nodes.push(self.pop_node());
        }
        nodes.reverse();
        let token_left = self.pop_token();
        Some(Node::Group {
            nodes,
            token_left,
            token_right,
        })
    }

    // ------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------

    /// Drain the stack into the root node once the input is exhausted
    fn finish(mut self) -> (Node, Vec<Correction>) {
        // Operators left dangling at end of input
        while self.top_token_is(TokenFlags::OPERATOR) {
            let operator = self.pop_token();
            let kind = if operator.is_any(TokenFlags::OPERATOR_BINARY) {
                CorrectionKind::BinaryOperatorMissingRightOperandIgnored
            } else {
                CorrectionKind::UnaryOperatorMissingOperandIgnored
            };
            self.record(kind, vec![operator]);
        }

        self.fold_pending_or();

        let nodes = self
            .stack
            .drain(..)
            .map(|entry| match entry {
                StackEntry::Node(node) => node,
                StackEntry::Token(token) => {
                    panic!("internal parser error: unreduced token left on stack: {token:?}")
                }
            })
            .collect();
        (Node::Query { nodes }, self.corrections)
    }
}
