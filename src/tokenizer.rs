//! Tokenizer for the Galach query language
//!
//! Converts an input string into a [`TokenSequence`] by trying an ordered
//! table of rules at the current offset and emitting the first match. The
//! tokenizer never fails: input that no rule matches becomes a `Bailout`
//! token covering the gap up to the next recognizable offset, which the
//! parser later strips with a correction.
//!
//! The `regex` crate has no look-around, so each rule anchors its pattern
//! at the cursor and verifies boundary conditions directly. The left
//! boundary of the word operators (`AND`, `OR`, `NOT`) is structural: the
//! cursor only ever sits at a token start, so `fooAND` is consumed whole
//! by the word rule before the operator rule can see it.

use crate::config::TokenizerConfig;
use crate::token::{Token, TokenKind, TokenSequence};
use once_cell::sync::Lazy;
use regex::Regex;

/// Identifier shape accepted as a `domain:` prefix and in `@user`/`#tag`
const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_.\-]*";

static USER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\A@(?P<name>{IDENT})")).unwrap());
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\A#(?P<name>{IDENT})")).unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\s+").unwrap());

/// One entry of the rule table; order of entries is the tokenization order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rule {
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    LogicalNot2,
    Include,
    Exclude,
    GroupBegin,
    GroupEnd,
    Phrase,
    Word,
    User,
    Tag,
    Whitespace,
}

/// Reusable tokenizer holding the compiled rule table
pub struct Tokenizer {
    config: TokenizerConfig,
    rules: Vec<Rule>,
    word_re: Regex,
    phrase_re: Regex,
    group_begin_re: Regex,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Tokenizer with every recognizer enabled
    pub fn new() -> Self {
        Self::with_config(TokenizerConfig::default())
    }

    pub fn with_config(config: TokenizerConfig) -> Self {
        let domain_prefix = if config.domains {
            format!(r"(?:(?P<domain>{IDENT}):)?")
        } else {
            String::new()
        };

        // The word rule is ordered before the user/tag rules, so its first
        // character must refuse their markers for those rules to ever fire.
        let mut first_char = String::from(r#"[^"()\s"#);
        if config.users {
            first_char.push('@');
        }
        if config.tags {
            first_char.push('#');
        }
        first_char.push(']');

        let word_re = Regex::new(&format!(
            r#"\A{domain_prefix}(?P<word>{first_char}[^"()\s]*)"#
        ))
        .unwrap();
        let phrase_re = Regex::new(&format!(
            r#"(?s)\A{domain_prefix}(?P<quote>")(?P<phrase>(?:\\.|[^"\\])*)""#
        ))
        .unwrap();
        let group_begin_re =
            Regex::new(&format!(r"\A{domain_prefix}(?P<delimiter>\()")).unwrap();

        let mut rules = vec![
            Rule::LogicalAnd,
            Rule::LogicalOr,
            Rule::LogicalNot,
            Rule::LogicalNot2,
            Rule::Include,
            Rule::Exclude,
            Rule::GroupBegin,
            Rule::GroupEnd,
            Rule::Phrase,
            Rule::Word,
        ];
        if config.users {
            rules.push(Rule::User);
        }
        if config.tags {
            rules.push(Rule::Tag);
        }
        rules.push(Rule::Whitespace);

        Self {
            config,
            rules,
            word_re,
            phrase_re,
            group_begin_re,
        }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize `input` left to right; never fails
    pub fn tokenize(&self, input: &str) -> TokenSequence {
        let mut tokens = Vec::new();
        let mut at = 0;

        while at < input.len() {
            match self.match_at(input, at) {
                Some(token) => {
                    at += token.lexeme.len();
                    tokens.push(token);
                }
                None => {
                    let end = self.next_match_offset(input, at);
                    tracing::trace!(position = at, "unmatched input, emitting bailout");
                    tokens.push(Token::new(TokenKind::Bailout, &input[at..end], at));
                    at = end;
                }
            }
        }

        TokenSequence::new(tokens, input)
    }

    /// First rule in table order that matches at `at`, if any
    fn match_at(&self, input: &str, at: usize) -> Option<Token> {
        self.rules
            .iter()
            .find_map(|rule| self.try_rule(*rule, input, at))
    }

    /// Smallest offset past `at` where some rule matches, for bailout spans
    fn next_match_offset(&self, input: &str, at: usize) -> usize {
        let mut indices = input[at..].char_indices();
        indices.next();
        for (offset, _) in indices {
            if self.match_at(input, at + offset).is_some() {
                return at + offset;
            }
        }
        input.len()
    }

    fn try_rule(&self, rule: Rule, input: &str, at: usize) -> Option<Token> {
        let rest = &input[at..];
        match rule {
            Rule::LogicalAnd => keyword_at(rest, "AND")
                .then(|| Token::new(TokenKind::LogicalAnd, "AND", at)),
            Rule::LogicalOr => {
                keyword_at(rest, "OR").then(|| Token::new(TokenKind::LogicalOr, "OR", at))
            }
            Rule::LogicalNot => keyword_at(rest, "NOT")
                .then(|| Token::new(TokenKind::LogicalNot, "NOT", at)),
            Rule::LogicalNot2 => prefix_at(rest, '!')
                .then(|| Token::new(TokenKind::LogicalNot2, "!", at)),
            Rule::Include => {
                prefix_at(rest, '+').then(|| Token::new(TokenKind::Include, "+", at))
            }
            Rule::Exclude => {
                prefix_at(rest, '-').then(|| Token::new(TokenKind::Exclude, "-", at))
            }
            Rule::GroupBegin => self.group_begin_re.captures(rest).map(|caps| {
                Token::new(
                    TokenKind::GroupBegin {
                        domain: caps.name("domain").map(|m| m.as_str().to_string()),
                        delimiter: '(',
                    },
                    &caps[0],
                    at,
                )
            }),
            Rule::GroupEnd => rest
                .starts_with(')')
                .then(|| Token::new(TokenKind::GroupEnd, ")", at)),
            Rule::Phrase => self.phrase_re.captures(rest).map(|caps| {
                Token::new(
                    TokenKind::Phrase {
                        phrase: decode_phrase_escapes(&caps["phrase"]),
                        domain: caps.name("domain").map(|m| m.as_str().to_string()),
                        quote: '"',
                    },
                    &caps[0],
                    at,
                )
            }),
            Rule::Word => self.word_re.captures(rest).map(|caps| {
                Token::new(
                    TokenKind::Word {
                        word: caps["word"].to_string(),
                        domain: caps.name("domain").map(|m| m.as_str().to_string()),
                    },
                    &caps[0],
                    at,
                )
            }),
            Rule::User => USER_RE.captures(rest).map(|caps| {
                Token::new(
                    TokenKind::User {
                        name: caps["name"].to_string(),
                        marker: '@',
                    },
                    &caps[0],
                    at,
                )
            }),
            Rule::Tag => TAG_RE.captures(rest).map(|caps| {
                Token::new(
                    TokenKind::Tag {
                        name: caps["name"].to_string(),
                        marker: '#',
                    },
                    &caps[0],
                    at,
                )
            }),
            Rule::Whitespace => WHITESPACE_RE
                .find(rest)
                .map(|m| Token::new(TokenKind::Whitespace, m.as_str(), at)),
        }
    }
}

/// Case-sensitive keyword bounded on the right by whitespace, a group
/// delimiter or end of input
fn keyword_at(rest: &str, keyword: &str) -> bool {
    if !rest.starts_with(keyword) {
        return false;
    }
    match rest[keyword.len()..].chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || c == '(' || c == ')',
    }
}

/// Single-character prefix operator; only meaningful when glued to a
/// following non-whitespace character
fn prefix_at(rest: &str, operator: char) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some(operator) && chars.next().is_some_and(|c| !c.is_whitespace())
}

/// Decode phrase escapes: `\"` and `\\` collapse, anything else keeps
/// its backslash
fn decode_phrase_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped @ ('"' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        Tokenizer::new().tokenize(input).tokens
    }

    fn word(text: &str, domain: Option<&str>, position: usize) -> Token {
        Token::new(
            TokenKind::Word {
                word: text.to_string(),
                domain: domain.map(String::from),
            },
            match domain {
                Some(d) => format!("{d}:{text}"),
                None => text.to_string(),
            },
            position,
        )
    }

    #[test]
    fn test_simple_words() {
        let tokens = tokenize("one two");
        assert_eq!(
            tokens,
            vec![
                word("one", None, 0),
                Token::new(TokenKind::Whitespace, " ", 3),
                word("two", None, 4),
            ]
        );
    }

    #[test]
    fn test_domain_word() {
        let tokens = tokenize("title:rust");
        assert_eq!(tokens, vec![word("rust", Some("title"), 0)]);
    }

    #[test]
    fn test_phrase_with_domain_and_escapes() {
        let tokens = tokenize(r#"title:"say \"hi\" \x""#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(
            tokens[0].kind,
            TokenKind::Phrase {
                phrase: r#"say "hi" \x"#.to_string(),
                domain: Some("title".to_string()),
                quote: '"',
            }
        );
        assert_eq!(tokens[0].lexeme, r#"title:"say \"hi\" \x""#);
    }

    #[test]
    fn test_boolean_operators() {
        let kinds: Vec<TokenKind> = tokenize("a AND b OR c NOT d")
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word {
                    word: "a".to_string(),
                    domain: None
                },
                TokenKind::LogicalAnd,
                TokenKind::Word {
                    word: "b".to_string(),
                    domain: None
                },
                TokenKind::LogicalOr,
                TokenKind::Word {
                    word: "c".to_string(),
                    domain: None
                },
                TokenKind::LogicalNot,
                TokenKind::Word {
                    word: "d".to_string(),
                    domain: None
                },
            ]
        );
    }

    #[test]
    fn test_operators_are_case_sensitive() {
        let tokens = tokenize("a and b");
        assert_eq!(tokens[2], word("and", None, 2));
    }

    #[test]
    fn test_keyword_requires_right_boundary() {
        // ANDroid is a word, AND) is an operator before a delimiter
        assert_eq!(tokenize("ANDroid")[0], word("ANDroid", None, 0));
        assert_eq!(tokenize("AND)")[0].kind, TokenKind::LogicalAnd);
    }

    #[test]
    fn test_prefix_operators_require_adjacent_operand() {
        let tokens = tokenize("+a -b !c");
        assert_eq!(tokens[0].kind, TokenKind::Include);
        assert_eq!(tokens[3].kind, TokenKind::Exclude);
        assert_eq!(tokens[6].kind, TokenKind::LogicalNot2);

        // Detached prefix characters fall through to the word rule
        let detached = tokenize("+ a");
        assert_eq!(detached[0], word("+", None, 0));
    }

    #[test]
    fn test_hyphen_inside_word_is_not_an_operator() {
        assert_eq!(tokenize("2024-01-15")[0], word("2024-01-15", None, 0));
    }

    #[test]
    fn test_user_and_tag() {
        let tokens = tokenize("@alice #rust");
        assert_eq!(
            tokens[0].kind,
            TokenKind::User {
                name: "alice".to_string(),
                marker: '@'
            }
        );
        assert_eq!(
            tokens[2].kind,
            TokenKind::Tag {
                name: "rust".to_string(),
                marker: '#'
            }
        );
    }

    #[test]
    fn test_marker_inside_word_is_plain_text() {
        assert_eq!(tokenize("mail@host")[0], word("mail@host", None, 0));
    }

    #[test]
    fn test_group_with_domain() {
        let tokens = tokenize("field:(a)");
        assert_eq!(
            tokens[0].kind,
            TokenKind::GroupBegin {
                domain: Some("field".to_string()),
                delimiter: '(',
            }
        );
        assert_eq!(tokens[0].lexeme, "field:(");
        assert_eq!(tokens[2].kind, TokenKind::GroupEnd);
    }

    #[test]
    fn test_bailout_covers_unmatched_run() {
        // A lone marker matches nothing; the next offset starts a word
        let tokens = tokenize("@ word");
        assert_eq!(tokens[0], Token::new(TokenKind::Bailout, "@", 0));
        assert_eq!(tokens[2], word("word", None, 2));
    }

    #[test]
    fn test_unterminated_phrase_bails_out_on_the_quote() {
        let tokens = tokenize("\"abc");
        assert_eq!(tokens[0], Token::new(TokenKind::Bailout, "\"", 0));
        assert_eq!(tokens[1], word("abc", None, 1));
    }

    #[test]
    fn test_text_config_disables_markers_and_domains() {
        let tokenizer = Tokenizer::with_config(TokenizerConfig::text());
        let tokens = tokenizer.tokenize("title:rust @alice #tag").tokens;
        assert_eq!(tokens[0], word("title:rust", None, 0));
        assert_eq!(tokens[2], word("@alice", None, 11));
        assert_eq!(tokens[4], word("#tag", None, 18));
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let tokens = tokenize("héllo wörld");
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].position, "héllo".len());
        assert_eq!(tokens[2].position, "héllo ".len());
    }
}
