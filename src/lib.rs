//! Galach: a forgiving search-query language
//!
//! Parses user-facing query strings (free text, quoted phrases,
//! `field:value` terms, `@user`/`#tag` terms, groups, `AND`/`OR`/`NOT`/`!`
//! and `+`/`-` prefixes) into a syntax tree suitable for translation to
//! backend search engines. Invalid input never fails to parse: offending
//! tokens are dropped and every repair is recorded as a correction on the
//! result.
//!
//! # Example
//!
//! ```rust
//! use galach::{NativeGenerator, Parser, Tokenizer};
//!
//! let tokens = Tokenizer::new().tokenize("title:rust AND (tags:tutorial OR tags:guide)");
//! let tree = Parser::new().parse(tokens);
//! assert!(tree.is_clean());
//!
//! let rendered = NativeGenerator::new().generate(&tree).unwrap();
//! assert_eq!(rendered, "title:rust AND (tags:tutorial OR tags:guide)");
//! ```

pub mod ast;
pub mod config;
pub mod correction;
pub mod error;
pub mod generators;
pub mod parser;
pub mod token;
pub mod tokenizer;

pub use ast::Node;
pub use config::TokenizerConfig;
pub use correction::{Correction, CorrectionKind};
pub use error::{GalachError, Result};
pub use generators::{AggregateVisitor, NativeGenerator, NodeVisitor, QueryStringGenerator};
pub use parser::{Parser, SyntaxTree};
pub use token::{Token, TokenFlags, TokenKind, TokenSequence};
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
