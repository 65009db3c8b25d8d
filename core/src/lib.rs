//! # ruta
//!
//! URI-template matching and rewriting for gateway rewrite rules.
//!
//! A template is a URI-shaped pattern such as
//! `{scheme}://{host}:{port}/{path=**}?{**}`. Matching a concrete URI
//! against an input template yields ordered [`Bindings`]; expanding an
//! output template from those bindings yields the rewritten URI. Host code
//! plugs in at two seams: a [`Resolver`] backfills names the match did not
//! bind, an [`Evaluator`] applies `{$fname(arg)}` functions.
//!
//! ```
//! use ruta::prelude::*;
//!
//! let source = ruta::parse("*://*:*/api/{path=**}?{**}")?;
//! let target = ruta::parse("http://backend:8080/{path=**}?{**}")?;
//! let out = ruta::rewrite("https://edge:443/api/a/b?x=1", &source, &target, None, None)?;
//! assert_eq!(out, "http://backend:8080/a/b?x=1");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Templates are parsed once and immutable; matching and rewriting take
//! `&self` everywhere, so parsed templates and rule sets can be shared
//! across threads freely.
//!
//! The optional `rules` feature adds a serde model for rule files and a
//! first-match-wins [`RuleSet`].

use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════

mod matcher;
mod params;
mod parser;
mod rewriter;
mod template;

#[cfg(feature = "rules")]
mod rules;

// ═══════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use matcher::{match_parsed, match_uri};
pub use params::{Bindings, CollaboratorError, Evaluator, Resolver};
pub use parser::parse;
pub use rewriter::{rewrite, Rewriter, UnresolvedPolicy};
pub use template::{Pattern, QueryEntry, Template, ValueKind};

#[cfg(feature = "rules")]
pub use rules::{RewriteOutcome, Rule, RuleConfig, RuleSet, RuleSetConfig};

/// Convenience re-exports for callers that want everything in scope.
pub mod prelude {
    pub use crate::params::{Bindings, CollaboratorError, Evaluator, Resolver};
    pub use crate::rewriter::{Rewriter, UnresolvedPolicy};
    pub use crate::template::{Pattern, QueryEntry, Template, ValueKind};
    pub use crate::{RewriteError, SyntaxError};

    #[cfg(feature = "rules")]
    pub use crate::rules::{RewriteOutcome, Rule, RuleSet, RuleSetConfig};
}

// ═══════════════════════════════════════════════════════════════════════════
// Limits
// ═══════════════════════════════════════════════════════════════════════════

/// Maximum accepted pattern length in bytes. Patterns and matched URIs both
/// go through [`parse`], so this bounds work per call on hostile input.
pub const MAX_PATTERN_LENGTH: usize = 8192;

// ═══════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════

/// A pattern string that does not conform to the template grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// A token opens a brace it never closes, or mixes literal text with a
    /// placeholder.
    UnbalancedBraces {
        /// The offending token.
        text: String,
    },
    /// A `{...}` placeholder that violates the capture grammar.
    InvalidPlaceholder {
        /// The offending token or query entry.
        text: String,
        /// What was wrong with it.
        detail: &'static str,
    },
    /// A `{$...}` token that is not a well-formed `{$fname(arg)}` reference.
    InvalidFunction {
        /// The offending token.
        text: String,
    },
    /// More than one `**` or `{name=**}` in a single path.
    MultipleMultiSegment {
        /// The whole pattern.
        pattern: String,
    },
    /// Pattern exceeds [`MAX_PATTERN_LENGTH`].
    PatternTooLong {
        /// Actual length in bytes.
        length: usize,
        /// The limit that was exceeded.
        max: usize,
    },
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedBraces { text } => {
                write!(f, "unbalanced braces in \"{text}\"")
            }
            Self::InvalidPlaceholder { text, detail } => {
                write!(f, "invalid placeholder \"{text}\": {detail}")
            }
            Self::InvalidFunction { text } => {
                write!(
                    f,
                    "invalid function reference \"{text}\": expected {{$fname(arg)}}"
                )
            }
            Self::MultipleMultiSegment { pattern } => {
                write!(
                    f,
                    "at most one multi-segment wildcard per path in \"{pattern}\""
                )
            }
            Self::PatternTooLong { length, max } => {
                write!(f, "pattern length {length} exceeds the {max} byte limit")
            }
        }
    }
}

impl std::error::Error for SyntaxError {}

/// A rewrite that could not produce an output URI.
#[derive(Debug)]
pub enum RewriteError {
    /// The input URI failed to parse.
    Syntax(SyntaxError),
    /// The input URI does not match the source template.
    NoMatch,
    /// An output placeholder had no value anywhere, under
    /// [`UnresolvedPolicy::Fail`].
    Unresolved {
        /// The placeholder's binding name.
        name: String,
    },
    /// A resolver or evaluator failed.
    Collaborator {
        /// The host-side error.
        source: CollaboratorError,
    },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(err) => write!(f, "malformed input URI: {err}"),
            Self::NoMatch => f.write_str("input URI does not match the source template"),
            Self::Unresolved { name } => {
                write!(f, "no value for placeholder \"{name}\"")
            }
            Self::Collaborator { source } => write!(f, "collaborator failed: {source}"),
        }
    }
}

impl std::error::Error for RewriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::Collaborator { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<SyntaxError> for RewriteError {
    fn from(err: SyntaxError) -> Self {
        Self::Syntax(err)
    }
}
