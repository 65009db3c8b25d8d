//! `Template`: immutable parsed URI pattern.
//!
//! A template is the compiled form of a pattern string such as
//! `{scheme}://{host}:{port}/{path=**}?{**}`. It is produced once by
//! [`parse`](crate::parse) and read-only thereafter, so a single template can
//! be shared across any number of concurrent match and rewrite calls.
//!
//! Placeholder kinds form one closed enum ([`Pattern`]) so the matcher and
//! rewriter can handle every kind exhaustively.

use std::fmt;

/// Whether a capture binds a single value or an ordered list of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Binds exactly one token (`{name}`, `{name=*}`).
    Single,
    /// Binds zero-or-more consecutive tokens (`{name=**}`).
    Multi,
}

/// One pattern atom: a path segment, an authority part, or a query value.
///
/// The five kinds cover the whole placeholder grammar:
///
/// | Syntax          | Variant      | Binds |
/// |-----------------|--------------|-------|
/// | `text`          | `Literal`    | no    |
/// | `*`             | `Star`       | no    |
/// | `**`            | `DoubleStar` | no    |
/// | `{name}`, `{name=*}`, `{name=**}` | `Capture` | yes |
/// | `{$fname(arg)}` | `Function`   | via `arg` |
///
/// Bare `*` and `**` match without binding and are never substituted in an
/// output template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Literal text, matched exactly (case-insensitively for scheme/host).
    Literal(String),
    /// Unnamed wildcard matching exactly one non-empty token.
    Star,
    /// Unnamed wildcard matching zero-or-more consecutive path tokens.
    DoubleStar,
    /// Named capture.
    Capture {
        /// Binding name.
        name: String,
        /// Single- or multi-valued.
        kind: ValueKind,
    },
    /// Function reference `{$fname(arg)}`: at rewrite time the values of
    /// `arg` are piped through the evaluator under the label `function`.
    Function {
        /// Opaque function label handed to the evaluator.
        function: String,
        /// Name whose values feed the function.
        arg: String,
    },
}

impl Pattern {
    /// Returns `true` for patterns that consume more than one path segment
    /// (`**` and `{name=**}`). At most one of these is allowed per path.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            Self::DoubleStar
                | Self::Capture {
                    kind: ValueKind::Multi,
                    ..
                }
        )
    }

    /// The name this pattern binds under, if any.
    ///
    /// Function references report their argument name: a name used both as a
    /// plain capture and inside a function reference is one logical binding.
    #[must_use]
    pub fn binding_name(&self) -> Option<&str> {
        match self {
            Self::Capture { name, .. } => Some(name),
            Self::Function { arg, .. } => Some(arg),
            _ => None,
        }
    }

    /// The literal text of a `Literal` pattern.
    ///
    /// Concrete URIs parse into all-literal templates; the matcher uses this
    /// to read their tokens.
    #[must_use]
    pub fn literal_text(&self) -> Option<&str> {
        match self {
            Self::Literal(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Star => f.write_str("*"),
            Self::DoubleStar => f.write_str("**"),
            Self::Capture { name, kind } => match kind {
                ValueKind::Single => write!(f, "{{{name}}}"),
                ValueKind::Multi => write!(f, "{{{name}=**}}"),
            },
            Self::Function { function, arg } => write!(f, "{{${function}({arg})}}"),
        }
    }
}

/// One entry of a query pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEntry {
    /// `key=value` where `value` is any [`Pattern`]. The shorthand `{name}`
    /// parses as `Pair` with `key == name`.
    Pair {
        /// Concrete parameter name this entry claims.
        key: String,
        /// Required literal, wildcard, capture, or function.
        value: Pattern,
    },
    /// `{**}`: binds every query parameter not claimed by a named entry,
    /// preserving key order and per-key value order.
    CatchAll,
    /// `{*}`: binds a single anonymous leftover parameter.
    Anonymous,
}

impl fmt::Display for QueryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pair { key, value } => {
                // `{name}` shorthand round-trips without the redundant key.
                if let Pattern::Capture { name, .. } = value {
                    if name == key {
                        return value.fmt(f);
                    }
                }
                write!(f, "{key}={value}")
            }
            Self::CatchAll => f.write_str("{**}"),
            Self::Anonymous => f.write_str("{*}"),
        }
    }
}

/// An immutable parsed URI pattern.
///
/// Construct via [`parse`](crate::parse) (or `str::parse`). Templates never
/// mutate after construction and are `Send + Sync`, so parse once at
/// configuration load and share freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub(crate) scheme: Option<Pattern>,
    pub(crate) host: Option<Pattern>,
    pub(crate) port: Option<Pattern>,
    pub(crate) has_authority: bool,
    pub(crate) absolute: bool,
    pub(crate) path: Vec<Pattern>,
    pub(crate) query: Vec<QueryEntry>,
    pub(crate) has_query: bool,
}

impl Template {
    /// Scheme pattern, when the pattern has an authority section.
    #[must_use]
    pub fn scheme(&self) -> Option<&Pattern> {
        self.scheme.as_ref()
    }

    /// Host pattern, when the pattern has an authority section.
    #[must_use]
    pub fn host(&self) -> Option<&Pattern> {
        self.host.as_ref()
    }

    /// Port pattern, when the authority carries one.
    #[must_use]
    pub fn port(&self) -> Option<&Pattern> {
        self.port.as_ref()
    }

    /// `true` when the pattern contained `://`.
    #[must_use]
    pub fn has_authority(&self) -> bool {
        self.has_authority
    }

    /// `true` when the path started with `/`.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Ordered path segment patterns. Empty means root.
    #[must_use]
    pub fn path(&self) -> &[Pattern] {
        &self.path
    }

    /// Query pattern entries, in source order.
    #[must_use]
    pub fn query(&self) -> &[QueryEntry] {
        &self.query
    }

    /// `true` when the pattern contained `?`.
    #[must_use]
    pub fn has_query(&self) -> bool {
        self.has_query
    }

    /// Names this template can bind when used as a source pattern, in
    /// pattern order. Unnamed wildcards contribute nothing.
    #[must_use]
    pub fn capture_names(&self) -> Vec<&str> {
        fn push<'a>(names: &mut Vec<&'a str>, name: Option<&'a str>) {
            if let Some(name) = name {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        let mut names = Vec::new();
        push(&mut names, self.scheme.as_ref().and_then(Pattern::binding_name));
        push(&mut names, self.host.as_ref().and_then(Pattern::binding_name));
        push(&mut names, self.port.as_ref().and_then(Pattern::binding_name));
        for segment in &self.path {
            push(&mut names, segment.binding_name());
        }
        for entry in &self.query {
            if let QueryEntry::Pair { value, .. } = entry {
                push(&mut names, value.binding_name());
            }
        }
        names
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_authority {
            if let Some(scheme) = &self.scheme {
                scheme.fmt(f)?;
            }
            f.write_str("://")?;
            if let Some(host) = &self.host {
                host.fmt(f)?;
            }
            if let Some(port) = &self.port {
                write!(f, ":{port}")?;
            }
        }
        for (i, segment) in self.path.iter().enumerate() {
            if i > 0 || self.absolute || self.has_authority {
                f.write_str("/")?;
            }
            segment.fmt(f)?;
        }
        if self.has_query {
            f.write_str("?")?;
            for (i, entry) in self.query.iter().enumerate() {
                if i > 0 {
                    f.write_str("&")?;
                }
                entry.fmt(f)?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Template {
    type Err = crate::SyntaxError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        crate::parse(pattern)
    }
}
