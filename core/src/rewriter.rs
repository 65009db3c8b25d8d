//! Template expansion and one-shot rewriting.
//!
//! [`Rewriter`] composes an output URI from an output [`Template`] plus the
//! bindings of a match, with two fallbacks for names the match did not bind:
//! a host-supplied [`Resolver`], then the configured [`UnresolvedPolicy`].
//! [`Rewriter::rewrite`] chains match and expand for the common
//! source-template-to-target-template case.
//!
//! Composition rules that matter:
//! - authority is rendered iff the output template has one; `:port` is
//!   omitted when the port renders empty, but an empty scheme or host keeps
//!   its delimiter (`http://:80` is a faithful rendering)
//! - path segments are emitted verbatim, never percent-encoded, and segments
//!   that render empty are skipped so no `//` appears
//! - query keys and values are percent-encoded; `?` is emitted only when at
//!   least one pair is
//! - unnamed `*` and `**` in an output template render as nothing

use std::borrow::Cow;

use crate::params::{Bindings, Evaluator, Resolver};
use crate::template::{Pattern, QueryEntry, Template, ValueKind};
use crate::RewriteError;

/// What to do when an output placeholder has no value anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    /// Substitute nothing and keep going.
    #[default]
    EmptyString,
    /// Fail the rewrite with [`RewriteError::Unresolved`].
    Fail,
}

/// Expands output templates from bindings, a resolver, and an evaluator.
///
/// Stateless apart from its policy; one rewriter can serve concurrent calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rewriter {
    policy: UnresolvedPolicy,
}

impl Rewriter {
    /// A rewriter with the default [`UnresolvedPolicy::EmptyString`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A rewriter with an explicit unresolved-placeholder policy.
    #[must_use]
    pub fn with_policy(policy: UnresolvedPolicy) -> Self {
        Self { policy }
    }

    /// Matches `uri` against `source` and expands `target` from the result.
    ///
    /// `Err(RewriteError::NoMatch)` when the URI does not match `source`.
    pub fn rewrite(
        &self,
        uri: &str,
        source: &Template,
        target: &Template,
        resolver: Option<&dyn Resolver>,
        evaluator: Option<&dyn Evaluator>,
    ) -> Result<String, RewriteError> {
        let parsed = crate::parse(uri)?;
        let bindings =
            crate::match_parsed(source, &parsed).ok_or(RewriteError::NoMatch)?;
        self.expand(target, &bindings, resolver, evaluator)
    }

    /// Expands `template` into a concrete URI string.
    pub fn expand(
        &self,
        template: &Template,
        bindings: &Bindings,
        resolver: Option<&dyn Resolver>,
        evaluator: Option<&dyn Evaluator>,
    ) -> Result<String, RewriteError> {
        let expansion = Expansion {
            bindings,
            resolver,
            evaluator,
            policy: self.policy,
        };

        let mut out = String::new();
        expansion.render_authority(template, &mut out)?;
        expansion.render_path(template, &mut out)?;
        expansion.render_query(template, &mut out)?;
        Ok(out)
    }
}

/// One-shot rewrite with the default policy.
///
/// ```
/// let source = ruta::parse("{scheme}://{host}:{port}/{path=**}?{**}")?;
/// let target = ruta::parse("{scheme}://{host}:{port}/prefix/{path=**}?{**}")?;
/// let out = ruta::rewrite("http://h:80/a/b?q=1", &source, &target, None, None)?;
/// assert_eq!(out, "http://h:80/prefix/a/b?q=1");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn rewrite(
    uri: &str,
    source: &Template,
    target: &Template,
    resolver: Option<&dyn Resolver>,
    evaluator: Option<&dyn Evaluator>,
) -> Result<String, RewriteError> {
    Rewriter::new().rewrite(uri, source, target, resolver, evaluator)
}

struct Expansion<'a> {
    bindings: &'a Bindings,
    resolver: Option<&'a dyn Resolver>,
    evaluator: Option<&'a dyn Evaluator>,
    policy: UnresolvedPolicy,
}

impl Expansion<'_> {
    /// Bindings first, resolver second. `Some(vec![])` from either source is
    /// a real answer and stops the fallback.
    fn lookup(&self, name: &str) -> Result<Option<Vec<String>>, RewriteError> {
        if let Some(values) = self.bindings.get(name) {
            return Ok(Some(values.to_vec()));
        }
        let Some(resolver) = self.resolver else {
            return Ok(None);
        };
        resolver
            .resolve(name)
            .map_err(|source| RewriteError::Collaborator { source })
    }

    /// Values for a pattern, or `None` when nothing anywhere supplies them.
    fn resolve_values(&self, pattern: &Pattern) -> Result<Option<Vec<String>>, RewriteError> {
        match pattern {
            Pattern::Literal(text) => Ok(Some(vec![text.clone()])),
            Pattern::Star | Pattern::DoubleStar => Ok(None),
            Pattern::Capture { name, .. } => self.lookup(name),
            Pattern::Function { function, arg } => {
                let Some(args) = self.lookup(arg)? else {
                    return Ok(None);
                };
                let Some(evaluator) = self.evaluator else {
                    return Ok(None);
                };
                evaluator
                    .evaluate(function, &args)
                    .map(Some)
                    .map_err(|source| RewriteError::Collaborator { source })
            }
        }
    }

    /// Applies the policy to an unresolved named pattern, yielding the empty
    /// substitution when the policy allows one.
    fn unresolved(&self, pattern: &Pattern) -> Result<(), RewriteError> {
        match (self.policy, pattern.binding_name()) {
            (UnresolvedPolicy::Fail, Some(name)) => Err(RewriteError::Unresolved {
                name: name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// One part of the authority, as a single string.
    fn render_part(&self, pattern: &Pattern) -> Result<String, RewriteError> {
        match self.resolve_values(pattern)? {
            Some(values) => Ok(values.first().cloned().unwrap_or_default()),
            None => {
                self.unresolved(pattern)?;
                Ok(String::new())
            }
        }
    }

    fn render_authority(&self, template: &Template, out: &mut String) -> Result<(), RewriteError> {
        if !template.has_authority() {
            return Ok(());
        }
        if let Some(scheme) = template.scheme() {
            out.push_str(&self.render_part(scheme)?);
        }
        out.push_str("://");
        if let Some(host) = template.host() {
            out.push_str(&self.render_part(host)?);
        }
        if let Some(port) = template.port() {
            let port = self.render_part(port)?;
            if !port.is_empty() {
                out.push(':');
                out.push_str(&port);
            }
        }
        Ok(())
    }

    fn render_path(&self, template: &Template, out: &mut String) -> Result<(), RewriteError> {
        let mut rendered = Vec::new();
        for segment in template.path() {
            match self.resolve_values(segment)? {
                Some(values) => {
                    let joined = match segment {
                        // Multi captures and functions re-expand one value
                        // per path segment.
                        Pattern::Capture {
                            kind: ValueKind::Multi,
                            ..
                        }
                        | Pattern::Function { .. } => values.join("/"),
                        _ => values.first().cloned().unwrap_or_default(),
                    };
                    if !joined.is_empty() {
                        rendered.push(joined);
                    }
                }
                None => self.unresolved(segment)?,
            }
        }
        if rendered.is_empty() {
            return Ok(());
        }
        if template.is_absolute() || template.has_authority() {
            out.push('/');
        }
        out.push_str(&rendered.join("/"));
        Ok(())
    }

    fn render_query(&self, template: &Template, out: &mut String) -> Result<(), RewriteError> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for entry in template.query() {
            match entry {
                QueryEntry::Pair { key, value } => match value {
                    Pattern::Star | Pattern::DoubleStar => {}
                    _ => match self.resolve_values(value)? {
                        Some(values) => {
                            for value in values {
                                pairs.push((key.clone(), value));
                            }
                        }
                        // Unresolved named entries emit nothing rather than
                        // a dangling `key=`.
                        None => self.unresolved(value)?,
                    },
                },
                QueryEntry::Anonymous => {
                    if let Some((key, values)) = self.bindings.anonymous_param() {
                        for value in values {
                            pairs.push((key.to_string(), value.clone()));
                        }
                    }
                }
                QueryEntry::CatchAll => {
                    for (key, values) in self.bindings.catch_all_params() {
                        for value in values {
                            pairs.push((key.to_string(), value.clone()));
                        }
                    }
                }
            }
        }
        if pairs.is_empty() {
            return Ok(());
        }
        out.push('?');
        for (i, (key, value)) in pairs.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(&encode(key));
            out.push('=');
            out.push_str(&encode(value));
        }
        Ok(())
    }
}

fn encode(text: &str) -> Cow<'_, str> {
    urlencoding::encode(text)
}
