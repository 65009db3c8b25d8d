//! Bindings and collaborator seams.
//!
//! [`Bindings`] is the ordered name-to-values multimap a successful match
//! produces and a rewrite consumes. [`Resolver`] and [`Evaluator`] are the
//! two host-supplied seams: a resolver backfills names the match did not
//! bind, an evaluator applies named functions to bound values.

use std::fmt;

/// Errors surfaced by host-supplied resolvers and evaluators.
///
/// Boxed so hosts can raise whatever error type their backends produce;
/// the rewriter wraps it in [`RewriteError::Collaborator`](crate::RewriteError).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies values for names a match did not bind.
///
/// The rewriter consults bindings first and falls back to the resolver only
/// for unbound names, so hosts can layer request-derived values over static
/// configuration by chaining resolvers.
pub trait Resolver: Send + Sync + fmt::Debug {
    /// Names this resolver can answer for. Informational; `resolve` is the
    /// authority.
    fn names(&self) -> Vec<String>;

    /// Values for `name`, or `Ok(None)` when this resolver has no answer.
    ///
    /// `Ok(Some(vec![]))` means the name IS resolved, to nothing; the
    /// rewriter renders it empty and does not fall further back.
    fn resolve(&self, name: &str) -> Result<Option<Vec<String>>, CollaboratorError>;
}

impl Resolver for Box<dyn Resolver> {
    fn names(&self) -> Vec<String> {
        self.as_ref().names()
    }

    fn resolve(&self, name: &str) -> Result<Option<Vec<String>>, CollaboratorError> {
        self.as_ref().resolve(name)
    }
}

/// Applies a named function to resolved values during rewriting.
///
/// A `{$fname(arg)}` reference in an output template resolves `arg` and then
/// calls `evaluate("fname", values)`; the returned values are substituted in
/// the argument's place.
pub trait Evaluator: Send + Sync + fmt::Debug {
    /// Applies `function` to `args`, returning the substituted values.
    fn evaluate(&self, function: &str, args: &[String]) -> Result<Vec<String>, CollaboratorError>;
}

impl Evaluator for Box<dyn Evaluator> {
    fn evaluate(&self, function: &str, args: &[String]) -> Result<Vec<String>, CollaboratorError> {
        self.as_ref().evaluate(function, args)
    }
}

/// Ordered name-to-values multimap produced by a successful match.
///
/// Insertion order of names is preserved, as is the order of values under
/// each name. A name bound to an empty list is distinct from an unbound
/// name: [`get`](Self::get) returns `Some(&[])` for the former and `None`
/// for the latter.
///
/// Query parameters claimed by a `{**}` catch-all or a `{*}` anonymous
/// entry are recorded apart from the captures, under
/// [`catch_all_params`](Self::catch_all_params) and
/// [`anonymous_param`](Self::anonymous_param). Concrete query keys are
/// arbitrary input, so they never share a namespace with capture names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    entries: Vec<(String, Vec<String>)>,
    catch_all: Vec<(String, Vec<String>)>,
    anonymous: Option<(String, Vec<String>)>,
}

impl Bindings {
    /// An empty set of bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one value under `name`, creating the name if absent.
    pub fn add_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.entry_mut(&name) {
            Some(values) => values.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// Binds `name` to `values`, appending to any existing binding.
    ///
    /// Binding an empty list records the name as bound-empty.
    pub fn add_values(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.entry_mut(&name) {
            Some(existing) => existing.extend(values),
            None => self.entries.push((name, values)),
        }
    }

    /// All values bound under `name`, or `None` when unbound.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// First value bound under `name`.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    /// `true` when `name` is bound, even to an empty list.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Bound names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of bound names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Query parameters a `{**}` entry claimed: keys in first-seen order,
    /// values per key in occurrence order.
    pub fn catch_all_params(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.catch_all
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// The single query parameter a `{*}` entry claimed, if any.
    #[must_use]
    pub fn anonymous_param(&self) -> Option<(&str, &[String])> {
        self.anonymous
            .as_ref()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Records one catch-all value under `key`, keeping first-seen key order.
    pub(crate) fn claim_catch_all(&mut self, key: &str, value: String) {
        match self.catch_all.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => values.push(value),
            None => self.catch_all.push((key.to_string(), vec![value])),
        }
    }

    /// Records the parameter an anonymous `{*}` entry claimed.
    pub(crate) fn claim_anonymous(&mut self, key: String, values: Vec<String>) {
        if self.anonymous.is_none() {
            self.anonymous = Some((key, values));
        }
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values)
    }
}

/// Bindings act as their own resolver, so a match result can seed a rewrite
/// of a different URI or back another template's expansion directly.
impl Resolver for Bindings {
    fn names(&self) -> Vec<String> {
        self.names().map(str::to_string).collect()
    }

    fn resolve(&self, name: &str) -> Result<Option<Vec<String>>, CollaboratorError> {
        Ok(self.get(name).map(<[String]>::to_vec))
    }
}
