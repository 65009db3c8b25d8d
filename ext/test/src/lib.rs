//! ruta-test: test support for conformance testing
//!
//! Provides simple [`Resolver`] and [`Evaluator`] implementations for
//! testing match and rewrite behavior with predictable, controllable data.
//!
//! # Example
//!
//! ```
//! use ruta_test::prelude::*;
//!
//! // TestParams is a builder over a name-to-values map
//! let params = TestParams::new()
//!     .with("host", "example.com")
//!     .with("port", "8443");
//!
//! assert_eq!(
//!     params.resolve("host").unwrap(),
//!     Some(vec!["example.com".to_string()])
//! );
//! ```

use std::collections::HashMap;

use ruta::prelude::*;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// Test resolver: a builder over a name-to-values map.
///
/// Backed by [`Bindings`] so insertion order is preserved and a name can be
/// bound to an empty list.
#[derive(Debug, Clone, Default)]
pub struct TestParams {
    values: Bindings,
}

impl TestParams {
    /// An empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one value under `name` (builder pattern).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.add_value(name, value);
        self
    }

    /// Binds `name` to a whole value list (builder pattern).
    #[must_use]
    pub fn with_values(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.values.add_values(name, values);
        self
    }
}

impl Resolver for TestParams {
    fn names(&self) -> Vec<String> {
        Resolver::names(&self.values)
    }

    fn resolve(&self, name: &str) -> Result<Option<Vec<String>>, CollaboratorError> {
        self.values.resolve(name)
    }
}

/// Test evaluator: per-function value-to-value mapping tables.
///
/// `evaluate` maps each argument through the function's table, passing
/// unmapped values through unchanged. Unknown functions fail, which is what
/// a misconfigured rewrite should do.
#[derive(Debug, Clone, Default)]
pub struct TestEvaluator {
    functions: HashMap<String, HashMap<String, String>>,
}

impl TestEvaluator {
    /// An evaluator that knows no functions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one `from -> to` entry to `function`'s table (builder pattern).
    #[must_use]
    pub fn with_mapping(
        mut self,
        function: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.functions
            .entry(function.into())
            .or_default()
            .insert(from.into(), to.into());
        self
    }
}

impl Evaluator for TestEvaluator {
    fn evaluate(&self, function: &str, args: &[String]) -> Result<Vec<String>, CollaboratorError> {
        let Some(table) = self.functions.get(function) else {
            return Err(format!("unknown function \"{function}\"").into());
        };
        Ok(args
            .iter()
            .map(|arg| table.get(arg).cloned().unwrap_or_else(|| arg.clone()))
            .collect())
    }
}

/// Chains resolvers: the first one that answers a name wins.
///
/// Models the request-values-over-configured-values precedence a gateway
/// filter uses.
#[derive(Debug, Default)]
pub struct ChainedParams {
    layers: Vec<Box<dyn Resolver>>,
}

impl ChainedParams {
    /// An empty chain, which resolves nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `resolver` as the next fallback layer (builder pattern).
    #[must_use]
    pub fn then(mut self, resolver: impl Resolver + 'static) -> Self {
        self.layers.push(Box::new(resolver));
        self
    }
}

impl Resolver for ChainedParams {
    fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for layer in &self.layers {
            for name in layer.names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    fn resolve(&self, name: &str) -> Result<Option<Vec<String>>, CollaboratorError> {
        for layer in &self.layers {
            if let Some(values) = layer.resolve(name)? {
                return Ok(Some(values));
            }
        }
        Ok(None)
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{ChainedParams, TestEvaluator, TestParams};
    pub use ruta::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_builder() {
        let params = TestParams::new()
            .with("host", "a")
            .with("tag", "x")
            .with("tag", "y");

        assert_eq!(params.resolve("host").unwrap(), Some(vec!["a".into()]));
        assert_eq!(
            params.resolve("tag").unwrap(),
            Some(vec!["x".into(), "y".into()])
        );
        assert_eq!(params.resolve("missing").unwrap(), None);
    }

    #[test]
    fn test_params_empty_binding() {
        let params = TestParams::new().with_values("empty", vec![]);
        assert_eq!(params.resolve("empty").unwrap(), Some(vec![]));
    }

    #[test]
    fn test_evaluator_maps_and_passes_through() {
        let eval = TestEvaluator::new().with_mapping("hostmap", "internal-host", "external-host");

        assert_eq!(
            eval.evaluate("hostmap", &["internal-host".into(), "other".into()])
                .unwrap(),
            vec!["external-host".to_string(), "other".to_string()]
        );
    }

    #[test]
    fn test_evaluator_unknown_function_fails() {
        let eval = TestEvaluator::new();
        assert!(eval.evaluate("nope", &["x".into()]).is_err());
    }

    #[test]
    fn test_chained_params_first_answer_wins() {
        let chain = ChainedParams::new()
            .then(TestParams::new().with("user", "from-request"))
            .then(
                TestParams::new()
                    .with("user", "from-config")
                    .with("op", "LISTSTATUS"),
            );

        assert_eq!(
            chain.resolve("user").unwrap(),
            Some(vec!["from-request".into()])
        );
        assert_eq!(
            chain.resolve("op").unwrap(),
            Some(vec!["LISTSTATUS".into()])
        );
        assert_eq!(chain.resolve("missing").unwrap(), None);
    }

    #[test]
    fn test_full_rewrite_with_test_doubles() {
        let source = ruta::parse("{scheme}://{host}:{port}/{path=**}?{**}").unwrap();
        let target = ruta::parse("{scheme}://{$hostmap(host)}:{port}/{path=**}?&{**}").unwrap();
        let eval = TestEvaluator::new().with_mapping("hostmap", "internal-host", "external-host");

        let out = ruta::rewrite(
            "scheme://internal-host:777/path",
            &source,
            &target,
            None,
            Some(&eval),
        )
        .unwrap();
        assert_eq!(out, "scheme://external-host:777/path");
    }
}
