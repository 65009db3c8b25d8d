//! Rule files: named source-to-target template pairs.
//!
//! The serde layer ([`RuleConfig`], [`RuleSetConfig`]) is the on-disk shape;
//! [`RuleSet::from_config`] compiles every pattern up front so malformed
//! rules fail at load time, never per request. Application is first-match-
//! wins in file order.

use serde::Deserialize;

use crate::params::{Evaluator, Resolver};
use crate::rewriter::{Rewriter, UnresolvedPolicy};
use crate::template::Template;
use crate::{RewriteError, SyntaxError};

/// One rule as read from a rule file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Optional label, reported in [`RewriteOutcome`].
    #[serde(default)]
    pub name: Option<String>,
    /// Pattern the input URI must match.
    pub source: String,
    /// Pattern the output URI is expanded from.
    pub target: String,
}

/// A whole rule file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetConfig {
    /// Rules in priority order.
    pub rules: Vec<RuleConfig>,
}

/// One compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    name: Option<String>,
    source: Template,
    target: Template,
}

impl Rule {
    /// Compiles a single rule, failing on either malformed pattern.
    pub fn from_config(config: RuleConfig) -> Result<Self, SyntaxError> {
        Ok(Self {
            name: config.name,
            source: crate::parse(&config.source)?,
            target: crate::parse(&config.target)?,
        })
    }

    /// The rule's label, when the file gave one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Compiled source pattern.
    #[must_use]
    pub fn source(&self) -> &Template {
        &self.source
    }

    /// Compiled target pattern.
    #[must_use]
    pub fn target(&self) -> &Template {
        &self.target
    }
}

/// What a rule set produced for one URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Label of the rule that fired, when it had one.
    pub rule: Option<String>,
    /// The rewritten URI.
    pub uri: String,
}

/// An ordered set of compiled rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    rewriter: Rewriter,
}

impl RuleSet {
    /// Compiles a config with the default unresolved-placeholder policy.
    pub fn from_config(config: RuleSetConfig) -> Result<Self, SyntaxError> {
        Self::with_policy(config, UnresolvedPolicy::default())
    }

    /// Compiles a config with an explicit policy.
    pub fn with_policy(
        config: RuleSetConfig,
        policy: UnresolvedPolicy,
    ) -> Result<Self, SyntaxError> {
        let rules = config
            .rules
            .into_iter()
            .map(Rule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rules,
            rewriter: Rewriter::with_policy(policy),
        })
    }

    /// Compiled rules in priority order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// `true` when the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies the first rule whose source matches `uri`.
    ///
    /// `Ok(None)` when no rule matches; expansion errors from the winning
    /// rule propagate.
    pub fn rewrite(
        &self,
        uri: &str,
        resolver: Option<&dyn Resolver>,
        evaluator: Option<&dyn Evaluator>,
    ) -> Result<Option<RewriteOutcome>, RewriteError> {
        let parsed = crate::parse(uri)?;
        for rule in &self.rules {
            let Some(bindings) = crate::match_parsed(&rule.source, &parsed) else {
                continue;
            };
            let uri = self
                .rewriter
                .expand(&rule.target, &bindings, resolver, evaluator)?;
            return Ok(Some(RewriteOutcome {
                rule: rule.name.clone(),
                uri,
            }));
        }
        Ok(None)
    }
}
