//! Conformance test fixture runner
//!
//! Loads YAML rewrite fixtures and runs them against the ruta engine.

use std::collections::HashMap;

use ruta::prelude::*;
use serde::Deserialize;

use crate::{TestEvaluator, TestParams};

/// A complete rewrite fixture: one source/target pair, many cases.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Pattern input URIs must match.
    pub source: String,
    /// Pattern outputs are expanded from.
    pub target: String,
    /// Resolver contents shared by every case.
    #[serde(default)]
    pub params: HashMap<String, ValueList>,
    /// Evaluator tables: function name -> { from: to }.
    #[serde(default)]
    pub functions: HashMap<String, HashMap<String, String>>,
    pub cases: Vec<TestCase>,
}

/// One value or a list; YAML fixtures write whichever reads better.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ValueList {
    One(String),
    Many(Vec<String>),
}

impl ValueList {
    fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

/// One input URI and its expected outcome.
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub uri: String,
    /// Expected output URI; absent means the URI must NOT match the source.
    #[serde(default)]
    pub expect: Option<String>,
}

/// Result of running a single test case.
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl Fixture {
    /// Parse a fixture from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators.
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    fn build_resolver(&self) -> TestParams {
        let mut params = TestParams::new();
        for (name, values) in &self.params {
            params = params.with_values(name.clone(), values.to_vec());
        }
        params
    }

    fn build_evaluator(&self) -> TestEvaluator {
        let mut evaluator = TestEvaluator::new();
        for (function, table) in &self.functions {
            for (from, to) in table {
                evaluator = evaluator.with_mapping(function.clone(), from.clone(), to.clone());
            }
        }
        evaluator
    }

    /// Run all test cases and return results.
    ///
    /// Panics on malformed source/target patterns; a fixture with a bad
    /// pattern is a bug in the fixture, not a case outcome.
    pub fn run(&self) -> Vec<CaseResult> {
        let source = ruta::parse(&self.source)
            .unwrap_or_else(|e| panic!("fixture '{}': bad source pattern: {e}", self.name));
        let target = ruta::parse(&self.target)
            .unwrap_or_else(|e| panic!("fixture '{}': bad target pattern: {e}", self.name));
        let resolver = self.build_resolver();
        let evaluator = self.build_evaluator();

        self.cases
            .iter()
            .map(|case| {
                let actual = match ruta::rewrite(
                    &case.uri,
                    &source,
                    &target,
                    Some(&resolver),
                    Some(&evaluator),
                ) {
                    Ok(uri) => Some(uri),
                    Err(RewriteError::NoMatch) => None,
                    Err(e) => panic!(
                        "fixture '{}' case '{}' failed to rewrite: {e}",
                        self.name, case.name
                    ),
                };
                CaseResult {
                    case_name: case.name.clone(),
                    passed: actual == case.expect,
                    expected: case.expect.clone(),
                    actual,
                }
            })
            .collect()
    }

    /// Run all test cases and panic on first failure.
    pub fn run_and_assert(&self) {
        for result in self.run() {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {:?}, got {:?}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_round_trip() {
        let fixture = Fixture::from_yaml(
            r"
name: inline
source: path-1/{path=**}/path-4
target: new-path-1/{path=**}/new-path-4
cases:
  - name: middle
    uri: path-1/path-2/path-3/path-4
    expect: new-path-1/path-2/path-3/new-path-4
  - name: no match
    uri: other/path
",
        )
        .unwrap();
        fixture.run_and_assert();
    }

    #[test]
    fn multi_doc_parsing() {
        let fixtures = Fixture::from_yaml_multi(
            r"
name: one
source: a
target: b
cases: []
---
name: two
source: c
target: d
cases: []
",
        )
        .unwrap();
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[1].name, "two");
    }
}
