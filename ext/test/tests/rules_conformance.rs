//! Conformance tests for rule-file loading and first-match-wins application.
//!
//! Run with: cargo test -p ruta-test --test rules_conformance --features ruta-test/rules
//!
//! Note: This test file requires the `rules` feature to be enabled.

#![cfg(feature = "rules")]

use ruta_test::prelude::*;

fn gateway_rules() -> RuleSet {
    let config: RuleSetConfig = serde_yaml::from_str(
        r"
rules:
  - name: webhdfs-file
    source: '*://*:*/webhdfs/v1/{path=**}?{**}'
    target: 'http://namenode:50070/webhdfs/v1/{path=**}?{**}'
  - name: passthrough
    source: '*://*:*/{path=**}?{**}'
    target: 'http://backend:8080/{path=**}?{**}'
",
    )
    .unwrap();
    RuleSet::from_config(config).unwrap()
}

#[test]
fn earlier_rules_shadow_later_ones() {
    let rules = gateway_rules();
    let outcome = rules
        .rewrite("https://edge:8443/webhdfs/v1/tmp/file?op=OPEN", None, None)
        .unwrap()
        .unwrap();
    assert_eq!(outcome.rule.as_deref(), Some("webhdfs-file"));
    assert_eq!(
        outcome.uri,
        "http://namenode:50070/webhdfs/v1/tmp/file?op=OPEN"
    );
}

#[test]
fn later_rules_catch_what_earlier_ones_miss() {
    let rules = gateway_rules();
    let outcome = rules
        .rewrite("https://edge:8443/other/thing", None, None)
        .unwrap()
        .unwrap();
    assert_eq!(outcome.rule.as_deref(), Some("passthrough"));
    assert_eq!(outcome.uri, "http://backend:8080/other/thing");
}

#[test]
fn no_rule_matching_yields_none() {
    let config: RuleSetConfig = serde_yaml::from_str(
        r"
rules:
  - source: api/{id}
    target: internal/{id}
",
    )
    .unwrap();
    let rules = RuleSet::from_config(config).unwrap();
    assert!(rules.rewrite("elsewhere", None, None).unwrap().is_none());
}

#[test]
fn rules_share_one_resolver_and_evaluator() {
    let config: RuleSetConfig = serde_yaml::from_str(
        r"
rules:
  - source: '{scheme}://{host}:{port}/{path=**}'
    target: '{scheme}://{$hostmap(host)}:{port}/{path=**}?user.name={user.name}'
",
    )
    .unwrap();
    let rules = RuleSet::from_config(config).unwrap();
    let params = TestParams::new().with("user.name", "hdfs");
    let evaluator = TestEvaluator::new().with_mapping("hostmap", "edge", "internal");

    let outcome = rules
        .rewrite("https://edge:443/a", Some(&params), Some(&evaluator))
        .unwrap()
        .unwrap();
    assert_eq!(outcome.uri, "https://internal:443/a?user.name=hdfs");
}

#[test]
fn fail_policy_applies_to_every_rule() {
    let config: RuleSetConfig = serde_yaml::from_str(
        r"
rules:
  - source: path
    target: path/{missing}
",
    )
    .unwrap();
    let rules = RuleSet::with_policy(config, UnresolvedPolicy::Fail).unwrap();
    let err = rules.rewrite("path", None, None).unwrap_err();
    assert!(matches!(err, RewriteError::Unresolved { name } if name == "missing"));
}
