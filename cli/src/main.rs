//! ruta CLI — driving adapter for the ruta rewrite engine.
//!
//! Subcommands:
//! - `parse <pattern>` — parse a pattern and print its structure
//! - `match <pattern> <uri>` — match a URI and print the bindings
//! - `rewrite <source> <target> <uri> [--param key=value...]` — one-shot rewrite
//! - `apply <rules-file> <uri> [--param key=value...]` — apply a rule file
//! - `check <rules-file>` — validate a rule file loads without errors

use std::process;

use ruta::prelude::*;
use ruta_test::TestParams;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "parse" => cmd_parse(&args[2..]),
        "match" => cmd_match(&args[2..]),
        "rewrite" => cmd_rewrite(&args[2..]),
        "apply" => cmd_apply(&args[2..]),
        "check" => cmd_check(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_parse(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("parse requires a pattern".into());
    }

    let template = parse_pattern(&args[0])?;
    println!("pattern:   {template}");
    println!("authority: {}", template.has_authority());
    println!("absolute:  {}", template.is_absolute());
    println!("segments:  {}", template.path().len());
    println!("query:     {}", template.has_query());

    let names = template.capture_names();
    if names.is_empty() {
        println!("captures:  (none)");
    } else {
        println!("captures:  {}", names.join(", "));
    }
    Ok(())
}

fn cmd_match(args: &[String]) -> Result<(), String> {
    if args.len() < 2 {
        return Err("match requires a pattern and a URI".into());
    }

    let template = parse_pattern(&args[0])?;
    let bindings = ruta::match_uri(&template, &args[1])
        .map_err(|e| format!("bad URI \"{}\": {e}", args[1]))?;

    match bindings {
        None => println!("(no match)"),
        Some(bindings) => {
            let mut printed = false;
            for (name, values) in bindings.iter() {
                println!("{name} = {}", values.join(", "));
                printed = true;
            }
            if let Some((key, values)) = bindings.anonymous_param() {
                println!("query {key} = {}", values.join(", "));
                printed = true;
            }
            for (key, values) in bindings.catch_all_params() {
                println!("query {key} = {}", values.join(", "));
                printed = true;
            }
            if !printed {
                println!("(match, no bindings)");
            }
        }
    }
    Ok(())
}

fn cmd_rewrite(args: &[String]) -> Result<(), String> {
    if args.len() < 3 {
        return Err("rewrite requires a source pattern, a target pattern, and a URI".into());
    }

    let source = parse_pattern(&args[0])?;
    let target = parse_pattern(&args[1])?;
    let params = parse_params(&args[3..])?;

    match ruta::rewrite(&args[2], &source, &target, Some(&params), None) {
        Ok(uri) => println!("{uri}"),
        Err(RewriteError::NoMatch) => println!("(no match)"),
        Err(e) => return Err(e.to_string()),
    }
    Ok(())
}

fn cmd_apply(args: &[String]) -> Result<(), String> {
    if args.len() < 2 {
        return Err("apply requires a rules file and a URI".into());
    }

    let rules = load_rules(&args[0])?;
    let params = parse_params(&args[2..])?;

    match rules.rewrite(&args[1], Some(&params), None) {
        Ok(Some(outcome)) => {
            if let Some(rule) = &outcome.rule {
                eprintln!("rule: {rule}");
            }
            println!("{}", outcome.uri);
        }
        Ok(None) => println!("(no match)"),
        Err(e) => return Err(e.to_string()),
    }
    Ok(())
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("check requires a rules file path".into());
    }

    let rules = load_rules(&args[0])?;
    println!("Rules valid ({} rules)", rules.len());
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rule file loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_rules(path: &str) -> Result<RuleSet, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;

    let is_json = std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: RuleSetConfig = if is_json {
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))?
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).map_err(|e| format!("YAML parse error: {e}"))?
    };

    RuleSet::from_config(config).map_err(|e| format!("rules invalid: {e}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_pattern(text: &str) -> Result<Template, String> {
    ruta::parse(text).map_err(|e| format!("bad pattern \"{text}\": {e}"))
}

fn parse_params(args: &[String]) -> Result<TestParams, String> {
    let mut params = TestParams::new();
    let mut i = 0;

    while i < args.len() {
        if args[i] == "--param" {
            i += 1;
            while i < args.len() && !args[i].starts_with("--") {
                let pair = &args[i];
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("invalid param \"{pair}\", expected key=value"))?;
                params = params.with(key, value);
                i += 1;
            }
        } else {
            return Err(format!("unexpected argument \"{}\"", args[i]));
        }
    }

    Ok(params)
}

fn print_usage() {
    eprintln!(
        "Usage: ruta <command> [options]

Commands:
  parse <pattern>                                      Parse a pattern and print its structure
  match <pattern> <uri>                                Match a URI and print the bindings
  rewrite <source> <target> <uri> [--param key=value]  Rewrite a URI through a template pair
  apply <rules-file> <uri> [--param key=value]         Apply the first matching rule from a file
  check <rules-file>                                   Validate a rule file
  help                                                 Show this help"
    );
}
