//! Template-against-URI matching.
//!
//! A concrete URI is parsed by the same grammar as a pattern and comes out
//! as an all-literal [`Template`]; matching then walks the two structures
//! section by section. The result is `None` for no-match, `Some(Bindings)`
//! with every capture's values for a match. Matching allocates only the
//! bindings it returns.
//!
//! Section rules:
//! - scheme and host compare case-insensitively, port exactly
//! - a path matches around at most one multi-segment pattern: literals and
//!   single captures anchor the prefix and suffix, the middle binds to the
//!   multi capture (possibly zero segments)
//! - query parameters are partitioned among named entries, then `{*}`, then
//!   `{**}`, preserving key order and per-key value order

use std::borrow::Cow;

use crate::params::Bindings;
use crate::template::{Pattern, QueryEntry, Template};
use crate::SyntaxError;

/// Matches `uri` against `template`.
///
/// Returns `Ok(None)` when the URI is well-formed but does not match, and
/// `Err` only when the URI itself fails to parse.
///
/// ```
/// let template = ruta::parse("*://*:*/{path=**}?{**}")?;
/// let bindings = ruta::match_uri(&template, "http://host:8443/a/b?x=1")?.unwrap();
/// assert_eq!(bindings.get("path"), Some(&["a".to_string(), "b".to_string()][..]));
/// # Ok::<(), ruta::SyntaxError>(())
/// ```
pub fn match_uri(template: &Template, uri: &str) -> Result<Option<Bindings>, SyntaxError> {
    let parsed = crate::parse(uri)?;
    Ok(match_parsed(template, &parsed))
}

/// Matches an already-parsed URI against `template`.
///
/// Useful when one URI is tried against many templates, as a rule set does.
#[must_use]
pub fn match_parsed(template: &Template, uri: &Template) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    if !match_authority(template, uri, &mut bindings) {
        return None;
    }
    if !match_path(template.path(), uri.path(), &mut bindings) {
        return None;
    }
    if !match_query(template, uri, &mut bindings) {
        return None;
    }
    Some(bindings)
}

/// A template without `://` places no constraint on the URI's authority.
fn match_authority(template: &Template, uri: &Template, bindings: &mut Bindings) -> bool {
    if !template.has_authority() {
        return true;
    }
    match_part(template.scheme(), uri.scheme(), true, bindings)
        && match_part(template.host(), uri.host(), true, bindings)
        && match_part(template.port(), uri.port(), false, bindings)
}

fn match_part(
    pattern: Option<&Pattern>,
    part: Option<&Pattern>,
    case_insensitive: bool,
    bindings: &mut Bindings,
) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };
    let Some(text) = part.and_then(Pattern::literal_text) else {
        return false;
    };
    match pattern {
        Pattern::Literal(expected) => {
            if case_insensitive {
                expected.eq_ignore_ascii_case(text)
            } else {
                expected == text
            }
        }
        Pattern::Star => !text.is_empty(),
        Pattern::Capture { name, .. } => {
            bindings.add_value(name.clone(), text);
            true
        }
        // A function reference on the input side binds the raw token under
        // its argument name; evaluation only happens on output.
        Pattern::Function { arg, .. } => {
            bindings.add_value(arg.clone(), text);
            true
        }
        Pattern::DoubleStar => false,
    }
}

fn match_path(pattern: &[Pattern], path: &[Pattern], bindings: &mut Bindings) -> bool {
    let Some(multi_at) = pattern.iter().position(Pattern::is_multi) else {
        return pattern.len() == path.len()
            && pattern
                .iter()
                .zip(path)
                .all(|(p, segment)| match_segment(p, segment, bindings));
    };

    let prefix = &pattern[..multi_at];
    let suffix = &pattern[multi_at + 1..];
    if path.len() < prefix.len() + suffix.len() {
        return false;
    }

    let (head, rest) = path.split_at(prefix.len());
    let (middle, tail) = rest.split_at(rest.len() - suffix.len());
    if !prefix
        .iter()
        .zip(head)
        .all(|(p, segment)| match_segment(p, segment, bindings))
    {
        return false;
    }
    if !suffix
        .iter()
        .zip(tail)
        .all(|(p, segment)| match_segment(p, segment, bindings))
    {
        return false;
    }

    // Zero middle segments still bind the name, to an empty list.
    if let Pattern::Capture { name, .. } = &pattern[multi_at] {
        let mut values = Vec::with_capacity(middle.len());
        for segment in middle {
            let Some(text) = segment.literal_text() else {
                return false;
            };
            values.push(text.to_string());
        }
        bindings.add_values(name.clone(), values);
    }
    true
}

fn match_segment(pattern: &Pattern, segment: &Pattern, bindings: &mut Bindings) -> bool {
    let Some(text) = segment.literal_text() else {
        return false;
    };
    match pattern {
        Pattern::Literal(expected) => expected == text,
        Pattern::Star => !text.is_empty(),
        Pattern::Capture { name, .. } => {
            bindings.add_value(name.clone(), text);
            true
        }
        Pattern::Function { arg, .. } => {
            bindings.add_value(arg.clone(), text);
            true
        }
        // Multi patterns are handled positionally by match_path.
        Pattern::DoubleStar => false,
    }
}

fn match_query(template: &Template, uri: &Template, bindings: &mut Bindings) -> bool {
    let pairs = concrete_pairs(uri);

    let mut claimed: Vec<&str> = Vec::new();
    let mut catch_all = false;
    let mut anonymous = false;

    for entry in template.query() {
        match entry {
            QueryEntry::CatchAll => catch_all = true,
            QueryEntry::Anonymous => anonymous = true,
            QueryEntry::Pair { key, value } => {
                claimed.push(key);
                let values: Vec<String> = pairs
                    .iter()
                    .filter(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
                    .collect();
                match value {
                    Pattern::Literal(expected) => {
                        // A literal is a hard requirement, unless the URI has
                        // no query at all.
                        if pairs.is_empty() {
                            continue;
                        }
                        if values.first().map(String::as_str) != Some(expected.as_str()) {
                            return false;
                        }
                    }
                    Pattern::Star | Pattern::DoubleStar => {}
                    Pattern::Capture { name, .. } => {
                        // Absent key: still a match, just no binding.
                        if !values.is_empty() {
                            bindings.add_values(name.clone(), values);
                        }
                    }
                    Pattern::Function { arg, .. } => {
                        if !values.is_empty() {
                            bindings.add_values(arg.clone(), values);
                        }
                    }
                }
            }
        }
    }

    let mut leftovers: Vec<(String, String)> = pairs
        .into_iter()
        .filter(|(k, _)| !claimed.iter().any(|c| *c == k.as_str()))
        .collect();

    if anonymous {
        if let Some((key, _)) = leftovers.first().cloned() {
            let values: Vec<String> = leftovers
                .iter()
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
                .collect();
            leftovers.retain(|(k, _)| *k != key);
            bindings.claim_anonymous(key, values);
        }
    }

    if catch_all {
        for (key, value) in leftovers {
            bindings.claim_catch_all(&key, value);
        }
    }

    true
}

/// Concrete `(key, value)` pairs in URI order, percent-decoded.
fn concrete_pairs(uri: &Template) -> Vec<(String, String)> {
    uri.query()
        .iter()
        .filter_map(|entry| match entry {
            QueryEntry::Pair {
                key,
                value: Pattern::Literal(value),
            } => Some((decode(key), decode(value))),
            _ => None,
        })
        .collect()
}

fn decode(text: &str) -> String {
    urlencoding::decode(text)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| text.to_string())
}
