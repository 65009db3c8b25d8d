//! Pattern-string parser.
//!
//! Turns pattern text into a [`Template`]. Concrete URIs are parsed by the
//! same grammar; they simply contain no placeholders and come out as
//! all-literal templates, which is what the matcher compares against.
//!
//! Sections are split structurally first (authority / path / query), then
//! each token is classified independently, so a `?` inside a query value or
//! a `:` inside a path never confuses the scan.

use crate::template::{Pattern, QueryEntry, Template, ValueKind};
use crate::{SyntaxError, MAX_PATTERN_LENGTH};

/// Parses a pattern string into a [`Template`].
///
/// ```
/// let template = ruta::parse("{scheme}://{host}:{port}/{path=**}?{**}")?;
/// assert!(template.has_authority());
/// assert_eq!(template.path().len(), 1);
/// # Ok::<(), ruta::SyntaxError>(())
/// ```
pub fn parse(pattern: &str) -> Result<Template, SyntaxError> {
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(SyntaxError::PatternTooLong {
            length: pattern.len(),
            max: MAX_PATTERN_LENGTH,
        });
    }

    let (scheme, host, port, has_authority, rest) = split_authority(pattern)?;

    let (path_text, query_text) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let absolute = path_text.starts_with('/');
    let mut path = Vec::new();
    for token in path_text.split('/').filter(|t| !t.is_empty()) {
        path.push(parse_atom(token)?);
    }
    if path.iter().filter(|p| p.is_multi()).count() > 1 {
        return Err(SyntaxError::MultipleMultiSegment {
            pattern: pattern.to_string(),
        });
    }

    let mut query = Vec::new();
    if let Some(query_text) = query_text {
        // Empty entries are skipped so `?&{**}` stays legal.
        for entry in query_text.split('&').filter(|e| !e.is_empty()) {
            query.push(parse_query_entry(entry)?);
        }
    }

    Ok(Template {
        scheme,
        host,
        port,
        has_authority,
        absolute,
        path,
        query,
        has_query: query_text.is_some(),
    })
}

type AuthorityParts<'a> = (
    Option<Pattern>,
    Option<Pattern>,
    Option<Pattern>,
    bool,
    &'a str,
);

/// Splits off `scheme://host:port` when the pattern carries `://`, returning
/// the unconsumed path-and-query remainder.
fn split_authority(pattern: &str) -> Result<AuthorityParts<'_>, SyntaxError> {
    let Some(sep) = pattern.find("://") else {
        return Ok((None, None, None, false, pattern));
    };

    let scheme_text = &pattern[..sep];
    let after = &pattern[sep + 3..];
    let authority_end = after.find(['/', '?']).unwrap_or(after.len());
    let authority_text = &after[..authority_end];
    let rest = &after[authority_end..];

    // host:port splits at the LAST colon so a placeholder host containing
    // no colon and an explicit port both come out right.
    let (host_text, port_text) = match authority_text.rfind(':') {
        Some(colon) => (&authority_text[..colon], Some(&authority_text[colon + 1..])),
        None => (authority_text, None),
    };

    let scheme = Some(parse_authority_atom(scheme_text)?);
    let host = Some(parse_authority_atom(host_text)?);
    let port = port_text.map(parse_authority_atom).transpose()?;

    Ok((scheme, host, port, true, rest))
}

/// Authority parts take the same atoms as path segments minus the
/// multi-segment forms, which only make sense between `/` separators.
fn parse_authority_atom(token: &str) -> Result<Pattern, SyntaxError> {
    let atom = parse_atom(token)?;
    if atom.is_multi() {
        return Err(SyntaxError::InvalidPlaceholder {
            text: token.to_string(),
            detail: "multi-segment wildcard not allowed in scheme, host, or port",
        });
    }
    Ok(atom)
}

/// Classifies one token: literal, `*`, `**`, `{...}` capture, or
/// `{$fname(arg)}` function reference.
fn parse_atom(token: &str) -> Result<Pattern, SyntaxError> {
    match token {
        "*" => return Ok(Pattern::Star),
        "**" => return Ok(Pattern::DoubleStar),
        _ => {}
    }

    if let Some(inner) = token.strip_prefix('{') {
        let Some(inner) = inner.strip_suffix('}') else {
            return Err(SyntaxError::UnbalancedBraces {
                text: token.to_string(),
            });
        };
        if inner.contains(['{', '}']) {
            return Err(SyntaxError::UnbalancedBraces {
                text: token.to_string(),
            });
        }
        if let Some(body) = inner.strip_prefix('$') {
            return parse_function(token, body);
        }
        return parse_capture(token, inner);
    }

    if token.contains(['{', '}']) {
        // Mixed literal-and-placeholder tokens are not part of the grammar.
        return Err(SyntaxError::UnbalancedBraces {
            text: token.to_string(),
        });
    }
    Ok(Pattern::Literal(token.to_string()))
}

/// Parses the inside of `{...}` (already brace-stripped, not a function).
fn parse_capture(token: &str, inner: &str) -> Result<Pattern, SyntaxError> {
    let (name, value_pattern) = match inner.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (inner, None),
    };

    if name.is_empty() {
        return Err(SyntaxError::InvalidPlaceholder {
            text: token.to_string(),
            detail: "empty capture name",
        });
    }
    if !is_valid_name(name) {
        return Err(SyntaxError::InvalidPlaceholder {
            text: token.to_string(),
            detail: "capture names may contain only alphanumerics, '-', '_', and '.'",
        });
    }

    let kind = match value_pattern {
        None => {
            // `{**}` and `{*}` are captures under the reserved names; `{**}`
            // consumes multiple path segments like any `=**` capture.
            if name == "**" {
                ValueKind::Multi
            } else {
                ValueKind::Single
            }
        }
        Some("*") => ValueKind::Single,
        Some("**") => ValueKind::Multi,
        Some(_) => {
            return Err(SyntaxError::InvalidPlaceholder {
                text: token.to_string(),
                detail: "value pattern must be * or **",
            })
        }
    };

    Ok(Pattern::Capture {
        name: name.to_string(),
        kind,
    })
}

/// Parses `$fname(arg)` (already brace-stripped, `$` consumed by the caller).
fn parse_function(token: &str, body: &str) -> Result<Pattern, SyntaxError> {
    let err = || SyntaxError::InvalidFunction {
        text: token.to_string(),
    };

    let open = body.find('(').ok_or_else(err)?;
    let function = &body[..open];
    let arg = body[open + 1..].strip_suffix(')').ok_or_else(err)?;

    if function.is_empty() || arg.is_empty() || !is_ident(function) || !is_ident(arg) {
        return Err(err());
    }

    Ok(Pattern::Function {
        function: function.to_string(),
        arg: arg.to_string(),
    })
}

/// Parses one `&`-separated query entry.
fn parse_query_entry(entry: &str) -> Result<QueryEntry, SyntaxError> {
    match entry {
        "{**}" => return Ok(QueryEntry::CatchAll),
        "{*}" => return Ok(QueryEntry::Anonymous),
        _ => {}
    }

    if entry.starts_with('{') {
        // `{name}` shorthand: parameter name and binding name coincide.
        let atom = parse_atom(entry)?;
        let Pattern::Capture { name, .. } = &atom else {
            return Err(SyntaxError::InvalidPlaceholder {
                text: entry.to_string(),
                detail: "function references require an explicit query key",
            });
        };
        let key = name.clone();
        return Ok(QueryEntry::Pair { key, value: atom });
    }

    let (key, value_text) = match entry.split_once('=') {
        Some((key, value)) => (key, Some(value)),
        None => (entry, None),
    };
    if key.is_empty() || key.contains(['{', '}']) {
        return Err(SyntaxError::InvalidPlaceholder {
            text: entry.to_string(),
            detail: "query parameter keys must be literal",
        });
    }

    let value = match value_text {
        None | Some("") => Pattern::Literal(String::new()),
        Some(text) => parse_atom(text)?,
    };
    Ok(QueryEntry::Pair {
        key: key.to_string(),
        value,
    })
}

/// Capture names: alphanumerics plus `-`, `_`, `.`, or the reserved `*` and
/// `**` forms handled by the caller.
fn is_valid_name(name: &str) -> bool {
    if name == "*" || name == "**" {
        return true;
    }
    is_ident(name)
}

fn is_ident(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
