// dbquery-core/src/domain/binding.rs
//
// Client-side argument binding with pyformat placeholders:
// `%s` (positional), `%(name)s` (named), `%%` (literal percent).

use serde_json::Value;

use crate::domain::arguments::QueryArguments;
use crate::domain::error::DomainError;
use crate::domain::statement::Statement;

/// How string and list literals are quoted for a target engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralDialect {
    Postgres,
    Impala,
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Percent,
    Positional,
    Named(&'a str),
}

// Unknown `%` sequences (e.g. in `LIKE 'a%'`) are kept as text.
fn scan(sql: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;
    let bytes = sql.as_bytes();

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        let token = match bytes.get(i + 1) {
            Some(b'%') => Some((Segment::Percent, 2)),
            Some(b's') => Some((Segment::Positional, 2)),
            Some(b'(') => sql[i + 2..].find(')').and_then(|close| {
                let name_end = i + 2 + close;
                (bytes.get(name_end + 1) == Some(&b's'))
                    .then(|| (Segment::Named(&sql[i + 2..name_end]), name_end + 2 - i))
            }),
            _ => None,
        };
        match token {
            Some((segment, len)) => {
                if text_start < i {
                    segments.push(Segment::Text(&sql[text_start..i]));
                }
                segments.push(segment);
                i += len;
                text_start = i;
            }
            None => i += 1,
        }
    }
    if text_start < sql.len() {
        segments.push(Segment::Text(&sql[text_start..]));
    }
    segments
}

/// Renders `statement` with its arguments inlined as SQL literals.
///
/// Statements are sent verbatim when no arguments are supplied or when they
/// contain no placeholder at all, so a batch may mix parameterised and plain
/// statements.
pub fn bind(
    statement: &Statement,
    arguments: &QueryArguments,
    dialect: LiteralDialect,
) -> Result<String, DomainError> {
    let sql = statement.as_str();
    if arguments.is_none() {
        return Ok(sql.to_string());
    }

    let segments = scan(sql);
    let has_placeholders = segments
        .iter()
        .any(|s| matches!(s, Segment::Positional | Segment::Named(_)));
    if !has_placeholders {
        return Ok(sql.to_string());
    }

    let fail = |reason: String| DomainError::ArgumentBinding {
        statement: sql.to_string(),
        reason,
    };

    let expected = segments
        .iter()
        .filter(|s| matches!(s, Segment::Positional))
        .count();
    if let QueryArguments::Positional(values) = arguments
        && values.len() != expected
    {
        return Err(fail(format!(
            "{} positional placeholder(s) but {} argument(s) given",
            expected,
            values.len()
        )));
    }

    let mut rendered = String::with_capacity(sql.len());
    let mut next_positional = 0;
    for segment in segments {
        match (segment, arguments) {
            (Segment::Text(text), _) => rendered.push_str(text),
            (Segment::Percent, _) => rendered.push('%'),
            (Segment::Positional, QueryArguments::Positional(values)) => {
                let value = values
                    .get(next_positional)
                    .ok_or_else(|| fail("not enough positional arguments".into()))?;
                rendered.push_str(&render_literal(value, dialect));
                next_positional += 1;
            }
            (Segment::Named(name), QueryArguments::Named(values)) => {
                let value = values
                    .get(name)
                    .ok_or_else(|| fail(format!("missing named argument '{}'", name)))?;
                rendered.push_str(&render_literal(value, dialect));
            }
            (Segment::Positional, _) => {
                return Err(fail("`%s` placeholder used with named arguments".into()));
            }
            (Segment::Named(name), _) => {
                return Err(fail(format!(
                    "`%({})s` placeholder used with positional arguments",
                    name
                )));
            }
        }
    }
    Ok(rendered)
}

/// Quotes one JSON value as a SQL literal.
pub fn render_literal(value: &Value, dialect: LiteralDialect) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_string(s, dialect),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(|v| render_literal(v, dialect)).collect();
            match dialect {
                LiteralDialect::Postgres if inner.is_empty() => "'{}'".to_string(),
                LiteralDialect::Postgres => format!("ARRAY[{}]", inner.join(", ")),
                LiteralDialect::Impala => format!("({})", inner.join(", ")),
            }
        }
        Value::Object(_) => quote_string(&value.to_string(), dialect),
    }
}

fn quote_string(s: &str, dialect: LiteralDialect) -> String {
    match dialect {
        LiteralDialect::Postgres if s.contains('\\') => {
            format!("E'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
        }
        LiteralDialect::Postgres => format!("'{}'", s.replace('\'', "''")),
        LiteralDialect::Impala => {
            format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
        }
    }
}
