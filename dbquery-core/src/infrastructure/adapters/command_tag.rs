// dbquery-core/src/infrastructure/adapters/command_tag.rs
//
// Drivers only hand back an affected-row count, so the status line is rebuilt
// from the statement itself, shaped like a PostgreSQL command tag.

use sqlparser::ast::Statement as SqlStatement;
use sqlparser::dialect::{Dialect, HiveDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

use crate::domain::binding::LiteralDialect;

// Modifiers that sit between CREATE/DROP and the object kind.
const OBJECT_MODIFIERS: &[&str] = &[
    "OR", "REPLACE", "TEMP", "TEMPORARY", "UNLOGGED", "UNIQUE", "GLOBAL", "LOCAL", "EXTERNAL",
    "MATERIALIZED", "IF", "NOT", "EXISTS",
];

/// Builds the status line for `sql` once it affected `rows` rows.
pub fn command_tag(sql: &str, rows: u64, dialect: LiteralDialect) -> String {
    if is_query(sql, dialect) {
        return format!("SELECT {}", rows);
    }

    let keywords = leading_keywords(sql);
    let Some(first) = keywords.first() else {
        return String::new();
    };

    match first.as_str() {
        "INSERT" => format!("INSERT 0 {}", rows),
        "UPDATE" | "DELETE" | "MERGE" | "COPY" | "FETCH" | "MOVE" | "UPSERT" => {
            format!("{} {}", first, rows)
        }
        "CREATE" | "DROP" | "ALTER" => {
            match keywords
                .iter()
                .skip(1)
                .find(|k| !OBJECT_MODIFIERS.contains(&k.as_str()))
            {
                Some(kind) => format!("{} {}", first, kind),
                None => first.clone(),
            }
        }
        _ => first.clone(),
    }
}

fn is_query(sql: &str, dialect: LiteralDialect) -> bool {
    let dialect: Box<dyn Dialect> = match dialect {
        LiteralDialect::Postgres => Box::new(PostgreSqlDialect {}),
        LiteralDialect::Impala => Box::new(HiveDialect {}),
    };
    match Parser::parse_sql(dialect.as_ref(), sql) {
        Ok(statements) => matches!(statements.last(), Some(SqlStatement::Query(_))),
        // Dialect gaps: fall back to the leading keyword.
        Err(_) => matches!(
            leading_keywords(sql).first().map(String::as_str),
            Some("SELECT" | "VALUES" | "TABLE" | "SHOW" | "DESCRIBE")
        ),
    }
}

// Upper-cased leading words, skipping `--` line comments.
fn leading_keywords(sql: &str) -> Vec<String> {
    sql.lines()
        .map(|line| line.split("--").next().unwrap_or_default())
        .flat_map(str::split_whitespace)
        .take(8)
        .map(|word| {
            word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .to_ascii_uppercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}
