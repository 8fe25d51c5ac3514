// dbquery/src/output.rs
//
// Everything written to stdout. Logs go to stderr so the report stays
// machine-readable.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde_json::{Value, json};

use dbquery_core::domain::report::ExecutionReport;

use crate::cli::OutputFormat;

pub fn render_report(report: &ExecutionReport, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report),
        OutputFormat::Table => Ok(render_table(report)),
    }
}

/// `{"failed": true, "msg": ...}` for automation callers.
pub fn render_failure(message: &str) -> String {
    json!({ "failed": true, "msg": message }).to_string()
}

fn render_table(report: &ExecutionReport) -> String {
    let mut out = String::new();

    if let Some(first) = report.query_results.first() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(first.keys().cloned().collect::<Vec<_>>());
        for row in &report.query_results {
            table.add_row(row.values().map(cell).collect::<Vec<_>>());
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    out.push_str(&format!(
        "status: {} | rowcount: {} | changed: {} | executed: {} | skipped: {}",
        if report.status.is_empty() { "-" } else { &report.status },
        report.rowcount,
        report.changed,
        report.executed,
        report.skipped
    ));
    out
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
