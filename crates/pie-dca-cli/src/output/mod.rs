pub mod csv_out;
pub mod document;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use document::Document;
use serde_json::Value;

/// Route a command result to the formatter picked with `--output`.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => document::print_document(Document::Json, value),
        OutputFormat::Yaml => document::print_document(Document::Yaml, value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}
