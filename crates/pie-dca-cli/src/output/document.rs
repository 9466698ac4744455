use serde_json::Value;

/// Whole-document formats that keep the envelope intact.
#[derive(Debug, Clone, Copy)]
pub enum Document {
    Json,
    Yaml,
}

pub fn print_document(kind: Document, value: &Value) {
    match render(kind, value) {
        Ok(s) => print!("{}", s),
        Err(e) => eprintln!("{:?} serialization error: {}", kind, e),
    }
}

fn render(kind: Document, value: &Value) -> Result<String, String> {
    match kind {
        Document::Json => serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
        // serde_yaml already ends with a newline
        Document::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
    }
}
