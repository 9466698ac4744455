use std::time::Instant;

use clap::Args;
use pie_dca_core::numeric::content_hash;
use pie_dca_core::structure::{merge_batch, parse_classifier_response};
use pie_dca_core::with_metadata;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{tree_value, Context};
use crate::input;

/// Arguments for merging classifier output into a portfolio
#[derive(Args)]
pub struct MergeArgs {
    /// Saved portfolio to merge into; created if missing
    pub name: String,

    /// File with the raw classifier response (reads stdin when omitted)
    #[arg(long)]
    pub response: Option<String>,

    /// Ignore any cached parse of this response
    #[arg(long)]
    pub reparse: bool,

    /// Show the merged tree without saving it
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run_merge(ctx: &Context, args: MergeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let raw = match args.response {
        Some(ref path) => input::file::read_text(path)?,
        None => input::stdin::read_stdin_text()?
            .ok_or("Provide --response file or pipe the classifier response via stdin")?,
    };

    let batch = parsed_batch(ctx, &raw, args.reparse)?;
    let mut pie = ctx.store.load_or_create(&args.name)?;
    let report = merge_batch(&mut pie, &Value::Object(batch))?;
    pie.normalize();

    if !args.dry_run {
        ctx.store.save(&args.name, &pie)?;
    }

    let warnings: Vec<String> = report
        .skipped
        .iter()
        .map(|s| format!("Skipped '{}': {}", s.name, s.reason))
        .collect();
    let result = json!({
        "applied": report.applied,
        "skipped": report.skipped_count(),
        "value": pie.value,
        "saved": !args.dry_run,
        "tree": tree_value(&pie)?,
    });
    let output = with_metadata(
        "Insert or overwrite children, then bottom-up normalization",
        &json!({ "portfolio": args.name, "reparse": args.reparse }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}

/// Parse a raw response, going through the content-hash cache.
fn parsed_batch(
    ctx: &Context,
    raw: &str,
    reparse: bool,
) -> Result<Map<String, Value>, Box<dyn std::error::Error>> {
    let hash = content_hash(raw.as_bytes());
    if !reparse {
        if let Some(cached) = ctx.store.cached_response(&hash)? {
            info!(%hash, "using cached classifier response");
            return Ok(cached);
        }
    }
    let parsed = parse_classifier_response(raw)?;
    ctx.store.cache_response(&hash, &parsed)?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use pie_dca_core::Ticker;
    use rust_decimal_macros::dec;
    use std::fs;

    fn context() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(Settings {
            data_dir: dir.path().join("data"),
            ..Settings::default()
        });
        (dir, ctx)
    }

    fn response_file(dir: &tempfile::TempDir, body: &str) -> String {
        let path = dir.path().join("response.txt");
        fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn args(name: &str, response: String) -> MergeArgs {
        MergeArgs {
            name: name.into(),
            response: Some(response),
            reparse: false,
            dry_run: false,
        }
    }

    #[test]
    fn test_merge_creates_and_saves() {
        let (dir, ctx) = context();
        let body = "```json\n{\"VTI\": {\"type\": \"ticker\", \"value\": 60}, \
                    \"BND\": {\"type\": \"ticker\", \"value\": 40}}\n```";
        let out = run_merge(&ctx, args("main", response_file(&dir, body))).unwrap();
        assert_eq!(out["result"]["skipped"], 0);
        assert_eq!(out["result"]["tree"]["type"], "pie");

        let saved = ctx.store.load("main").unwrap();
        assert_eq!(saved.value, dec!(100));
        assert_eq!(saved.children.names(), vec!["VTI", "BND"]);
    }

    #[test]
    fn test_invalid_response_saves_nothing() {
        let (dir, ctx) = context();
        let pie = pie_dca_core::Pie::new("main").with_child(Ticker::new("VTI", dec!(5)));
        ctx.store.save("main", &pie).unwrap();

        let out = run_merge(&ctx, args("main", response_file(&dir, "no idea")));
        assert!(out.is_err());
        assert_eq!(ctx.store.load("main").unwrap().children.names(), vec!["VTI"]);
    }

    #[test]
    fn test_cached_parse_is_reused() {
        let (dir, ctx) = context();
        let body = r#"{"VTI": {"type": "ticker", "value": 1}}"#;
        let hash = content_hash(body.as_bytes());
        let mut poisoned = Map::new();
        poisoned.insert("CACHED".into(), json!({"type": "ticker", "value": 2}));
        ctx.store.cache_response(&hash, &poisoned).unwrap();

        let mut a = args("main", response_file(&dir, body));
        a.dry_run = true;
        let out = run_merge(&ctx, a).unwrap();
        assert_eq!(out["result"]["applied"], json!(["CACHED"]));
        assert!(!ctx.store.exists("main"));

        let mut a = args("main", response_file(&dir, body));
        a.reparse = true;
        let out = run_merge(&ctx, a).unwrap();
        assert_eq!(out["result"]["applied"], json!(["VTI"]));
    }
}
