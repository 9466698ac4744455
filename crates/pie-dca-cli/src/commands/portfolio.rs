use std::time::Instant;

use clap::Args;
use pie_dca_core::display::{flatten, structure_links, summarize_children};
use pie_dca_core::tree::is_normalized;
use pie_dca_core::with_metadata;
use serde_json::{json, Value};
use tracing::info;

use super::{load_pie, tree_value, Context, PieSource};

/// Arguments for creating an empty portfolio
#[derive(Args)]
pub struct NewArgs {
    /// Portfolio name, also its file name
    pub name: String,
}

/// Arguments for deleting a saved portfolio
#[derive(Args)]
pub struct DeleteArgs {
    pub name: String,
}

/// Arguments for commands that only read a pie
#[derive(Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: PieSource,
}

/// Arguments for normalizing a pie
#[derive(Args)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub source: PieSource,

    /// Save the normalized tree back to its file
    #[arg(long)]
    pub write: bool,
}

pub fn run_new(ctx: &Context, args: NewArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pie = ctx.store.create(&args.name)?;
    tree_value(&pie)
}

pub fn run_list(ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let files = ctx.store.list()?;
    info!(dir = %ctx.store.dir().display(), count = files.len(), "listed portfolios");
    Ok(json!(files))
}

pub fn run_delete(ctx: &Context, args: DeleteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    ctx.store.delete(&args.name)?;
    Ok(json!({ "deleted": args.name }))
}

pub fn run_show(ctx: &Context, args: ViewArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut pie = load_pie(ctx, &args.source)?;
    let mut warnings = Vec::new();
    if !is_normalized(&pie) {
        warnings.push("Stored values or weights were stale and have been recomputed".to_string());
    }
    pie.normalize();

    let result = json!({
        "name": pie.name,
        "value": pie.value,
        "children": summarize_children(&pie),
    });
    let output = with_metadata(
        "Bottom-up normalization, weights relative to the root",
        &json!({ "levels": "root children only" }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_tree(ctx: &Context, args: ViewArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut pie = load_pie(ctx, &args.source)?;
    pie.normalize();
    let rows = flatten(&pie);
    let output = with_metadata(
        "Depth-first pre-order, weights relative to each parent",
        &json!({ "root": pie.name }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        rows,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_links(ctx: &Context, args: ViewArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut pie = load_pie(ctx, &args.source)?;
    pie.normalize();
    let links = structure_links(&pie);
    let output = with_metadata(
        "Parent to child edges weighted by child value",
        &json!({ "root": pie.name }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        links,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_normalize(
    ctx: &Context,
    args: NormalizeArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut pie = load_pie(ctx, &args.source)?;
    pie.normalize();

    if args.write {
        let name = args
            .source
            .stored_name()
            .ok_or("--write needs a saved portfolio name")?;
        ctx.store.save(name, &pie)?;
    }
    tree_value(&pie)
}
