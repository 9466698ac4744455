pub mod account;
pub mod allocate;
pub mod merge;
pub mod portfolio;
pub mod recalc;

use clap::Args;
use pie_dca_core::{Node, Pie};
use serde_json::Value;

use crate::config::Settings;
use crate::input;
use crate::store::Store;

/// Loaded settings and the portfolio store they point at.
pub struct Context {
    pub settings: Settings,
    pub store: Store,
}

impl Context {
    pub fn new(settings: Settings) -> Self {
        let store = Store::new(settings.data_dir.clone());
        Self { settings, store }
    }
}

/// Where a command reads its pie from.
#[derive(Args, Clone)]
pub struct PieSource {
    /// Name of a saved portfolio
    pub name: Option<String>,

    /// Path to a portfolio JSON file instead of a saved portfolio
    #[arg(long, conflicts_with = "name")]
    pub input: Option<String>,
}

impl PieSource {
    /// The saved portfolio name, if the pie came from the store.
    pub fn stored_name(&self) -> Option<&str> {
        match self.input {
            Some(_) => None,
            None => self.name.as_deref(),
        }
    }
}

/// Resolve a pie from a saved name, `--input` file or piped stdin.
pub fn load_pie(ctx: &Context, source: &PieSource) -> Result<Pie, Box<dyn std::error::Error>> {
    if let Some(ref path) = source.input {
        let value = input::file::read_json_value(path)?;
        Ok(Pie::from_value(value)?)
    } else if let Some(ref name) = source.name {
        ctx.store.load(name)
    } else if let Some(value) = input::stdin::read_stdin()? {
        Ok(Pie::from_value(value)?)
    } else {
        Err("Provide a portfolio name, --input file or pipe JSON via stdin".into())
    }
}

/// Canonical wire form of a pie, `type` tag included.
pub fn tree_value(pie: &Pie) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(Node::Pie(pie.clone()))?)
}
