use std::fs;

use chrono::{DateTime, Utc};
use clap::Args;
use pie_dca_core::account::Account;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::Context;
use crate::input;

/// Every saved portfolio in one file.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountBundle {
    pub exported_at: DateTime<Utc>,
    pub account: Account,
}

/// Arguments for exporting all portfolios
#[derive(Args)]
pub struct ExportArgs {
    /// Write the bundle to this file instead of stdout
    #[arg(long)]
    pub file: Option<String>,
}

/// Arguments for importing a bundle
#[derive(Args)]
pub struct ImportArgs {
    /// Bundle written by `pie export`
    pub file: String,

    /// Overwrite portfolios that already exist
    #[arg(long)]
    pub replace: bool,
}

pub fn collect_account(ctx: &Context) -> Result<Account, Box<dyn std::error::Error>> {
    let mut account = Account::create_empty();
    for file in ctx.store.list()? {
        let name = file.trim_end_matches(".json");
        account.add_or_replace(name, ctx.store.load(name)?);
    }
    Ok(account)
}

pub fn run_export(ctx: &Context, args: ExportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bundle = AccountBundle {
        exported_at: Utc::now(),
        account: collect_account(ctx)?,
    };
    info!(portfolios = bundle.account.len(), "exporting account");

    match args.file {
        Some(path) => {
            fs::write(&path, serde_json::to_string_pretty(&bundle)?)
                .map_err(|e| format!("Failed to write '{}': {}", path, e))?;
            Ok(json!({
                "saved": path,
                "portfolios": bundle.account.list(),
            }))
        }
        None => Ok(serde_json::to_value(&bundle)?),
    }
}

pub fn run_import(ctx: &Context, args: ImportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bundle: AccountBundle = input::file::read_json(&args.file)?;
    for (name, pie) in &bundle.account.portfolios {
        ctx.store.path_for(name)?;
        pie.validate()?;
    }

    if !args.replace {
        let existing: Vec<&str> = bundle
            .account
            .list()
            .into_iter()
            .filter(|name| ctx.store.exists(name))
            .collect();
        if !existing.is_empty() {
            return Err(format!(
                "Already exist: {} (use --replace to overwrite)",
                existing.join(", ")
            )
            .into());
        }
    }

    for (name, pie) in &bundle.account.portfolios {
        ctx.store.save(name, pie)?;
    }
    info!(portfolios = bundle.account.len(), "imported account");
    Ok(json!({
        "imported": bundle.account.list(),
        "exported_at": bundle.exported_at.to_rfc3339(),
    }))
}
