use clap::Args;
use pie_dca_core::allocation::{plan_reallocation, ReallocationInput};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::info;

use super::{load_pie, Context, PieSource};

/// Arguments for a what-if reallocation
#[derive(Args)]
pub struct RecalcArgs {
    #[command(flatten)]
    pub source: PieSource,

    /// Capital being added [default: from settings, 50]
    #[arg(long)]
    pub new_funds: Option<Decimal>,

    /// Number of new placeholder positions [default: from settings, 2]
    #[arg(long)]
    pub new_tickers: Option<u32>,

    /// Percent of the new funds going to new positions, 0-100 [default: from settings, 80]
    #[arg(long)]
    pub percent_to_new: Option<Decimal>,

    /// Name prefix for new positions [default: from settings, NEW_]
    #[arg(long)]
    pub prefix: Option<String>,

    /// Save the adjusted pie over the saved portfolio
    #[arg(long)]
    pub commit: bool,
}

impl RecalcArgs {
    fn to_input(&self, defaults: &ReallocationInput) -> ReallocationInput {
        ReallocationInput {
            new_funds: self.new_funds.unwrap_or(defaults.new_funds),
            new_ticker_count: self.new_tickers.unwrap_or(defaults.new_ticker_count),
            percent_to_new: self.percent_to_new.unwrap_or(defaults.percent_to_new),
            mock_prefix: self
                .prefix
                .clone()
                .unwrap_or_else(|| defaults.mock_prefix.clone()),
        }
    }
}

pub fn run_recalc(ctx: &Context, args: RecalcArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = args.to_input(&ctx.settings.recalc);
    let pie = load_pie(ctx, &args.source)?;

    let plan = plan_reallocation(&pie, &input)?;

    if args.commit {
        let name = args
            .source
            .stored_name()
            .ok_or("--commit needs a saved portfolio name")?;
        ctx.store.save(name, &plan.result.adjusted)?;
        info!(portfolio = %name, "committed reallocation");
    }

    let mut value = serde_json::to_value(plan)?;
    if let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) {
        result.insert("committed".into(), json!(args.commit));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use pie_dca_core::{Pie, Ticker};
    use rust_decimal_macros::dec;

    fn context() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(Settings {
            data_dir: dir.path().to_path_buf(),
            ..Settings::default()
        });
        let pie = Pie::new("main")
            .with_child(Ticker::new("AAPL", dec!(150)))
            .with_child(Ticker::new("MSFT", dec!(100)))
            .with_child(Ticker::new("GOOGL", dec!(50)));
        ctx.store.save("main", &pie).unwrap();
        (dir, ctx)
    }

    fn args(commit: bool) -> RecalcArgs {
        RecalcArgs {
            source: PieSource {
                name: Some("main".into()),
                input: None,
            },
            new_funds: None,
            new_tickers: None,
            percent_to_new: None,
            prefix: None,
            commit,
        }
    }

    #[test]
    fn test_preview_leaves_store_untouched() {
        let (_dir, ctx) = context();
        let out = run_recalc(&ctx, args(false)).unwrap();
        assert_eq!(out["result"]["committed"], false);
        assert_eq!(out["result"]["new_tickers"], json!(["NEW_1", "NEW_2"]));
        assert_eq!(ctx.store.load("main").unwrap().children.len(), 3);
    }

    #[test]
    fn test_commit_saves_adjusted_pie() {
        let (_dir, ctx) = context();
        run_recalc(&ctx, args(true)).unwrap();
        let saved = ctx.store.load("main").unwrap();
        assert_eq!(saved.children.len(), 5);
        assert_eq!(saved.value, dec!(350));
        let total: u32 = saved.children.iter().filter_map(|c| c.target_weight()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_flags_override_settings() {
        let defaults = ReallocationInput::default();
        let mut a = args(false);
        a.new_funds = Some(dec!(200));
        a.prefix = Some("IDEA_".into());
        let input = a.to_input(&defaults);
        assert_eq!(input.new_funds, dec!(200));
        assert_eq!(input.percent_to_new, dec!(80));
        assert_eq!(input.mock_prefix, "IDEA_");
    }

    #[test]
    fn test_failed_commit_writes_nothing() {
        let (_dir, ctx) = context();
        let mut a = args(true);
        a.percent_to_new = Some(dec!(150));
        assert!(run_recalc(&ctx, a).is_err());
        assert_eq!(ctx.store.load("main").unwrap().children.len(), 3);
    }
}
