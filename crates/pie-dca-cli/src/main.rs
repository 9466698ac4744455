mod commands;
mod config;
mod input;
mod output;
mod store;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::account::{ExportArgs, ImportArgs};
use commands::allocate::AllocateArgs;
use commands::merge::MergeArgs;
use commands::portfolio::{DeleteArgs, NewArgs, NormalizeArgs, ViewArgs};
use commands::recalc::RecalcArgs;
use commands::Context;

/// Hierarchical pie portfolios: normalize, DCA allocation and what-if reallocation
#[derive(Parser)]
#[command(
    name = "pie",
    version,
    about = "Hierarchical pie portfolios with decimal precision",
    long_about = "Manage nested pie portfolios stored as JSON. Normalizes container \
                  values and weights, spreads new capital across every position, \
                  plans what-if reallocations with whole-percent targets, and merges \
                  structure extracted by an external classifier."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Verbosity on stderr (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    debug: u8,

    /// Extra config file layered over the global one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Portfolio directory, overrides settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty portfolio
    New(NewArgs),
    /// List saved portfolios
    List,
    /// Summarize the root level of a portfolio
    Show(ViewArgs),
    /// Delete a saved portfolio
    Delete(DeleteArgs),
    /// Flatten a portfolio into depth-first rows
    Tree(ViewArgs),
    /// Parent to child edges for flow charts
    Links(ViewArgs),
    /// Recompute container values and weights
    Normalize(NormalizeArgs),
    /// Spread new capital across every leaf
    Allocate(AllocateArgs),
    /// Plan a reallocation with new positions and whole-percent targets
    Recalc(RecalcArgs),
    /// Merge a classifier response into a portfolio
    Merge(MergeArgs),
    /// Export every portfolio as one account bundle
    Export(ExportArgs),
    /// Import an account bundle
    Import(ImportArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
    Yaml,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.debug);

    if let Commands::Version = cli.command {
        println!("pie {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = context(&cli).and_then(|ctx| run(&ctx, cli.command));

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn context(cli: &Cli) -> Result<Context, Box<dyn std::error::Error>> {
    let mut settings = config::Settings::load(cli.config.as_deref())?;
    if let Some(ref dir) = cli.data_dir {
        settings.data_dir = dir.clone();
    }
    tracing::debug!(data_dir = %settings.data_dir.display(), "settings loaded");
    Ok(Context::new(settings))
}

fn run(ctx: &Context, command: Commands) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    match command {
        Commands::New(args) => commands::portfolio::run_new(ctx, args),
        Commands::List => commands::portfolio::run_list(ctx),
        Commands::Show(args) => commands::portfolio::run_show(ctx, args),
        Commands::Delete(args) => commands::portfolio::run_delete(ctx, args),
        Commands::Tree(args) => commands::portfolio::run_tree(ctx, args),
        Commands::Links(args) => commands::portfolio::run_links(ctx, args),
        Commands::Normalize(args) => commands::portfolio::run_normalize(ctx, args),
        Commands::Allocate(args) => commands::allocate::run_allocate(ctx, args),
        Commands::Recalc(args) => commands::recalc::run_recalc(ctx, args),
        Commands::Merge(args) => commands::merge::run_merge(ctx, args),
        Commands::Export(args) => commands::account::run_export(ctx, args),
        Commands::Import(args) => commands::account::run_import(ctx, args),
        Commands::Version => Ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // RUST_LOG wins when set
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_recalc_flags() {
        let cli = Cli::try_parse_from([
            "pie",
            "-dd",
            "--output",
            "table",
            "recalc",
            "main",
            "--new-funds",
            "120.50",
            "--new-tickers",
            "3",
            "--commit",
        ])
        .unwrap();
        assert_eq!(cli.debug, 2);
        assert!(matches!(cli.output, OutputFormat::Table));
        match cli.command {
            Commands::Recalc(args) => {
                assert_eq!(args.source.name.as_deref(), Some("main"));
                assert_eq!(args.new_tickers, Some(3));
                assert!(args.commit);
            }
            _ => panic!("expected recalc"),
        }
    }
}
