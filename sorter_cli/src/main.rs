#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
//! Command-line front end for the carousel color sorter.

mod cli;
mod error_fmt;
mod sort;

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);

    if let Err(err) = run(&args) {
        if args.json {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn run(args: &Cli) -> eyre::Result<()> {
    color_eyre::install()?;
    let cfg = load_config(args)?;
    init_tracing(args, &cfg.logging)?;

    match &args.cmd {
        Commands::Sort { objects } => sort::run_sort(&cfg, *objects, args.json),
        Commands::Calibrate => sort::run_calibrate(&cfg, args.json),
        Commands::SelfCheck => sort::self_check(&cfg),
    }
}

/// Read and validate the TOML config. A missing file at the default path
/// falls back to the built-in reference machine; an explicitly given path
/// must exist.
fn load_config(args: &Cli) -> eyre::Result<sorter_config::Config> {
    if !args.config.exists() {
        if args.config == std::path::Path::new("etc/sorter_config.toml") {
            return Ok(sorter_config::Config::default());
        }
        eyre::bail!("config file not found: {}", args.config.display());
    }
    let text = std::fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("reading {}", args.config.display()))?;
    let cfg = sorter_config::load_toml(&text)
        .wrap_err_with(|| format!("parsing {}", args.config.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Console layer honoring --log-level and RUST_LOG, plus an optional JSON
/// lines file layer from the config.
fn init_tracing(args: &Cli, logging: &sorter_config::Logging) -> eyre::Result<()> {
    let level = logging.level.as_deref().unwrap_or(&args.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = if args.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let file = logging.file.as_ref().map(|path| {
        let appender = tracing_appender::rolling::never(".", path);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer().json().with_writer(writer).boxed()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre::eyre!("initializing tracing: {e}"))?;
    Ok(())
}
