use std::sync::Arc;

use clap::Parser;
use staterail_cli::commands::{cli, navigate, tree};
use staterail_cli::error::CliError;
use staterail_core::api::{AppConfig, AppContext, LoggingConfig};
use staterail_plugins::services::PluginServicesFactory;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(&args)?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    let states = staterail_core::api::load_states(&args.states)
        .map_err(|e| CliError::Definition(format!("{e:#}")))?;

    let services = Arc::new(PluginServicesFactory::new());
    let routes = services.route_table();
    let ctx = AppContext::new(cfg, &states, Some(services))
        .await
        .map_err(|e| CliError::Definition(format!("{e:#}")))?;
    tracing::debug!(states = ctx.tree().len(), routes = routes.len(), "state tree loaded");

    match &args.command {
        cli::Commands::Tree => Ok(tree::print_tree(&ctx)),
        cli::Commands::Routes => Ok(tree::print_routes(&ctx)),
        cli::Commands::Navigate(nav) => {
            navigate::navigate_paths(&ctx, &routes, &nav.paths, args.json).await
        }
        cli::Commands::Goto(goto) => navigate::goto_states(&ctx, goto, args.json).await,
    }
}

fn load_config(args: &cli::Args) -> Result<AppConfig, CliError> {
    let mut cfg = match &args.config {
        Some(path) => staterail_core::api::load_from_path(path),
        None => staterail_core::api::load_default(),
    }
    .map_err(|e| CliError::Config(format!("{e:#}")))?;

    if let Some(dir) = args.template_dir.as_deref().filter(|d| !d.trim().is_empty()) {
        cfg.templates.base_dir = dir.to_string();
    }
    Ok(cfg)
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("staterail"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("staterail.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
