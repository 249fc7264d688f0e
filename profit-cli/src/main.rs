use anyhow::Context;
use clap::Parser;
use tracing::debug;

use profit_cli::{app, cli::Cli, config::AppConfig, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref().unwrap_or("info"));

    let config_path = AppConfig::resolve_path(cli.config.as_deref());
    let config = AppConfig::load(&config_path)?;
    debug!(path = %config_path.display(), "configuration loaded");

    if cli.log_level.is_none() && !logging::env_filter_set() {
        logging::set_log_level(&config.logging.level)?;
    }
    if let Some(file) = config.log_file() {
        logging::enable_file_logging(file)?;
    }

    let registry = app::build_registry();
    let mut stdout = std::io::stdout().lock();
    app::run(&cli, &config, &registry, &mut stdout)
        .await
        .context("command failed")?;

    Ok(())
}
