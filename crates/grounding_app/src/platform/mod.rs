mod app;
mod cli;
mod config;
mod effects;
mod logging;
mod ui;

use clap::Parser;
use engine_logging::{engine_error, engine_info, engine_warn};

pub fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let (mut config, config_error) = config::AppConfig::load_or_default(&cli.config);
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }

    logging::initialize(config.log_destination, cli.verbose);
    if let Some(err) = config_error {
        engine_warn!("{}; using defaults", err);
    }
    engine_info!("groundtruth starting against {}", config.base_url);

    let result = app::run_command(cli.command, &config, &cli.config);
    if let Err(err) = &result {
        engine_error!("{:#}", err);
    }
    result
}
