//! `quire`: a note store extended by plugins.

mod app;
mod cli;
mod config;
mod logging;
mod plugins;
mod sink;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::app::App;
use crate::cli::Cli;
use crate::config::{CliConfig, DEFAULT_CONFIG_FILE};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logging::setup_tracing(cli.verbose);

	let config_path = cli
		.config
		.clone()
		.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
	let config = CliConfig::load(&config_path)
		.with_context(|| format!("loading {}", config_path.display()))?;
	let state_path = config.state_path(cli.state.as_deref());

	let app = App::start(&config, &state_path)?;
	let stdout = std::io::stdout();
	app.run(&cli.command, &mut stdout.lock())
}
