use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Installs the global subscriber.
///
/// The filter comes from `QUIRE_LOG`, then `RUST_LOG`. When `QUIRE_LOG_DIR`
/// is set and writable, logs go to a per-process file there instead of
/// stderr.
pub fn setup_tracing(verbose: bool) {
	let filter = || {
		EnvFilter::try_from_env("QUIRE_LOG")
			.or_else(|_| EnvFilter::try_from_default_env())
			.unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
	};

	if let Some(log_dir) = std::env::var_os("QUIRE_LOG_DIR").map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("quire.{}.log", std::process::id()));
		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);
			tracing_subscriber::registry()
				.with(filter())
				.with(file_layer)
				.init();
			tracing::debug!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::registry()
		.with(filter())
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}

fn default_directives(verbose: bool) -> &'static str {
	if verbose {
		"quire=debug,quire_plugin=debug,quire_store=debug"
	} else {
		"quire=info,quire_plugin=info,quire_store=warn"
	}
}
