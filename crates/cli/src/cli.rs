use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(about = "A plugin-extensible note store")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Config file (defaults to ./quire.toml)
	#[arg(long, short = 'c', value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// State file, overriding `state_file` from the config
	#[arg(long, short = 's', value_name = "PATH")]
	pub state: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v')]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Create a note and select it
	Add {
		#[arg(long)]
		title: Option<String>,
		#[arg(long)]
		content: Option<String>,
		/// Free-form type tag, e.g. `journal`
		#[arg(long = "type", value_name = "TYPE")]
		note_type: Option<String>,
	},
	/// List notes, newest first
	List,
	/// Print one note
	Show { id: String },
	/// Delete a note
	Delete { id: String },
	/// Show plugin activation status
	Plugins,
}
