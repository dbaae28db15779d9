use clap::Parser;
use clap::Subcommand;
use serde_json::Map;
use serde_json::Value;

/// Default of `--in-files`. Means "no files given".
pub const IN_FILES_SENTINEL: &str = "files";
/// Default of `--out-file`. Means "no output file given".
pub const OUT_FILE_SENTINEL: &str = "file";

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Build API Blueprint documentation: transclude, interpolate fixtures, validate and \
	         render.",
	long_about = "blot compiles API Blueprint documents into validated markdown, extracts their \
	              JSON fixtures and renders them into post-processed static HTML.\n\nProject \
	              settings are read from `blot.json`, or `blot.<env>.json` when an environment \
	              is named. Flags override the project file and `--config` overrides \
	              both.\n\nQuick start:\n  blot compile -i 'docs/**/*.apib' -o api.json\n  blot \
	              render production"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct BlotCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Source documentation files, as a path or glob pattern.
	#[arg(long, short = 'i', global = true, default_value = IN_FILES_SENTINEL)]
	pub in_files: String,

	/// Read plain markdown from the argument instead of files.
	#[arg(long, short = 'd', global = true)]
	pub in_data: Option<String>,

	/// Write the compiled result to this file (`.apib`, `.md` or `.json`).
	#[arg(long, short = 'o', global = true, default_value = OUT_FILE_SENTINEL)]
	pub out_file: String,

	/// A JSON object that overrides the project configuration and every flag.
	#[arg(long, short = 'c', global = true)]
	pub config: Option<String>,

	/// Only check that the content is a valid API Blueprint.
	#[arg(long, short = 'v', global = true, default_value_t = false)]
	pub validate: bool,

	/// Print the compiled result to stdout.
	#[arg(long, short = 'e', global = true, default_value_t = false)]
	pub echo: bool,

	/// Enable structured logging of blot events.
	#[arg(long, short = 'l', global = true, default_value_t = false)]
	pub log: bool,

	/// Format output and logs for reading in a terminal.
	#[arg(long, short = 'p', global = true, default_value_t = false)]
	pub pretty: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

impl BlotCli {
	/// The configuration layer formed by the flags. Only flags that were set
	/// are included, so an unset flag never hides a project value.
	pub fn flag_layer(&self) -> Map<String, Value> {
		let mut layer = Map::new();

		for (key, enabled) in [
			("echo", self.echo),
			("logging", self.log),
			("pretty", self.pretty),
		] {
			if enabled {
				layer.insert(key.to_string(), Value::Bool(true));
			}
		}

		layer
	}

	/// `--in-files` unless it still holds its default.
	pub fn files(&self) -> Option<&str> {
		let files = self.in_files.trim();
		(!files.is_empty() && files != IN_FILES_SENTINEL).then_some(files)
	}

	/// `--out-file` unless it still holds its default.
	pub fn out_file(&self) -> Option<&str> {
		let file = self.out_file.trim();
		(!file.is_empty() && file != OUT_FILE_SENTINEL).then_some(file)
	}

	/// The environment named by the subcommand.
	pub fn env(&self) -> Option<&str> {
		match &self.command {
			Some(Commands::Compile { env } | Commands::Render { env }) => env.as_deref(),
			None => None,
		}
	}
}

#[derive(Subcommand)]
pub enum Commands {
	/// Process documentation and compile it into a static format.
	///
	/// Reads the sources named by `--in-files`, the project's `docs.src` or
	/// `--in-data`, then runs transclusion, interpolation, validation and
	/// fixture extraction. The result is written to the project's `docs.dest`
	/// when the project exports docs, otherwise to `--out-file`. Extracted
	/// fixtures are written to `fixtures.dest` when the project exports them.
	Compile {
		/// Project environment. Loads `blot.<env>.json`, or `blot.json` when
		/// omitted.
		env: Option<String>,
	},
	/// Compile documentation and render it as HTML.
	///
	/// Compiles the sources exactly like `compile`, renders every document
	/// with the configured theme, applies the `view.elements` and
	/// `view.replace` rules and writes the HTML to `view.dest` when the
	/// project exports views.
	Render {
		/// Project environment. Loads `blot.<env>.json`, or `blot.json` when
		/// omitted.
		env: Option<String>,
	},
}
