use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use blot_cli::BlotCli;
use blot_cli::Commands;
use blot_core::Blueprint;
use blot_core::BlotResult;
use blot_core::Config;
use blot_core::DEFAULT_NAME;
use blot_core::Environment;
use blot_core::HtmlDocument;
use blot_core::Input;
use blot_core::Marshalled;
use blot_core::Overrides;
use blot_core::PostProcessor;
use blot_core::Reader;
use blot_core::Renderer;
use blot_core::Resolution;
use blot_core::ThemeRenderer;
use blot_core::io::write_file;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

const RULE: &str = "--------------------------------------------------";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,cyan) => {
		if color_enabled() {
			format!("{}", $text.cyan())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,magenta) => {
		if color_enabled() {
			format!("{}", $text.magenta())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = BlotCli::parse();

	// Respect NO_COLOR, --no-color and terminals without color support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(command) => run(&args, command),
		None => {
			eprintln!("No subcommand specified. Run `blot --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<blot_core::BlotError>() {
			Ok(blot_err) => {
				let report: miette::Report = (*blot_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Resolve and activate the environment, then run `command` on a fresh
/// runtime.
fn run(args: &BlotCli, command: &Commands) -> CliResult<()> {
	let mut overrides = Overrides::new().layer(args.flag_layer());
	if let Some(literal) = &args.config {
		overrides = overrides.json_literal(literal)?;
	}

	let env = args.env();
	let Resolution { config, is_project } = Config::resolve(Config::project_path(env), &overrides)?;

	init_logging(&config);

	if !is_project {
		tracing::warn!(
			env = env.unwrap_or(DEFAULT_NAME),
			"no project environment defined"
		);
	}

	let mut environment = Environment::new();
	environment.activate(config, true)?;

	let session = Session {
		args,
		environment,
		is_project,
	};

	let rt = tokio::runtime::Runtime::new()?;
	rt.block_on(async {
		match command {
			Commands::Compile { .. } => session.compile().await,
			Commands::Render { .. } => session.render().await,
		}
	})
}

/// Install the log subscriber chosen by the configuration. `RUST_LOG` always
/// takes precedence over the configured level.
fn init_logging(config: &Config) {
	let level = if config.pretty || config.logging {
		"info"
	} else {
		"off"
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

	if config.pretty {
		tracing_subscriber::registry()
			.with(filter)
			.with(layer.with_ansi(color_enabled()))
			.init();
	} else if config.logging {
		tracing_subscriber::registry()
			.with(filter)
			.with(layer.json())
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(layer.with_ansi(false))
			.init();
	}
}

/// Everything a command needs after the environment is activated.
struct Session<'a> {
	args: &'a BlotCli,
	environment: Environment,
	is_project: bool,
}

impl Session<'_> {
	fn config(&self) -> Arc<Config> {
		self.environment.current()
	}

	async fn compile(&self) -> CliResult<()> {
		let blueprints = self.compile_inputs().await?;

		for blueprint in &blueprints {
			self.section(blueprint.content());
		}

		if self.args.validate {
			report_valid(&blueprints);
			return Ok(());
		}

		self.export_blueprints(&blueprints).await?;
		self.export_fixtures(&blueprints).await?;

		Ok(())
	}

	async fn render(&self) -> CliResult<()> {
		let blueprints = self.compile_inputs().await?;

		if self.args.validate {
			report_valid(&blueprints);
			return Ok(());
		}

		let config = self.config();
		let compiler = self.environment.compiler();
		let renderer: Arc<dyn Renderer> = Arc::new(ThemeRenderer::for_config(&config));

		tracing::info!(count = blueprints.len(), "rendering blueprints");
		let documents = blot_core::render_all(renderer, blueprints, Arc::clone(&config)).await?;

		let processor = PostProcessor::for_compiler(&compiler);
		let documents = documents
			.into_iter()
			.map(|document| document.process(&processor))
			.collect::<BlotResult<Vec<_>>>()?;

		if documents.iter().all(HtmlDocument::is_empty) {
			tracing::warn!("no resulting HTML, check the `elements` configuration");
		}

		for document in &documents {
			self.section(document.html());
		}

		self.export_html(&documents).await
	}

	/// Pick the input source: `--in-files`, then the project's `docs.src`,
	/// then `--in-data`.
	fn input(&self) -> CliResult<Input> {
		let config = self.config();

		if let Some(files) = self.args.files() {
			return Ok(Input::Pattern(files.to_string()));
		}

		if self.is_project {
			if let Some(src) = config.docs.source() {
				return Ok(Input::Pattern(src.to_string()));
			}
		}

		if let Some(data) = &self.args.in_data {
			return Ok(Input::Text(data.clone()));
		}

		Err("malformed command: provide `--in-files`, `--in-data` or a project `docs.src`".into())
	}

	async fn compile_inputs(&self) -> CliResult<Vec<Blueprint>> {
		let input = self.input()?;
		let reader = Reader::new(self.environment.compiler());

		let blueprints = reader.read(input).await?;
		tracing::info!(count = blueprints.len(), "compiled blueprints");

		Ok(blueprints)
	}

	/// Write compiled markdown to the project's `docs.dest`, or to
	/// `--out-file`. Several documents are merged into one output.
	async fn export_blueprints(&self, blueprints: &[Blueprint]) -> CliResult<()> {
		let config = self.config();
		let project_dest = if self.is_project {
			config.docs.export_path()
		} else {
			None
		};

		let path = match (project_dest, self.args.out_file()) {
			(Some(dest), _) => config.uri(dest),
			(None, Some(file)) => PathBuf::from(file),
			(None, None) => return Ok(()),
		};

		let Some(merged) = Blueprint::merge(blueprints) else {
			tracing::warn!(path = %path.display(), "nothing to export");
			return Ok(());
		};

		blot_core::dest(&merged, &path).await?;
		tracing::info!(path = %path.display(), "exported blueprint");

		Ok(())
	}

	/// Write every extracted fixture as one JSON array to `fixtures.dest`.
	async fn export_fixtures(&self, blueprints: &[Blueprint]) -> CliResult<()> {
		let config = self.config();
		let Some(dest) = config.fixtures.export_path() else {
			return Ok(());
		};

		let fixtures = blueprints
			.iter()
			.flat_map(|blueprint| blueprint.fixtures().iter().cloned())
			.collect();
		let path = config.uri(dest);

		write_file(&path, &Marshalled::Fixtures(fixtures).to_text()?).await?;
		tracing::info!(path = %path.display(), "exported fixtures");

		Ok(())
	}

	async fn export_html(&self, documents: &[HtmlDocument]) -> CliResult<()> {
		let config = self.config();
		if !self.is_project || config.view.export_path().is_none() {
			return Ok(());
		}

		let html = documents
			.iter()
			.map(HtmlDocument::html)
			.collect::<Vec<_>>()
			.join("\n");

		HtmlDocument::new(html).write_to(None, &config).await?;
		tracing::info!(path = %config.view.dest, "exported html");

		Ok(())
	}

	/// Print one document: framed when pretty, logged when logging, raw when
	/// echoing.
	fn section(&self, content: &str) {
		let config = self.config();

		if config.pretty {
			println!("\n{}\n", colored!(RULE, magenta));
			println!("{}", colored!(content, cyan));
			println!("\n{}\n", colored!(RULE, magenta));
		} else if config.logging {
			tracing::info!(section = content, "document");
		} else if config.echo {
			println!("{content}");
		}
	}
}

fn report_valid(blueprints: &[Blueprint]) {
	for blueprint in blueprints {
		let name = blueprint
			.origin()
			.map_or_else(|| "<input>".to_string(), |path| path.display().to_string());
		println!("{} {name}", colored!("valid:", green));
	}
}
