use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::BlotError;
use crate::BlotResult;
use crate::config::Config;
use crate::environment::FixtureRegistry;
use crate::interpolate::Interpolator;
use crate::interpolate::Scope;
use crate::interpolate::TokenInterpolator;
use crate::io::write_file;
use crate::parser::ApiBlueprint;
use crate::parser::BlueprintParser;
use crate::parser::GrammarParser;
use crate::transclude::FileTranscluder;
use crate::transclude::Transcluder;

/// Candidate fixture spans: the shortest `{...}` run on a single line. Nested
/// objects are cut at the first closing brace and fail to parse.
static FIXTURE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(.*?)\}").unwrap());

/// The ordered steps of a compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStage {
	Transcluding,
	Interpolating,
	Validating,
	ExtractingFixtures,
}

impl CompileStage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Transcluding => "transclude",
			Self::Interpolating => "interpolate",
			Self::Validating => "validate",
			Self::ExtractingFixtures => "fixtures",
		}
	}
}

impl Display for CompileStage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The output of a full compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Compiled {
	/// Transcluded, interpolated and validated markdown.
	pub markdown: String,
	/// Fixtures extracted from `markdown`, in document order.
	pub fixtures: Vec<Value>,
	/// Candidate fixture spans that were not valid JSON.
	pub skipped: usize,
}

/// One API Blueprint source document, optionally compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
	markdown: String,
	origin: Option<PathBuf>,
	compiled: Option<Compiled>,
}

impl Blueprint {
	pub fn new(markdown: impl Into<String>) -> Self {
		Self {
			markdown: markdown.into(),
			origin: None,
			compiled: None,
		}
	}

	/// A document read from `origin`. References inside it resolve against
	/// the file's directory.
	pub fn with_origin(markdown: impl Into<String>, origin: impl Into<PathBuf>) -> Self {
		Self {
			origin: Some(origin.into()),
			..Self::new(markdown)
		}
	}

	/// The source markdown, as given.
	pub fn markdown(&self) -> &str {
		&self.markdown
	}

	pub fn origin(&self) -> Option<&Path> {
		self.origin.as_deref()
	}

	pub fn compiled(&self) -> Option<&Compiled> {
		self.compiled.as_ref()
	}

	pub fn is_compiled(&self) -> bool {
		self.compiled.is_some()
	}

	/// Compiled fixtures, empty for an uncompiled document.
	pub fn fixtures(&self) -> &[Value] {
		self.compiled
			.as_ref()
			.map_or(&[], |compiled| compiled.fixtures.as_slice())
	}

	/// Compiled markdown when available, otherwise the source.
	pub fn content(&self) -> &str {
		self.compiled
			.as_ref()
			.map_or(self.markdown.as_str(), |compiled| compiled.markdown.as_str())
	}

	/// Convert the content into `format`.
	pub fn marshall(&self, format: MarshallFormat) -> Marshalled {
		marshall(self.content(), format)
	}

	/// Join several compiled documents into one: markdown separated by a blank
	/// line, fixtures concatenated in order. Returns `None` for an empty slice.
	pub fn merge(blueprints: &[Self]) -> Option<Self> {
		match blueprints {
			[] => None,
			[single] => Some(single.clone()),
			many => {
				let mut compiled = Compiled::default();
				let mut sources = Vec::with_capacity(many.len());
				let mut contents = Vec::with_capacity(many.len());

				for blueprint in many {
					sources.push(blueprint.markdown.as_str());
					contents.push(blueprint.content());
					compiled.fixtures.extend_from_slice(blueprint.fixtures());
					compiled.skipped += blueprint.compiled.as_ref().map_or(0, |c| c.skipped);
				}

				compiled.markdown = contents.join("\n\n");

				Some(Self {
					markdown: sources.join("\n\n"),
					origin: None,
					compiled: Some(compiled),
				})
			}
		}
	}
}

/// Result of best-effort fixture extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
	pub fixtures: Vec<Value>,
	/// Candidate spans that did not parse as JSON.
	pub skipped: usize,
}

/// Scan `markdown` for JSON-looking `{...}` spans and parse each one. Spans
/// that are not valid JSON are counted in [`Extraction::skipped`] and
/// otherwise ignored.
pub fn extract_fixtures(markdown: &str) -> Extraction {
	let mut extraction = Extraction::default();

	for candidate in FIXTURE_PATTERN.find_iter(markdown) {
		match serde_json::from_str::<Value>(candidate.as_str()) {
			Ok(fixture) => extraction.fixtures.push(fixture),
			Err(e) => {
				tracing::debug!(span = candidate.as_str(), error = %e, "skipped fixture candidate");
				extraction.skipped += 1;
			}
		}
	}

	extraction
}

/// Output formats a blueprint can be marshalled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarshallFormat {
	/// Compiled markdown, for `.md` files.
	Markdown,
	/// Compiled markdown, for `.apib` files.
	Apib,
	/// Extracted fixtures as a JSON array.
	Json,
}

impl FromStr for MarshallFormat {
	type Err = BlotError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"md" | "markdown" => Ok(Self::Markdown),
			"apib" => Ok(Self::Apib),
			"json" => Ok(Self::Json),
			_ => Err(BlotError::UnsupportedFormat(value.to_string())),
		}
	}
}

impl MarshallFormat {
	/// The format implied by the extension of `path`.
	pub fn from_path(path: &Path) -> BlotResult<Self> {
		let extension = path
			.extension()
			.and_then(|extension| extension.to_str())
			.ok_or_else(|| BlotError::UnsupportedFormat(path.display().to_string()))?;

		extension.parse()
	}
}

/// A marshalled blueprint.
#[derive(Debug, Clone, PartialEq)]
pub enum Marshalled {
	Markdown(String),
	Fixtures(Vec<Value>),
}

impl Marshalled {
	/// Serialized file content: markdown as is, fixtures as pretty JSON.
	pub fn to_text(&self) -> BlotResult<String> {
		match self {
			Self::Markdown(markdown) => Ok(markdown.clone()),
			Self::Fixtures(fixtures) => Ok(serde_json::to_string_pretty(fixtures)?),
		}
	}
}

/// Convert markdown into `format`. Markdown formats pass through and `Json`
/// re-runs fixture extraction.
pub fn marshall(markdown: &str, format: MarshallFormat) -> Marshalled {
	tracing::info!(format = ?format, "marshalling");

	match format {
		MarshallFormat::Markdown | MarshallFormat::Apib => Marshalled::Markdown(markdown.to_string()),
		MarshallFormat::Json => Marshalled::Fixtures(extract_fixtures(markdown).fixtures),
	}
}

/// Marshall into the format named by `format`, e.g. `"apib"` or `"json"`.
pub fn marshall_as(markdown: &str, format: &str) -> BlotResult<Marshalled> {
	Ok(marshall(markdown, format.parse()?))
}

/// Export a compiled blueprint to `path`, marshalled by the path's extension.
///
/// The format is resolved before anything touches the filesystem.
pub async fn dest(blueprint: &Blueprint, path: impl AsRef<Path>) -> BlotResult<()> {
	let path = path.as_ref();
	let format = MarshallFormat::from_path(path)?;

	if !blueprint.is_compiled() {
		return Err(BlotError::InputRequired("compiled blueprint".to_string()));
	}

	tracing::info!(path = %path.display(), "writing blueprint");
	let content = blueprint.marshall(format).to_text()?;

	write_file(path, &content).await
}

/// Runs the compilation pipeline with an explicit configuration and fixture
/// context.
///
/// A compiler is cheap to clone. Each stage collaborator can be replaced:
///
/// ```rust
/// use std::sync::Arc;
///
/// use blot_core::Compiler;
/// use blot_core::Config;
/// use blot_core::TokenInterpolator;
///
/// let compiler =
/// 	Compiler::new(Arc::new(Config::default())).with_interpolator(TokenInterpolator::seeded(7));
/// let blueprint = compiler.compile("# API\n\n## Notes [/notes]\n").unwrap();
/// assert!(blueprint.is_compiled());
/// ```
#[derive(Debug, Clone)]
pub struct Compiler {
	config: Arc<Config>,
	fixtures: FixtureRegistry,
	transcluder: Arc<dyn Transcluder>,
	interpolator: Arc<dyn Interpolator>,
	parser: Arc<dyn GrammarParser>,
}

impl Default for Compiler {
	fn default() -> Self {
		Self::new(Arc::default())
	}
}

impl Compiler {
	pub fn new(config: Arc<Config>) -> Self {
		Self {
			config,
			fixtures: FixtureRegistry::default(),
			transcluder: Arc::new(FileTranscluder),
			interpolator: Arc::new(TokenInterpolator::new()),
			parser: Arc::new(BlueprintParser),
		}
	}

	#[must_use]
	pub fn with_fixtures(mut self, fixtures: FixtureRegistry) -> Self {
		self.fixtures = fixtures;
		self
	}

	#[must_use]
	pub fn with_transcluder(mut self, transcluder: impl Transcluder + 'static) -> Self {
		self.transcluder = Arc::new(transcluder);
		self
	}

	#[must_use]
	pub fn with_interpolator(mut self, interpolator: impl Interpolator + 'static) -> Self {
		self.interpolator = Arc::new(interpolator);
		self
	}

	#[must_use]
	pub fn with_parser(mut self, parser: impl GrammarParser + 'static) -> Self {
		self.parser = Arc::new(parser);
		self
	}

	pub fn config(&self) -> &Arc<Config> {
		&self.config
	}

	pub fn fixtures(&self) -> &FixtureRegistry {
		&self.fixtures
	}

	pub fn interpolator(&self) -> Arc<dyn Interpolator> {
		Arc::clone(&self.interpolator)
	}

	/// The interpolation scope: the configuration under `config` plus the
	/// registered fixtures.
	pub fn scope(&self) -> Scope {
		let mut locals = Map::new();
		locals.insert("config".to_string(), self.config.to_value());

		Scope::new(locals, self.fixtures.clone())
	}

	/// Expand file references. Relative references resolve against `base`.
	pub fn transclude(&self, markdown: &str, base: &Path) -> BlotResult<String> {
		tracing::info!(stage = %CompileStage::Transcluding, "compiling");

		if markdown.trim().is_empty() {
			return Err(BlotError::Transclude(
				"valid markdown required for transclusion".to_string(),
			));
		}

		self.transcluder.expand(markdown, base)
	}

	/// Apply interpolation tokens using [`Compiler::scope`].
	pub fn interpolate(&self, markdown: &str) -> BlotResult<String> {
		tracing::info!(stage = %CompileStage::Interpolating, "compiling");

		self.interpolator.interpolate(markdown, &self.scope())
	}

	/// Check that `markdown` is a valid API Blueprint. Parser rejections
	/// become [`BlotError::InvalidDocument`].
	pub fn validate(&self, markdown: &str) -> BlotResult<()> {
		tracing::info!(stage = %CompileStage::Validating, "compiling");

		match self.parser.parse(markdown) {
			Ok(_) => Ok(()),
			Err(BlotError::Parse(message)) => {
				tracing::error!(%message, "invalid API blueprint");
				Err(BlotError::InvalidDocument(message))
			}
			Err(e) => Err(e),
		}
	}

	/// Parse `markdown` into an API Blueprint AST.
	pub fn parse(&self, markdown: &str) -> BlotResult<ApiBlueprint> {
		tracing::info!("parsing");

		if markdown.trim().is_empty() {
			return Err(BlotError::Parse("markdown data required".to_string()));
		}

		self.parser.parse(markdown)
	}

	/// Compile in-memory markdown. References resolve against the configured
	/// base path.
	pub fn compile(&self, markdown: &str) -> BlotResult<Blueprint> {
		self.compile_blueprint(&Blueprint::new(markdown))
	}

	/// Compile `blueprint`, or return it unchanged when already compiled.
	pub fn compile_blueprint(&self, blueprint: &Blueprint) -> BlotResult<Blueprint> {
		if blueprint.is_compiled() {
			return Ok(blueprint.clone());
		}

		let markdown = blueprint.markdown();
		if markdown.trim().is_empty() {
			return Err(BlotError::InputRequired("markdown data".to_string()));
		}

		let base = blueprint
			.origin()
			.and_then(Path::parent)
			.map_or_else(|| self.config.base.clone(), Path::to_path_buf);

		let embedded = self.transclude(markdown, &base)?;
		let interpolated = self.interpolate(&embedded)?;
		self.validate(&interpolated)?;

		tracing::info!(stage = %CompileStage::ExtractingFixtures, "compiling");
		let Extraction { fixtures, skipped } = extract_fixtures(&interpolated);
		if skipped > 0 {
			tracing::warn!(skipped, "skipped fixture spans that are not valid JSON");
		}

		Ok(Blueprint {
			markdown: blueprint.markdown.clone(),
			origin: blueprint.origin.clone(),
			compiled: Some(Compiled {
				markdown: interpolated,
				fixtures,
				skipped,
			}),
		})
	}
}
