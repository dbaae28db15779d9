use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::BlotError;
use crate::BlotResult;
use crate::io::exists_at;

/// Name of the environment used when none is given.
pub const DEFAULT_NAME: &str = "root";
/// Host exposed to documentation when the project does not define one.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Base path used to resolve every relative path of a project.
pub const DEFAULT_BASE: &str = ".";
/// Conventional project file for the root environment.
pub const PROJECT_FILE: &str = "blot.json";

/// Input/output settings shared by the `docs` and `fixtures` sections.
///
/// ```json
/// { "src": "docs/**/*.apib", "dest": "dist/api.apib", "export": true }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IoSpec {
	/// Glob pattern (or single path) of the source documents.
	pub src: String,
	/// Destination path for exported output.
	pub dest: String,
	/// Whether the output should be written to `dest`.
	pub export: bool,
}

impl IoSpec {
	/// Returns the destination when exporting is enabled and a destination is
	/// configured.
	pub fn export_path(&self) -> Option<&str> {
		(self.export && !self.dest.trim().is_empty()).then_some(self.dest.as_str())
	}

	/// Returns the source pattern when one is configured.
	pub fn source(&self) -> Option<&str> {
		let src = self.src.trim();
		(!src.is_empty()).then_some(src)
	}
}

/// One or more CSS selectors configured for an element rule.
///
/// Accepts either a single selector string or an array of selectors:
///
/// ```json
/// { "strip": ["h1", ".navbar"], "container": "#content" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum SelectorList {
	One(String),
	Many(Vec<String>),
}

impl SelectorList {
	/// Individual selectors with surrounding whitespace and empty entries
	/// removed. A single string is split on top-level commas so both forms
	/// behave alike; commas inside `[...]`, `(...)` or quotes stay put.
	pub fn parts(&self) -> Vec<String> {
		let raw: Vec<&str> = match self {
			Self::One(selector) => split_selector_group(selector),
			Self::Many(selectors) => selectors.iter().map(String::as_str).collect(),
		};

		raw.into_iter()
			.map(str::trim)
			.filter(|part| !part.is_empty())
			.map(ToString::to_string)
			.collect()
	}

	/// The combined selector group (`a, b, c`), or `None` when nothing usable
	/// is configured.
	pub fn selector(&self) -> Option<String> {
		let parts = self.parts();
		(!parts.is_empty()).then(|| parts.join(", "))
	}
}

/// Split a selector group at commas outside brackets, parentheses and quoted
/// strings.
fn split_selector_group(group: &str) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut depth = 0_usize;
	let mut quote: Option<char> = None;
	let mut start = 0;

	for (index, c) in group.char_indices() {
		match (quote, c) {
			(Some(open), _) if c == open => quote = None,
			(Some(_), _) => {}
			(None, '"' | '\'') => quote = Some(c),
			(None, '[' | '(') => depth += 1,
			(None, ']' | ')') => depth = depth.saturating_sub(1),
			(None, ',') if depth == 0 => {
				parts.push(&group[start..index]);
				start = index + 1;
			}
			_ => {}
		}
	}

	parts.push(&group[start..]);
	parts
}

/// Element filters applied to rendered HTML, in the order `container`,
/// `pluck`, `strip`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ElementRules {
	/// Narrows the document to the inner HTML of the first matching element.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub container: Option<SelectorList>,
	/// Replaces the document with the concatenated inner HTML of every match.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pluck: Option<SelectorList>,
	/// Removes every matching element.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub strip: Option<SelectorList>,
}

/// A templated, case-insensitive regex replacement over serialized HTML.
///
/// The template is interpolated with `$match` (the whole match) and `$sub`
/// (the capture groups) in scope, e.g. `|=$sub.0|`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReplaceRule {
	#[serde(rename = "match", skip_serializing_if = "Option::is_none")]
	pub pattern: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub template: Option<String>,
}

/// Settings for HTML views.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewSpec {
	/// Destination path of the exported HTML.
	pub dest: String,
	/// Whether the rendered HTML should be written to `dest`.
	pub export: bool,
	/// Theme options handed to the renderer. `template` names a layout file.
	pub theme: Map<String, Value>,
	/// Element filters. When absent, post-processing leaves HTML untouched.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub elements: Option<ElementRules>,
	/// Extra attributes made available to the layout.
	pub attrs: Map<String, Value>,
	/// Renderer options made available to the layout.
	pub options: Map<String, Value>,
	/// Regex replacement rules applied after the element filters.
	pub replace: Vec<ReplaceRule>,
}

impl ViewSpec {
	/// Returns the destination when exporting is enabled and a destination is
	/// configured.
	pub fn export_path(&self) -> Option<&str> {
		(self.export && !self.dest.trim().is_empty()).then_some(self.dest.as_str())
	}
}

/// A project environment configuration, loaded from `blot.json` or
/// `blot.<env>.json`.
///
/// ```json
/// {
///   "name": "staging",
///   "host": "api.example.com",
///   "docs": { "src": "docs/*.apib", "dest": "dist/api.apib", "export": true },
///   "fixtures": { "dest": "dist/fixtures.json", "export": true },
///   "view": {
///     "dest": "dist/index.html",
///     "export": true,
///     "elements": { "container": "body", "strip": ["h1"] },
///     "replace": [{ "match": "api\\.example\\.com", "template": "|@blot.config.host|" }]
///   },
///   "logging": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
	/// Key-friendly name of the environment.
	pub name: String,
	/// Path of the project file this configuration was loaded from.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<PathBuf>,
	/// Base path for all other paths.
	pub base: PathBuf,
	/// API host, for use in documentation.
	pub host: String,
	pub docs: IoSpec,
	pub fixtures: IoSpec,
	pub view: ViewSpec,
	/// Print compiled results to stdout.
	pub echo: bool,
	/// Emit structured logs.
	pub logging: bool,
	/// Emit human-friendly logs and framed output.
	pub pretty: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			name: DEFAULT_NAME.to_string(),
			source: None,
			base: PathBuf::from(DEFAULT_BASE),
			host: DEFAULT_HOST.to_string(),
			docs: IoSpec::default(),
			fixtures: IoSpec::default(),
			view: ViewSpec::default(),
			echo: false,
			logging: false,
			pretty: false,
		}
	}
}

/// Outcome of [`Config::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
	pub config: Config,
	/// `false` when no project file was found and the overrides alone formed
	/// the configuration.
	pub is_project: bool,
}

impl Config {
	/// Expected project file for an environment: `blot.json` for none or
	/// `root`, the value itself when it already names a `.json` file, and
	/// `blot.<env>.json` otherwise.
	pub fn project_path(env: Option<&str>) -> PathBuf {
		match env.map(str::trim).filter(|env| !env.is_empty() && *env != DEFAULT_NAME) {
			None => PathBuf::from(PROJECT_FILE),
			Some(env) if Path::new(env).extension().is_some_and(|ext| ext == "json") => {
				PathBuf::from(env)
			}
			Some(env) => PathBuf::from(format!("blot.{env}.json")),
		}
	}

	/// Whether a project file exists for the environment.
	pub fn exists_as_project(env: Option<&str>) -> bool {
		exists_at(Self::project_path(env))
	}

	/// Read and parse a project file, tagging the result with its source path.
	pub fn load(path: impl AsRef<Path>) -> BlotResult<Self> {
		let path = path.as_ref();
		let object = load_object(path)?;
		let mut config = Self::from_object(object, path)?;
		config.source = Some(path.to_path_buf());

		Ok(config)
	}

	/// Load the project file at `path` and merge `overrides` on top of it.
	///
	/// A missing project file is not an error: the overrides alone become the
	/// configuration and [`Resolution::is_project`] is `false`.
	pub fn resolve(path: impl AsRef<Path>, overrides: &Overrides) -> BlotResult<Resolution> {
		let path = path.as_ref();

		if !exists_at(path) {
			tracing::info!(path = %path.display(), "no project file found, using overrides");
			let mut object = Map::new();
			overrides.apply(&mut object);
			let config = Self::from_object(object, path)?;

			return Ok(Resolution {
				config,
				is_project: false,
			});
		}

		let mut object = load_object(path)?;
		overrides.apply(&mut object);
		let mut config = Self::from_object(object, path)?;
		config.source = Some(path.to_path_buf());

		Ok(Resolution {
			config,
			is_project: true,
		})
	}

	/// Build a configuration from a JSON object. `origin` is only used in
	/// error messages.
	pub fn from_object(object: Map<String, Value>, origin: &Path) -> BlotResult<Self> {
		let config: Self =
			serde_json::from_value(Value::Object(object)).map_err(|e| BlotError::ConfigRead {
				path: origin.display().to_string(),
				reason: e.to_string(),
			})?;

		Ok(config.normalized())
	}

	/// Resolve `path` against the project base path.
	pub fn uri(&self, path: impl AsRef<Path>) -> PathBuf {
		self.base.join(path)
	}

	/// The project file this configuration belongs to.
	pub fn root_uri(&self) -> PathBuf {
		self.source
			.clone()
			.unwrap_or_else(|| Self::project_path(Some(&self.name)))
	}

	/// Whether this configuration is backed by a project file.
	pub fn is_project(&self) -> bool {
		self.source.is_some() || exists_at(self.root_uri())
	}

	/// Registry key: the source path when present, otherwise the name.
	pub fn key(&self) -> String {
		self.source
			.as_ref()
			.map_or_else(|| self.name.clone(), |source| source.display().to_string())
	}

	/// The configuration as a JSON value, as exposed to interpolation.
	pub fn to_value(&self) -> Value {
		serde_json::to_value(self).unwrap_or(Value::Null)
	}

	fn normalized(mut self) -> Self {
		if self.name.trim().is_empty() {
			self.name = DEFAULT_NAME.to_string();
		}
		if self.host.trim().is_empty() {
			self.host = DEFAULT_HOST.to_string();
		}
		if self.base.as_os_str().is_empty() {
			self.base = PathBuf::from(DEFAULT_BASE);
		}
		self
	}
}

/// Ordered override layers merged over a project file. Later layers win.
///
/// The CLI builds `flags` then the `--config` JSON literal, which gives the
/// precedence `project file < flags < literal`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	layers: Vec<Map<String, Value>>,
}

impl Overrides {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a layer that wins over every earlier layer.
	#[must_use]
	pub fn layer(mut self, layer: Map<String, Value>) -> Self {
		if !layer.is_empty() {
			self.layers.push(layer);
		}
		self
	}

	/// Append a layer parsed from a JSON object literal.
	pub fn json_literal(self, literal: &str) -> BlotResult<Self> {
		let value: Value = serde_json::from_str(literal).map_err(|e| BlotError::ConfigRead {
			path: "--config".to_string(),
			reason: format!("config override must be valid JSON: {e}"),
		})?;

		let Value::Object(layer) = value else {
			return Err(BlotError::ConfigRead {
				path: "--config".to_string(),
				reason: "config override must be a JSON object".to_string(),
			});
		};

		Ok(self.layer(layer))
	}

	pub fn is_empty(&self) -> bool {
		self.layers.is_empty()
	}

	/// Merge every layer into `base`, in order.
	pub fn apply(&self, base: &mut Map<String, Value>) {
		for layer in &self.layers {
			merge_shallow(base, layer);
		}
	}
}

/// Replace each top-level key of `base` present in `layer`. Nested objects
/// such as `docs` or `view` are replaced wholesale, never deep-merged.
pub fn merge_shallow(base: &mut Map<String, Value>, layer: &Map<String, Value>) {
	for (key, value) in layer {
		base.insert(key.clone(), value.clone());
	}
}

/// Read a JSON object from `path`.
pub fn load_object(path: &Path) -> BlotResult<Map<String, Value>> {
	let content = std::fs::read_to_string(path).map_err(|e| BlotError::ConfigRead {
		path: path.display().to_string(),
		reason: e.to_string(),
	})?;

	let value: Value = serde_json::from_str(&content).map_err(|e| BlotError::ConfigRead {
		path: path.display().to_string(),
		reason: e.to_string(),
	})?;

	match value {
		Value::Object(object) => Ok(object),
		other => {
			Err(BlotError::ConfigRead {
				path: path.display().to_string(),
				reason: format!("expected a JSON object, found {}", json_type_name(&other)),
			})
		}
	}
}

/// Human-readable name of a JSON value's type.
pub fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
