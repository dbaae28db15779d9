use std::path::PathBuf;

use futures::future::try_join_all;
use serde_json::Value;

use crate::BlotError;
use crate::BlotResult;
use crate::Compiler;
use crate::blueprint::Blueprint;
use crate::config::json_type_name;
use crate::io::GlobOptions;
use crate::io::expand_glob;
use crate::io::read_file;

/// Anything that can be read into compiled blueprints.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
	/// Markdown held in memory.
	Text(String),
	/// A single file.
	Path(PathBuf),
	/// A glob pattern, e.g. `docs/**/*.apib`.
	Pattern(String),
	/// A blueprint, compiled or not.
	Blueprint(Blueprint),
	/// A flat collection of the other variants.
	Many(Vec<Input>),
}

impl From<&str> for Input {
	fn from(text: &str) -> Self {
		Self::Text(text.to_string())
	}
}

impl From<String> for Input {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<Blueprint> for Input {
	fn from(blueprint: Blueprint) -> Self {
		Self::Blueprint(blueprint)
	}
}

impl<T: Into<Input>> From<Vec<T>> for Input {
	fn from(members: Vec<T>) -> Self {
		Self::Many(members.into_iter().map(Into::into).collect())
	}
}

impl TryFrom<Value> for Input {
	type Error = BlotError;

	/// Strings become [`Input::Text`] and arrays of strings become
	/// [`Input::Many`]. Any other shape is rejected.
	fn try_from(value: Value) -> Result<Self, Self::Error> {
		match value {
			Value::String(text) => Ok(Self::Text(text)),
			Value::Array(items) => {
				items
					.into_iter()
					.map(|item| {
						match item {
							Value::String(text) => Ok(Self::Text(text)),
							other => Err(BlotError::InvalidInput(json_type_name(&other).to_string())),
						}
					})
					.collect::<BlotResult<Vec<_>>>()
					.map(Self::Many)
			}
			other => Err(BlotError::InvalidInput(json_type_name(&other).to_string())),
		}
	}
}

/// Reads inputs into compiled blueprints.
///
/// Collections compile concurrently, one task per member, and join fail-fast:
/// the first failure is returned and results of the other members are
/// discarded. Output order always follows input order.
#[derive(Debug, Clone, Default)]
pub struct Reader {
	compiler: Compiler,
	glob_options: GlobOptions,
}

impl Reader {
	pub fn new(compiler: Compiler) -> Self {
		let glob_options = GlobOptions::new(compiler.config().base.clone());

		Self {
			compiler,
			glob_options,
		}
	}

	#[must_use]
	pub fn with_glob_options(mut self, glob_options: GlobOptions) -> Self {
		self.glob_options = glob_options;
		self
	}

	pub fn compiler(&self) -> &Compiler {
		&self.compiler
	}

	/// Read and compile `input`.
	pub async fn read(&self, input: impl Into<Input>) -> BlotResult<Vec<Blueprint>> {
		tracing::info!("reading in content");

		match input.into() {
			Input::Many(members) => self.read_all(members).await,
			input => self.read_member(input).await,
		}
	}

	/// Expand `pattern` and compile every matching file. No matches is an
	/// empty result, not an error.
	pub async fn glob(&self, pattern: &str) -> BlotResult<Vec<Blueprint>> {
		tracing::info!(pattern, "globbing");

		let owned_pattern = pattern.to_string();
		let options = self.glob_options.clone();
		let files =
			tokio::task::spawn_blocking(move || expand_glob(&owned_pattern, &options)).await??;

		if files.is_empty() {
			tracing::warn!(pattern, "no files matched");
			return Ok(vec![]);
		}

		let handles = files.into_iter().map(|path| {
			let reader = self.clone();
			tokio::spawn(async move { reader.src(path).await })
		});

		try_join_all(handles.map(|handle| async move { handle.await? })).await
	}

	/// Read and compile a single file. The path is used as given; relative
	/// [`Input::Path`] values passed to [`Reader::read`] resolve against the
	/// glob base first.
	pub async fn src(&self, path: impl Into<PathBuf>) -> BlotResult<Blueprint> {
		let path = path.into();
		if path.as_os_str().is_empty() {
			return Err(BlotError::InputRequired("filepath".to_string()));
		}

		tracing::info!(path = %path.display(), "reading content");
		let markdown = read_file(&path).await?;

		self.compile(Blueprint::with_origin(markdown, path)).await
	}

	/// Compile `blueprint` on the blocking pool.
	pub async fn compile(&self, blueprint: Blueprint) -> BlotResult<Blueprint> {
		if blueprint.is_compiled() {
			return Ok(blueprint);
		}

		let compiler = self.compiler.clone();
		tokio::task::spawn_blocking(move || compiler.compile_blueprint(&blueprint)).await?
	}

	/// Resolve a relative input path against the glob base, so paths and
	/// patterns name the same files.
	fn resolve(&self, path: PathBuf) -> PathBuf {
		if path.as_os_str().is_empty() || path.is_absolute() {
			path
		} else {
			self.glob_options.cwd.join(path)
		}
	}

	async fn read_all(&self, members: Vec<Input>) -> BlotResult<Vec<Blueprint>> {
		if members.iter().any(|member| matches!(member, Input::Many(_))) {
			return Err(BlotError::InvalidInput("a nested collection".to_string()));
		}

		let handles = members.into_iter().map(|member| {
			let reader = self.clone();
			tokio::spawn(async move { reader.read_member(member).await })
		});

		let batches = try_join_all(handles.map(|handle| async move { handle.await? })).await?;

		Ok(batches.into_iter().flatten().collect())
	}

	async fn read_member(&self, input: Input) -> BlotResult<Vec<Blueprint>> {
		match input {
			Input::Text(markdown) => Ok(vec![self.compile(Blueprint::new(markdown)).await?]),
			Input::Blueprint(blueprint) => Ok(vec![self.compile(blueprint).await?]),
			Input::Path(path) => Ok(vec![self.src(self.resolve(path)).await?]),
			Input::Pattern(pattern) => self.glob(&pattern).await,
			Input::Many(_) => Err(BlotError::InvalidInput("a nested collection".to_string())),
		}
	}
}
