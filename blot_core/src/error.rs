use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum BlotError {
	#[error(transparent)]
	#[diagnostic(code(blot::io_error))]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	#[diagnostic(code(blot::json_error))]
	Json(#[from] serde_json::Error),

	#[error("{0} required")]
	#[diagnostic(code(blot::input_required))]
	InputRequired(String),

	#[error("failed to transclude markdown: {0}")]
	#[diagnostic(
		code(blot::transclude),
		help("references use the form `:[label](relative/path.md)`")
	)]
	Transclude(String),

	#[error("failed to parse file as valid API blueprint: {0}")]
	#[diagnostic(code(blot::invalid_document))]
	InvalidDocument(String),

	#[error("failed to parse API blueprint: {0}")]
	#[diagnostic(code(blot::parse))]
	Parse(String),

	#[error("unsupported filetype: `{0}`")]
	#[diagnostic(
		code(blot::unsupported_format),
		help("supported filetypes: md, apib, json")
	)]
	UnsupportedFormat(String),

	#[error("documents must be represented as text, paths, patterns or blueprints, got {0}")]
	#[diagnostic(code(blot::invalid_input))]
	InvalidInput(String),

	#[error("failed to read blot environment configuration from `{path}`: {reason}")]
	#[diagnostic(
		code(blot::config_read),
		help("check that the project file is a valid JSON object")
	)]
	ConfigRead { path: String, reason: String },

	#[error("failed to render API blueprint as HTML: {0}")]
	#[diagnostic(code(blot::render))]
	Render(String),

	#[error("{0} filepath required")]
	#[diagnostic(
		code(blot::missing_path),
		help("pass an explicit output path or configure a `dest` in the project file")
	)]
	MissingPath(String),

	#[error("failed to load globbed files for `{pattern}`: {reason}")]
	#[diagnostic(code(blot::glob))]
	Glob { pattern: String, reason: String },

	#[error("invalid element selector `{selector}`: {reason}")]
	#[diagnostic(
		code(blot::invalid_selector),
		help("check the `view.elements` configuration")
	)]
	InvalidSelector { selector: String, reason: String },

	#[error("compilation task failed: {0}")]
	#[diagnostic(code(blot::task))]
	Task(String),
}

impl From<tokio::task::JoinError> for BlotError {
	fn from(error: tokio::task::JoinError) -> Self {
		Self::Task(error.to_string())
	}
}

pub type BlotResult<T> = Result<T, BlotError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
