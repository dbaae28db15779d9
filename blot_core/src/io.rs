use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use globset::GlobBuilder;
use ignore::WalkBuilder;

use crate::BlotError;
use crate::BlotResult;

/// Characters that turn a path segment into a glob segment.
const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// Options for [`expand_glob`].
#[derive(Debug, Clone)]
pub struct GlobOptions {
	/// Directory relative patterns are resolved against.
	pub cwd: PathBuf,
	/// Whether hidden files and directories can match.
	pub hidden: bool,
}

impl Default for GlobOptions {
	fn default() -> Self {
		Self {
			cwd: PathBuf::from("."),
			hidden: false,
		}
	}
}

impl GlobOptions {
	pub fn new(cwd: impl Into<PathBuf>) -> Self {
		Self {
			cwd: cwd.into(),
			..Self::default()
		}
	}
}

/// Whether a readable file exists at `path`.
pub fn exists_at(path: impl AsRef<Path>) -> bool {
	path.as_ref().is_file()
}

/// Read UTF-8 content from `path`.
pub async fn read_file(path: impl AsRef<Path>) -> BlotResult<String> {
	let path = path.as_ref();
	tracing::debug!(path = %path.display(), "reading file");

	Ok(tokio::fs::read_to_string(path).await?)
}

/// Write UTF-8 content to `path`, creating missing parent directories first.
pub async fn write_file(path: impl AsRef<Path>, data: &str) -> BlotResult<()> {
	let path = path.as_ref();

	if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
		ensure_dir(dir).await?;
	}

	tokio::fs::write(path, data).await?;
	tracing::info!(path = %path.display(), "exported content");

	Ok(())
}

/// Create `path` and all of its missing parents.
pub async fn ensure_dir(path: impl AsRef<Path>) -> BlotResult<()> {
	Ok(tokio::fs::create_dir_all(path).await?)
}

/// Expand `pattern` against the filesystem into a sorted list of files.
///
/// A pattern without wildcards resolves to itself when the file exists. An
/// empty match set is not an error.
pub fn expand_glob(pattern: &str, options: &GlobOptions) -> BlotResult<Vec<PathBuf>> {
	let trimmed = pattern.trim();
	if trimmed.is_empty() {
		return Err(BlotError::Glob {
			pattern: pattern.to_string(),
			reason: "pattern required".to_string(),
		});
	}

	let joined = if Path::new(trimmed).is_absolute() {
		PathBuf::from(trimmed)
	} else {
		options.cwd.join(trimmed)
	};
	// Collapse interior `.` segments so the glob and the walked paths agree.
	let full: PathBuf = joined.components().collect();

	if !is_glob(trimmed) {
		return Ok(if full.is_file() { vec![full] } else { vec![] });
	}

	let glob_source = full.to_string_lossy().replace('\\', "/");
	let matcher = GlobBuilder::new(&glob_source)
		.literal_separator(true)
		.build()
		.map_err(|e| {
			BlotError::Glob {
				pattern: pattern.to_string(),
				reason: e.to_string(),
			}
		})?
		.compile_matcher();

	let root = literal_prefix(&full);
	if !root.is_dir() {
		return Ok(vec![]);
	}

	let mut files = Vec::new();
	let walker = WalkBuilder::new(&root)
		.standard_filters(false)
		.hidden(!options.hidden)
		.build();

	for entry in walker {
		let entry = entry.map_err(|e| {
			BlotError::Glob {
				pattern: pattern.to_string(),
				reason: e.to_string(),
			}
		})?;

		if entry.file_type().is_some_and(|kind| kind.is_file()) && matcher.is_match(entry.path())
		{
			files.push(entry.into_path());
		}
	}

	// Sort for deterministic ordering.
	files.sort();
	Ok(files)
}

fn is_glob(pattern: &str) -> bool {
	pattern.contains(GLOB_META)
}

/// The leading directories of `path` that contain no glob syntax.
fn literal_prefix(path: &Path) -> PathBuf {
	let mut prefix = PathBuf::new();

	for component in path.components() {
		if let Component::Normal(segment) = component {
			if segment.to_string_lossy().contains(GLOB_META) {
				break;
			}
		}
		prefix.push(component);
	}

	if prefix.as_os_str().is_empty() {
		PathBuf::from(".")
	} else {
		prefix
	}
}
