use std::fmt::Debug;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::BlotError;
use crate::BlotResult;

/// `:[label](relative/path.md)` with an optional `|| "fallback"` literal.
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#":\[([^\]\n]*)\]\(\s*([^\s)|"]+)\s*(?:\|\|\s*"([^"\n]*)"\s*)?\)"#).unwrap()
});

/// Expands file references embedded in markdown.
pub trait Transcluder: Debug + Send + Sync {
	/// Expand every reference in `markdown`. Relative references resolve
	/// against `base`, the directory of the document being expanded.
	fn expand(&self, markdown: &str, base: &Path) -> BlotResult<String>;
}

/// Resolves references from the local filesystem, recursively.
///
/// Every line of included content is prefixed with the indentation of the
/// line holding the reference, so references inside list items stay nested.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTranscluder;

impl Transcluder for FileTranscluder {
	fn expand(&self, markdown: &str, base: &Path) -> BlotResult<String> {
		if markdown.trim().is_empty() {
			return Err(BlotError::Transclude("no markdown to expand".to_string()));
		}

		let mut stack = Vec::new();
		expand_references(markdown, base, &mut stack)
	}
}

fn expand_references(markdown: &str, base: &Path, stack: &mut Vec<PathBuf>) -> BlotResult<String> {
	if !markdown.contains(":[") {
		return Ok(markdown.to_string());
	}

	let mut output = String::with_capacity(markdown.len());

	for line in markdown.split_inclusive('\n') {
		let indent = &line[..line.len() - line.trim_start().len()];
		let mut last = 0;

		for captures in REFERENCE.captures_iter(line) {
			let Some(whole) = captures.get(0) else {
				continue;
			};

			output.push_str(&line[last..whole.start()]);
			let content = resolve_reference(&captures, base, stack)?;
			push_indented(&mut output, content.trim_end_matches('\n'), indent);
			last = whole.end();
		}

		output.push_str(&line[last..]);
	}

	Ok(output)
}

fn resolve_reference(
	captures: &Captures<'_>,
	base: &Path,
	stack: &mut Vec<PathBuf>,
) -> BlotResult<String> {
	let target = captures.get(2).map_or("", |m| m.as_str());
	let fallback = captures.get(3).map(|m| m.as_str());
	let path = base.join(target);

	let Ok(canonical) = std::fs::canonicalize(&path) else {
		return fallback.map(ToString::to_string).ok_or_else(|| {
			BlotError::Transclude(format!("unable to resolve `{}`", path.display()))
		});
	};

	if stack.contains(&canonical) {
		return Err(BlotError::Transclude(format!(
			"circular reference to `{}`",
			path.display()
		)));
	}

	let content = match std::fs::read_to_string(&canonical) {
		Ok(content) => content,
		Err(e) => {
			return fallback.map(ToString::to_string).ok_or_else(|| {
				BlotError::Transclude(format!("unable to read `{}`: {e}", path.display()))
			});
		}
	};

	tracing::debug!(path = %path.display(), "transcluding file");

	let dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
	stack.push(canonical);
	let expanded = expand_references(&content, &dir, stack);
	stack.pop();

	expanded
}

fn push_indented(output: &mut String, content: &str, indent: &str) {
	for (index, line) in content.split('\n').enumerate() {
		if index > 0 {
			output.push('\n');
			if !line.is_empty() {
				output.push_str(indent);
			}
		}
		output.push_str(line);
	}
}
