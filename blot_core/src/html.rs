use std::collections::HashSet;
use std::fmt::Debug;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::try_join_all;
use markdown::Options;
use markdown::to_html_with_options;
use regex::Captures;
use regex::Regex;
use scraper::Html;
use scraper::Selector;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::BlotError;
use crate::BlotResult;
use crate::Compiler;
use crate::blueprint::Blueprint;
use crate::config::Config;
use crate::config::ReplaceRule;
use crate::config::SelectorList;
use crate::config::ViewSpec;
use crate::interpolate::Interpolator;
use crate::interpolate::Scope;
use crate::interpolate::TokenInterpolator;
use crate::io::write_file;

/// Name the layout is registered under. The `.html` suffix turns on HTML
/// auto-escaping.
const LAYOUT_NAME: &str = "layout.html";

/// Variables the layout context provides.
const CONTEXT_KEYS: [&str; 6] = ["content", "title", "theme", "options", "attrs", "locals"];

const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
{%- if theme.stylesheet %}
<link rel="stylesheet" href="{{ theme.stylesheet }}">
{%- endif %}
</head>
<body>
<main id="content">
{{ content|safe }}
</main>
</body>
</html>
"#;

/// Options handed to a [`Renderer`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderOptions {
	pub title: String,
	pub theme: Map<String, Value>,
	pub options: Map<String, Value>,
	pub attrs: Map<String, Value>,
	/// `blot` (the environment name) and `fixtures` (the document's fixtures).
	pub locals: Map<String, Value>,
}

impl RenderOptions {
	pub fn new(config: &Config, blueprint: &Blueprint) -> Self {
		let mut locals = Map::new();
		locals.insert("blot".to_string(), Value::String(config.name.clone()));
		locals.insert(
			"fixtures".to_string(),
			Value::Array(blueprint.fixtures().to_vec()),
		);

		let title = document_title(blueprint.content()).unwrap_or_else(|| config.name.clone());

		Self {
			title,
			theme: config.view.theme.clone(),
			options: config.view.options.clone(),
			attrs: config.view.attrs.clone(),
			locals,
		}
	}
}

/// HTML produced by a [`Renderer`] along with non-fatal warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
	pub html: String,
	pub warnings: Vec<String>,
}

/// Renders compiled markdown into HTML.
pub trait Renderer: Debug + Send + Sync {
	fn render(&self, markdown: &str, options: &RenderOptions) -> BlotResult<Rendered>;
}

/// Converts markdown with GFM extensions and wraps it in a minijinja layout.
///
/// The layout is the built-in one unless `theme.template` names a file,
/// which is resolved against `base`.
#[derive(Debug, Clone)]
pub struct ThemeRenderer {
	base: PathBuf,
}

impl Default for ThemeRenderer {
	fn default() -> Self {
		Self::new(".")
	}
}

impl ThemeRenderer {
	pub fn new(base: impl Into<PathBuf>) -> Self {
		Self { base: base.into() }
	}

	pub fn for_config(config: &Config) -> Self {
		Self::new(config.base.clone())
	}

	fn layout(&self, options: &RenderOptions) -> BlotResult<String> {
		let Some(template) = options.theme.get("template").and_then(Value::as_str) else {
			return Ok(DEFAULT_LAYOUT.to_string());
		};

		let path = self.base.join(template);
		std::fs::read_to_string(&path).map_err(|e| {
			BlotError::Render(format!("unable to read layout `{}`: {e}", path.display()))
		})
	}
}

impl Renderer for ThemeRenderer {
	fn render(&self, markdown: &str, options: &RenderOptions) -> BlotResult<Rendered> {
		let content =
			to_html_with_options(markdown, &Options::gfm()).map_err(|e| BlotError::Render(e.to_string()))?;
		let layout = self.layout(options)?;

		let mut env = minijinja::Environment::new();
		env.set_keep_trailing_newline(true);
		env.add_template(LAYOUT_NAME, &layout)
			.map_err(|e| BlotError::Render(e.to_string()))?;
		let template = env
			.get_template(LAYOUT_NAME)
			.map_err(|e| BlotError::Render(e.to_string()))?;

		let known: HashSet<&str> = CONTEXT_KEYS.into_iter().collect();
		let mut warnings: Vec<String> = template
			.undeclared_variables(false)
			.into_iter()
			.filter(|name| !known.contains(name.as_str()) && !is_builtin_variable(name))
			.map(|name| format!("layout references undefined variable `{name}`"))
			.collect();
		warnings.sort();

		let context = json!({
			"content": content,
			"title": options.title,
			"theme": options.theme,
			"options": options.options,
			"attrs": options.attrs,
			"locals": options.locals,
		});

		let html = template
			.render(minijinja::Value::from_serialize(&context))
			.map_err(|e| BlotError::Render(e.to_string()))?;

		Ok(Rendered { html, warnings })
	}
}

fn is_builtin_variable(name: &str) -> bool {
	matches!(
		name,
		"loop" | "self" | "super" | "true" | "false" | "none" | "namespace" | "range" | "dict"
	)
}

/// Text of the first `# ` heading.
fn document_title(markdown: &str) -> Option<String> {
	markdown
		.lines()
		.find_map(|line| line.strip_prefix("# "))
		.map(|title| title.trim().to_string())
		.filter(|title| !title.is_empty())
}

/// Rendered HTML for one blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlDocument {
	html: String,
}

impl HtmlDocument {
	pub fn new(html: impl Into<String>) -> Self {
		Self { html: html.into() }
	}

	pub fn html(&self) -> &str {
		&self.html
	}

	pub fn into_html(self) -> String {
		self.html
	}

	pub fn is_empty(&self) -> bool {
		self.html.trim().is_empty()
	}

	/// Apply `processor` to the HTML.
	pub fn process(self, processor: &PostProcessor) -> BlotResult<Self> {
		Ok(Self::new(processor.process(&self.html)?))
	}

	/// Write the HTML to `path`, or to the configured `view.dest` when no
	/// path is given.
	pub async fn write_to(&self, path: Option<&Path>, config: &Config) -> BlotResult<()> {
		let path = match path {
			Some(path) => path.to_path_buf(),
			None if !config.view.dest.trim().is_empty() => config.uri(&config.view.dest),
			None => return Err(BlotError::MissingPath("html".to_string())),
		};

		write_file(path, &self.html).await
	}
}

/// Render a compiled blueprint and log any renderer warnings.
pub fn render(
	renderer: &dyn Renderer,
	blueprint: &Blueprint,
	config: &Config,
) -> BlotResult<HtmlDocument> {
	tracing::info!("creating html from blueprint");

	if !blueprint.is_compiled() {
		return Err(BlotError::InputRequired("compiled blueprint".to_string()));
	}

	let options = RenderOptions::new(config, blueprint);
	let Rendered { html, warnings } = renderer
		.render(blueprint.content(), &options)
		.inspect_err(|e| tracing::error!(error = %e, "failed to render html"))?;

	for warning in &warnings {
		tracing::warn!(%warning, "renderer warning");
	}

	Ok(HtmlDocument::new(html))
}

/// Render every blueprint concurrently. Fails on the first error and keeps
/// input order.
pub async fn render_all(
	renderer: Arc<dyn Renderer>,
	blueprints: Vec<Blueprint>,
	config: Arc<Config>,
) -> BlotResult<Vec<HtmlDocument>> {
	let handles = blueprints.into_iter().map(|blueprint| {
		let renderer = Arc::clone(&renderer);
		let config = Arc::clone(&config);
		tokio::task::spawn_blocking(move || render(renderer.as_ref(), &blueprint, &config))
	});

	try_join_all(handles.map(|handle| async move { handle.await? })).await
}

/// Applies the `view.elements` and `view.replace` rules to rendered HTML.
#[derive(Debug, Clone)]
pub struct PostProcessor {
	view: ViewSpec,
	interpolator: Arc<dyn Interpolator>,
	scope: Scope,
}

impl PostProcessor {
	pub fn new(view: ViewSpec) -> Self {
		Self {
			view,
			interpolator: Arc::new(TokenInterpolator::new()),
			scope: Scope::default(),
		}
	}

	/// A processor for the compiler's view configuration that interpolates
	/// replacement templates with the compiler's interpolator and scope.
	pub fn for_compiler(compiler: &Compiler) -> Self {
		Self {
			view: compiler.config().view.clone(),
			interpolator: compiler.interpolator(),
			scope: compiler.scope(),
		}
	}

	/// Run `container`, `pluck`, `strip` and then the replacement rules.
	///
	/// Without an `elements` configuration the HTML is returned unchanged.
	pub fn process(&self, html: &str) -> BlotResult<String> {
		let Some(elements) = &self.view.elements else {
			return Ok(html.to_string());
		};

		let html = self.container(html, elements.container.as_ref())?;
		let html = self.pluck(&html, elements.pluck.as_ref())?;
		let html = self.strip(&html, elements.strip.as_ref())?;

		Ok(self.replace(&html))
	}

	/// Narrow to the inner HTML of the first element matching the container
	/// selector. Nothing matching leaves an empty document.
	pub fn container(&self, html: &str, rule: Option<&SelectorList>) -> BlotResult<String> {
		let Some(selector_text) = rule.and_then(SelectorList::selector) else {
			return Ok(html.to_string());
		};

		let selector = parse_selector(&selector_text)?;
		let dom = parse_html(html);

		match dom.select(&selector).next() {
			Some(element) => Ok(element.inner_html()),
			None => {
				tracing::warn!(selector = %selector_text, "no element matches the container selector");
				Ok(String::new())
			}
		}
	}

	/// Replace the document with the concatenated inner HTML of every match,
	/// selector by selector.
	pub fn pluck(&self, html: &str, rule: Option<&SelectorList>) -> BlotResult<String> {
		let Some(parts) = rule.map(SelectorList::parts).filter(|parts| !parts.is_empty()) else {
			return Ok(html.to_string());
		};

		let dom = parse_html(html);
		let mut plucked = String::new();

		for part in parts {
			let selector = parse_selector(&part)?;
			for element in dom.select(&selector) {
				plucked.push_str(&element.inner_html());
			}
		}

		Ok(plucked)
	}

	/// Remove every element matching the strip selector.
	pub fn strip(&self, html: &str, rule: Option<&SelectorList>) -> BlotResult<String> {
		let Some(selector_text) = rule.and_then(SelectorList::selector) else {
			return Ok(html.to_string());
		};

		let selector = parse_selector(&selector_text)?;
		let whole_document = is_whole_document(html);
		let mut dom = parse_html(html);
		let matches: Vec<_> = dom.select(&selector).map(|element| element.id()).collect();

		for id in matches {
			if let Some(mut node) = dom.tree.get_mut(id) {
				node.detach();
			}
		}

		Ok(if whole_document {
			dom.html()
		} else {
			dom.root_element().inner_html()
		})
	}

	/// Apply every replacement rule as a global, case-insensitive regex
	/// substitution. Malformed rules are logged and skipped.
	pub fn replace(&self, html: &str) -> String {
		let mut output = html.to_string();

		for rule in &self.view.replace {
			let ReplaceRule {
				pattern: Some(pattern),
				template: Some(template),
			} = rule
			else {
				tracing::warn!(?rule, "replacement rules need both `match` and `template`");
				continue;
			};

			let regex = match Regex::new(&format!("(?i){pattern}")) {
				Ok(regex) => regex,
				Err(e) => {
					tracing::warn!(%pattern, error = %e, "skipping invalid replacement pattern");
					continue;
				}
			};

			output = regex
				.replace_all(&output, |captures: &Captures<'_>| {
					self.substitute(captures, template)
				})
				.into_owned();
		}

		output
	}

	fn substitute(&self, captures: &Captures<'_>, template: &str) -> String {
		let whole = captures.get(0).map_or("", |m| m.as_str());
		let groups = captures
			.iter()
			.skip(1)
			.map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
			.collect();

		self.interpolator
			.interpolate(template, &self.scope.with_match(whole, groups))
			.unwrap_or_else(|e| {
				tracing::warn!(error = %e, "failed to interpolate replacement template");
				whole.to_string()
			})
	}
}

fn parse_selector(selector: &str) -> BlotResult<Selector> {
	Selector::parse(selector).map_err(|e| {
		BlotError::InvalidSelector {
			selector: selector.to_string(),
			reason: e.to_string(),
		}
	})
}

/// Whether `html` is a full page. Leading whitespace and comments, such as a
/// license banner, are skipped before looking for the doctype or `<html>`.
fn is_whole_document(html: &str) -> bool {
	let mut rest = html.trim_start();
	while let Some(comment) = rest.strip_prefix("<!--") {
		let Some(end) = comment.find("-->") else {
			return false;
		};
		rest = comment[end + 3..].trim_start();
	}

	let start = rest
		.chars()
		.take(9)
		.collect::<String>()
		.to_ascii_lowercase();
	start.starts_with("<!doctype") || start.starts_with("<html")
}

/// Full documents keep their structure. Anything else is parsed as a body
/// fragment.
fn parse_html(html: &str) -> Html {
	if is_whole_document(html) {
		Html::parse_document(html)
	} else {
		Html::parse_fragment(html)
	}
}
