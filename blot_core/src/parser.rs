use std::fmt::Debug;

use markdown::ParseOptions;
use markdown::mdast::List;
use markdown::mdast::ListItem;
use markdown::mdast::Node;
use markdown::to_mdast;
use serde::Serialize;

use crate::BlotError;
use crate::BlotResult;

/// HTTP methods accepted in action headings.
pub const HTTP_METHODS: [&str; 11] = [
	"GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "TRACE", "CONNECT", "LINK",
	"UNLINK",
];

/// The only supported value of the `FORMAT` metadata key.
pub const BLUEPRINT_FORMAT: &str = "1A";

/// List item keywords that describe an action or resource without carrying
/// prose. They are skipped when building descriptions.
const SECTION_KEYWORDS: [&str; 7] = [
	"Attributes",
	"Body",
	"Headers",
	"Parameters",
	"Relation",
	"Schema",
	"Values",
];

/// Parses markdown into an API Blueprint AST.
pub trait GrammarParser: Debug + Send + Sync {
	fn parse(&self, markdown: &str) -> BlotResult<ApiBlueprint>;
}

/// A parsed API Blueprint document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApiBlueprint {
	/// Leading `Key: value` lines such as `FORMAT: 1A` and `HOST: …`.
	pub metadata: Vec<(String, String)>,
	pub name: String,
	pub description: String,
	/// Resources declared before the first `Group` heading land in an
	/// unnamed group.
	pub groups: Vec<ResourceGroup>,
}

impl ApiBlueprint {
	/// Value of the metadata `key`, if present.
	pub fn metadata(&self, key: &str) -> Option<&str> {
		self.metadata
			.iter()
			.find(|(name, _)| name.eq_ignore_ascii_case(key))
			.map(|(_, value)| value.as_str())
	}

	pub fn resources(&self) -> impl Iterator<Item = &Resource> {
		self.groups.iter().flat_map(|group| group.resources.iter())
	}

	pub fn actions(&self) -> impl Iterator<Item = &Action> {
		self.resources().flat_map(|resource| resource.actions.iter())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceGroup {
	pub name: String,
	pub description: String,
	pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resource {
	pub name: String,
	pub uri_template: String,
	pub description: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub model: Option<Payload>,
	pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Action {
	pub name: String,
	pub method: String,
	/// The action's own URI template, or its resource's.
	pub uri_template: String,
	pub description: String,
	pub requests: Vec<Payload>,
	pub responses: Vec<Payload>,
}

/// A request, response or model. For responses `name` holds the status code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Payload {
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub media_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
}

impl Payload {
	/// The HTTP status of a response payload.
	pub fn status(&self) -> Option<u16> {
		self.name.parse().ok()
	}
}

/// The default [`GrammarParser`], built on the `markdown` crate's mdast.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlueprintParser;

impl GrammarParser for BlueprintParser {
	fn parse(&self, markdown: &str) -> BlotResult<ApiBlueprint> {
		if markdown.trim().is_empty() {
			return Err(BlotError::Parse("markdown data required".to_string()));
		}

		let root = to_mdast(markdown, &ParseOptions::gfm())
			.map_err(|e| BlotError::Parse(e.to_string()))?;
		let mut builder = BlueprintBuilder::default();

		for node in root.children().into_iter().flatten() {
			builder.visit(node)?;
		}

		Ok(builder.blueprint)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Level {
	#[default]
	Api,
	Group,
	Resource,
	Action,
}

#[derive(Debug, PartialEq, Eq)]
enum Heading {
	Group(String),
	Resource {
		name: String,
		uri: String,
	},
	Action {
		name: String,
		method: String,
		uri: Option<String>,
	},
	/// `GET /notes` declares a resource and its single action at once.
	Endpoint {
		method: String,
		uri: String,
	},
	Plain(String),
}

#[derive(Debug, Default)]
struct BlueprintBuilder {
	blueprint: ApiBlueprint,
	level: Level,
	seen_heading: bool,
	seen_content: bool,
}

impl BlueprintBuilder {
	fn visit(&mut self, node: &Node) -> BlotResult<()> {
		let line = line_of(node);

		match node {
			Node::Heading(_) => self.heading(&node_text(node), line)?,
			Node::Paragraph(_) if !self.seen_heading && !self.seen_content => {
				let text = node_text(node);
				match parse_metadata(&text) {
					Some(metadata) => self.metadata(metadata, line)?,
					None => self.describe(&text),
				}
			}
			Node::List(list) => self.list(list)?,
			Node::Yaml(_) | Node::Toml(_) | Node::Definition(_) => {}
			other => self.describe(&node_text(other)),
		}

		self.seen_content = true;
		Ok(())
	}

	fn metadata(&mut self, metadata: Vec<(String, String)>, line: usize) -> BlotResult<()> {
		if let Some((_, format)) = metadata
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case("FORMAT"))
		{
			if format != BLUEPRINT_FORMAT {
				return Err(BlotError::Parse(format!(
					"line {line}: unsupported FORMAT `{format}`, expected `{BLUEPRINT_FORMAT}`"
				)));
			}
		}

		self.blueprint.metadata = metadata;
		Ok(())
	}

	fn heading(&mut self, text: &str, line: usize) -> BlotResult<()> {
		let first_heading = !self.seen_heading;
		self.seen_heading = true;

		let in_resource = self.resource_mut().is_some();

		match classify_heading(text, line, in_resource)? {
			Heading::Group(name) => {
				self.blueprint.groups.push(ResourceGroup {
					name,
					..ResourceGroup::default()
				});
				self.level = Level::Group;
			}
			Heading::Resource { name, uri } => {
				self.group_mut().resources.push(Resource {
					name,
					uri_template: uri,
					..Resource::default()
				});
				self.level = Level::Resource;
			}
			Heading::Action { name, method, uri } => {
				let resource = self.resource_mut().ok_or_else(|| {
					BlotError::Parse(format!(
						"line {line}: action `{text}` is not nested in a resource"
					))
				})?;
				let uri_template = uri.unwrap_or_else(|| resource.uri_template.clone());
				resource.actions.push(Action {
					name,
					method,
					uri_template,
					..Action::default()
				});
				self.level = Level::Action;
			}
			Heading::Endpoint { method, uri } => {
				self.group_mut().resources.push(Resource {
					uri_template: uri.clone(),
					actions: vec![Action {
						method,
						uri_template: uri,
						..Action::default()
					}],
					..Resource::default()
				});
				self.level = Level::Action;
			}
			Heading::Plain(name) => {
				if first_heading && self.level == Level::Api {
					self.blueprint.name = name;
				} else {
					self.describe(&name);
				}
			}
		}

		Ok(())
	}

	fn list(&mut self, list: &List) -> BlotResult<()> {
		for child in &list.children {
			let Node::ListItem(item) = child else {
				continue;
			};

			let title = item_title(item);
			let keyword = title.split_whitespace().next().unwrap_or_default();
			let line = line_of(child);

			match keyword {
				"Request" | "Response" => {
					let payload = parse_payload(item, &title, line)?;
					let action = self.action_mut().ok_or_else(|| {
						BlotError::Parse(format!(
							"line {line}: `{title}` is not nested in an action"
						))
					})?;

					if keyword == "Request" {
						action.requests.push(payload);
					} else {
						action.responses.push(payload);
					}
				}
				"Model" => {
					let payload = parse_payload(item, &title, line)?;
					if let Some(resource) = self.resource_mut() {
						resource.model = Some(payload);
					}
				}
				keyword if SECTION_KEYWORDS.contains(&keyword) => {}
				_ => self.describe(&format!("- {}", node_text(child))),
			}
		}

		Ok(())
	}

	fn describe(&mut self, text: &str) {
		let text = text.trim();
		if text.is_empty() {
			return;
		}

		let description = match self.level {
			Level::Api => Some(&mut self.blueprint.description),
			Level::Group => self.blueprint.groups.last_mut().map(|group| &mut group.description),
			Level::Resource => self.resource_mut().map(|resource| &mut resource.description),
			Level::Action => self.action_mut().map(|action| &mut action.description),
		};

		if let Some(description) = description {
			if !description.is_empty() {
				description.push_str("\n\n");
			}
			description.push_str(text);
		}
	}

	fn group_mut(&mut self) -> &mut ResourceGroup {
		if self.blueprint.groups.is_empty() {
			self.blueprint.groups.push(ResourceGroup::default());
		}

		let last = self.blueprint.groups.len() - 1;
		&mut self.blueprint.groups[last]
	}

	fn resource_mut(&mut self) -> Option<&mut Resource> {
		self.blueprint
			.groups
			.last_mut()
			.and_then(|group| group.resources.last_mut())
	}

	fn action_mut(&mut self) -> Option<&mut Action> {
		if self.level != Level::Action {
			return None;
		}

		self.resource_mut()
			.and_then(|resource| resource.actions.last_mut())
	}
}

/// Classify a heading. Outside a resource, a bracket holding an unknown
/// uppercase word such as `[BETA]` is plain text rather than an action.
fn classify_heading(text: &str, line: usize, in_resource: bool) -> BlotResult<Heading> {
	let text = text.trim();

	if let Some(name) = text.strip_prefix("Group ") {
		return Ok(Heading::Group(name.trim().to_string()));
	}

	if let Some((name, inner)) = bracketed(text) {
		let inner = inner.trim();

		if inner.starts_with('/') {
			validate_uri(inner, line)?;
			return Ok(Heading::Resource {
				name: name.to_string(),
				uri: inner.to_string(),
			});
		}

		let (method, rest) = inner.split_once(char::is_whitespace).unwrap_or((inner, ""));
		let is_action = is_method_like(method) && (in_resource || HTTP_METHODS.contains(&method));
		if is_action {
			validate_method(method, line)?;
			let rest = rest.trim();
			let uri = if rest.is_empty() {
				None
			} else {
				validate_uri(rest, line)?;
				Some(rest.to_string())
			};

			return Ok(Heading::Action {
				name: name.to_string(),
				method: method.to_string(),
				uri,
			});
		}
	}

	if let Some((method, uri)) = text.split_once(char::is_whitespace) {
		let uri = uri.trim();
		if HTTP_METHODS.contains(&method) && uri.starts_with('/') {
			validate_uri(uri, line)?;
			return Ok(Heading::Endpoint {
				method: method.to_string(),
				uri: uri.to_string(),
			});
		}
	}

	Ok(Heading::Plain(text.to_string()))
}

/// Split `Name [inner]` into its name and bracket content.
fn bracketed(text: &str) -> Option<(&str, &str)> {
	let inner = text.strip_suffix(']')?;
	let open = inner.rfind('[')?;

	Some((inner[..open].trim(), &inner[open + 1..]))
}

fn is_method_like(word: &str) -> bool {
	!word.is_empty() && word.chars().all(|c| c.is_ascii_uppercase())
}

fn validate_method(method: &str, line: usize) -> BlotResult<()> {
	if HTTP_METHODS.contains(&method) {
		Ok(())
	} else {
		Err(BlotError::Parse(format!(
			"line {line}: unknown HTTP method `{method}`"
		)))
	}
}

fn validate_uri(uri: &str, line: usize) -> BlotResult<()> {
	let invalid = || BlotError::Parse(format!("line {line}: invalid URI template `{uri}`"));

	if !uri.starts_with('/') {
		return Err(invalid());
	}

	let mut depth = 0_usize;
	for c in uri.chars() {
		match c {
			'{' => depth += 1,
			'}' => depth = depth.checked_sub(1).ok_or_else(invalid)?,
			_ => {}
		}
	}

	if depth == 0 { Ok(()) } else { Err(invalid()) }
}

/// Parse a leading `Key: value` paragraph. Every line must be a pair.
fn parse_metadata(text: &str) -> Option<Vec<(String, String)>> {
	let metadata: Vec<(String, String)> = text
		.lines()
		.map(|line| {
			let (key, value) = line.split_once(':')?;
			let key = key.trim();
			let valid_key = key
				.chars()
				.next()
				.is_some_and(|c| c.is_ascii_alphabetic())
				&& key
					.chars()
					.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '));

			valid_key.then(|| (key.to_string(), value.trim().to_string()))
		})
		.collect::<Option<_>>()?;

	(!metadata.is_empty()).then_some(metadata)
}

/// Parse `Response 200 (application/json)` or `Request Create (text/plain)`.
fn parse_payload(item: &ListItem, title: &str, line: usize) -> BlotResult<Payload> {
	let (head, media_type) = match (title.rfind('('), title.ends_with(')')) {
		(Some(open), true) => {
			let media_type = title[open + 1..title.len() - 1].trim();
			(
				title[..open].trim(),
				(!media_type.is_empty()).then(|| media_type.to_string()),
			)
		}
		_ => (title.trim(), None),
	};

	let mut words = head.split_whitespace();
	let keyword = words.next().unwrap_or_default();
	let name = words.collect::<Vec<_>>().join(" ");

	if keyword == "Response" {
		let valid = name.len() == 3
			&& name
				.parse::<u16>()
				.is_ok_and(|status| (100..=599).contains(&status));

		if !valid {
			return Err(BlotError::Parse(format!(
				"line {line}: invalid response status `{name}`"
			)));
		}
	}

	Ok(Payload {
		name,
		media_type,
		body: payload_body(item),
	})
}

/// The body of a payload: a nested `Body` section, else the first code block
/// in the item.
fn payload_body(item: &ListItem) -> Option<String> {
	let nested_body = item.children.iter().find_map(|child| {
		let Node::List(list) = child else {
			return None;
		};

		list.children.iter().find_map(|entry| {
			match entry {
				Node::ListItem(entry) if item_title(entry).trim() == "Body" => first_code(entry),
				_ => None,
			}
		})
	});

	nested_body.or_else(|| {
		item.children.iter().find_map(|child| {
			match child {
				Node::Code(code) => Some(code.value.clone()),
				_ => None,
			}
		})
	})
}

fn first_code(item: &ListItem) -> Option<String> {
	item.children.iter().find_map(find_code)
}

fn find_code(node: &Node) -> Option<String> {
	match node {
		Node::Code(code) => Some(code.value.clone()),
		other => other.children()?.iter().find_map(find_code),
	}
}

/// First line of a list item's leading paragraph.
fn item_title(item: &ListItem) -> String {
	item.children
		.iter()
		.find(|child| matches!(child, Node::Paragraph(_)))
		.map(node_text)
		.and_then(|text| text.lines().next().map(|line| line.trim().to_string()))
		.unwrap_or_default()
}

fn line_of(node: &Node) -> usize {
	node.position().map_or(0, |position| position.start.line)
}

/// Plain text of a node. Block children are separated by newlines.
pub fn node_text(node: &Node) -> String {
	match node {
		Node::Text(text) => text.value.clone(),
		Node::InlineCode(code) => code.value.clone(),
		Node::Code(code) => code.value.clone(),
		Node::Html(html) => html.value.clone(),
		Node::Break(_) => "\n".to_string(),
		other => {
			let separator = if matches!(
				other,
				Node::Root(_) | Node::List(_) | Node::ListItem(_) | Node::Blockquote(_)
			) {
				"\n"
			} else {
				""
			};

			other
				.children()
				.map(|children| {
					children
						.iter()
						.map(node_text)
						.collect::<Vec<_>>()
						.join(separator)
				})
				.unwrap_or_default()
		}
	}
}
