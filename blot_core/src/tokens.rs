use std::fmt::Display;
use std::ops::Range;

use derive_more::Deref;
use derive_more::DerefMut;

/// A classified piece of interpolation source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// Plain text copied through unchanged.
	Text,
	/// `|~category:kind|`, e.g. `|~person:name|`
	Random { category: String, kind: String },
	/// `|@key|`, e.g. `|@blot.config.host|`
	Fixture(String),
	/// `|=path|`, e.g. `|=config.view.dest|` or `|=$sub[0]|`
	Expression(Vec<PathSegment>),
}

impl Token {
	pub fn is_text(&self) -> bool {
		matches!(self, Self::Text)
	}
}

/// One step of an expression path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
	Key(String),
	Index(usize),
}

impl Display for PathSegment {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Key(key) => write!(f, "{key}"),
			Self::Index(index) => write!(f, "[{index}]"),
		}
	}
}

/// A token and the byte range of its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
	pub token: Token,
	pub span: Range<usize>,
}

impl Segment {
	pub fn new(token: Token, span: Range<usize>) -> Self {
		Self { token, span }
	}

	/// The source text covered by this segment.
	pub fn raw<'a>(&self, source: &'a str) -> &'a str {
		&source[self.span.clone()]
	}
}

/// The ordered segments of one interpolation source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct Segments(pub Vec<Segment>);

impl Segments {
	/// Whether any segment needs resolving.
	pub fn has_tokens(&self) -> bool {
		self.iter().any(|segment| !segment.token.is_text())
	}

	/// Append `segment`, folding adjacent text runs together.
	pub fn push_segment(&mut self, segment: Segment) {
		if segment.token.is_text() {
			if let Some(last) = self.last_mut().filter(|last| last.token.is_text()) {
				last.span.end = segment.span.end;
				return;
			}
		}

		self.push(segment);
	}
}

/// Split an expression such as `config.docs.src`, `$sub.0` or `$sub[1]` into
/// path segments. Returns `None` for malformed paths.
pub fn parse_path(expression: &str) -> Option<Vec<PathSegment>> {
	let mut segments = Vec::new();

	for part in expression.split('.') {
		let part = part.trim();
		if part.is_empty() {
			return None;
		}

		let (key, mut rest) = match part.find('[') {
			Some(open) => (&part[..open], &part[open..]),
			None => (part, ""),
		};

		if !key.is_empty() {
			segments.push(key.parse::<usize>().map_or_else(
				|_| PathSegment::Key(key.to_string()),
				PathSegment::Index,
			));
		}

		while !rest.is_empty() {
			let close = rest.find(']')?;
			let index = rest.get(1..close)?.trim().parse::<usize>().ok()?;
			segments.push(PathSegment::Index(index));
			rest = &rest[close + 1..];

			if !rest.is_empty() && !rest.starts_with('[') {
				return None;
			}
		}
	}

	(!segments.is_empty()).then_some(segments)
}
