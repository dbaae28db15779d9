use std::fmt::Debug;
use std::sync::Mutex;
use std::sync::PoisonError;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Map;
use serde_json::Value;

use crate::BlotResult;
use crate::environment::FixtureRegistry;
use crate::generators::generate;
use crate::lexer::tokenize;
use crate::tokens::PathSegment;
use crate::tokens::Token;

/// Values available to interpolation tokens.
///
/// `|=path|` tokens read from `locals`, `|@key|` tokens read from `fixtures`.
#[derive(Debug, Clone, Default)]
pub struct Scope {
	pub locals: Map<String, Value>,
	pub fixtures: FixtureRegistry,
}

impl Scope {
	pub fn new(locals: Map<String, Value>, fixtures: FixtureRegistry) -> Self {
		Self { locals, fixtures }
	}

	/// A scope with only locals.
	pub fn with_locals(locals: Map<String, Value>) -> Self {
		Self {
			locals,
			fixtures: FixtureRegistry::default(),
		}
	}

	/// This scope extended for a regex replacement template: `$match` is the
	/// whole match and `$sub` holds the capture groups in order.
	#[must_use]
	pub fn with_match(&self, whole: &str, groups: Vec<String>) -> Self {
		let mut scope = self.clone();
		scope
			.locals
			.insert("$match".to_string(), Value::String(whole.to_string()));
		scope.locals.insert(
			"$sub".to_string(),
			Value::Array(groups.into_iter().map(Value::String).collect()),
		);

		scope
	}

	/// Follow `path` through the locals.
	pub fn lookup(&self, path: &[PathSegment]) -> Option<&Value> {
		let (first, rest) = path.split_first()?;
		let PathSegment::Key(key) = first else {
			return None;
		};

		rest.iter()
			.try_fold(self.locals.get(key)?, |value, segment| {
				match (segment, value) {
					(PathSegment::Key(key), Value::Object(object)) => object.get(key),
					(PathSegment::Index(index), Value::Array(items)) => items.get(*index),
					(PathSegment::Index(index), Value::Object(object)) => {
						object.get(&index.to_string())
					}
					_ => None,
				}
			})
	}
}

/// Applies template tokens to text.
pub trait Interpolator: Debug + Send + Sync {
	fn interpolate(&self, text: &str, scope: &Scope) -> BlotResult<String>;
}

/// The default interpolator for `|~category:kind|`, `|@key|` and `|=path|`
/// tokens.
///
/// Random values come from a [`StdRng`]; build it with
/// [`TokenInterpolator::seeded`] for reproducible output. Tokens that cannot
/// be resolved are left in the text as written.
#[derive(Debug)]
pub struct TokenInterpolator {
	rng: Mutex<StdRng>,
}

impl Default for TokenInterpolator {
	fn default() -> Self {
		Self::new()
	}
}

impl TokenInterpolator {
	pub fn new() -> Self {
		Self {
			rng: Mutex::new(StdRng::from_entropy()),
		}
	}

	pub fn seeded(seed: u64) -> Self {
		Self {
			rng: Mutex::new(StdRng::seed_from_u64(seed)),
		}
	}
}

impl Interpolator for TokenInterpolator {
	fn interpolate(&self, text: &str, scope: &Scope) -> BlotResult<String> {
		let segments = tokenize(text);
		if !segments.has_tokens() {
			return Ok(text.to_string());
		}

		let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
		let mut output = String::with_capacity(text.len());

		for segment in segments.iter() {
			let raw = segment.raw(text);
			let resolved = match &segment.token {
				Token::Text => None,
				Token::Random { category, kind } => generate(&mut *rng, category, kind),
				Token::Fixture(key) => scope.fixtures.get(key).map(value_to_text),
				Token::Expression(path) => scope.lookup(path).map(value_to_text),
			};

			match resolved {
				Some(value) => output.push_str(&value),
				None => {
					if !segment.token.is_text() {
						tracing::warn!(token = raw, "unresolved interpolation token");
					}
					output.push_str(raw);
				}
			}
		}

		Ok(output)
	}
}

/// Text form of a JSON value: strings are inserted without quotes, everything
/// else as compact JSON.
pub fn value_to_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}
