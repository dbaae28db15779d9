use logos::Logos;

use crate::tokens::Segment;
use crate::tokens::Segments;
use crate::tokens::Token;
use crate::tokens::parse_path;

/// Raw tokens produced by logos for flat tokenization of interpolation source.
#[derive(Logos, Debug, PartialEq)]
enum RawToken {
	/// `|~…|`, `|@…|` or `|=…|` on a single line.
	#[regex(r"\|[~@=][^|\n]*\|")]
	Interpolation,
	#[token("|")]
	Pipe,
	#[regex(r"[^|]+")]
	Text,
}

/// Tokenize `source` into text runs and interpolation tokens.
///
/// Anything that does not form a well-formed token, including bare pipes and
/// tokens with an empty or malformed body, stays plain text.
pub fn tokenize(source: &str) -> Segments {
	let mut segments = Segments::default();

	for (raw, span) in RawToken::lexer(source).spanned() {
		let token = match raw {
			Ok(RawToken::Interpolation) => classify(&source[span.clone()]).unwrap_or(Token::Text),
			Ok(RawToken::Pipe | RawToken::Text) | Err(()) => Token::Text,
		};

		segments.push_segment(Segment::new(token, span));
	}

	segments
}

/// Classify the text of an `Interpolation` raw token.
fn classify(slice: &str) -> Option<Token> {
	let sigil = slice.chars().nth(1)?;
	let body = slice.get(2..slice.len() - 1)?.trim();

	if body.is_empty() {
		return None;
	}

	match sigil {
		'~' => {
			let (category, kind) = body.split_once(':')?;
			let (category, kind) = (category.trim(), kind.trim());

			if category.is_empty() || kind.is_empty() {
				return None;
			}

			Some(Token::Random {
				category: category.to_ascii_lowercase(),
				kind: kind.to_ascii_lowercase(),
			})
		}
		'@' => Some(Token::Fixture(body.to_string())),
		'=' => parse_path(body).map(Token::Expression),
		_ => None,
	}
}
