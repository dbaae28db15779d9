//! Random fixture data for `|~category:kind|` tokens.

use rand::Rng;
use rand::seq::SliceRandom;

const FIRST_NAMES: [&str; 16] = [
	"Ada", "Alan", "Barbara", "Claude", "Dennis", "Edsger", "Frances", "Grace", "Hedy", "John",
	"Katherine", "Ken", "Linus", "Margaret", "Niklaus", "Radia",
];

const LAST_NAMES: [&str; 16] = [
	"Allen", "Dijkstra", "Hamilton", "Hopper", "Johnson", "Kay", "Knuth", "Lamarr", "Liskov",
	"Lovelace", "Perlman", "Ritchie", "Shannon", "Thompson", "Turing", "Wirth",
];

const WORDS: [&str; 24] = [
	"alpha", "api", "blueprint", "cache", "delta", "document", "endpoint", "fixture", "gateway",
	"header", "index", "json", "kernel", "latency", "method", "node", "payload", "query",
	"request", "resource", "response", "schema", "token", "version",
];

const DOMAINS: [&str; 6] = [
	"example.com",
	"example.net",
	"example.org",
	"api.test",
	"docs.test",
	"mail.test",
];

/// Produce a value for `category:kind`, or `None` when the combination is
/// unknown.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, category: &str, kind: &str) -> Option<String> {
	let value = match (category, kind) {
		("person" | "misc", "name") => format!("{} {}", first_name(rng), last_name(rng)),
		("person", "first" | "firstname") => first_name(rng).to_string(),
		("person", "last" | "lastname") => last_name(rng).to_string(),
		("person" | "net", "email") => {
			format!(
				"{}.{}@{}",
				first_name(rng).to_ascii_lowercase(),
				last_name(rng).to_ascii_lowercase(),
				pick(rng, &DOMAINS)
			)
		}
		("person" | "net", "username") => {
			format!(
				"{}{}",
				first_name(rng).to_ascii_lowercase(),
				rng.gen_range(1..1000)
			)
		}
		("misc" | "id", "guid" | "uuid") => uuid(rng),
		("id" | "num", "int") => rng.gen_range(1..10_000).to_string(),
		("num", "digit") => rng.gen_range(0..10).to_string(),
		("num", "float") => format!("{:.2}", rng.gen_range(0.0..1000.0_f64)),
		("num" | "misc", "bool") => rng.r#gen::<bool>().to_string(),
		("text", "word") => pick(rng, &WORDS).to_string(),
		("text", "sentence") => sentence(rng),
		("text", "paragraph") => {
			let count = rng.gen_range(3..6);
			(0..count)
				.map(|_| sentence(rng))
				.collect::<Vec<_>>()
				.join(" ")
		}
		("date", "year") => rng.gen_range(1970..2040).to_string(),
		("date", "iso" | "date") => {
			let (year, month, day) = date(rng);
			format!("{year:04}-{month:02}-{day:02}")
		}
		("date", "timestamp" | "datetime") => {
			let (year, month, day) = date(rng);
			format!(
				"{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
				rng.gen_range(0..24),
				rng.gen_range(0..60),
				rng.gen_range(0..60)
			)
		}
		("net", "ip" | "ipv4") => {
			format!(
				"{}.{}.{}.{}",
				rng.gen_range(1..=254),
				rng.gen_range(0..=255),
				rng.gen_range(0..=255),
				rng.gen_range(1..=254)
			)
		}
		("net", "domain") => pick(rng, &DOMAINS).to_string(),
		("net", "url") => format!("https://{}/{}", pick(rng, &DOMAINS), pick(rng, &WORDS)),
		_ => return None,
	};

	Some(value)
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, values: &[&'a str]) -> &'a str {
	values.choose(rng).copied().unwrap_or_default()
}

fn first_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
	pick(rng, &FIRST_NAMES)
}

fn last_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
	pick(rng, &LAST_NAMES)
}

fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
	let count = rng.gen_range(4..10);
	let words: Vec<&str> = (0..count).map(|_| pick(rng, &WORDS)).collect();
	let mut sentence = words.join(" ");

	if let Some(first) = sentence.get_mut(0..1) {
		first.make_ascii_uppercase();
	}
	sentence.push('.');

	sentence
}

fn date<R: Rng + ?Sized>(rng: &mut R) -> (u32, u32, u32) {
	(
		rng.gen_range(1970..2040),
		rng.gen_range(1..=12),
		rng.gen_range(1..=28),
	)
}

fn uuid<R: Rng + ?Sized>(rng: &mut R) -> String {
	let bytes: [u8; 16] = rng.r#gen();
	uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
}
