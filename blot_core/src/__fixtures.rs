use std::path::Path;

use serde_json::Map;
use serde_json::Value;

use crate::config::ElementRules;
use crate::config::ReplaceRule;
use crate::config::SelectorList;
use crate::config::ViewSpec;

pub const NOTES_BLUEPRINT: &str = r#"FORMAT: 1A
HOST: http://api.example.com

# Notes API

A simple notes service.

# Group Notes

## Note [/notes/{id}]

### Retrieve a Note [GET]

+ Response 200 (application/json)

        {"id": 1, "title": "Pick up milk"}

### Delete a Note [DELETE]

+ Response 204
"#;

pub const FIRST_BLUEPRINT: &str = r#"# First API

## Users [/users]

### List Users [GET]

+ Response 200 (application/json)

        {"user": "first"}
"#;

pub const SECOND_BLUEPRINT: &str = r#"# Second API

## Teams [/teams]

### List Teams [GET]

+ Response 200 (application/json)

        {"team": "second"}
"#;

/// Parses as markdown but declares an action outside of any resource.
pub const ORPHAN_ACTION: &str = "# Broken API\n\n### Fetch Everything [GET]\n";

pub fn write(path: &Path, content: &str) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}

	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

pub fn object(value: Value) -> Map<String, Value> {
	match value {
		Value::Object(object) => object,
		other => panic!("expected an object, got {other}"),
	}
}

pub fn view_with(elements: ElementRules) -> ViewSpec {
	ViewSpec {
		elements: Some(elements),
		..ViewSpec::default()
	}
}

pub fn strip(selector: &str) -> ElementRules {
	ElementRules {
		strip: Some(SelectorList::One(selector.to_string())),
		..ElementRules::default()
	}
}

pub fn replace_rule(pattern: &str, template: &str) -> ReplaceRule {
	ReplaceRule {
		pattern: Some(pattern.to_string()),
		template: Some(template.to_string()),
	}
}
