#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const NOTES_BLUEPRINT: &str = r#"FORMAT: 1A

# Notes API

Served from |=config.host|.

## Note [/notes/{id}]

### Retrieve a Note [GET]

+ Response 200 (application/json)

        {"id": 1, "title": "Pick up milk"}
"#;

pub const USERS_BLUEPRINT: &str = r#"# Users API

## Users [/users]

### List Users [GET]

+ Response 200 (application/json)

        {"user": "first"}
"#;

pub const TEAMS_BLUEPRINT: &str = r#"# Teams API

## Teams [/teams]

### List Teams [GET]

+ Response 200 (application/json)

        {"team": "second"}
"#;

/// Declares an action before any resource.
pub const ORPHAN_ACTION: &str = "# Broken API\n\n### Fetch Everything [GET]\n";

/// A `blot` command running inside `dir` with colors and inherited log
/// filters disabled.
pub fn blot_cmd(dir: &Path) -> Command {
	let mut cmd = Command::new(get_cargo_bin("blot"));
	cmd.current_dir(dir);
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

pub fn write(path: &Path, content: &str) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}

	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}
