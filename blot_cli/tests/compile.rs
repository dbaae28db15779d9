mod common;

use blot_core::AnyEmptyResult;
use common::NOTES_BLUEPRINT;
use common::ORPHAN_ACTION;
use common::TEAMS_BLUEPRINT;
use common::USERS_BLUEPRINT;
use common::blot_cmd;
use common::write;
use predicates::prelude::*;
use serde_json::Value;
use serde_json::json;

#[test]
fn compile_echoes_inline_markdown() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.args(["--echo", "--in-data", NOTES_BLUEPRINT, "compile"])
		.assert()
		.success()
		.stdout(predicate::str::contains("# Notes API"))
		.stdout(predicate::str::contains("Served from 127.0.0.1."));

	Ok(())
}

#[test]
fn compile_without_echo_prints_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.args(["--in-data", NOTES_BLUEPRINT, "compile"])
		.assert()
		.success()
		.stdout(predicate::str::is_empty());

	Ok(())
}

#[test]
fn compile_writes_fixtures_to_json_out_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.args(["-d", NOTES_BLUEPRINT, "-o", "fixtures.json", "compile"])
		.assert()
		.success();

	let content = std::fs::read_to_string(tmp.path().join("fixtures.json"))?;
	let fixtures: Value = serde_json::from_str(&content)?;
	similar_asserts::assert_eq!(fixtures, json!([{"id": 1, "title": "Pick up milk"}]));

	Ok(())
}

#[test]
fn compile_merges_globbed_documents_in_path_order() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(&tmp.path().join("docs/b_teams.apib"), TEAMS_BLUEPRINT);
	write(&tmp.path().join("docs/a_users.apib"), USERS_BLUEPRINT);

	blot_cmd(tmp.path())
		.args(["-i", "docs/*.apib", "-o", "dist/api.apib", "compile"])
		.assert()
		.success();

	let content = std::fs::read_to_string(tmp.path().join("dist/api.apib"))?;
	let users = content.find("# Users API").ok_or("users document missing")?;
	let teams = content.find("# Teams API").ok_or("teams document missing")?;
	assert!(users < teams, "documents should follow path order:\n{content}");

	Ok(())
}

#[test]
fn compile_exports_project_docs_and_fixtures() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(&tmp.path().join("docs/a_users.apib"), USERS_BLUEPRINT);
	write(&tmp.path().join("docs/b_teams.apib"), TEAMS_BLUEPRINT);
	write(
		&tmp.path().join("blot.json"),
		r#"{
			"name": "local",
			"docs": { "src": "docs/*.apib", "dest": "dist/api.md", "export": true },
			"fixtures": { "dest": "dist/fixtures.json", "export": true }
		}"#,
	);

	blot_cmd(tmp.path()).arg("compile").assert().success();

	let docs = std::fs::read_to_string(tmp.path().join("dist/api.md"))?;
	assert!(docs.contains("# Users API"));
	assert!(docs.contains("# Teams API"));

	let fixtures: Value =
		serde_json::from_str(&std::fs::read_to_string(tmp.path().join("dist/fixtures.json"))?)?;
	similar_asserts::assert_eq!(fixtures, json!([{"user": "first"}, {"team": "second"}]));

	Ok(())
}

#[test]
fn compile_project_dest_wins_over_out_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(&tmp.path().join("docs/users.apib"), USERS_BLUEPRINT);
	write(
		&tmp.path().join("blot.json"),
		r#"{ "docs": { "src": "docs/*.apib", "dest": "project.apib", "export": true } }"#,
	);

	blot_cmd(tmp.path())
		.args(["-o", "flag.apib", "compile"])
		.assert()
		.success();

	assert!(tmp.path().join("project.apib").exists());
	assert!(!tmp.path().join("flag.apib").exists());

	Ok(())
}

#[test]
fn compile_loads_named_environment() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(&tmp.path().join("docs/notes.apib"), NOTES_BLUEPRINT);
	write(
		&tmp.path().join("blot.staging.json"),
		r#"{ "name": "staging", "host": "staging.example.com", "docs": { "src": "docs/*.apib" } }"#,
	);

	blot_cmd(tmp.path())
		.args(["-e", "compile", "staging"])
		.assert()
		.success()
		.stdout(predicate::str::contains("Served from staging.example.com."));

	Ok(())
}

#[test]
fn config_literal_overrides_project_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(&tmp.path().join("docs/notes.apib"), NOTES_BLUEPRINT);
	write(
		&tmp.path().join("blot.json"),
		r#"{ "host": "project.example.com", "docs": { "src": "docs/*.apib" } }"#,
	);

	blot_cmd(tmp.path())
		.args(["-e", "-c", r#"{"host": "literal.example.com"}"#, "compile"])
		.assert()
		.success()
		.stdout(predicate::str::contains("Served from literal.example.com."));

	Ok(())
}

#[test]
fn in_files_flag_wins_over_project_source() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(&tmp.path().join("docs/users.apib"), USERS_BLUEPRINT);
	write(&tmp.path().join("other/teams.apib"), TEAMS_BLUEPRINT);
	write(
		&tmp.path().join("blot.json"),
		r#"{ "docs": { "src": "docs/*.apib" } }"#,
	);

	blot_cmd(tmp.path())
		.args(["-e", "-i", "other/*.apib", "compile"])
		.assert()
		.success()
		.stdout(predicate::str::contains("# Teams API"))
		.stdout(predicate::str::contains("# Users API").not());

	Ok(())
}

#[test]
fn validate_reports_documents_and_skips_export() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.args(["-v", "-d", NOTES_BLUEPRINT, "-o", "out.apib", "compile"])
		.assert()
		.success()
		.stdout(predicate::str::contains("valid: <input>"));

	assert!(!tmp.path().join("out.apib").exists());

	Ok(())
}

#[test]
fn invalid_document_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.args(["-d", ORPHAN_ACTION, "-o", "out.apib", "compile"])
		.assert()
		.code(2)
		.stderr(predicate::str::contains("blot::invalid_document"));

	assert!(!tmp.path().join("out.apib").exists());

	Ok(())
}

#[test]
fn missing_input_is_a_malformed_command() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.arg("compile")
		.assert()
		.code(2)
		.stderr(predicate::str::contains("malformed command"));

	Ok(())
}

#[test]
fn config_literal_must_be_an_object() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.args(["-d", NOTES_BLUEPRINT, "-c", "[1, 2]", "compile"])
		.assert()
		.code(2)
		.stderr(predicate::str::contains("blot::config_read"));

	Ok(())
}

#[test]
fn unsupported_out_file_extension_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.args(["-d", NOTES_BLUEPRINT, "-o", "out.xml", "compile"])
		.assert()
		.code(2)
		.stderr(predicate::str::contains("blot::unsupported_format"));

	assert!(!tmp.path().join("out.xml").exists());

	Ok(())
}

#[test]
fn logging_warns_without_a_project() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.args(["--log", "-d", NOTES_BLUEPRINT, "compile"])
		.assert()
		.success()
		.stderr(predicate::str::contains("no project environment defined"));

	Ok(())
}

#[test]
fn missing_subcommand_prints_usage_hint() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.assert()
		.code(1)
		.stderr(predicate::str::contains("blot --help"));

	Ok(())
}
