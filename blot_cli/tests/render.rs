mod common;

use blot_core::AnyEmptyResult;
use common::NOTES_BLUEPRINT;
use common::blot_cmd;
use common::write;
use predicates::prelude::*;

#[test]
fn render_echoes_html() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.args(["-e", "-d", NOTES_BLUEPRINT, "render"])
		.assert()
		.success()
		.stdout(predicate::str::contains("<title>Notes API</title>"))
		.stdout(predicate::str::contains("<h1>Notes API</h1>"));

	Ok(())
}

#[test]
fn render_exports_project_view() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(&tmp.path().join("docs/notes.apib"), NOTES_BLUEPRINT);
	write(
		&tmp.path().join("blot.json"),
		r#"{
			"docs": { "src": "docs/*.apib" },
			"view": { "dest": "dist/index.html", "export": true }
		}"#,
	);

	blot_cmd(tmp.path()).arg("render").assert().success();

	let html = std::fs::read_to_string(tmp.path().join("dist/index.html"))?;
	assert!(html.contains("<h1>Notes API</h1>"));
	assert!(html.contains(r#"<main id="content">"#));

	Ok(())
}

#[test]
fn render_applies_element_and_replace_rules() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(&tmp.path().join("docs/notes.apib"), NOTES_BLUEPRINT);
	write(
		&tmp.path().join("blot.json"),
		r##"{
			"docs": { "src": "docs/*.apib" },
			"view": {
				"dest": "index.html",
				"export": true,
				"elements": { "container": "#content", "strip": "h1" },
				"replace": [{ "match": "pick up (\\w+)", "template": "buy |=$sub.0|" }]
			}
		}"##,
	);

	blot_cmd(tmp.path()).arg("render").assert().success();

	let html = std::fs::read_to_string(tmp.path().join("index.html"))?;
	assert!(!html.contains("<h1>"), "h1 should be stripped:\n{html}");
	assert!(!html.contains("<main"), "container should unwrap main:\n{html}");
	assert!(html.contains("<h2>"));
	assert!(html.contains("buy milk"), "replacement missing:\n{html}");

	Ok(())
}

#[test]
fn render_without_view_export_writes_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(&tmp.path().join("docs/notes.apib"), NOTES_BLUEPRINT);
	write(
		&tmp.path().join("blot.json"),
		r#"{ "docs": { "src": "docs/*.apib" }, "view": { "dest": "index.html" } }"#,
	);

	blot_cmd(tmp.path()).arg("render").assert().success();

	assert!(!tmp.path().join("index.html").exists());

	Ok(())
}

#[test]
fn render_warns_when_no_html_remains() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config = r##"{"view": {"elements": {"container": "#missing"}}}"##;

	blot_cmd(tmp.path())
		.args(["--log", "-d", NOTES_BLUEPRINT, "-c", config, "render"])
		.assert()
		.success()
		.stderr(predicate::str::contains("check the `elements` configuration"));

	Ok(())
}

#[test]
fn render_validate_skips_rendering() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	blot_cmd(tmp.path())
		.args(["-e", "-v", "-d", NOTES_BLUEPRINT, "render"])
		.assert()
		.success()
		.stdout(predicate::str::contains("valid: <input>"))
		.stdout(predicate::str::contains("<h1>").not());

	Ok(())
}

#[test]
fn render_fails_on_invalid_selector() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config = r#"{"view": {"elements": {"strip": "[[["}}}"#;

	blot_cmd(tmp.path())
		.args(["-d", NOTES_BLUEPRINT, "-c", config, "render"])
		.assert()
		.code(2)
		.stderr(predicate::str::contains("blot::invalid_selector"));

	Ok(())
}
