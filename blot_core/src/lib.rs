//! `blot_core` is the core library for [blot](https://github.com/slurmulon/blot), a build pipeline for [API Blueprint](https://apiblueprint.org) documentation. It compiles markdown sources into validated blueprints, extracts their JSON fixtures and renders them into post-processed static HTML.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown source (text, file or glob)
//!   → Transclude (expands `:[label](path.md)` references)
//!   → Interpolate (replaces `|~person:name|`, `|@key|` and `|=path|` tokens)
//!   → Validate (parses the result as an API Blueprint)
//!   → Extract fixtures (collects the inline `{...}` JSON examples)
//!   → Render (markdown to HTML inside a theme layout)
//!   → Post-process (container, pluck, strip and replace rules)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Project configuration loaded from `blot.json` or `blot.<env>.json`, layered with overrides.
//! - [`environment`]: The registry of known configurations, the selected one and the fixture registry.
//! - [`io`]: File reads, writes and glob expansion.
//!
//! ## Key Types
//!
//! - [`Compiler`]: Runs the pipeline against an explicit configuration and fixture context.
//! - [`Blueprint`]: A source document and, once compiled, its [`Compiled`] output.
//! - [`Reader`]: Compiles an [`Input`] (text, path, pattern, blueprint or a collection of them) concurrently.
//! - [`PostProcessor`]: Applies `view.elements` and `view.replace` rules to rendered HTML.
//! - [`BlotError`]: Every failure the pipeline can report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blot_core::Config;
//! use blot_core::Environment;
//! use blot_core::Overrides;
//! use blot_core::Reader;
//!
//! # async fn run() -> blot_core::BlotResult<()> {
//! let resolution = Config::resolve(Config::project_path(None), &Overrides::new())?;
//! let mut environment = Environment::new();
//! environment.activate(resolution.config, false)?;
//!
//! let reader = Reader::new(environment.compiler());
//! let blueprints = reader.glob("docs/**/*.apib").await?;
//!
//! for blueprint in &blueprints {
//! 	println!("{} fixtures", blueprint.fixtures().len());
//! }
//! # Ok(())
//! # }
//! ```

pub use blueprint::*;
pub use config::*;
pub use environment::*;
pub use error::*;
pub use html::*;
pub use interpolate::*;
pub use parser::*;
pub use reader::*;
pub use transclude::*;

mod blueprint;
pub mod config;
pub mod environment;
#[allow(unused_assignments)]
mod error;
pub(crate) mod generators;
mod html;
mod interpolate;
pub mod io;
pub(crate) mod lexer;
mod parser;
mod reader;
pub(crate) mod tokens;
mod transclude;

#[cfg(test)]
mod __fixtures;
