use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::BlotResult;
use crate::Compiler;
use crate::config::Config;

/// Configuration fields published to the fixture registry on activation.
pub const REGISTERED_FIELDS: [&str; 5] = ["name", "host", "base", "docs", "fixtures"];

/// Prefix of every fixture key published by [`Environment::activate`].
pub const CONFIG_FIXTURE_PREFIX: &str = "blot.config";

/// Named fixture values available to `|@key|` interpolation tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureRegistry {
	entries: BTreeMap<String, Value>,
}

impl FixtureRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `value` under `key`, replacing any previous value.
	pub fn register(&mut self, key: impl Into<String>, value: Value) {
		self.entries.insert(key.into(), value);
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.entries.get(key)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.entries.iter()
	}
}

/// Every known project configuration plus the selected one.
///
/// Exactly one configuration is current at a time. Lookups are keyed by the
/// configuration's source path, or its name when it has no source, and the
/// most recent registration for a key wins.
#[derive(Debug, Default)]
pub struct Environment {
	configs: HashMap<String, Arc<Config>>,
	selected: Option<String>,
	fixtures: FixtureRegistry,
}

impl Environment {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a configuration without selecting it.
	pub fn register(&mut self, config: Config) -> Arc<Config> {
		let config = Arc::new(config);
		self.configs.insert(config.key(), Arc::clone(&config));
		config
	}

	/// Make `config` the current configuration and publish its fields to the
	/// fixture registry as `blot.config.<field>`.
	///
	/// When `chdir` is set and the configuration has a source path, the
	/// process working directory moves to the source's directory.
	pub fn activate(&mut self, config: Config, chdir: bool) -> BlotResult<Arc<Config>> {
		let config = self.register(config);
		self.selected = Some(config.key());
		self.publish(&config);

		if chdir {
			if let Some(dir) = config
				.source
				.as_ref()
				.and_then(|source| source.parent())
				.filter(|dir| !dir.as_os_str().is_empty())
			{
				std::env::set_current_dir(dir)?;
			}
		}

		tracing::info!(name = %config.name, host = %config.host, "activated environment");

		Ok(config)
	}

	/// Select a previously registered configuration by key. Returns `None`
	/// and leaves the selection unchanged when the key is unknown.
	pub fn select(&mut self, key: &str) -> Option<Arc<Config>> {
		let Some(config) = self.configs.get(key).cloned() else {
			tracing::warn!(key, "environment is not defined");
			return None;
		};

		self.selected = Some(key.to_string());
		self.publish(&config);

		Some(config)
	}

	/// The current configuration, or the default one when nothing has been
	/// activated.
	pub fn current(&self) -> Arc<Config> {
		self.selected
			.as_ref()
			.and_then(|key| self.configs.get(key))
			.cloned()
			.unwrap_or_default()
	}

	pub fn get(&self, key: &str) -> Option<Arc<Config>> {
		self.configs.get(key).cloned()
	}

	pub fn fixtures(&self) -> &FixtureRegistry {
		&self.fixtures
	}

	pub fn fixtures_mut(&mut self) -> &mut FixtureRegistry {
		&mut self.fixtures
	}

	/// A compiler bound to the current configuration and a snapshot of the
	/// fixture registry.
	pub fn compiler(&self) -> Compiler {
		Compiler::new(self.current()).with_fixtures(self.fixtures.clone())
	}

	fn publish(&mut self, config: &Config) {
		let Value::Object(fields) = config.to_value() else {
			return;
		};

		for field in REGISTERED_FIELDS {
			if let Some(value) = fields.get(field) {
				self.fixtures
					.register(format!("{CONFIG_FIXTURE_PREFIX}.{field}"), value.clone());
			}
		}
	}
}
