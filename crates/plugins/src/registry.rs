//! Plugin registry
//!
//! Holds the plugins of one translation pass, in registration order. Order matters: it is
//! the order upstreams are offered to plugins and the tie-break for filters of equal stage.

use crate::nats_streaming::NatsStreaming;
use crate::plugin::Plugin;
use crate::*;

#[derive(Default)]
pub struct Registry {
	plugins: Vec<Box<dyn Plugin>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry holding every plugin shipped with this crate.
	pub fn builtin() -> Self {
		let mut registry = Self::new();
		registry.register(NatsStreaming::default());
		registry
	}

	pub fn register(&mut self, plugin: impl Plugin + 'static) {
		info!(plugin = plugin.name(), "registered plugin");
		self.plugins.push(Box::new(plugin));
	}

	pub fn len(&self) -> usize {
		self.plugins.len()
	}

	pub fn is_empty(&self) -> bool {
		self.plugins.is_empty()
	}

	pub fn names(&self) -> Vec<&'static str> {
		self.plugins.iter().map(|p| p.name()).collect()
	}

	pub(crate) fn plugins(&self) -> &[Box<dyn Plugin>] {
		&self.plugins
	}

	pub(crate) fn plugins_mut(&mut self) -> &mut [Box<dyn Plugin>] {
		&mut self.plugins
	}
}

impl Debug for Registry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Registry")
			.field("plugins", &self.names())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::nats_streaming::PLUGIN_NAME;

	#[test]
	fn builtin_registers_nats_streaming() {
		let registry = Registry::builtin();
		assert_eq!(registry.names(), vec![PLUGIN_NAME]);
		assert!(!registry.is_empty());
		assert_eq!(format!("{registry:?}"), format!("Registry {{ plugins: [{PLUGIN_NAME:?}] }}"));
	}
}
