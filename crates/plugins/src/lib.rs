use plugin_core::prelude::*;

pub mod config;
pub mod metadata;
pub mod nats_streaming;
pub mod plugin;
pub mod protoutil;
pub mod registry;
pub mod serdes;
pub mod translator;
pub mod types;

pub use config::Config;
pub use registry::Registry;
pub use translator::{Translation, Translator};
