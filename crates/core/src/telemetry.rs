// Originally derived from https://github.com/istio/ztunnel (Apache 2.0 licensed)

use std::str::FromStr;
use std::time::Instant;
use std::{env, io};

use once_cell::sync::{Lazy, OnceCell};
use thiserror::Error;
use tracing::{info, warn};
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry, filter, reload};

pub static APPLICATION_START_TIME: Lazy<Instant> = Lazy::new(Instant::now);
static LOG_HANDLE: OnceCell<LogHandle> = OnceCell::new();

const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global subscriber, writing to stderr so stdout stays free for program output.
/// The returned guard must be held until the program exits, otherwise buffered lines are lost.
pub fn setup_logging() -> WorkerGuard {
	Lazy::force(&APPLICATION_START_TIME);
	let (non_blocking, guard) = NonBlockingBuilder::default()
		.lossy(false)
		.buffered_lines_limit(10_000)
		.finish(io::stderr());
	let use_json = env::var("LOG_FORMAT").unwrap_or("plain".to_string()) == "json";
	tracing_subscriber::registry()
		.with(fmt_layer(non_blocking, use_json))
		.init();
	guard
}

fn fmt_layer<W>(writer: W, use_json: bool) -> BoxLayer
where
	W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
	let format: BoxLayer = if use_json {
		Box::new(
			tracing_subscriber::fmt::layer()
				.json()
				.flatten_event(true)
				.with_current_span(false)
				.with_span_list(false)
				.with_writer(writer),
		)
	} else {
		Box::new(
			tracing_subscriber::fmt::layer()
				.with_ansi(false)
				.with_writer(writer),
		)
	};
	let (layer, reload) = reload::Layer::new(format.with_filter(default_filter()));
	LOG_HANDLE
		.set(reload)
		.map_or_else(|_| warn!("setup log handler failed"), |_| {});
	Box::new(layer)
}

fn default_filter() -> filter::Targets {
	let var = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_DIRECTIVE.to_string());
	filter::Targets::from_str(&var).unwrap_or_else(|_| {
		filter::Targets::from_str(DEFAULT_DIRECTIVE).expect("static filter should build")
	})
}

// a handle to get and set the log level
type BoxLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;
type FilteredLayer = filter::Filtered<BoxLayer, filter::Targets, Registry>;
type LogHandle = reload::Handle<FilteredLayer, Registry>;

/// set_level dynamically updates the logging level to *include* level. If `reset` is true, it will
/// reset the entire logging configuration first.
pub fn set_level(reset: bool, level: &str) -> Result<(), Error> {
	let Some(handle) = LOG_HANDLE.get() else {
		warn!("failed to get log handle");
		return Err(Error::Uninitialized);
	};
	let new_directive = if let Ok(current) = handle.with_current(|f| f.filter().to_string()) {
		if reset {
			if level.is_empty() {
				default_filter().to_string()
			} else {
				format!("{},{}", default_filter(), level)
			}
		} else {
			format!("{current},{level}")
		}
	} else {
		level.to_string()
	};

	let new_filter = filter::Targets::from_str(&new_directive)?;
	info!("new log filter is {new_filter}");

	Ok(handle.modify(|layer| {
		*layer.filter_mut() = new_filter;
	})?)
}

pub fn get_current_loglevel() -> Result<String, Error> {
	if let Some(handle) = LOG_HANDLE.get() {
		Ok(handle.with_current(|f| f.filter().to_string())?)
	} else {
		Err(Error::Uninitialized)
	}
}

#[derive(Error, Debug)]
pub enum Error {
	#[error("parse failure: {0}")]
	InvalidFilter(#[from] filter::ParseError),
	#[error("reload failure: {0}")]
	Reload(#[from] reload::Error),
	#[error("logging is not initialized")]
	Uninitialized,
}

/// Mod testing gives access to a test logger, which stores logs in memory for querying.
/// Inspired by https://github.com/dbrgn/tracing-test
pub mod testing {
	use std::collections::HashMap;
	use std::io;
	use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

	use once_cell::sync::Lazy;
	use serde_json::Value;
	use tracing_subscriber::fmt;
	use tracing_subscriber::layer::SubscriberExt;
	use tracing_subscriber::util::SubscriberInitExt;

	use crate::telemetry::{APPLICATION_START_TIME, fmt_layer};

	/// find returns every log line that contains all of the wanted keys.
	/// An empty wanted value asserts the key is absent.
	/// Common keys to match on are "target" and "message"; most of the rest are custom.
	pub fn find(want: &[(&str, &str)]) -> Vec<Value> {
		let want: HashMap<&str, &str> = HashMap::from_iter(want.iter().cloned());
		let logs = {
			let b = global_buf();
			let buf = b.lock().unwrap();
			std::str::from_utf8(&buf)
				.expect("Logs contain invalid UTF8")
				.to_string()
		};
		logs
			.lines()
			.map(|line| serde_json::from_str::<Value>(line).expect("log must be valid json"))
			.filter(|log| {
				want.iter().all(|(k, v)| match log.get(*k) {
					None => v.is_empty(),
					Some(Value::Number(n)) => !v.is_empty() && *v == n.to_string(),
					Some(Value::String(s)) => !v.is_empty() && v == s,
					Some(_) => panic!("find currently only supports string/number values"),
				})
			})
			.collect()
	}

	/// MockWriter will store written logs
	#[derive(Debug, Clone)]
	pub struct MockWriter {
		buf: Arc<Mutex<Vec<u8>>>,
	}

	impl MockWriter {
		pub fn new(buf: Arc<Mutex<Vec<u8>>>) -> Self {
			Self { buf }
		}

		fn buf(&self) -> io::Result<MutexGuard<'_, Vec<u8>>> {
			self
				.buf
				.lock()
				.map_err(|_| io::Error::from(io::ErrorKind::Other))
		}
	}

	impl io::Write for MockWriter {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			let mut target = self.buf()?;
			target.write(buf)
		}

		fn flush(&mut self) -> io::Result<()> {
			self.buf()?.flush()
		}
	}

	impl fmt::MakeWriter<'_> for MockWriter {
		type Writer = Self;

		fn make_writer(&self) -> Self::Writer {
			MockWriter::new(self.buf.clone())
		}
	}

	// Global buffer to store logs in
	fn global_buf() -> Arc<Mutex<Vec<u8>>> {
		static GLOBAL_BUF: OnceLock<Arc<Mutex<Vec<u8>>>> = OnceLock::new();
		GLOBAL_BUF
			.get_or_init(|| Arc::new(Mutex::new(vec![])))
			.clone()
	}

	static TRACING: Lazy<()> = Lazy::new(setup_test_logging_internal);

	pub fn setup_test_logging() {
		Lazy::force(&TRACING);
	}

	fn setup_test_logging_internal() {
		Lazy::force(&APPLICATION_START_TIME);
		let mock_writer = MockWriter::new(global_buf());
		tracing_subscriber::registry()
			.with(fmt_layer(mock_writer, true))
			.init();
	}
}
