pub use std::fmt::{Debug, Display};
pub use std::sync::Arc;

pub use anyhow::Context as _;
pub use tracing::{debug, error, info, trace, warn};

pub use crate::strng;
pub use crate::strng::Strng;
