//! Cheaply clonable, immutable strings used for names throughout the workspace.

use arcstr::ArcStr;

pub type Strng = ArcStr;

pub use arcstr::format;

pub const EMPTY: Strng = arcstr::literal!("");

pub fn new<A: AsRef<str>>(s: A) -> Strng {
	ArcStr::from(s.as_ref())
}
