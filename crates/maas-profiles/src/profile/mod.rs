//! Profile types and operations

mod replace;
mod types;

pub use replace::Replace;
pub use types::{Profile, RESERVED_KEYS};
