//! MAAS Profiles - Named connection profiles and their storage
//!
//! This crate provides the immutable [`Profile`] value, the opaque
//! [`Credentials`] it carries, and the `SQLite`-backed [`ProfileManager`]
//! that persists profiles and tracks the default one.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod credentials;
pub mod error;
pub mod paths;
pub mod profile;
pub mod storage;
pub mod util;

pub use credentials::Credentials;
pub use error::{ProfileError, ProfileResult};
pub use profile::Profile;
pub use storage::{Database, ProfileManager};
