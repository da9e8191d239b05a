//! User preferences stored as TOML in the platform config directory.
//!
//! Only preferences live here; the credential is kept in its own slot (see
//! [`crate::core::credential`]) and the conversation is never persisted.

pub mod data;
pub mod io;
mod printing;

pub use data::Config;
pub use io::ConfigError;
