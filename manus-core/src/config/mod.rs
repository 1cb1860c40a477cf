//! Configuration types
//!
//! Board-agnostic configuration structures, deserialized from TOML by the
//! controller when the `serde` feature is enabled.

pub mod types;

pub use types::*;
