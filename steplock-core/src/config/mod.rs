//! Configuration types
//!
//! Board-agnostic calibration structures and the `lock.toml` parser.

pub mod parse;
pub mod types;

pub use parse::parse_config;
pub use types::*;
