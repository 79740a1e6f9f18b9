//! Format-preserving editing of Unreal Engine style INI files.
//!
//! A [`ConfigDocument`] keeps the file as its physical lines and edits single lines in place, so
//! comments, blank lines, spacing and line endings survive everything except the lines an
//! operation actually touches.
//!
//! ```
//! use uecfg::ConfigDocument;
//!
//! let mut config = ConfigDocument::parse("[Game]\nPort=7777\n");
//! config.set_key("Game", "Port", "8000");
//!
//! assert_eq!(config.to_string(), "[Game]\nPort=8000\n");
//! assert_eq!(config.get_key("Game", "Port", ""), "8000");
//! ```
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]

mod document;
mod error;
mod messages;
mod parser;
mod section;
mod store;
mod util;

pub use document::ConfigDocument;
pub use error::{Error, Result};
pub use messages::{AdminMessages, MessageSpec};
pub use parser::{Entry, LineKind, classify};
pub use store::{ConfigStore, OptionKind, OptionSpec, OptionValue};
pub use util::NewlinePolicy;
