//! Build-time code generator that turns a parsed Bot API reference
//! (`tgbot_tl_parser::ir::Api`) into Rust source for data types and method
//! request structs.
//!
//! Intended to be used from a `build.rs` script.
//!
//! # Usage
//!
//! ```no_run
//! // build.rs
//! use tgbot_tl_gen::{generate, Config, Outputs};
//! use std::fs;
//!
//! fn main() {
//!     let html = fs::read_to_string("bot-api.html").unwrap();
//!     let api = tgbot_tl_parser::parse_document(&html).unwrap();
//!
//!     let out = std::env::var("OUT_DIR").unwrap();
//!     let mut outputs = Outputs::from_dir(&out).unwrap();
//!     generate(&api, &Config::default(), &mut outputs).unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod emit;
mod enums;
/// Error types for configuration loading and code emission.
pub mod errors;
mod metadata;
mod namegen;

pub(crate) use tgbot_tl_parser::ir;

pub use config::{Config, DiscriminatedUnion, EnumDecl, FieldTypeRule, MethodgenConfig, ParserConfig, ShortcutDecl, TypegenConfig};
pub use emit::{generate, Outputs};
pub use errors::{ConfigError, EmitError};
