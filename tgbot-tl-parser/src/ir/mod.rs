//! Rust types representing the intermediate representation (IR) produced by
//! the Bot API reference parser.
//!
//! `Enum` (the resolved, named enum values described in `spec.md` §3) is not
//! part of this module: it is produced by `tgbot-tl-gen`'s config-enrichment
//! pass over this IR, not by the parser itself (see `spec.md` §4.2 — enum
//! declarations live in `parser.enums` config, not on the reference page).

mod api;
mod field;
mod method;
mod type_expr;
mod ty;

pub use api::{Api, InvariantError};
pub use field::Field;
pub use method::{Method, Param};
pub use type_expr::{TypeExpr, TypeRef};
pub use ty::Type;
