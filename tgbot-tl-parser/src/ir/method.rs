//! [`Method`] and [`Param`] — one documented Bot API call.

use crate::ir::TypeExpr;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
/// A parameter row from a method's argument table.
pub struct Param {
    /// snake_case parameter name.
    pub name: String,
    /// The parsed type cell.
    pub type_expr: TypeExpr,
    /// `true` when the table's "Required" column reads `"Yes"`.
    pub required: bool,
    /// Documentation text.
    pub description: String,
    /// Literal discriminator value, if any (rare on parameters).
    pub const_: Option<String>,
    /// Closed string value set, if the description describes one.
    pub enum_values: Vec<String>,
    /// Default value parsed from `Defaults to <token>` in the description,
    /// with trailing punctuation stripped.
    pub default: Option<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
/// A documented Bot API method.
pub struct Method {
    /// camelCase method name, e.g. `"sendMessage"`.
    pub name: String,
    /// Ordered description lines (paragraphs and blockquotes, each split at
    /// `<br>` into a separate entry).
    pub description: Vec<String>,
    /// Ordered parameter table rows.
    pub params: Vec<Param>,
    /// The method's return type, derived from its description per the
    /// return-type rule in `spec.md` §4.1.
    pub returns: TypeExpr,
}

impl Method {
    /// `true` if the camelCase naming invariant holds: starts with a
    /// lowercase ASCII letter and contains only alphanumerics.
    pub fn is_camel_case(&self) -> bool {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_lowercase() => {}
            _ => return false,
        }
        !self.name.is_empty() && self.name.chars().all(|c| c.is_ascii_alphanumeric())
    }
}
