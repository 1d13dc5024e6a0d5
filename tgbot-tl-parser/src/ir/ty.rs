//! [`Type`] — a parsed object type or discriminated union.

use crate::ir::Field;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
/// A documented type: either an object with fields, or a union naming its
/// subtypes.
///
/// Exactly one of `fields` / `subtypes` is non-empty for a well-formed type
/// (see [`Type::is_union`]); an empty-fields, empty-subtypes `Type` describes
/// a type section with neither a table nor a subtype list (rare, but legal —
/// some Bot API types are documented with prose only).
pub struct Type {
    /// PascalCase type name.
    pub name: String,
    /// Concatenated paragraph description, with internal links rendered as
    /// Markdown and anchors rewritten to absolute URLs.
    pub description: String,
    /// Ordered member fields, for an object type.
    pub fields: Vec<Field>,
    /// Names of the concrete types this union may resolve to, for a
    /// discriminated-union type (names only — the parser does not resolve
    /// them; that's the emitter's job once the full `Api` is assembled).
    pub subtypes: Vec<String>,
}

impl Type {
    /// `true` when this type is a union (non-empty `subtypes`, empty `fields`).
    pub fn is_union(&self) -> bool {
        !self.subtypes.is_empty() && self.fields.is_empty()
    }

    /// `true` if the PascalCase naming invariant holds: starts with an
    /// uppercase ASCII letter and contains only alphanumerics.
    pub fn is_pascal_case(&self) -> bool {
        is_pascal_case(&self.name)
    }
}

pub(crate) fn is_pascal_case(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}
