//! [`Field`] — one row of a type's member table, or one row of a method's
//! parameter table (see [`crate::ir::Param`], which wraps a `Field`).

use crate::ir::TypeExpr;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
/// A single member of an object [`crate::ir::Type`].
pub struct Field {
    /// snake_case field name, as documented.
    pub name: String,
    /// The parsed type cell.
    pub type_expr: TypeExpr,
    /// `true` when the description says the field is optional.
    pub optional: bool,
    /// The field's documentation text.
    pub description: String,
    /// The literal value this field always holds, if the description pins a
    /// single discriminator value (e.g. `always "message"`).
    ///
    /// Mutually exclusive with a non-empty [`Field::enum_values`].
    pub const_: Option<String>,
    /// The closed set of string values this field may hold, in declaration
    /// order, if the description describes one (`"one of …"` etc).
    ///
    /// Mutually exclusive with [`Field::const_`].
    pub enum_values: Vec<String>,
}

impl Field {
    /// `true` if [`Field::const_`] and a non-empty [`Field::enum_values`] are
    /// both set — an IR invariant violation the parser must never produce.
    pub fn violates_const_enum_exclusivity(&self) -> bool {
        self.const_.is_some() && !self.enum_values.is_empty()
    }
}
