//! [`TypeExpr`] — a type cell as it appears in a table, possibly wrapped in
//! `Array of` and possibly a union of several nominal types.

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
/// A reference to a nominal type, optionally anchored to a documented section.
pub struct TypeRef {
    /// The nominal type name, e.g. `"Integer"`, `"String"`, `"True"`, or a
    /// user-defined type name such as `"Message"`.
    pub ty: String,
    /// The anchor slug this reference points at, when the type is documented
    /// elsewhere on the page (e.g. `"message"` for a link to `#message`).
    pub ref_: Option<String>,
}

impl TypeRef {
    /// A bare nominal reference with no anchor (used for primitives).
    pub fn bare(ty: impl Into<String>) -> Self {
        Self { ty: ty.into(), ref_: None }
    }

    /// A reference anchored to another section of the document.
    pub fn anchored(ty: impl Into<String>, ref_: impl Into<String>) -> Self {
        Self { ty: ty.into(), ref_: Some(ref_.into()) }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Default)]
/// A parsed type cell: an ordered list of candidate types plus array depth.
///
/// `array == 0` is a scalar, `1` is a sequence, `2` is a sequence of
/// sequences. More than one entry in `types` means the field is a union of
/// primitives or of named types (e.g. `InputFile or String`).
pub struct TypeExpr {
    /// Candidate nominal types, in document order.
    pub types: Vec<TypeRef>,
    /// Array nesting depth (0 = scalar).
    pub array: u8,
}

impl TypeExpr {
    /// A scalar expression with a single nominal type.
    pub fn scalar(ty: impl Into<String>) -> Self {
        Self { types: vec![TypeRef::bare(ty)], array: 0 }
    }

    /// `true` when this expression names more than one candidate type.
    pub fn is_union(&self) -> bool {
        self.types.len() > 1
    }

    /// The single nominal type name, if this expression is not a union.
    pub fn single(&self) -> Option<&str> {
        match self.types.as_slice() {
            [one] => Some(one.ty.as_str()),
            _ => None,
        }
    }
}
