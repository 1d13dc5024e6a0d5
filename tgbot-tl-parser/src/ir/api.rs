//! [`Api`] — the parser's complete output: every type and method found on
//! the reference page.

use std::collections::HashSet;

use crate::ir::{Method, Type};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
/// The root intermediate representation produced by [`crate::parse_document`]
/// and consumed by the emitters in `tgbot-tl-gen`.
pub struct Api {
    /// Every parsed type section, in document order.
    pub types: Vec<Type>,
    /// Every parsed method section, in document order.
    pub methods: Vec<Method>,
}

/// A violation of one of the IR invariants listed in `spec.md` §3/§8.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    #[error("type name {0:?} is not PascalCase")]
    TypeNameNotPascalCase(String),
    #[error("duplicate type name {0:?}")]
    DuplicateTypeName(String),
    #[error("method name {0:?} is not camelCase")]
    MethodNameNotCamelCase(String),
    #[error("duplicate method name {0:?}")]
    DuplicateMethodName(String),
    #[error("field {type_}.{field} has both Const and a non-empty Enum")]
    ConstEnumConflict { type_: String, field: String },
    #[error("union type {0:?} has both fields and subtypes")]
    UnionWithFields(String),
    #[error("reference {0:?} does not resolve to any known type")]
    DanglingRef(String),
}

impl Api {
    /// Validates every invariant listed in `spec.md` §3/§8 and returns the
    /// first violation found, if any.
    ///
    /// Anchors are resolved against `name.to_lowercase()` of every known
    /// `Type`, mirroring how the reference page slugifies its headings.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut type_names = HashSet::new();
        let mut anchors = HashSet::new();
        for ty in &self.types {
            if !ty.is_pascal_case() {
                return Err(InvariantError::TypeNameNotPascalCase(ty.name.clone()));
            }
            if !type_names.insert(ty.name.as_str()) {
                return Err(InvariantError::DuplicateTypeName(ty.name.clone()));
            }
            anchors.insert(ty.name.to_ascii_lowercase());

            if !ty.subtypes.is_empty() && !ty.fields.is_empty() {
                return Err(InvariantError::UnionWithFields(ty.name.clone()));
            }

            for field in &ty.fields {
                if field.violates_const_enum_exclusivity() {
                    return Err(InvariantError::ConstEnumConflict {
                        type_: ty.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        }

        let mut method_names = HashSet::new();
        for method in &self.methods {
            if !method.is_camel_case() {
                return Err(InvariantError::MethodNameNotCamelCase(method.name.clone()));
            }
            if !method_names.insert(method.name.as_str()) {
                return Err(InvariantError::DuplicateMethodName(method.name.clone()));
            }
        }

        for ty in &self.types {
            for field in &ty.fields {
                for tref in &field.type_expr.types {
                    if let Some(r) = &tref.ref_ {
                        if !anchors.contains(r.as_str()) {
                            return Err(InvariantError::DanglingRef(r.clone()));
                        }
                    }
                }
            }
        }
        for method in &self.methods {
            for param in &method.params {
                for tref in &param.type_expr.types {
                    if let Some(r) = &tref.ref_ {
                        if !anchors.contains(r.as_str()) {
                            return Err(InvariantError::DanglingRef(r.clone()));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
