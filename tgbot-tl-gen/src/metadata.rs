//! Pre-computed metadata used throughout the code generator: which fields
//! need `Box<_>` to break a recursive struct definition.

use std::collections::{HashMap, HashSet};

use crate::ir::{Api, Type};

pub(crate) struct Metadata<'a> {
    by_name: HashMap<&'a str, &'a Type>,
    /// `(type name, field name)` pairs that form part of a reference cycle
    /// through scalar (non-array) fields.
    boxed_fields: HashSet<(&'a str, &'a str)>,
}

impl<'a> Metadata<'a> {
    pub(crate) fn build(api: &'a Api) -> Self {
        let by_name: HashMap<&str, &Type> =
            api.types.iter().map(|t| (t.name.as_str(), t)).collect();

        let mut boxed_fields = HashSet::new();
        for ty in &api.types {
            for field in &ty.fields {
                if field.type_expr.array > 0 {
                    // `Vec<_>` already indirects through the heap.
                    continue;
                }
                let Some(target) = field.type_expr.single() else { continue };
                if by_name.contains_key(target)
                    && reaches(target, &ty.name, &by_name, &mut HashSet::new())
                {
                    boxed_fields.insert((ty.name.as_str(), field.name.as_str()));
                }
            }
        }

        Self { by_name, boxed_fields }
    }

    /// `true` if `type_name.field_name` must be wrapped in `Box<_>` to keep
    /// the generated struct's size finite.
    pub(crate) fn needs_box(&self, type_name: &str, field_name: &str) -> bool {
        self.boxed_fields.contains(&(type_name, field_name))
    }

    /// Looks up a parsed type by name, e.g. to inspect a union's members
    /// while emitting it.
    pub(crate) fn type_by_name(&self, name: &str) -> Option<&'a Type> {
        self.by_name.get(name).copied()
    }
}

/// `true` if, starting from `current`, following scalar (non-array) field
/// references eventually reaches `target` again.
fn reaches<'a>(
    current: &str,
    target: &str,
    by_name: &HashMap<&'a str, &'a Type>,
    visited: &mut HashSet<String>,
) -> bool {
    if current == target {
        return true;
    }
    if !visited.insert(current.to_string()) {
        return false;
    }
    let Some(ty) = by_name.get(current) else { return false };
    for field in &ty.fields {
        if field.type_expr.array > 0 {
            continue;
        }
        if let Some(next) = field.type_expr.single() {
            if reaches(next, target, by_name, visited) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, TypeExpr, TypeRef};

    fn ty(name: &str, fields: Vec<Field>) -> Type {
        Type { name: name.to_string(), description: String::new(), fields, subtypes: Vec::new() }
    }

    fn field(name: &str, target: &str) -> Field {
        Field {
            name: name.to_string(),
            type_expr: TypeExpr { types: vec![TypeRef::anchored(target, target.to_lowercase())], array: 0 },
            optional: true,
            description: String::new(),
            const_: None,
            enum_values: Vec::new(),
        }
    }

    #[test]
    fn direct_self_reference_is_boxed() {
        let api = Api {
            types: vec![ty("Message", vec![field("reply_to_message", "Message")])],
            methods: vec![],
        };
        let meta = Metadata::build(&api);
        assert!(meta.needs_box("Message", "reply_to_message"));
    }

    #[test]
    fn array_field_is_never_boxed() {
        let mut message = field("entities", "MessageEntity");
        message.type_expr.array = 1;
        let api = Api {
            types: vec![
                ty("Message", vec![message]),
                ty("MessageEntity", vec![]),
            ],
            methods: vec![],
        };
        let meta = Metadata::build(&api);
        assert!(!meta.needs_box("Message", "entities"));
    }
}
