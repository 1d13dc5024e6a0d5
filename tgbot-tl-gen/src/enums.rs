//! Resolves `parser.enums` config entries into concrete Rust enums, each
//! with a PascalCase variant per wire value.
//!
//! This is the "`Enum` is produced by config enrichment over the IR" step
//! described in `tgbot_tl_parser::ir`'s module docs: the parser never
//! invents a shared enum on its own, since the reference page has no way to
//! say two fields' closed value sets are the same type.

use std::collections::HashMap;

use crate::config::{Config, EnumDecl};
use crate::ir::Api;
use crate::namegen::to_pascal_case;

/// A shared Rust enum derived from one or more fields' `enum_values`.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedEnum {
    pub name: String,
    /// `(wire value, Rust variant name)`, in declaration order.
    pub variants: Vec<(String, String)>,
}

/// Maps every `"TypeName.field_name"` reference across all declared enums to
/// the enum that owns it, so the struct emitter can swap the field's type
/// from `String` to the shared enum.
pub(crate) struct EnumTable {
    pub enums: Vec<ResolvedEnum>,
    field_to_enum: HashMap<(String, String), usize>,
}

impl EnumTable {
    pub(crate) fn resolve(api: &Api, decls: &HashMap<String, EnumDecl>) -> Self {
        let mut enums = Vec::new();
        let mut field_to_enum = HashMap::new();

        let mut names: Vec<&String> = decls.keys().collect();
        names.sort();

        for name in names {
            let decl = &decls[name];
            let values = first_enum_values(api, decl);
            let variants = values
                .iter()
                .map(|value| {
                    let variant = decl
                        .rename
                        .get(value)
                        .cloned()
                        .unwrap_or_else(|| to_pascal_case(value));
                    (value.clone(), variant)
                })
                .collect();

            let index = enums.len();
            enums.push(ResolvedEnum { name: name.clone(), variants });

            for field_ref in &decl.fields {
                if let Some((type_name, field_name)) = field_ref.split_once('.') {
                    field_to_enum.insert((type_name.to_string(), field_name.to_string()), index);
                }
            }
        }

        Self { enums, field_to_enum }
    }

    /// The shared enum a field's type should reference, if `parser.enums`
    /// claimed it.
    pub(crate) fn enum_for_field(&self, type_name: &str, field_name: &str) -> Option<&ResolvedEnum> {
        self.field_to_enum
            .get(&(type_name.to_string(), field_name.to_string()))
            .map(|&i| &self.enums[i])
    }
}

fn first_enum_values(api: &Api, decl: &EnumDecl) -> Vec<String> {
    for field_ref in &decl.fields {
        let Some((type_name, field_name)) = field_ref.split_once('.') else { continue };
        let values = api
            .types
            .iter()
            .find(|t| t.name == type_name)
            .and_then(|t| t.fields.iter().find(|f| f.name == field_name))
            .map(|f| f.enum_values.clone());
        if let Some(values) = values {
            if !values.is_empty() {
                return values;
            }
        }
    }
    Vec::new()
}
