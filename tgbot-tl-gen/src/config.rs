//! The generator's config surface: everything that can't be read off the
//! reference page itself — shared enum declarations, naming overrides, type
//! overrides for fields the default mapping gets wrong, and the Bot-method
//! "shortcut" helpers emitted on the client.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::errors::ConfigError;
use crate::ir::Api;

/// Top-level generator configuration, loaded from a YAML file passed via the
/// generator CLI's `-config` flag (or `build.rs`'s bundled default).
///
/// Unknown keys are ignored rather than rejected: the same config file is
/// meant to keep working as new sections get added, rather than forcing a
/// lockstep upgrade.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub typegen: TypegenConfig,
    #[serde(default)]
    pub methodgen: MethodgenConfig,
}

/// Declares which field descriptions to enrich into shared Rust enums.
///
/// The reference page only ever describes a closed value set in prose
/// (`Field::enum_values`); it never names the Rust type those values should
/// share. `parser.enums` supplies that name, and a list of the fields
/// (`"TypeName.field_name"`) whose value sets feed it — usually just one
/// field, but `ChatType` for instance is shared by several `Chat`-shaped
/// types' `type` field.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub enums: HashMap<String, EnumDecl>,
}

/// One declared shared enum: the fields whose value set it draws from, and
/// any wire-value renames.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EnumDecl {
    /// `"TypeName.field_name"` references into the parsed `Api`.
    pub fields: Vec<String>,
    /// Wire value → explicit PascalCase variant name, for values whose
    /// automatic PascalCase conversion would be misleading (e.g. Bot API's
    /// `"channel"` chat type staying `Channel` rather than clashing with a
    /// differently-cased existing variant).
    #[serde(default)]
    pub rename: HashMap<String, String>,
}

/// Overrides applied while emitting struct and union definitions.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TypegenConfig {
    /// Type names to skip entirely (e.g. deprecated aliases the page still
    /// documents for backward compatibility).
    #[serde(default)]
    pub exclude: HashSet<String>,
    /// `"TypeName"` → Rust identifier, for names that would otherwise clash
    /// with a Rust keyword or a generated shortcut.
    #[serde(default)]
    pub name_overrides: HashMap<String, String>,
    /// `"TypeName.field_name"` → a literal Rust type to use instead of the
    /// one derived from the field's `TypeExpr`.
    #[serde(default)]
    pub type_overrides: HashMap<String, String>,
    /// Rules matched against a field's description text, applied before the
    /// default type mapping (e.g. rewriting `Integer` fields whose
    /// description mentions "unix time" to a `chrono`/`time` timestamp type).
    #[serde(default)]
    pub field_type_rules: Vec<FieldTypeRule>,
    /// Union type names that have no wire discriminator field and must be
    /// deserialized by structural "try each variant" fallback, rather than
    /// reading a `type`/`status`-shaped tag (the "marker-interface union"
    /// case, e.g. `InputMessageContent`). Purely documentary: any union not
    /// present in [`TypegenConfig::discriminated_unions`] is emitted this
    /// way regardless, so listing it here just records that the omission
    /// was deliberate rather than an oversight.
    #[serde(default)]
    pub interface_unions: HashSet<String>,
    /// Union type names that *do* have a wire discriminator, with the tag
    /// field name and each member's literal tag value. The reference page
    /// never states a union member's tag value directly (it only names the
    /// member types), so this has to come from config rather than the IR.
    #[serde(default)]
    pub discriminated_unions: HashMap<String, DiscriminatedUnion>,
    /// Extra inherent-impl method bodies (raw Rust source) to splice onto a
    /// generated type, keyed by type name.
    #[serde(default)]
    pub type_methods: HashMap<String, Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiscriminatedUnion {
    /// The field every member uses to signal its variant, e.g. `"type"`.
    pub field: String,
    /// Member type name → the literal value `field` holds for that member.
    pub variants: HashMap<String, String>,
}

/// A description-text match that overrides a field's generated Rust type.
#[derive(Clone, Debug, Deserialize)]
pub struct FieldTypeRule {
    /// Substring to search for in the field's description (case-sensitive).
    pub when_description_contains: String,
    /// Literal Rust type to use when it matches.
    pub rust_type: String,
}

/// Overrides and additions applied while emitting method request/response
/// types and their shortcut helpers.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MethodgenConfig {
    /// Method names to skip entirely.
    #[serde(default)]
    pub exclude: HashSet<String>,
    /// Method name → the shortcut helper to generate on the client facade
    /// (e.g. `sendMessage` → `fn send_message(&self, chat_id: impl Into<ChatId>, text: impl Into<String>) -> Call<Message>`).
    #[serde(default)]
    pub shortcuts: HashMap<String, ShortcutDecl>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ShortcutDecl {
    /// The shortcut's snake_case Rust method name.
    pub name: String,
    /// Required parameter names, in the order they should appear in the
    /// shortcut's argument list (optional parameters remain builder-style
    /// setters on the returned `Call<R>`).
    #[serde(default)]
    pub args: Vec<String>,
}

impl Config {
    /// Loads and validates a config file against an already-parsed `Api`.
    pub fn load(path: &std::path::Path, api: &Api) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        let config: Config = serde_yaml::from_str(&text)?;
        config.validate(api)?;
        Ok(config)
    }

    fn validate(&self, api: &Api) -> Result<(), ConfigError> {
        for (enum_name, decl) in &self.parser.enums {
            let mut variants: Option<Vec<String>> = None;
            for field_ref in &decl.fields {
                let Some((type_name, field_name)) = field_ref.split_once('.') else {
                    return Err(ConfigError::UnknownEnumField {
                        enum_name: enum_name.clone(),
                        field: field_ref.clone(),
                    });
                };
                let field = api
                    .types
                    .iter()
                    .find(|t| t.name == type_name)
                    .and_then(|t| t.fields.iter().find(|f| f.name == field_name));
                let Some(field) = field else {
                    return Err(ConfigError::UnknownEnumField {
                        enum_name: enum_name.clone(),
                        field: field_ref.clone(),
                    });
                };
                let values = field.enum_values.clone();
                match &variants {
                    None => variants = Some(values),
                    Some(existing) if *existing != values => {
                        return Err(ConfigError::InconsistentEnumVariants {
                            enum_name: enum_name.clone(),
                            field: field_ref.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_ignored() {
        let yaml = "typegen:\n  exclude: [Foo]\n  some_future_key: true\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.typegen.exclude.contains("Foo"));
    }

    #[test]
    fn defaults_are_empty() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(config.parser.enums.is_empty());
        assert!(config.typegen.exclude.is_empty());
        assert!(config.methodgen.shortcuts.is_empty());
    }
}
