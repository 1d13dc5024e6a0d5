//! Error types for configuration loading and code emission.

/// Errors from parsing or validating a generator [`crate::Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("reading config file {path:?}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    /// The config file's YAML was malformed.
    #[error("parsing config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// `parser.enums` named a field (`"Type.field"`) that doesn't exist on
    /// the parsed `Api`.
    #[error("parser.enums entry {enum_name:?} references unknown field {field:?}")]
    UnknownEnumField { enum_name: String, field: String },
    /// Two fields assigned to the same declared enum disagree on variants.
    #[error("parser.enums entry {enum_name:?}: field {field:?} has a different value set than its siblings")]
    InconsistentEnumVariants { enum_name: String, field: String },
}

/// Errors from emitting Rust source for a parsed, config-enriched [`crate::ir::Api`].
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// Writing generated source failed.
    #[error("writing generated source: {0}")]
    Io(#[from] std::io::Error),
    /// `typegen.type_overrides` or `typegen.name_overrides` named a type or
    /// field that the parsed `Api` doesn't have.
    #[error("{section} override for {key:?} does not match any parsed {kind}")]
    DanglingOverride { section: &'static str, key: String, kind: &'static str },
    /// A union type was declared in both `typegen.interface_unions` and left
    /// to default to a discriminated union, or named a discriminator field
    /// that isn't present on every member.
    #[error("union {type_name:?} member {member:?} is missing its discriminator field {field:?}")]
    MissingDiscriminator { type_name: String, member: String, field: String },
    /// `methodgen.shortcuts` named a method the parsed (and non-excluded) `Api` doesn't have.
    #[error("methodgen.shortcuts entry {method:?} does not match any parsed method")]
    UnknownShortcutMethod { method: String },
    /// A `methodgen.shortcuts` entry's `args` doesn't name exactly the
    /// method's required parameters (no more, no fewer).
    #[error(
        "methodgen.shortcuts entry {method:?} (shortcut {shortcut:?}) args {found:?} do not match the method's required parameters {expected:?}"
    )]
    ShortcutArgMismatch { method: String, shortcut: String, expected: Vec<String>, found: Vec<String> },
}
