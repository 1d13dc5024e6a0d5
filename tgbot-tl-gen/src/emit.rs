//! Turns a config-enriched [`Api`] into Rust source: one file of data types,
//! one file of method request structs.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::config::Config;
use crate::enums::EnumTable;
use crate::errors::EmitError;
use crate::ir::{Api, Field, Method, Param, Type};
use crate::metadata::Metadata;
use crate::namegen::{escape_ident, method_struct_name, type_expr_rust};

/// The two output streams a generation pass writes to.
pub struct Outputs<W: Write> {
    /// Destination for generated data types (`generated_types.rs`).
    pub types: W,
    /// Destination for generated method request structs (`generated_methods.rs`).
    pub methods: W,
}

impl Outputs<File> {
    /// Creates `generated_types.rs` and `generated_methods.rs` inside `dir`
    /// (typically `$OUT_DIR` from a `build.rs`).
    pub fn from_dir(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            types: File::create(dir.join("generated_types.rs"))?,
            methods: File::create(dir.join("generated_methods.rs"))?,
        })
    }
}

/// Emits Rust source for `api` into `out`, applying every override in
/// `config`.
pub fn generate(api: &Api, config: &Config, out: &mut Outputs<impl Write>) -> Result<(), EmitError> {
    let meta = Metadata::build(api);
    let enum_table = EnumTable::resolve(api, &config.parser.enums);

    writeln!(out.types, "// @generated by tgbot-tl-gen. Do not edit by hand.\n")?;
    write_shared_enums(&enum_table, &mut out.types)?;

    for ty in &api.types {
        if config.typegen.exclude.contains(&ty.name) {
            continue;
        }
        if ty.is_union() {
            write_union(ty, config, &mut out.types)?;
        } else {
            write_struct(ty, config, &meta, &enum_table, &mut out.types)?;
        }
    }

    writeln!(out.methods, "// @generated by tgbot-tl-gen. Do not edit by hand.\n")?;
    writeln!(out.methods, "use crate::BotMethod;\n")?;
    let mut unused_shortcuts: std::collections::HashSet<&String> = config.methodgen.shortcuts.keys().collect();
    for method in &api.methods {
        if config.methodgen.exclude.contains(&method.name) {
            continue;
        }
        write_method(method, config, &mut out.methods)?;
        if let Some(decl) = config.methodgen.shortcuts.get(&method.name) {
            unused_shortcuts.remove(&method.name);
            write_shortcut(method, decl, config, &mut out.methods)?;
        }
    }
    if let Some(method) = unused_shortcuts.into_iter().next() {
        return Err(EmitError::UnknownShortcutMethod { method: method.clone() });
    }

    Ok(())
}

/// Emits §4.3(g)'s "fluent shortcut helper": an additional associated
/// function on the method's request struct, named and ordered per
/// `methodgen.shortcuts`, forwarding to [`write_method_constructor`]'s
/// `new` with the same required fields (§4.2 "shortcuts").
fn write_shortcut(
    method: &Method,
    decl: &crate::config::ShortcutDecl,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), EmitError> {
    let struct_name = method_struct_name(&rust_type_name(&method.name, config));
    let required: Vec<&Param> = method.params.iter().filter(|p| p.required).collect();

    let mut expected: Vec<String> = required.iter().map(|p| p.name.clone()).collect();
    let mut found: Vec<String> = decl.args.clone();
    expected.sort();
    found.sort();
    if expected != found {
        return Err(EmitError::ShortcutArgMismatch {
            method: method.name.clone(),
            shortcut: decl.name.clone(),
            expected: required.iter().map(|p| p.name.clone()).collect(),
            found: decl.args.clone(),
        });
    }

    let sig = decl
        .args
        .iter()
        .map(|arg| {
            let param = required.iter().find(|p| &p.name == arg).expect("checked above");
            format!("{}: impl Into<{}>", escape_ident(arg), rust_param_type(&method.name, param, config))
        })
        .collect::<Vec<_>>()
        .join(", ");
    let call_args =
        required.iter().map(|p| format!("{}.into()", escape_ident(&p.name))).collect::<Vec<_>>().join(", ");

    writeln!(out, "impl {struct_name} {{")?;
    writeln!(out, "    /// Fluent shortcut for `{}`, declared via `methodgen.shortcuts`.", method.name)?;
    writeln!(out, "    pub fn {}({sig}) -> Self {{", decl.name)?;
    writeln!(out, "        Self::new({call_args})")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}\n")?;
    Ok(())
}

fn rust_type_name(name: &str, config: &Config) -> String {
    config.typegen.name_overrides.get(name).cloned().unwrap_or_else(|| name.to_string())
}

fn write_shared_enums(enum_table: &EnumTable, out: &mut impl Write) -> Result<(), EmitError> {
    for resolved in &enum_table.enums {
        writeln!(out, "#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]")?;
        writeln!(out, "pub enum {} {{", resolved.name)?;
        for (wire, variant) in &resolved.variants {
            writeln!(out, "    #[serde(rename = {wire:?})]")?;
            writeln!(out, "    {variant},")?;
        }
        writeln!(out, "}}\n")?;
    }
    Ok(())
}

fn write_struct(
    ty: &Type,
    config: &Config,
    meta: &Metadata<'_>,
    enum_table: &EnumTable,
    out: &mut impl Write,
) -> Result<(), EmitError> {
    let name = rust_type_name(&ty.name, config);

    if !ty.description.is_empty() {
        for line in wrap_doc(&ty.description) {
            writeln!(out, "/// {line}")?;
        }
    }
    writeln!(out, "#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]")?;
    writeln!(out, "pub struct {name} {{")?;

    for field in &ty.fields {
        write_struct_field(&ty.name, field, config, meta, enum_table, out)?;
    }

    writeln!(out, "}}\n")?;

    if let Some(methods) = config.typegen.type_methods.get(&ty.name) {
        writeln!(out, "impl {name} {{")?;
        for snippet in methods {
            writeln!(out, "    {snippet}")?;
        }
        writeln!(out, "}}\n")?;
    }

    Ok(())
}

fn write_struct_field(
    owner: &str,
    field: &Field,
    config: &Config,
    meta: &Metadata<'_>,
    enum_table: &EnumTable,
    out: &mut impl Write,
) -> Result<(), EmitError> {
    let rust_name = escape_ident(&field.name);
    let override_key = format!("{owner}.{}", field.name);

    let mut rust_ty = if let Some(literal) = config.typegen.type_overrides.get(&override_key) {
        literal.clone()
    } else if let Some(rule) = config
        .typegen
        .field_type_rules
        .iter()
        .find(|r| field.description.contains(&r.when_description_contains))
    {
        rule.rust_type.clone()
    } else if let Some(shared) = enum_table.enum_for_field(owner, &field.name) {
        shared.name.clone()
    } else {
        type_expr_rust(&field.type_expr, |name| rust_type_name(name, config))
    };

    if field.type_expr.array == 0 && meta.needs_box(owner, &field.name) {
        rust_ty = format!("Box<{rust_ty}>");
    }
    if field.optional {
        rust_ty = format!("Option<{rust_ty}>");
    }

    if !field.description.is_empty() {
        for line in wrap_doc(&field.description) {
            writeln!(out, "    /// {line}")?;
        }
    }
    if field.optional {
        writeln!(out, "    #[serde(skip_serializing_if = \"Option::is_none\", default)]")?;
    }
    if rust_name != field.name {
        writeln!(out, "    #[serde(rename = {:?})]", field.name)?;
    }
    writeln!(out, "    pub {rust_name}: {rust_ty},")?;
    Ok(())
}

fn write_union(
    ty: &Type,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), EmitError> {
    let name = rust_type_name(&ty.name, config);

    if !ty.description.is_empty() {
        for line in wrap_doc(&ty.description) {
            writeln!(out, "/// {line}")?;
        }
    }
    writeln!(out, "#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]")?;

    if let Some(tagged) = config.typegen.discriminated_unions.get(&ty.name) {
        writeln!(out, "#[serde(tag = {:?})]", tagged.field)?;
        writeln!(out, "pub enum {name} {{")?;
        for member in &ty.subtypes {
            let member_name = rust_type_name(member, config);
            if let Some(wire) = tagged.variants.get(member) {
                writeln!(out, "    #[serde(rename = {wire:?})]")?;
            } else {
                return Err(EmitError::MissingDiscriminator {
                    type_name: ty.name.clone(),
                    member: member.clone(),
                    field: tagged.field.clone(),
                });
            }
            writeln!(out, "    {member_name}({member_name}),")?;
        }
        writeln!(out, "}}\n")?;
    } else {
        writeln!(out, "#[serde(untagged)]")?;
        writeln!(out, "pub enum {name} {{")?;
        for member in &ty.subtypes {
            let member_name = rust_type_name(member, config);
            writeln!(out, "    {member_name}({member_name}),")?;
        }
        writeln!(out, "}}\n")?;
    }

    Ok(())
}

fn write_method(method: &Method, config: &Config, out: &mut impl Write) -> Result<(), EmitError> {
    let name = rust_type_name(&method.name, config);
    let struct_name = method_struct_name(&name);

    for line in method.description.iter().flat_map(|d| wrap_doc(d)) {
        writeln!(out, "/// {line}")?;
    }
    writeln!(out, "#[derive(Clone, Debug, serde::Serialize)]")?;
    writeln!(out, "pub struct {struct_name} {{")?;
    for param in &method.params {
        write_param_field(&method.name, param, config, out)?;
    }
    writeln!(out, "}}\n")?;

    write_method_constructor(&struct_name, method, config, out)?;

    let response = type_expr_rust(&method.returns, |n| rust_type_name(n, config));
    writeln!(out, "impl BotMethod for {struct_name} {{")?;
    writeln!(out, "    type Response = {response};")?;
    writeln!(out, "    const NAME: &'static str = {:?};", method.name)?;
    writeln!(out, "}}\n")?;

    Ok(())
}

/// The param's base Rust type (before `Option<_>` wrapping for non-required
/// params), honoring `typegen.type_overrides` the same way a struct field
/// would. Shared between the field declaration and the builder's `impl
/// Into<_>` bound so the two can never disagree about what the field holds.
fn rust_param_type(method_name: &str, param: &Param, config: &Config) -> String {
    let override_key = format!("{method_name}.{}", param.name);
    if let Some(literal) = config.typegen.type_overrides.get(&override_key) {
        literal.clone()
    } else {
        type_expr_rust(&param.type_expr, |n| rust_type_name(n, config))
    }
}

fn write_param_field(
    method_name: &str,
    param: &Param,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), EmitError> {
    let rust_name = escape_ident(&param.name);
    let mut rust_ty = rust_param_type(method_name, param, config);
    if !param.required {
        rust_ty = format!("Option<{rust_ty}>");
    }

    if !param.description.is_empty() {
        for line in wrap_doc(&param.description) {
            writeln!(out, "    /// {line}")?;
        }
    }
    if !param.required {
        writeln!(out, "    #[serde(skip_serializing_if = \"Option::is_none\")]")?;
    }
    if rust_name != param.name {
        writeln!(out, "    #[serde(rename = {:?})]", param.name)?;
    }
    writeln!(out, "    pub {rust_name}: {rust_ty},")?;
    Ok(())
}

fn write_method_constructor(
    struct_name: &str,
    method: &Method,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), EmitError> {
    let required: Vec<&Param> = method.params.iter().filter(|p| p.required).collect();

    writeln!(out, "impl {struct_name} {{")?;
    let args = required
        .iter()
        .map(|p| format!("{}: impl Into<{}>", escape_ident(&p.name), rust_param_type(&method.name, p, config)))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(out, "    /// Builds a request with every required parameter set and every")?;
    writeln!(out, "    /// optional one left unset.")?;
    writeln!(out, "    pub fn new({args}) -> Self {{")?;
    writeln!(out, "        Self {{")?;
    for p in &method.params {
        let n = escape_ident(&p.name);
        if p.required {
            writeln!(out, "            {n}: {n}.into(),")?;
        } else {
            writeln!(out, "            {n}: None,")?;
        }
    }
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;

    for param in method.params.iter().filter(|p| !p.required) {
        let n = escape_ident(&param.name);
        let ty = rust_param_type(&method.name, param, config);
        writeln!(out, "    /// Sets `{}`.", param.name)?;
        writeln!(out, "    pub fn {n}(mut self, {n}: impl Into<{ty}>) -> Self {{")?;
        writeln!(out, "        self.{n} = Some({n}.into());")?;
        writeln!(out, "        self")?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "}}\n")?;
    Ok(())
}

fn wrap_doc(text: &str) -> Vec<String> {
    const WIDTH: usize = 96;
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > WIDTH {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShortcutDecl;

    const FIXTURE: &str = r##"
<html><body>
<h4>sendMessage</h4>
<p>Use this method to send text messages. On success, the sent
<a href="#message">Message</a> is returned.</p>
<table>
    <thead><tr><th>Parameter</th><th>Type</th><th>Required</th><th>Description</th></tr></thead>
    <tbody>
        <tr><td>chat_id</td><td>Integer</td><td>Yes</td>
            <td>Unique identifier for the target chat.</td></tr>
        <tr><td>text</td><td>String</td><td>Yes</td><td>Text of the message to be sent.</td></tr>
        <tr><td>disable_notification</td><td>Boolean</td><td>Optional</td>
            <td>Sends the message silently. Defaults to false.</td></tr>
    </tbody>
</table>
<h4>Message</h4>
<p>This object represents a message.</p>
<table>
    <thead><tr><th>Field</th><th>Type</th><th>Description</th></tr></thead>
    <tbody>
        <tr><td>message_id</td><td>Integer</td><td>Unique message identifier inside this chat.</td></tr>
    </tbody>
</table>
</body></html>
"##;

    fn parse_fixture() -> Api {
        tgbot_tl_parser::parse_document(FIXTURE).expect("fixture parses")
    }

    #[test]
    fn shortcut_emits_a_reordered_associated_function() {
        let api = parse_fixture();
        let mut config = Config::default();
        config.methodgen.shortcuts.insert(
            "sendMessage".to_string(),
            ShortcutDecl { name: "quick".to_string(), args: vec!["text".to_string(), "chat_id".to_string()] },
        );
        let mut outputs = Outputs { types: Vec::new(), methods: Vec::new() };
        generate(&api, &config, &mut outputs).expect("generation succeeds");
        let methods = String::from_utf8(outputs.methods).unwrap();
        assert!(methods.contains("pub fn quick(text: impl Into<String>, chat_id: impl Into<i64>) -> Self {"));
        assert!(methods.contains("Self::new(chat_id.into(), text.into())"));
    }

    #[test]
    fn shortcut_referencing_unknown_method_fails() {
        let api = parse_fixture();
        let mut config = Config::default();
        config.methodgen.shortcuts.insert(
            "noSuchMethod".to_string(),
            ShortcutDecl { name: "quick".to_string(), args: vec![] },
        );
        let mut outputs = Outputs { types: Vec::new(), methods: Vec::new() };
        let err = generate(&api, &config, &mut outputs).unwrap_err();
        assert!(matches!(err, EmitError::UnknownShortcutMethod { method } if method == "noSuchMethod"));
    }

    #[test]
    fn shortcut_with_wrong_args_fails() {
        let api = parse_fixture();
        let mut config = Config::default();
        config.methodgen.shortcuts.insert(
            "sendMessage".to_string(),
            ShortcutDecl { name: "quick".to_string(), args: vec!["chat_id".to_string()] },
        );
        let mut outputs = Outputs { types: Vec::new(), methods: Vec::new() };
        let err = generate(&api, &config, &mut outputs).unwrap_err();
        assert!(matches!(err, EmitError::ShortcutArgMismatch { method, .. } if method == "sendMessage"));
    }
}
