//! Functions that convert Bot API names and wire values into idiomatic Rust
//! identifiers and type expressions.

use crate::ir::TypeExpr;

// ─── wire value → Rust identifier ────────────────────────────────────────

/// Closed initialism set (§4.3 "Naming"): uppercased as a unit at word
/// boundaries instead of merely capitalized, e.g. `"url"` -> `"URL"` rather
/// than `"Url"`.
const INITIALISMS: &[&str] =
    &["ID", "URL", "JSON", "HTML", "HTTP", "HTTPS", "MPEG", "GIF", "API", "IP", "UUID"];

/// Converts a wire string value (`"supergroup"`, `"web_app_data"`) into a
/// PascalCase Rust enum variant name (`"Supergroup"`, `"WebAppData"`),
/// uppercasing closed initialisms at word boundaries (`"url"` -> `"URL"`,
/// `"ids"` -> `"IDs"` — plural forms keep a lowercase trailing `s`).
pub(crate) fn to_pascal_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for word in value.split(['_', '-']) {
        if !word.is_empty() {
            out.push_str(&pascal_word(word));
        }
    }
    out
}

fn pascal_word(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some(stripped) = lower.strip_suffix('s') {
        if let Some(initialism) = INITIALISMS.iter().find(|i| i.to_ascii_lowercase() == stripped) {
            return format!("{initialism}s");
        }
    }
    if let Some(initialism) = INITIALISMS.iter().find(|i| i.to_ascii_lowercase() == lower) {
        return initialism.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Converts a camelCase method name (`"sendMessage"`) into the PascalCase
/// name of its generated request struct (`"SendMessage"`).
pub(crate) fn method_struct_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Escapes a snake_case field or parameter name that collides with a Rust
/// keyword.
pub(crate) fn escape_ident(name: &str) -> String {
    match name {
        "type" => "r#type".to_string(),
        "loop" => "r#loop".to_string(),
        "self" => "is_self".to_string(),
        "static" => "r#static".to_string(),
        "final" => "r#final".to_string(),
        "move" => "r#move".to_string(),
        "match" => "r#match".to_string(),
        "ref" => "r#ref".to_string(),
        other => other.to_string(),
    }
}

// ─── scalar primitives ───────────────────────────────────────────────────

/// Maps a reference-page primitive name to its Rust built-in type.
///
/// Returns `None` for a named (user-defined) type, which the caller resolves
/// against the type's own emitted identifier instead.
pub(crate) fn builtin_scalar(name: &str) -> Option<&'static str> {
    Some(match name {
        "Integer" => "i64",
        "Integer64" => "i64",
        "Float" => "f64",
        "String" => "String",
        "Boolean" => "bool",
        "True" => "True",
        "False" => "False",
        _ => return None,
    })
}

/// Builds the Rust type expression for a parsed [`TypeExpr`], given a
/// resolver for named type references (anchor → emitted Rust identifier).
///
/// Does not apply `Option<_>` wrapping for optional fields or `Box<_>`
/// wrapping for recursive fields — callers apply those themselves, since
/// both depend on context this function doesn't have (the owning field's
/// `optional` flag, and whole-`Api` recursion analysis).
pub(crate) fn type_expr_rust(expr: &TypeExpr, resolve_named: impl Fn(&str) -> String) -> String {
    let inner = if let Some(single) = expr.single() {
        builtin_scalar(single).map(str::to_string).unwrap_or_else(|| resolve_named(single))
    } else {
        // A union of candidate types with no shared Rust representation
        // becomes a small generated enum at the call site; the struct
        // emitter is responsible for actually defining it and must pass a
        // `resolve_named` that already accounts for that generated name.
        resolve_named(&expr.types.iter().map(|t| t.ty.as_str()).collect::<Vec<_>>().join("Or"))
    };

    let mut ty = inner;
    for _ in 0..expr.array {
        ty = format!("Vec<{ty}>");
    }
    ty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_from_wire_value() {
        assert_eq!(to_pascal_case("supergroup"), "Supergroup");
        assert_eq!(to_pascal_case("web_app_data"), "WebAppData");
        assert_eq!(to_pascal_case("channel-post"), "ChannelPost");
    }

    #[test]
    fn initialisms_are_uppercased_at_word_boundaries() {
        assert_eq!(to_pascal_case("url"), "URL");
        assert_eq!(to_pascal_case("custom_emoji_id"), "CustomEmojiID");
        assert_eq!(to_pascal_case("ids"), "IDs");
        assert_eq!(to_pascal_case("web_app_data"), "WebAppData");
    }

    #[test]
    fn keyword_escaping() {
        assert_eq!(escape_ident("type"), "r#type");
        assert_eq!(escape_ident("chat_id"), "chat_id");
    }

    #[test]
    fn array_nesting_wraps_vec() {
        let expr = TypeExpr { types: vec![crate::ir::TypeRef::bare("Integer")], array: 2 };
        assert_eq!(type_expr_rust(&expr, |n| n.to_string()), "Vec<Vec<i64>>");
    }
}
