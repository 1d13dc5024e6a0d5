//! The type-cell grammar and the field-level "extras" rules (`Const`,
//! `Enum`) described in `spec.md` §4.1.

use scraper::ElementRef;

use crate::inline::{self, Token};
use crate::ir::{TypeExpr, TypeRef};

const PRIMITIVES: &[&str] = &[
    "Integer", "Integer64", "Float", "String", "Boolean", "True", "False",
];

/// Parses a table cell naming a type (the "Type" column of a field or
/// parameter table, or the return-type prose of a method) into a
/// [`TypeExpr`].
///
/// Grammar, applied in order:
/// 1. Strip any number of leading `"Array of "` prefixes, counting depth.
/// 2. If the remainder contains one or more internal `<a>` links, each
///    becomes an anchored [`TypeRef`]; a lone link followed by `" or
///    <Primitive>"` produces a two-element union with the primitive.
/// 3. Otherwise the remainder is split on `" or "` into bare primitive
///    `TypeRef`s, each normalized (`"Float number"` → `"Float"`).
pub(crate) fn parse_type_cell(cell: ElementRef) -> TypeExpr {
    let tokens = inline::flatten(cell);
    let full_text = inline::plain_text(&tokens);

    let mut remainder = full_text.as_str();
    let mut array = 0u8;
    while let Some(rest) = remainder.strip_prefix("Array of ") {
        array += 1;
        remainder = rest;
    }

    let links: Vec<(String, String)> = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Link { text, href } => Some((text.clone(), href.clone())),
            _ => None,
        })
        .collect();

    if links.is_empty() {
        let types = remainder
            .split(" or ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|tok| TypeRef::bare(normalize_primitive(tok)))
            .collect();
        return TypeExpr { types, array };
    }

    let mut types: Vec<TypeRef> = links
        .iter()
        .map(|(text, href)| match href.strip_prefix('#') {
            Some(anchor) => TypeRef::anchored(text.clone(), anchor.to_string()),
            None => TypeRef::bare(text.clone()),
        })
        .collect();

    if links.len() == 1 {
        if let Some(idx) = remainder.find(" or ") {
            let tail = remainder[idx + " or ".len()..].trim();
            if is_known_primitive(tail) {
                types.push(TypeRef::bare(normalize_primitive(tail)));
            }
        }
    }

    TypeExpr { types, array }
}

fn normalize_primitive(tok: &str) -> String {
    match tok {
        "Float number" => "Float".to_string(),
        other => other.to_string(),
    }
}

fn is_known_primitive(tok: &str) -> bool {
    PRIMITIVES.contains(&tok) || tok == "Float number"
}

/// Rewrites a scalar `Integer` type to `Integer64` when `description`
/// mentions a 52-bit payload, per `spec.md` §4.1.
pub(crate) fn apply_integer64_rule(type_expr: &mut TypeExpr, description: &str) {
    if description.contains("52 significant bits") {
        if let [TypeRef { ty, ref_: None }] = type_expr.types.as_mut_slice() {
            if ty.as_str() == "Integer" {
                *ty = "Integer64".to_string();
            }
        }
    }
}

/// Extracts the `Const` / `Enum` extras from a description cell, per
/// `spec.md` §4.1:
///
/// - `Const`: the description contains `always "<literal>"`, or an `<em>`
///   element is immediately preceded by text ending in `must be`.
/// - `Enum`: the description contains `one of`, `can be`, `currently one
///   of`, `must be one of`, or `can be one of`, followed by two or more
///   quoted tokens.
///
/// The two are mutually exclusive; `Const` takes priority if both patterns
/// somehow match, since a single pinned literal is a degenerate one-value
/// enum that the emitter would reject as redundant.
pub(crate) fn extract_const_and_enum(cell: ElementRef) -> (Option<String>, Vec<String>) {
    let tokens = inline::flatten(cell);
    let plain = inline::plain_text(&tokens);

    if let Some(const_) = extract_always_literal(&plain) {
        return (Some(const_), Vec::new());
    }
    if let Some(const_) = extract_must_be_em(&tokens) {
        return (Some(const_), Vec::new());
    }

    let enum_values = extract_enum_values(&plain);
    (None, enum_values)
}

fn extract_always_literal(plain: &str) -> Option<String> {
    let idx = plain.find("always \"")?;
    let rest = &plain[idx + "always \"".len()..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn extract_must_be_em(tokens: &[Token]) -> Option<String> {
    let mut preceding = String::new();
    for tok in tokens {
        match tok {
            Token::Em(text) => {
                if preceding.trim_end().ends_with("must be") {
                    return Some(text.clone());
                }
                preceding.push_str(text);
            }
            Token::Text(t) => preceding.push_str(t),
            Token::Link { text, .. } => preceding.push_str(text),
            Token::Break => preceding.push(' '),
        }
    }
    None
}

const ENUM_CUES: &[&str] =
    &["currently one of", "must be one of", "can be one of", "one of", "can be"];

fn extract_enum_values(plain: &str) -> Vec<String> {
    let Some(cue_idx) = ENUM_CUES.iter().find_map(|cue| plain.find(cue)) else {
        return Vec::new();
    };
    let tail = &plain[cue_idx..];

    let mut values = Vec::new();
    let mut rest = tail;
    while let Some(start) = rest.find('"') {
        let after_quote = &rest[start + 1..];
        let Some(end) = after_quote.find('"') else { break };
        values.push(after_quote[..end].to_string());
        rest = &after_quote[end + 1..];
    }

    if values.len() >= 2 {
        values
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn parse_cell(fragment: &str) -> scraper::Html {
        Html::parse_fragment(&format!("<table><tr><td>{fragment}</td></tr></table>"))
    }

    fn first_td(doc: &Html) -> ElementRef<'_> {
        let sel = scraper::Selector::parse("td").unwrap();
        doc.select(&sel).next().unwrap()
    }

    #[test]
    fn plain_primitive() {
        let doc = parse_cell("Integer");
        let expr = parse_type_cell(first_td(&doc));
        assert_eq!(expr.array, 0);
        assert_eq!(expr.types, vec![TypeRef::bare("Integer")]);
    }

    #[test]
    fn array_of_array_of_link() {
        let doc = parse_cell(r#"Array of Array of <a href="#messageentity">MessageEntity</a>"#);
        let expr = parse_type_cell(first_td(&doc));
        assert_eq!(expr.array, 2);
        assert_eq!(expr.types, vec![TypeRef::anchored("MessageEntity", "messageentity")]);
    }

    #[test]
    fn primitive_union() {
        let doc = parse_cell("Integer or String");
        let expr = parse_type_cell(first_td(&doc));
        assert_eq!(
            expr.types,
            vec![TypeRef::bare("Integer"), TypeRef::bare("String")]
        );
    }

    #[test]
    fn link_or_primitive_union() {
        let doc = parse_cell(r#"<a href="#inputfile">InputFile</a> or String"#);
        let expr = parse_type_cell(first_td(&doc));
        assert_eq!(
            expr.types,
            vec![TypeRef::anchored("InputFile", "inputfile"), TypeRef::bare("String")]
        );
    }

    #[test]
    fn float_number_normalized() {
        let doc = parse_cell("Float number");
        let expr = parse_type_cell(first_td(&doc));
        assert_eq!(expr.types, vec![TypeRef::bare("Float")]);
    }

    #[test]
    fn enum_values_require_two() {
        assert_eq!(extract_enum_values(r#"can be "private" only"#), Vec::<String>::new());
        assert_eq!(
            extract_enum_values(r#"can be one of "private", "group", "supergroup" or "channel""#),
            vec!["private", "group", "supergroup", "channel"]
        );
    }

    #[test]
    fn always_literal() {
        assert_eq!(
            extract_always_literal(r#"Type of the chat, always "private""#),
            Some("private".to_string())
        );
    }
}
