//! Parses a single classified method section into an [`ir::Method`].

use scraper::{ElementRef, Selector};

use crate::grammar::parse_type_cell;
use crate::inline::{self, paragraph_selector, Token};
use crate::ir::{Method, Param, TypeExpr, TypeRef};
use crate::section::select_in_body;

pub(crate) fn parse_method_section(heading: &str, body: &[ElementRef<'_>]) -> Method {
    let paragraphs = select_in_body(body, &paragraph_selector());
    let paragraph_tokens: Vec<Vec<Token>> = paragraphs.iter().map(|p| inline::flatten(*p)).collect();

    let description = paragraph_tokens.iter().flat_map(|toks| inline::split_lines(toks)).collect();

    let flat: Vec<Token> = paragraph_tokens.into_iter().flatten().collect();
    let returns = derive_return_type(&flat);

    let params = select_in_body(body, &table_selector())
        .into_iter()
        .next()
        .map(parse_param_table)
        .unwrap_or_default();

    Method { name: heading.to_string(), description, params, returns }
}

/// Implements the return-type rule from `spec.md` §4.1, checked in order:
/// 1. the description says the call returns `True`;
/// 2. otherwise the last internal link naming a type, with array depth read
///    from the `"Array of "` prefixes immediately preceding it;
/// 3. otherwise the last italicised PascalCase token;
/// 4. otherwise no declared return type.
fn derive_return_type(tokens: &[Token]) -> TypeExpr {
    let lower = inline::plain_text(tokens).to_ascii_lowercase();
    if lower.contains("returns true") || lower.contains("true is returned") {
        return TypeExpr::scalar("True");
    }

    let mut running = String::new();
    let mut last_link: Option<(String, String, u8)> = None;
    for tok in tokens {
        match tok {
            Token::Link { text, href } => {
                if let Some(anchor) = href.strip_prefix('#') {
                    if is_pascal_case(text) {
                        last_link = Some((text.clone(), anchor.to_string(), trailing_array_depth(&running)));
                    }
                }
                running.push_str(text);
                running.push(' ');
            }
            Token::Text(t) => {
                running.push_str(t);
                running.push(' ');
            }
            Token::Em(_) | Token::Break => {}
        }
    }
    if let Some((text, anchor, array)) = last_link {
        return TypeExpr { types: vec![TypeRef::anchored(text, anchor)], array };
    }

    let last_em = tokens.iter().rev().find_map(|t| match t {
        Token::Em(text) if is_pascal_case(text) => Some(text.clone()),
        _ => None,
    });
    match last_em {
        Some(text) => TypeExpr::scalar(text),
        None => TypeExpr::default(),
    }
}

fn trailing_array_depth(running: &str) -> u8 {
    let mut rest = running.trim_end();
    let mut depth = 0u8;
    while let Some(stripped) = rest.strip_suffix("Array of") {
        depth += 1;
        rest = stripped.trim_end();
    }
    depth
}

fn is_pascal_case(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn parse_param_table(table: ElementRef<'_>) -> Vec<Param> {
    let row_sel = row_selector();
    let cell_sel = cell_selector();
    let header_cell_sel = header_cell_selector();

    let mut params = Vec::new();
    for row in table.select(&row_sel) {
        if row.select(&header_cell_sel).next().is_some() {
            continue;
        }
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        let [name_cell, type_cell, required_cell, desc_cell] = cells.as_slice() else { continue };

        let name = inline::plain_text(&inline::flatten(*name_cell));
        let type_expr = parse_type_cell(*type_cell);
        let required = inline::plain_text(&inline::flatten(*required_cell)) == "Yes";
        let description = inline::plain_text(&inline::flatten(*desc_cell));
        let default = extract_default(&description);

        params.push(Param {
            name,
            type_expr,
            required,
            description,
            const_: None,
            enum_values: Vec::new(),
            default,
        });
    }
    params
}

fn extract_default(description: &str) -> Option<String> {
    const CUE: &str = "Defaults to ";
    let idx = description.find(CUE)?;
    let rest = &description[idx + CUE.len()..];
    let end = rest.find(['.', ',', ';']).unwrap_or(rest.len());
    let token = rest[..end].trim().trim_matches(|c| c == '"' || c == '`' || c == '\'');
    (!token.is_empty()).then(|| token.to_string())
}

fn table_selector() -> Selector {
    Selector::parse("table").expect("static selector")
}

fn row_selector() -> Selector {
    Selector::parse("tr").expect("static selector")
}

fn cell_selector() -> Selector {
    Selector::parse("td").expect("static selector")
}

fn header_cell_selector() -> Selector {
    Selector::parse("th").expect("static selector")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_true_phrase_wins() {
        let tokens = vec![Token::Text("On success, returns True.".to_string())];
        assert_eq!(derive_return_type(&tokens), TypeExpr::scalar("True"));
    }

    #[test]
    fn last_internal_link_with_array_depth() {
        let tokens = vec![
            Token::Text("On success, returns Array of Array of".to_string()),
            Token::Link { text: "Update".to_string(), href: "#update".to_string() },
            Token::Text("objects.".to_string()),
        ];
        let expr = derive_return_type(&tokens);
        assert_eq!(expr.array, 2);
        assert_eq!(expr.types, vec![TypeRef::anchored("Update", "update")]);
    }

    #[test]
    fn default_extraction_strips_punctuation() {
        assert_eq!(
            extract_default("Sequential number of the first update. Defaults to 0."),
            Some("0".to_string())
        );
    }
}
