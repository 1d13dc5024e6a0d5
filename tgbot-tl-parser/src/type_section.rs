//! Parses a single classified type section into an [`ir::Type`].

use scraper::{ElementRef, Selector};

use crate::grammar::{self, parse_type_cell};
use crate::inline::{self, paragraph_selector};
use crate::ir::{Field, Type};
use crate::section::select_in_body;

pub(crate) fn parse_type_section(heading: &str, body: &[ElementRef<'_>]) -> Type {
    let description = description_text(body);

    if let Some(table) = select_in_body(body, &table_selector()).into_iter().next() {
        return Type {
            name: heading.to_string(),
            description,
            fields: parse_field_table(table),
            subtypes: Vec::new(),
        };
    }

    if let Some(list) = select_in_body(body, &list_selector()).into_iter().next() {
        return Type {
            name: heading.to_string(),
            description,
            fields: Vec::new(),
            subtypes: parse_subtype_list(list),
        };
    }

    Type { name: heading.to_string(), description, fields: Vec::new(), subtypes: Vec::new() }
}

fn description_text(body: &[ElementRef<'_>]) -> String {
    select_in_body(body, &paragraph_selector())
        .into_iter()
        .map(|p| inline::render_markdown(&inline::flatten(p)))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_field_table(table: ElementRef<'_>) -> Vec<Field> {
    let row_sel = row_selector();
    let cell_sel = cell_selector();
    let header_cell_sel = header_cell_selector();

    let mut fields = Vec::new();
    for row in table.select(&row_sel) {
        if row.select(&header_cell_sel).next().is_some() {
            continue;
        }
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        let [name_cell, type_cell, desc_cell] = cells.as_slice() else { continue };

        let name = inline::plain_text(&inline::flatten(*name_cell));
        let name = name.trim_end_matches(" NEW").trim().to_string();

        let mut type_expr = parse_type_cell(*type_cell);
        let description = inline::plain_text(&inline::flatten(*desc_cell));
        grammar::apply_integer64_rule(&mut type_expr, &description);

        let optional = description.contains("Optional");
        let (const_, enum_values) = grammar::extract_const_and_enum(*desc_cell);

        fields.push(Field { name, type_expr, optional, description, const_, enum_values });
    }
    fields
}

fn parse_subtype_list(list: ElementRef<'_>) -> Vec<String> {
    let item_sel = Selector::parse("li").expect("static selector");
    let link_sel = Selector::parse("a").expect("static selector");

    list.select(&item_sel)
        .filter_map(|li| li.select(&link_sel).next())
        .filter(|a| a.value().attr("href").is_some_and(|h| h.starts_with('#')))
        .map(|a| inline::plain_text(&inline::flatten(a)))
        .collect()
}

fn table_selector() -> Selector {
    Selector::parse("table").expect("static selector")
}

fn list_selector() -> Selector {
    Selector::parse("ul").expect("static selector")
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
