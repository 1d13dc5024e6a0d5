//! Splits the reference document into type and method sections by walking
//! its `<h4>` headings, per `spec.md` §4.1.

use scraper::{ElementRef, Html, Selector};

use crate::inline::collapse_ws;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HeadingKind {
    /// `^[A-Z][A-Za-z0-9]+$`, length ≥ 2 — e.g. `"Message"`, `"InputFile"`.
    Type,
    /// `^[a-z][A-Za-z]+$`, length ≥ 2 — e.g. `"sendMessage"`, `"getMe"`.
    Method,
    /// Neither shape — section headings like `"Recent changes"`, `"Formatting
    /// options"` fall here and are skipped.
    Discard,
}

pub(crate) fn classify_heading(text: &str) -> HeadingKind {
    if is_type_heading(text) {
        HeadingKind::Type
    } else if is_method_heading(text) {
        HeadingKind::Method
    } else {
        HeadingKind::Discard
    }
}

fn is_type_heading(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    text.chars().count() >= 2 && text.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_method_heading(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    text.chars().count() >= 2 && text.chars().all(|c| c.is_ascii_alphabetic())
}

/// One `<h4>` heading together with its classification and the element
/// nodes that belong to it (everything up to, but not including, the next
/// `<h3>`/`<h4>`).
pub(crate) struct Section<'a> {
    pub heading: String,
    pub kind: HeadingKind,
    pub body: Vec<ElementRef<'a>>,
}

pub(crate) fn sections(document: &Html) -> Vec<Section<'_>> {
    let heading_sel = Selector::parse("h3, h4").expect("static selector");
    let headings: Vec<ElementRef<'_>> = document.select(&heading_sel).collect();

    let mut out = Vec::new();
    for heading in &headings {
        if heading.value().name() != "h4" {
            continue;
        }
        let text = collapse_ws(&heading.text().collect::<String>());
        let kind = classify_heading(&text);
        if kind == HeadingKind::Discard {
            continue;
        }
        out.push(Section { heading: text, kind, body: collect_body(*heading) });
    }
    out
}

fn collect_body(heading: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut body = Vec::new();
    let mut next = heading.next_sibling();
    while let Some(node) = next {
        if let Some(el) = ElementRef::wrap(node) {
            if matches!(el.value().name(), "h3" | "h4") {
                break;
            }
            body.push(el);
        }
        next = node.next_sibling();
    }
    body
}

/// Selects every element matching `selector` anywhere within a section's
/// body, including the top-level body nodes themselves.
pub(crate) fn select_in_body<'a>(
    body: &[ElementRef<'a>],
    selector: &Selector,
) -> Vec<ElementRef<'a>> {
    let mut out = Vec::new();
    for node in body {
        if selector.matches(node) {
            out.push(*node);
        }
        out.extend(node.select(selector));
    }
    out
}
