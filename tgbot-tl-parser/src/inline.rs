//! Flattening of inline HTML markup (links, emphasis, line breaks) into a
//! token stream, shared by the type-section and method-section parsers.
//!
//! The reference page encodes several structural signals inline — a `must
//! be` phrase followed by an `<em>`, an internal `<a>` naming a type, a
//! `<br>` separating two paragraph lines — that plain `.text()` extraction
//! throws away. Everything downstream (const/enum detection, return-type
//! derivation, per-line descriptions) walks this token stream instead of the
//! raw `ElementRef`.

use scraper::node::Node;
use scraper::{ElementRef, Selector};

/// One inline run extracted from a paragraph-like element, in document order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    /// A run of plain text (whitespace-collapsed).
    Text(String),
    /// An `<a>` element: visible text plus its `href` attribute verbatim.
    Link { text: String, href: String },
    /// An `<em>` or `<i>` element's visible text.
    Em(String),
    /// A `<br>` line break.
    Break,
}

/// Recursively flattens `el`'s children into a [`Token`] stream.
///
/// `<code>`, `<strong>`, and other inline wrappers we don't special-case are
/// flattened through transparently — their children are visited as if the
/// wrapper weren't there.
pub(crate) fn flatten(el: ElementRef) -> Vec<Token> {
    let mut out = Vec::new();
    flatten_into(el, &mut out);
    out
}

fn flatten_into(el: ElementRef, out: &mut Vec<Token>) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let collapsed = collapse_ws(text);
                if !collapsed.is_empty() {
                    out.push(Token::Text(collapsed));
                }
            }
            Node::Element(elem) => {
                let Some(child_ref) = ElementRef::wrap(child) else { continue };
                match elem.name() {
                    "a" => out.push(Token::Link {
                        text: collapse_ws(&child_ref.text().collect::<String>()),
                        href: elem.attr("href").unwrap_or_default().to_string(),
                    }),
                    "em" | "i" => {
                        out.push(Token::Em(collapse_ws(&child_ref.text().collect::<String>())))
                    }
                    "br" => out.push(Token::Break),
                    _ => flatten_into(child_ref, out),
                }
            }
            _ => {}
        }
    }
}

/// Collapses runs of ASCII whitespace (including newlines) into single
/// spaces and trims the ends, the way a browser would render inline text.
pub(crate) fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true; // swallow leading whitespace
    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Renders a token stream as the plain concatenated text a reader would see,
/// with `<br>` collapsed to a single space. Used for substring checks like
/// `"Optional"` / `"always \""` / `"Defaults to "`.
pub(crate) fn plain_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        match tok {
            Token::Text(t) => push_joined(&mut out, t),
            Token::Link { text, .. } => push_joined(&mut out, text),
            Token::Em(t) => push_joined(&mut out, t),
            Token::Break => push_joined(&mut out, ""),
        }
    }
    out
}

fn push_joined(out: &mut String, s: &str) {
    if !out.is_empty() && !out.ends_with(' ') && !s.is_empty() {
        out.push(' ');
    }
    out.push_str(s);
}

/// Renders a token stream as Markdown, with internal anchors (`href`
/// starting with `#`) rewritten to absolute URLs against the reference page.
pub(crate) fn render_markdown(tokens: &[Token]) -> String {
    const BASE: &str = "https://core.telegram.org/bots/api";
    let mut out = String::new();
    for tok in tokens {
        let piece = match tok {
            Token::Text(t) => t.clone(),
            Token::Em(t) => t.clone(),
            Token::Break => continue,
            Token::Link { text, href } => {
                let url = if let Some(anchor) = href.strip_prefix('#') {
                    format!("{BASE}#{anchor}")
                } else {
                    href.clone()
                };
                format!("[{text}]({url})")
            }
        };
        push_joined(&mut out, &piece);
    }
    out
}

/// Splits a paragraph's tokens into lines at each [`Token::Break`], the way
/// `spec.md` §4.1 describes method descriptions being built: "split at
/// `<br>` into a separate entry".
pub(crate) fn split_lines(tokens: &[Token]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for tok in tokens {
        match tok {
            Token::Break => {
                let line = plain_text(&current);
                if !line.is_empty() {
                    lines.push(line);
                }
                current.clear();
            }
            other => current.push(other.clone()),
        }
    }
    let line = plain_text(&current);
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

pub(crate) fn paragraph_selector() -> Selector {
    Selector::parse("p, blockquote").expect("static selector")
}
