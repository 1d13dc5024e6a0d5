//! Parser for the official [Telegram Bot API] HTML reference page.
//!
//! This crate converts the reference document into a structured [`ir::Api`]
//! — every documented type and method, with table cells parsed into typed
//! [`ir::TypeExpr`]s — which code-generators (see `tgbot-tl-gen`) then turn
//! into Rust source.
//!
//! # Quick start
//!
//! ```rust
//! let html = std::fs::read_to_string("bot-api.html").unwrap_or_default();
//! if let Ok(api) = tgbot_tl_parser::parse_document(&html) {
//!     println!("{} types, {} methods", api.types.len(), api.methods.len());
//! }
//! ```
//!
//! [Telegram Bot API]: https://core.telegram.org/bots/api

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Parse error types.
pub mod errors;
/// The intermediate representation produced by [`parse_document`].
pub mod ir;

mod grammar;
mod inline;
mod method_section;
mod section;
mod type_section;

use scraper::Html;

pub use errors::ParseError;

/// Parses the Telegram Bot API reference page into an [`ir::Api`].
///
/// Walks every `<h4>` heading in the document (see `spec.md` §4.1): a
/// PascalCase heading starts a type section, a camelCase heading starts a
/// method section, anything else (changelog entries, prose headings like
/// "Formatting options") is skipped. Returns [`ParseError::Empty`] if no
/// section of either kind was found, which usually means the input isn't
/// the reference page at all.
///
/// This function does not call [`ir::Api::check_invariants`] — callers that
/// need a validated `Api` should call it explicitly, since a caller
/// generating a diagnostic report may want to inspect an invalid `Api`
/// rather than have it rejected outright.
pub fn parse_document(html: &str) -> Result<ir::Api, ParseError> {
    let document = Html::parse_document(html);

    let mut types = Vec::new();
    let mut methods = Vec::new();
    for section in section::sections(&document) {
        match section.kind {
            section::HeadingKind::Type => {
                types.push(type_section::parse_type_section(&section.heading, &section.body));
            }
            section::HeadingKind::Method => {
                methods.push(method_section::parse_method_section(
                    &section.heading,
                    &section.body,
                ));
            }
            section::HeadingKind::Discard => unreachable!("filtered out by `section::sections`"),
        }
    }

    if types.is_empty() && methods.is_empty() {
        return Err(ParseError::Empty);
    }

    Ok(ir::Api { types, methods })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r##"
        <html><body>
        <h4>User</h4>
        <p>This object represents a Telegram user or bot.</p>
        <table>
            <thead><tr><th>Field</th><th>Type</th><th>Description</th></tr></thead>
            <tbody>
                <tr><td>id</td><td>Integer</td><td>Unique identifier for this user or bot.</td></tr>
                <tr><td>is_bot NEW</td><td>Boolean</td><td>Optional. <em>True</em>, if this user is a bot.</td></tr>
            </tbody>
        </table>
        <h4>getMe</h4>
        <p>A simple method for testing your bot's authentication token. Requires no
        parameters. Returns basic information about the bot in form of a
        <a href="#user">User</a> object.</p>
        <h4>Recent changes</h4>
        <p>Not a type or a method.</p>
        </body></html>
    "##;

    #[test]
    fn splits_types_and_methods() {
        let api = parse_document(FIXTURE).expect("fixture parses");
        assert_eq!(api.types.len(), 1);
        assert_eq!(api.methods.len(), 1);
        assert_eq!(api.types[0].name, "User");
        assert_eq!(api.methods[0].name, "getMe");
    }

    #[test]
    fn strips_new_badge_and_marks_optional() {
        let api = parse_document(FIXTURE).unwrap();
        let is_bot = &api.types[0].fields[1];
        assert_eq!(is_bot.name, "is_bot");
        assert!(is_bot.optional);
    }

    #[test]
    fn derives_method_return_type_from_trailing_link() {
        let api = parse_document(FIXTURE).unwrap();
        assert_eq!(api.methods[0].returns.single(), Some("User"));
    }

    #[test]
    fn empty_document_is_an_error() {
        let err = parse_document("<html><body><h1>Bot API</h1></body></html>").unwrap_err();
        assert!(matches!(err, ParseError::Empty));
    }
}
