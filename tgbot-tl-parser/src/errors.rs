//! Error types for parsing the Bot API reference document.

/// Errors produced while parsing the reference HTML page.
///
/// Per `spec.md` §4.1 "Failure semantics": unrecognized markup is skipped,
/// not an error. This type only surfaces the case the parser cannot recover
/// from at all.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The document contained no recognizable type or method sections at all.
    #[error("no type or method sections found — is this the Bot API reference page?")]
    Empty,
    /// The document could not be parsed as HTML (malformed beyond recovery).
    #[error("malformed HTML document: {0}")]
    MalformedHtml(String),
}
