//! Error types for the update dispatch runtime.
//!
//! One flat enum per §7 error kind, matching the teacher's `RpcError`/
//! `InvocationError` shape (`fmt::Display` + `std::error::Error`, wildcard
//! name matching) but ported from MTProto's `FLOOD_WAIT_n` naming onto the
//! Bot API's `{error_code, description, parameters.retry_after}` shape.

use thiserror::Error;

// ─── TransportError ───────────────────────────────────────────────────────────

/// The error returned from any call that talks to the Telegram Bot API.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Telegram rejected the request (`"ok": false`).
    #[error("RPC {error_code}: {description}")]
    Rpc {
        error_code: i32,
        description: String,
        retry_after: Option<u64>,
    },
    /// Network / I/O failure reaching the Bot API endpoint.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The response body did not deserialize into the expected type.
    #[error("deserialize error: {0}")]
    Deserialize(String),
    /// The request was dropped before a response arrived (e.g. client shut down).
    #[error("request dropped")]
    Dropped,
}

impl TransportError {
    /// Match the error description, with optional wildcard prefix/suffix `'*'`.
    ///
    /// # Examples
    /// - `err.is_rpc("Too Many Requests")` — exact match
    /// - `err.is_rpc("Too Many*")` — starts-with match
    /// - `err.is_rpc("*not found")` — ends-with match
    pub fn is_rpc(&self, pattern: &str) -> bool {
        let Self::Rpc { description, .. } = self else { return false };
        if let Some(prefix) = pattern.strip_suffix('*') {
            description.starts_with(prefix)
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            description.ends_with(suffix)
        } else {
            description == pattern
        }
    }

    /// The `retry_after` hint Telegram attaches to 429 responses, if present.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Rpc { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn rpc(error_code: i32, description: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self::Rpc { error_code, description: description.into(), retry_after }
    }
}

// ─── FilterError ──────────────────────────────────────────────────────────────

/// A filter failed to evaluate (e.g. the command filter's `getMe` lookup
/// could not reach the Bot API).
#[derive(Debug, Error)]
#[error("filter evaluation failed: {0}")]
pub struct FilterError(#[from] pub TransportError);

// ─── HandlerError ─────────────────────────────────────────────────────────────

/// A registered handler returned an error.
#[derive(Debug, Error)]
#[error("handler failed: {0}")]
pub struct HandlerError(pub Box<dyn std::error::Error + Send + Sync + 'static>);

impl HandlerError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}

// ─── CodecError ───────────────────────────────────────────────────────────────

/// The callback payload codec failed to encode or decode a value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Encoded length exceeded the 64-byte Telegram limit.
    #[error("encoded payload too long: {length} bytes (limit 64)")]
    TooLong { length: usize },
    /// The input did not have the expected number of delimited fields.
    #[error("malformed payload: expected {expected} fields, found {found}")]
    Malformed { expected: usize, found: usize },
    /// A field could not be parsed as its declared type.
    #[error("field {index} is not a valid {kind}: {value:?}")]
    UnsupportedField { index: usize, kind: &'static str, value: String },
}

// ─── StoreError ───────────────────────────────────────────────────────────────

/// A session [`crate::session::Store`] backend failed.
#[derive(Debug, Error)]
#[error("session store failed: {0}")]
pub struct StoreError(pub Box<dyn std::error::Error + Send + Sync + 'static>);

impl StoreError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}

// ─── DispatchError ────────────────────────────────────────────────────────────

/// The union of errors that can flow out of the router's dispatch path —
/// whatever an installed error handler ultimately receives.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
