//! Callback payload codec (§4.7).
//!
//! Telegram limits `callback_data` to 64 bytes, so structured payloads are
//! packed as delimiter-joined tokens rather than JSON. Booleans as `0`/`1`;
//! integers/unsigneds in a configurable radix (default 36); floats in a
//! configurable precision (default: shortest round-trip representation);
//! strings verbatim. A prefix-scoped variant joins a short literal prefix in
//! front so incoming callback data can be routed before being decoded.

use crate::errors::CodecError;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// One value in a callback payload record, tagged with how to format it.
#[derive(Clone, Debug, PartialEq)]
pub enum CallbackValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
    /// `precision = None` uses the default shortest round-trip rendering.
    Float(f64, Option<usize>),
}

/// The shape a decoded token must take, used to drive [`CallbackCodec::decode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackKind {
    Bool,
    Int,
    UInt,
    Str,
    Float,
}

/// Encodes/decodes a record of [`CallbackValue`]s as delimiter-joined tokens.
#[derive(Clone, Debug)]
pub struct CallbackCodec {
    pub delimiter: char,
    pub radix: u32,
    pub check_length: bool,
}

impl Default for CallbackCodec {
    fn default() -> Self {
        Self { delimiter: ':', radix: 36, check_length: true }
    }
}

impl CallbackCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn radix(mut self, radix: u32) -> Self {
        assert!((2..=36).contains(&radix), "radix must be in 2..=36");
        self.radix = radix;
        self
    }

    pub fn without_length_check(mut self) -> Self {
        self.check_length = false;
        self
    }

    /// Encode `values` into a single `callback_data` string.
    pub fn encode(&self, values: &[CallbackValue]) -> Result<String, CodecError> {
        let tokens: Vec<String> = values.iter().map(|v| self.encode_one(v)).collect();
        let joined = tokens.join(&self.delimiter.to_string());
        if self.check_length && joined.len() > 64 {
            return Err(CodecError::TooLong { length: joined.len() });
        }
        Ok(joined)
    }

    /// Decode `data` according to `schema`, one [`CallbackKind`] per field in order.
    pub fn decode(&self, schema: &[CallbackKind], data: &str) -> Result<Vec<CallbackValue>, CodecError> {
        let tokens: Vec<&str> = data.split(self.delimiter).collect();
        if tokens.len() != schema.len() {
            return Err(CodecError::Malformed { expected: schema.len(), found: tokens.len() });
        }
        tokens
            .iter()
            .zip(schema)
            .enumerate()
            .map(|(index, (token, kind))| self.decode_one(index, token, *kind))
            .collect()
    }

    fn encode_one(&self, value: &CallbackValue) -> String {
        match value {
            CallbackValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            CallbackValue::Int(n) => int_to_radix(*n, self.radix),
            CallbackValue::UInt(n) => uint_to_radix(*n, self.radix),
            CallbackValue::Str(s) => s.clone(),
            CallbackValue::Float(f, precision) => match precision {
                Some(p) => format!("{f:.p$}"),
                None => format!("{f}"),
            },
        }
    }

    fn decode_one(&self, index: usize, token: &str, kind: CallbackKind) -> Result<CallbackValue, CodecError> {
        let unsupported = |kind_name| CodecError::UnsupportedField {
            index,
            kind: kind_name,
            value: token.to_string(),
        };
        match kind {
            CallbackKind::Bool => match token {
                "1" => Ok(CallbackValue::Bool(true)),
                "0" => Ok(CallbackValue::Bool(false)),
                _ => Err(unsupported("bool")),
            },
            CallbackKind::Int => i64::from_str_radix(token, self.radix)
                .map(CallbackValue::Int)
                .map_err(|_| unsupported("int")),
            CallbackKind::UInt => u64::from_str_radix(token, self.radix)
                .map(CallbackValue::UInt)
                .map_err(|_| unsupported("uint")),
            CallbackKind::Str => Ok(CallbackValue::Str(token.to_string())),
            CallbackKind::Float => token
                .parse::<f64>()
                .map(|f| CallbackValue::Float(f, None))
                .map_err(|_| unsupported("float")),
        }
    }
}

fn int_to_radix(value: i64, radix: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let neg = value < 0;
    let mut n = value.unsigned_abs();
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % radix as u64) as usize]);
        n /= radix as u64;
    }
    if neg {
        buf.push(b'-');
    }
    buf.reverse();
    String::from_utf8(buf).expect("radix digits are ASCII")
}

fn uint_to_radix(value: u64, radix: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut n = value;
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % radix as u64) as usize]);
        n /= radix as u64;
    }
    buf.reverse();
    String::from_utf8(buf).expect("radix digits are ASCII")
}

/// Pairs a [`CallbackCodec`] with a short literal prefix so incoming
/// `callback_data` can be routed by prefix before being decoded.
#[derive(Clone, Debug)]
pub struct PrefixedCodec {
    pub prefix: String,
    pub codec: CallbackCodec,
}

impl PrefixedCodec {
    pub fn new(prefix: impl Into<String>, codec: CallbackCodec) -> Self {
        Self { prefix: prefix.into(), codec }
    }

    pub fn encode(&self, values: &[CallbackValue]) -> Result<String, CodecError> {
        let body = self.codec.encode(values)?;
        let joined = format!("{}{}{}", self.prefix, self.codec.delimiter, body);
        if self.codec.check_length && joined.len() > 64 {
            return Err(CodecError::TooLong { length: joined.len() });
        }
        Ok(joined)
    }

    /// `None` if `data` does not start with this codec's prefix.
    pub fn decode(&self, schema: &[CallbackKind], data: &str) -> Option<Result<Vec<CallbackValue>, CodecError>> {
        let expected = format!("{}{}", self.prefix, self.codec.delimiter);
        let rest = data.strip_prefix(&expected)?;
        Some(self.codec.decode(schema, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_and_string_round_trip() {
        let codec = CallbackCodec::default();
        let values = vec![CallbackValue::Bool(true), CallbackValue::Str("xyz".into())];
        let encoded = codec.encode(&values).unwrap();
        let decoded = codec.decode(&[CallbackKind::Bool, CallbackKind::Str], &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn signed_and_unsigned_ints_round_trip_in_base36() {
        let codec = CallbackCodec::default();
        let values = vec![CallbackValue::Int(-1_234_567_890), CallbackValue::UInt(1_234_567_890)];
        let encoded = codec.encode(&values).unwrap();
        let decoded = codec
            .decode(&[CallbackKind::Int, CallbackKind::UInt], &encoded)
            .unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn float_with_explicit_precision_formats_and_parses() {
        let codec = CallbackCodec::default();
        let values = vec![CallbackValue::Float(123.456, Some(2))];
        let encoded = codec.encode(&values).unwrap();
        assert_eq!(encoded, "123.46");
        let decoded = codec.decode(&[CallbackKind::Float], &encoded).unwrap();
        assert_eq!(decoded, vec![CallbackValue::Float(123.46, None)]);
    }

    #[test]
    fn encoding_over_64_bytes_fails_with_actual_length() {
        let codec = CallbackCodec::default();
        let long_string = "x".repeat(80);
        let values = vec![CallbackValue::Str(long_string.clone())];
        let err = codec.encode(&values).unwrap_err();
        assert_eq!(err, CodecError::TooLong { length: 80 });
    }

    #[test]
    fn length_check_can_be_disabled() {
        let codec = CallbackCodec::default().without_length_check();
        let values = vec![CallbackValue::Str("x".repeat(80))];
        assert!(codec.encode(&values).is_ok());
    }

    #[test]
    fn decode_rejects_wrong_field_count() {
        let codec = CallbackCodec::default();
        let err = codec.decode(&[CallbackKind::Bool, CallbackKind::Str], "1").unwrap_err();
        assert_eq!(err, CodecError::Malformed { expected: 2, found: 1 });
    }

    #[test]
    fn prefixed_codec_routes_and_decodes() {
        let prefixed = PrefixedCodec::new("noop", CallbackCodec::default());
        let encoded = prefixed.encode(&[CallbackValue::Int(1)]).unwrap();
        assert_eq!(encoded, "noop:1");
        assert!(PrefixedCodec::new("other", CallbackCodec::default())
            .decode(&[CallbackKind::Int], &encoded)
            .is_none());
        let decoded = prefixed.decode(&[CallbackKind::Int], &encoded).unwrap().unwrap();
        assert_eq!(decoded, vec![CallbackValue::Int(1)]);
    }
}
