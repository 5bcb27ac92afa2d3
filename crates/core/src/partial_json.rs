//! Optimistic JSON Parsing
//!
//! Extracts whatever top-level key/value pairs are already decodable from a
//! JSON object text that may still be streaming in. The parser never fails:
//! truncated input, unterminated strings, dangling escapes, missing closers and
//! trailing commas simply reduce what is extracted.
//!
//! ## Completeness rules
//!
//! A key is reported only once its value can no longer change as more text
//! arrives:
//! - strings once the closing quote is seen (partial strings are withheld)
//! - arrays and objects once the matching closing bracket is seen
//! - numbers and literals once a delimiter (`,` `}` `]` or whitespace) follows
//!
//! Growing the input therefore never removes an extracted key nor changes its
//! value, with one exception: a key repeated later in the object. Duplicate
//! keys resolve to the last complete occurrence, which is what a full
//! `serde_json` decode of the finished text produces, so a second complete
//! occurrence replaces the value reported for the first.

use std::borrow::Cow;
use std::ops::Range;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Best-effort decoded fields of a (possibly incomplete) JSON object text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    pub extracted_values: Map<String, Value>,
}

impl ParseResult {
    /// Whether nothing could be extracted.
    pub fn is_empty(&self) -> bool {
        self.extracted_values.is_empty()
    }

    /// Number of extracted top-level keys.
    pub fn len(&self) -> usize {
        self.extracted_values.len()
    }

    /// Raw value for `key`, if extracted.
    pub fn get(&self, key: &str) -> Option<&Value> {
        get_optimistic_value(&self.extracted_values, key)
    }

    /// Typed value for `key`; `None` when absent or not decodable as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        get_optimistic_as(&self.extracted_values, key)
    }
}

/// Parse a possibly-partial JSON object text.
pub fn parse_optimistic(text: &str) -> ParseResult {
    if text.trim().is_empty() {
        return ParseResult::default();
    }

    // Complete documents take the strict path.
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return ParseResult {
            extracted_values: map,
        };
    }

    // Trailing whitespace is kept: it terminates a number or literal.
    ParseResult {
        extracted_values: scan_object(text.trim_start()),
    }
}

/// Look up a key without any validation beyond presence.
pub fn get_optimistic_value<'a>(values: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    values.get(key)
}

/// Look up a key and deserialize it into `T`.
pub fn get_optimistic_as<T: DeserializeOwned>(values: &Map<String, Value>, key: &str) -> Option<T> {
    values
        .get(key)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

// ============================================================================
// Scanner
// ============================================================================

fn scan_object(text: &str) -> Map<String, Value> {
    let mut values = Map::new();
    let mut scanner = Scanner::new(text);

    scanner.skip_whitespace();
    if !scanner.eat(b'{') {
        return values;
    }

    loop {
        scanner.skip_whitespace();
        match scanner.peek() {
            None | Some(b'}') => break,
            Some(b',') => {
                scanner.pos += 1;
                continue;
            }
            Some(b'"') => {}
            // Unquoted keys or stray structure: nothing after this is trustworthy.
            Some(_) => break,
        }

        let Some(key_span) = scanner.scan_string() else {
            break;
        };
        let Ok(key) = serde_json::from_str::<String>(&text[key_span]) else {
            break;
        };

        scanner.skip_whitespace();
        if !scanner.eat(b':') {
            break;
        }
        scanner.skip_whitespace();

        let Some(value_span) = scanner.scan_value() else {
            break;
        };
        if let Some(value) = decode_value(&text[value_span]) {
            // A repeated key overwrites an earlier reported value. This is the
            // one case where a longer prefix changes an extracted value.
            values.insert(key, value);
        }
    }

    values
}

/// Decode one complete value slice, retrying once with trailing commas removed.
fn decode_value(slice: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(slice) {
        Ok(value) => Some(value),
        Err(_) => match strip_trailing_commas(slice) {
            Cow::Owned(repaired) => serde_json::from_str::<Value>(&repaired).ok(),
            Cow::Borrowed(_) => None,
        },
    }
}

/// Remove commas that directly precede a closing bracket, outside strings.
fn strip_trailing_commas(slice: &str) -> Cow<'_, str> {
    let bytes = slice.as_bytes();
    let mut drop_at = Vec::new();
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == b',' {
            let next = bytes[i + 1..]
                .iter()
                .find(|c| !c.is_ascii_whitespace())
                .copied();
            if matches!(next, Some(b'}') | Some(b']')) {
                drop_at.push(i);
            }
        }
        i += 1;
    }

    if drop_at.is_empty() {
        return Cow::Borrowed(slice);
    }

    let mut repaired = String::with_capacity(slice.len());
    let mut last = 0;
    for idx in drop_at {
        repaired.push_str(&slice[last..idx]);
        last = idx + 1;
    }
    repaired.push_str(&slice[last..]);
    Cow::Owned(repaired)
}

/// Byte-level cursor. JSON structure is pure ASCII, so every index the scanner
/// stops at is a valid char boundary of the source text.
struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Span of the next complete value, or `None` if the input ends inside it.
    fn scan_value(&mut self) -> Option<Range<usize>> {
        match self.peek()? {
            b'"' => self.scan_string(),
            b'{' | b'[' => self.scan_container(),
            _ => self.scan_scalar(),
        }
    }

    /// Expects the cursor on an opening quote.
    fn scan_string(&mut self) -> Option<Range<usize>> {
        let start = self.pos;
        let mut i = start + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    self.pos = i + 1;
                    return Some(start..i + 1);
                }
                _ => i += 1,
            }
        }
        None
    }

    fn scan_container(&mut self) -> Option<Range<usize>> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b'"' => {
                    self.scan_string()?;
                    continue;
                }
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.pos += 1;
                        return Some(start..self.pos);
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        None
    }

    fn scan_scalar(&mut self) -> Option<Range<usize>> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b',' | b'}' | b']') || b.is_ascii_whitespace() {
                return Some(start..self.pos);
            }
            self.pos += 1;
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
