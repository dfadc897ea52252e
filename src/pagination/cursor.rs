//! Locates `pageInfo { hasNextPage endCursor }` in a GraphQL response body
//! without decoding it into a typed structure.
//!
//! `serde_json` drives a visitor over the document. The visitor keeps its own
//! stack of open containers so it knows when a key sits directly inside a
//! `pageInfo` object, and it stops the parse once both values are known.

use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use tracing::debug;

/// Pagination state of one GraphQL page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

impl PageState {
    /// Cursor for the following page, if there is one.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_next_page {
            self.end_cursor.as_deref()
        } else {
            None
        }
    }
}

/// The only object keys the scan cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    PageInfo,
    HasNextPage,
    EndCursor,
    Other,
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = Key;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
                Ok(match v {
                    "pageInfo" => Key::PageInfo,
                    "hasNextPage" => Key::HasNextPage,
                    "endCursor" => Key::EndCursor,
                    _ => Key::Other,
                })
            }
        }

        deserializer.deserialize_identifier(KeyVisitor)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Array,
    Object { page_info: bool },
}

const FOUND: &str = "page info found";

#[derive(Debug, Default)]
struct Scanner {
    stack: Vec<Frame>,
    has_next_page: Option<bool>,
    /// `Some(None)` records an explicit `null` cursor.
    end_cursor: Option<Option<String>>,
}

impl Scanner {
    fn in_page_info(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Object { page_info: true }))
    }

    fn complete(&self) -> bool {
        self.has_next_page.is_some() && self.end_cursor.is_some()
    }

    /// Abort the parse once there is nothing left to look for.
    fn stop_if_complete<E: de::Error>(&self) -> Result<(), E> {
        if self.complete() {
            Err(E::custom(FOUND))
        } else {
            Ok(())
        }
    }

    fn scalar<E: de::Error>(&mut self, key: Key, value: Scalar<'_>) -> Result<(), E> {
        if !self.in_page_info() {
            return Ok(());
        }
        match (key, value) {
            (Key::HasNextPage, Scalar::Bool(b)) => self.has_next_page = Some(b),
            (Key::EndCursor, Scalar::Str(s)) => self.end_cursor = Some(Some(s.to_string())),
            (Key::EndCursor, Scalar::Null) => self.end_cursor = Some(None),
            _ => return Ok(()),
        }
        self.stop_if_complete()
    }
}

enum Scalar<'a> {
    Bool(bool),
    Str(&'a str),
    Null,
    Other,
}

/// Scans one JSON value sitting under `key` in its parent.
struct ScanValue<'s> {
    scanner: &'s mut Scanner,
    key: Key,
}

impl<'de> DeserializeSeed<'de> for ScanValue<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ScanValue<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<(), E> {
        self.scanner.scalar(self.key, Scalar::Bool(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<(), E> {
        self.scanner.scalar(self.key, Scalar::Str(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        self.scanner.scalar(self.key, Scalar::Null)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<(), E> {
        self.scanner.scalar(self.key, Scalar::Other)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<(), E> {
        self.scanner.scalar(self.key, Scalar::Other)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<(), E> {
        self.scanner.scalar(self.key, Scalar::Other)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let scanner = self.scanner;
        scanner.stack.push(Frame::Array);
        while seq
            .next_element_seed(ScanValue {
                scanner: &mut *scanner,
                key: Key::Other,
            })?
            .is_some()
        {}
        scanner.stack.pop();
        Ok(())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let scanner = self.scanner;
        scanner.stack.push(Frame::Object {
            page_info: self.key == Key::PageInfo,
        });
        while let Some(key) = map.next_key::<Key>()? {
            map.next_value_seed(ScanValue {
                scanner: &mut *scanner,
                key,
            })?;
        }
        scanner.stack.pop();
        Ok(())
    }
}

/// Scan `body` for the first `pageInfo` object and report its cursor state.
/// Malformed input yields whatever was found before the bad byte.
pub fn scan_page_info(body: &[u8]) -> PageState {
    let mut scanner = Scanner::default();
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    let seed = ScanValue {
        scanner: &mut scanner,
        key: Key::Other,
    };

    if let Err(e) = seed.deserialize(&mut deserializer) {
        if !scanner.complete() {
            debug!(error = %e, "malformed response while scanning for pageInfo");
        }
    }

    PageState {
        has_next_page: scanner.has_next_page.unwrap_or(false),
        end_cursor: scanner.end_cursor.flatten(),
    }
}
