//! Header records and the request/response header sets.
//!
//! # Responsibilities
//! - Keep headers in arrival order inside a `ChunkedList`
//! - Provide first-match and all-matches lookups by lowercase name
//! - Support logical deletion (hash 0) without moving records

use bytes::Bytes;

use crate::hash::hash_key;
use crate::http::list::ChunkedList;

/// One header line.
#[derive(Debug, Clone)]
pub struct Header {
    /// Hash of the lowercase name; 0 marks a deleted record.
    pub hash: u32,
    pub key: Bytes,
    pub lowcase_key: Bytes,
    pub value: Bytes,
}

impl Header {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        let key = key.into();
        let lowcase_key = Bytes::from(key.to_ascii_lowercase());
        let hash = hash_key(&lowcase_key).max(1);
        Self {
            hash,
            key,
            lowcase_key,
            value: value.into(),
        }
    }

    /// Whether the record is live.
    pub fn is_live(&self) -> bool {
        self.hash != 0
    }
}

/// Ordered header storage.
#[derive(Debug, Clone, Default)]
pub struct HeaderList {
    list: ChunkedList<Header>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping arrival order.
    pub fn push(&mut self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        self.list.push(Header::new(key, value));
    }

    /// Logically delete every header with the given name.
    pub fn remove(&mut self, name: &str) -> usize {
        let mut removed = 0;
        for h in self.list.iter_mut() {
            if h.is_live() && h.lowcase_key.eq_ignore_ascii_case(name.as_bytes()) {
                h.hash = 0;
                removed += 1;
            }
        }
        removed
    }

    /// Live headers in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.list.iter().filter(|h| h.is_live())
    }

    /// Every record, deleted ones included.
    pub fn raw(&self) -> &ChunkedList<Header> {
        &self.list
    }

    /// First live header with the given (case-insensitive) name.
    pub fn first(&self, name: &str) -> Option<&Header> {
        self.iter()
            .find(|h| h.lowcase_key.eq_ignore_ascii_case(name.as_bytes()))
    }

    /// All live headers with the given (case-insensitive) name.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Header> + 'a {
        self.iter()
            .filter(move |h| h.lowcase_key.eq_ignore_ascii_case(name.as_bytes()))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Headers received from the client plus values derived while parsing them.
#[derive(Debug, Clone, Default)]
pub struct HeadersIn {
    pub headers: HeaderList,
    /// Host name from the request line or Host header, lowercased, port stripped.
    pub server: Option<Bytes>,
    /// Parsed Content-Length, when present.
    pub content_length_n: Option<u64>,
}

impl HeadersIn {
    pub fn first(&self, name: &str) -> Option<&Header> {
        self.headers.first(name)
    }

    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers.all(name)
    }
}

/// Headers queued for the response.
#[derive(Debug, Clone, Default)]
pub struct HeadersOut {
    pub status: u16,
    pub headers: HeaderList,
    /// Content type chosen by the handler (may differ from a raw header).
    pub content_type: Option<Bytes>,
    pub content_length_n: Option<u64>,
    /// Last-Modified as seconds since the epoch, when no raw header is set.
    pub last_modified_time: Option<i64>,
}

impl HeadersOut {
    pub fn first(&self, name: &str) -> Option<&Header> {
        self.headers.first(name)
    }

    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers.all(name)
    }
}
