//! Ordered, case-sensitive multi-map of STOMP headers.

use std::slice;

/// The `accept-version` header name.
pub const ACCEPT_VERSION: &str = "accept-version";
/// The `host` header name.
pub const HOST: &str = "host";
/// The `login` header name.
pub const LOGIN: &str = "login";
/// The `passcode` header name.
pub const PASSCODE: &str = "passcode";
/// The `heart-beat` header name.
pub const HEART_BEAT: &str = "heart-beat";
/// The `version` header name.
pub const VERSION: &str = "version";
/// The `session` header name.
pub const SESSION: &str = "session";
/// The `server` header name.
pub const SERVER: &str = "server";
/// The `destination` header name.
pub const DESTINATION: &str = "destination";
/// The `id` header name.
pub const ID: &str = "id";
/// The `ack` header name.
pub const ACK: &str = "ack";
/// The `transaction` header name.
pub const TRANSACTION: &str = "transaction";
/// The `receipt` header name.
pub const RECEIPT: &str = "receipt";
/// The `message-id` header name.
pub const MESSAGE_ID: &str = "message-id";
/// The `subscription` header name.
pub const SUBSCRIPTION: &str = "subscription";
/// The `receipt-id` header name.
pub const RECEIPT_ID: &str = "receipt-id";
/// The `message` header name.
pub const MESSAGE: &str = "message";
/// The `content-length` header name.
pub const CONTENT_LENGTH: &str = "content-length";
/// The `content-type` header name.
pub const CONTENT_TYPE: &str = "content-type";

/// An insertion-ordered multi-map of header name/value pairs.
///
/// Names are case-sensitive: `"Header"` and `"header"` are distinct keys.
/// The same name may appear more than once; single-value lookups return the
/// first occurrence. Iteration yields entries in insertion order, which is
/// also the order the encoder writes them in. Equality is order-independent
/// so frames can be compared for equivalence in tests.
#[derive(Clone, Debug, Default, Eq)]
pub struct StompHeaders {
    entries: Vec<(String, String)>,
}

impl StompHeaders {
    /// Create an empty header map.
    #[must_use]
    pub const fn new() -> Self { Self { entries: Vec::new() } }

    /// Append a header, keeping any existing occurrences of `name`.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replace every occurrence of `name` with a single entry.
    ///
    /// The replacement keeps the position of the first existing occurrence;
    /// a previously absent name is appended.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let Some(first) = self.entries.iter().position(|(n, _)| *n == name) else {
            self.entries.push((name, value));
            return;
        };
        self.entries[first].1 = value;
        let mut index = first + 1;
        while index < self.entries.len() {
            if self.entries[index].0 == name {
                self.entries.remove(index);
            } else {
                index += 1;
            }
        }
    }

    /// First value recorded for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value recorded for `name`, in insertion order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Whether any entry uses `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.entries.iter().any(|(n, _)| n == name) }

    /// Whether an entry with exactly `name` and `value` exists.
    #[must_use]
    pub fn contains_value(&self, name: &str, value: &str) -> bool {
        self.entries.iter().any(|(n, v)| n == name && v == value)
    }

    /// Remove every occurrence of `name`, reporting whether any existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        self.entries.len() != before
    }

    /// Number of entries, counting repeated names once per occurrence.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Iterate over `(name, value)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Raw first value of the `content-length` header, if present.
    ///
    /// Numeric interpretation (including the treatment of unparseable and
    /// negative values) is the decoder's and aggregator's business.
    #[must_use]
    pub fn content_length(&self) -> Option<&str> { self.get(CONTENT_LENGTH) }
}

/// Order-independent equality: both maps hold the same multiset of entries.
impl PartialEq for StompHeaders {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        let mut left: Vec<_> = self.entries.iter().collect();
        let mut right: Vec<_> = other.entries.iter().collect();
        left.sort();
        right.sort();
        left == right
    }
}

impl<'a> IntoIterator for &'a StompHeaders {
    type Item = &'a (String, String);
    type IntoIter = slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter { self.entries.iter() }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for StompHeaders {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}
