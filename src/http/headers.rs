// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Case-insensitive, order-preserving, multi-valued HTTP header map.

use std::collections::BTreeMap;
use std::fmt;

/// A header field name, compared case-insensitively but displayed as given.
#[derive(Debug, Clone)]
pub struct HeaderName(String);

impl HeaderName {
    /// Build a header name from any string-like input.
    pub fn new(name: impl Into<String>) -> Self {
        HeaderName(name.into())
    }

    /// The original-case field name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl From<&str> for HeaderName {
    fn from(s: &str) -> Self {
        HeaderName::new(s)
    }
}

impl From<String> for HeaderName {
    fn from(s: String) -> Self {
        HeaderName::new(s)
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A case-insensitive, insertion-order-preserving, multi-valued header map.
///
/// Lookup is case-insensitive on the field name (`get("content-length")` sees
/// a header inserted as `Content-Length`); a field may be inserted more than
/// once (`Set-Cookie`, `Sec-WebSocket-Protocol`) and iteration preserves the
/// order values were inserted in.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    // insertion-ordered (name, value, live) triples, exactly as received/added.
    // `live` is false for entries superseded by `set`; they stay in place so
    // unrelated fields keep a stable relative order, but are invisible to
    // lookup and iteration.
    entries: Vec<(HeaderName, String, bool)>,
    // lowercase field name -> indices of its *live* entries into `entries`.
    index: BTreeMap<String, Vec<usize>>,
}

impl Headers {
    /// An empty header map.
    pub fn new() -> Self {
        Headers::default()
    }

    /// Append a header value, preserving any existing values for this field.
    pub fn append(&mut self, name: impl Into<HeaderName>, value: impl Into<String>) {
        let name = name.into();
        let key = name.key();
        let idx = self.entries.len();
        self.entries.push((name, value.into(), true));
        self.index.entry(key).or_default().push(idx);
    }

    /// Set a header, replacing any previously inserted values for this field.
    pub fn set(&mut self, name: impl Into<HeaderName>, value: impl Into<String>) {
        let name = name.into();
        let key = name.key();
        if let Some(idxs) = self.index.remove(&key) {
            for i in idxs {
                self.entries[i].2 = false;
            }
        }
        self.append(name, value);
    }

    /// The first value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name).next()
    }

    /// All values for `name`, in insertion order.
    pub fn values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let key = name.to_ascii_lowercase();
        self.index
            .get(&key)
            .into_iter()
            .flatten()
            .map(move |&i| self.entries[i].1.as_str())
    }

    /// Whether any value for `name` has been set.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether `name`'s value contains `token` as a case-insensitive,
    /// comma/whitespace-delimited substring (used for `Connection: Upgrade`).
    pub fn contains_token(&self, name: &str, token: &str) -> bool {
        self.values(name).any(|v| {
            v.split(|c: char| c == ',' || c.is_whitespace())
                .any(|part| part.eq_ignore_ascii_case(token))
        })
    }

    /// Iterate over every (name, value) pair in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter(|(_, _, live)| *live).map(|(n, v, _)| (n.as_str(), v.as_str()))
    }

    /// Parse every `Cookie` header into a flat name→value map (last write
    /// wins on duplicate cookie names), splitting on `;` then `=` and
    /// trimming surrounding whitespace from both sides.
    pub fn cookies(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for header in self.values("Cookie") {
            for pair in header.split(';') {
                let mut parts = pair.splitn(2, '=');
                let (Some(k), Some(v)) = (parts.next(), parts.next()) else {
                    continue;
                };
                out.insert(k.trim().to_owned(), v.trim().to_owned());
            }
        }
        out
    }
}
