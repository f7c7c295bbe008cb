// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Typed extraction of named regex captures into handler arguments.

use std::fmt;

/// A named capture failed to convert to the type a handler asked for.
#[derive(Debug, Clone)]
pub struct ExtractError {
    /// The name of the capture group that failed to convert.
    pub field: String,
    /// The raw string value that failed to convert.
    pub value: String,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capture {:?} = {:?} could not be converted", self.field, self.value)
    }
}

impl std::error::Error for ExtractError {}

/// Converts a single named path capture (always a `&str` on the wire) into
/// a handler's typed parameter.
pub trait FromCapture: Sized {
    /// Convert a capture group's raw text into `Self`.
    fn from_capture(field: &str, value: &str) -> Result<Self, ExtractError>;
}

impl FromCapture for String {
    fn from_capture(_field: &str, value: &str) -> Result<Self, ExtractError> {
        Ok(value.to_owned())
    }
}

macro_rules! from_capture_parse {
    ($($ty:ty),+) => {
        $(
            impl FromCapture for $ty {
                fn from_capture(field: &str, value: &str) -> Result<Self, ExtractError> {
                    value.parse().map_err(|_| ExtractError {
                        field: field.to_owned(),
                        value: value.to_owned(),
                    })
                }
            }
        )+
    };
}

from_capture_parse!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64, bool, std::net::IpAddr);

/// A successful route match: the captured path segments, addressable by the
/// pattern's named groups.
#[derive(Debug, Clone)]
pub struct Captures<'a> {
    inner: regex::Captures<'a>,
}

impl<'a> Captures<'a> {
    pub(super) fn new(inner: regex::Captures<'a>) -> Self {
        Captures { inner }
    }

    /// Fetch and convert a named capture group.
    pub fn get<T: FromCapture>(&self, name: &str) -> Result<T, ExtractError> {
        let value = self.inner.name(name).ok_or_else(|| ExtractError {
            field: name.to_owned(),
            value: String::new(),
        })?;
        T::from_capture(name, value.as_str())
    }

    /// Fetch a named capture group as its raw string slice.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.inner.name(name).map(|m| m.as_str())
    }
}
