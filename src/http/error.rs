// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Error types shared by the HTTP parser, builders and session.

use std::io;

/// A malformed preamble, header, length, or chunk length. Fatal to the
/// connection; the parser does not attempt resynchronization (spec.md §7).
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The request or status line was not `TOKEN SP TOKEN SP TOKEN`.
    #[error("malformed request/status line")]
    MalformedPreamble,
    /// The request line's method token is not one this crate recognizes.
    #[error("unknown method token: {0:?}")]
    UnknownMethod(String),
    /// The status line's code is not a known IANA status code.
    #[error("unknown status code: {0:?}")]
    UnknownStatus(String),
    /// A header line had no `:` separator.
    #[error("malformed header line")]
    MalformedHeader,
    /// The `Content-Length` value was not a valid non-negative integer.
    #[error("invalid Content-Length value")]
    InvalidContentLength,
    /// A chunk-size line was not a valid hexadecimal integer.
    #[error("invalid chunk size line")]
    InvalidChunkSize,
    /// A line ended in a bare `LF` with no preceding `CR`.
    #[error("line terminator must be CRLF; a bare LF is not tolerated")]
    BareLineFeed,
    /// Body bytes exceeded the declared `Content-Length`.
    #[error("body bytes exceeded the declared Content-Length")]
    BodyOverflow,
}

/// Errors surfaced by a running HTTP session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The incoming bytes failed to parse as HTTP.
    #[error("http parse error: {0}")]
    Parse(#[from] ParseError),
    /// An I/O error was encountered.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// A transport read returned zero bytes while a message was in progress.
    #[error("connection reset mid-message")]
    ConnectionReset,
}
