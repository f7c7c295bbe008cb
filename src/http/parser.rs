// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! An incremental HTTP/1.1 parser that tolerates arbitrary input fragmentation.
//!
//! Grounded on `g6::http::parser` (original_source/include/g6/http/parser.hpp):
//! a `{preamble, header, body, done}` state machine fed one byte span at a
//! time, delivering body bytes through a callback instead of buffering them.

use super::error::ParseError;
use super::headers::Headers;
use super::method::Method;
use super::status::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Preamble,
    Header,
    Body,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    Size,
    Data { remaining: u64 },
    TrailingCrlf,
    FinalCrlf,
}

/// The preamble of a parsed HTTP message: either a request line or a status
/// line, depending on `IS_REQUEST`.
#[derive(Debug, Clone, Default)]
struct Preamble {
    method: Option<Method>,
    status: Option<Status>,
    /// Request path, or the response's reason phrase.
    path_or_reason: String,
    protocol_version: String,
}

/// An incremental, single-message HTTP/1.1 parser.
///
/// `IS_REQUEST = true` parses a request (`METHOD SP PATH SP VERSION`);
/// `IS_REQUEST = false` parses a response (`VERSION SP CODE SP REASON`).
/// Feed it successive byte fragments with [`Parser::feed`]; it is correct
/// for any partitioning of the input, including single-byte fragments and
/// fragments that split a `CRLF` across the boundary.
#[derive(Debug)]
pub struct Parser<const IS_REQUEST: bool> {
    state: State,
    preamble: Preamble,
    headers: Headers,
    has_content_length: bool,
    is_chunked: bool,
    remaining_bytes: u64,
    chunk_state: ChunkState,
    /// Scratch buffer accumulating the current line across `feed` calls.
    line: Vec<u8>,
}

/// An `HTTP/1.1` request parser.
pub type RequestParser = Parser<true>;
/// An `HTTP/1.1` response parser.
pub type ResponseParser = Parser<false>;

impl<const IS_REQUEST: bool> Default for Parser<IS_REQUEST> {
    fn default() -> Self {
        Parser {
            state: State::Preamble,
            preamble: Preamble::default(),
            headers: Headers::new(),
            has_content_length: false,
            is_chunked: false,
            remaining_bytes: 0,
            chunk_state: ChunkState::Size,
            line: Vec::new(),
        }
    }
}

impl<const IS_REQUEST: bool> Parser<IS_REQUEST> {
    /// A fresh parser, ready to parse a new message from the start.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the parser to parse a new message, discarding all prior state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Is the message fully parsed?
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// The request method. Only meaningful once the preamble has parsed.
    pub fn method(&self) -> Option<Method> {
        self.preamble.method
    }

    /// The request path. Only meaningful once the preamble has parsed.
    pub fn path(&self) -> &str {
        &self.preamble.path_or_reason
    }

    /// The response status. Only meaningful once the preamble has parsed.
    pub fn status(&self) -> Option<Status> {
        self.preamble.status
    }

    /// The response's reason phrase as received on the wire (may differ
    /// from the canonical phrase associated with the status code).
    pub fn reason(&self) -> &str {
        &self.preamble.path_or_reason
    }

    /// The protocol version token, e.g. `HTTP/1.1`.
    pub fn protocol_version(&self) -> &str {
        &self.preamble.protocol_version
    }

    /// The parsed header map.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Feed a fragment of the message, returning the number of leading bytes
    /// of `input` that were consumed. Check [`Parser::is_done`] afterwards:
    /// once the full message (preamble + headers + body) has been parsed,
    /// any bytes past the returned count belong to whatever follows this
    /// message on the wire (the next response, or the first bytes of an
    /// upgraded protocol) and must not be discarded. Calling this again
    /// after completion is a no-op that consumes nothing.
    pub fn feed(
        &mut self,
        input: &[u8],
        mut on_body: impl FnMut(&[u8]),
    ) -> Result<usize, ParseError> {
        if self.state == State::Done {
            return Ok(0);
        }
        let original_len = input.len();
        let mut input = input;

        // RFC 2616 §4.1 tolerance: skip leading CRLFs before the preamble.
        while self.state == State::Preamble && self.line.is_empty() && input.starts_with(b"\r\n") {
            input = &input[2..];
        }

        while !input.is_empty() && self.state != State::Done {
            match self.state {
                State::Preamble | State::Header => {
                    input = self.advance_line(input)?;
                }
                State::Body => {
                    input = self.advance_body(input, &mut on_body)?;
                }
                State::Done => unreachable!(),
            }
        }

        Ok(original_len - input.len())
    }

    /// Consume bytes up to and including the next `CRLF`, dispatching the
    /// completed line; returns the unconsumed remainder of `input`.
    fn advance_line<'a>(&mut self, input: &'a [u8]) -> Result<&'a [u8], ParseError> {
        for (i, &b) in input.iter().enumerate() {
            if b == b'\n' {
                if self.line.last() != Some(&b'\r') {
                    return Err(ParseError::BareLineFeed);
                }
                self.line.pop();
                let line = std::mem::take(&mut self.line);
                let line = String::from_utf8(line).map_err(|_| ParseError::MalformedHeader)?;
                match self.state {
                    State::Preamble => self.accept_preamble(&line)?,
                    State::Header => self.accept_header_line(&line)?,
                    _ => unreachable!(),
                }
                return Ok(&input[i + 1..]);
            }
            self.line.push(b);
        }
        Ok(&[])
    }

    fn accept_preamble(&mut self, line: &str) -> Result<(), ParseError> {
        if line.is_empty() {
            // Tolerate a stray leading blank line (RFC 2616 §4.1).
            return Ok(());
        }
        let mut parts = line.splitn(3, ' ');
        let (Some(a), Some(b), Some(c)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseError::MalformedPreamble);
        };
        if IS_REQUEST {
            let method = Method::parse(a).ok_or_else(|| ParseError::UnknownMethod(a.to_owned()))?;
            self.preamble.method = Some(method);
            self.preamble.path_or_reason = b.to_owned();
            self.preamble.protocol_version = c.to_owned();
        } else {
            let code: u16 = b.parse().map_err(|_| ParseError::MalformedPreamble)?;
            let status =
                Status::from_code(code).ok_or_else(|| ParseError::UnknownStatus(b.to_owned()))?;
            self.preamble.protocol_version = a.to_owned();
            self.preamble.status = Some(status);
            self.preamble.path_or_reason = c.to_owned();
        }
        self.state = State::Header;
        Ok(())
    }

    fn accept_header_line(&mut self, line: &str) -> Result<(), ParseError> {
        if line.is_empty() {
            self.state = self.start_body();
            return Ok(());
        }
        let idx = line.find(':').ok_or(ParseError::MalformedHeader)?;
        let field = &line[..idx];
        let value = line[idx + 1..].trim();
        if field.eq_ignore_ascii_case("content-length") {
            let len: u64 = value.parse().map_err(|_| ParseError::InvalidContentLength)?;
            self.has_content_length = true;
            self.remaining_bytes = len;
        } else if field.eq_ignore_ascii_case("transfer-encoding")
            && value.eq_ignore_ascii_case("chunked")
        {
            self.is_chunked = true;
        }
        self.headers.append(field, value);
        Ok(())
    }

    fn start_body(&mut self) -> State {
        if self.is_chunked {
            self.chunk_state = ChunkState::Size;
            State::Body
        } else if self.has_content_length && self.remaining_bytes > 0 {
            State::Body
        } else {
            State::Done
        }
    }

    fn advance_body<'a>(
        &mut self,
        input: &'a [u8],
        on_body: &mut impl FnMut(&[u8]),
    ) -> Result<&'a [u8], ParseError> {
        if self.is_chunked {
            self.advance_chunked_body(input, on_body)
        } else {
            self.advance_fixed_body(input, on_body)
        }
    }

    fn advance_fixed_body<'a>(
        &mut self,
        input: &'a [u8],
        on_body: &mut impl FnMut(&[u8]),
    ) -> Result<&'a [u8], ParseError> {
        let take = usize::try_from(self.remaining_bytes).unwrap_or(usize::MAX).min(input.len());
        if take > 0 {
            on_body(&input[..take]);
            self.remaining_bytes -= take as u64;
        }
        if self.remaining_bytes == 0 {
            self.state = State::Done;
        }
        let rest = &input[take..];
        if self.state == State::Done && !rest.is_empty() {
            // Any further bytes for this message while `done` would be a
            // surplus beyond the declared length.
            return Err(ParseError::BodyOverflow);
        }
        Ok(rest)
    }

    fn advance_chunked_body<'a>(
        &mut self,
        mut input: &'a [u8],
        on_body: &mut impl FnMut(&[u8]),
    ) -> Result<&'a [u8], ParseError> {
        loop {
            match self.chunk_state {
                ChunkState::Size => {
                    return self.advance_chunk_size_lines(input);
                }
                ChunkState::Data { remaining } => {
                    let take = usize::try_from(remaining).unwrap_or(usize::MAX).min(input.len());
                    if take > 0 {
                        on_body(&input[..take]);
                        input = &input[take..];
                    }
                    let remaining = remaining - take as u64;
                    if remaining == 0 {
                        self.chunk_state = ChunkState::TrailingCrlf;
                    } else {
                        self.chunk_state = ChunkState::Data { remaining };
                        return Ok(input);
                    }
                }
                ChunkState::TrailingCrlf | ChunkState::FinalCrlf => {
                    return self.advance_chunk_crlf(input);
                }
            }
            if input.is_empty() {
                return Ok(input);
            }
        }
    }

    /// Consume the bare `CRLF` that follows chunk data (or the final chunk),
    /// one line-scan at a time so it tolerates being split across `feed`
    /// calls.
    fn advance_chunk_crlf<'a>(&mut self, input: &'a [u8]) -> Result<&'a [u8], ParseError> {
        for (i, &b) in input.iter().enumerate() {
            if b == b'\n' {
                if self.line.last() != Some(&b'\r') {
                    return Err(ParseError::BareLineFeed);
                }
                self.line.pop();
                if !self.line.is_empty() {
                    self.line.clear();
                    return Err(ParseError::InvalidChunkSize);
                }
                let was_final = self.chunk_state == ChunkState::FinalCrlf;
                self.chunk_state = ChunkState::Size;
                if was_final {
                    self.state = State::Done;
                    return Ok(&input[i + 1..]);
                }
                return self.advance_chunk_size_lines(&input[i + 1..]);
            }
            self.line.push(b);
        }
        Ok(&[])
    }

    /// Like `advance_line`, but routes completed lines to the chunk-size
    /// parser instead of the header parser.
    fn advance_chunk_size_lines<'a>(&mut self, input: &'a [u8]) -> Result<&'a [u8], ParseError> {
        let mut input = input;
        loop {
            let mut found = None;
            for (i, &b) in input.iter().enumerate() {
                if b == b'\n' {
                    found = Some(i);
                    break;
                }
                self.line.push(b);
            }
            let Some(i) = found else { return Ok(&[]) };
            if self.line.last() != Some(&b'\r') {
                return Err(ParseError::BareLineFeed);
            }
            self.line.pop();
            let line = std::mem::take(&mut self.line);
            let line = String::from_utf8(line).map_err(|_| ParseError::InvalidChunkSize)?;
            // A chunk-size line may carry `;`-delimited extensions; only the
            // hex length prefix is meaningful here.
            let size_token = line.split(';').next().unwrap_or("");
            let size = u64::from_str_radix(size_token.trim(), 16)
                .map_err(|_| ParseError::InvalidChunkSize)?;
            input = &input[i + 1..];
            if size == 0 {
                self.chunk_state = ChunkState::FinalCrlf;
            } else {
                self.chunk_state = ChunkState::Data { remaining: size };
            }
            return Ok(input);
        }
    }
}
