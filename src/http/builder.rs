// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! HTTP message builders: a fixed `Content-Length` body or a streamed
//! `Transfer-Encoding: chunked` body.
//!
//! Grounded on `g6::http::session::server_response::build_header` and
//! `async_send` (original_source/include/g6/http/session.hpp), which compose
//! a status/request line, header lines, a blank line, and then either a
//! whole body or a sequence of `N\r\n<data>\r\n` chunks terminated by
//! `0\r\n\r\n`.

use bytes::{BufMut, BytesMut};

use super::headers::Headers;
use super::method::Method;
use super::status::Status;

const CRLF: &[u8] = b"\r\n";

const USER_AGENT_LINE: &str = concat!("user-agent: protoweb/", env!("CARGO_PKG_VERSION"), "\r\n");

fn write_headers(buf: &mut BytesMut, headers: &Headers) {
    for (name, value) in headers.iter() {
        buf.put_slice(name.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(value.as_bytes());
        buf.put_slice(CRLF);
    }
}

/// Builds a complete request message with a fixed-length (or absent) body.
pub struct RequestBuilder {
    buf: BytesMut,
}

impl RequestBuilder {
    /// Start a request line: `METHOD PATH HTTP/1.1`.
    pub fn new(method: Method, path: &str) -> Self {
        let mut buf = BytesMut::with_capacity(256);
        buf.put_slice(method.as_str().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(path.as_bytes());
        buf.put_slice(b" HTTP/1.1\r\n");
        buf.put_slice(USER_AGENT_LINE.as_bytes());
        RequestBuilder { buf }
    }

    /// Append headers, then the body (setting `Content-Length` to its exact
    /// length), and return the finished message.
    pub fn body(mut self, headers: &Headers, body: &[u8]) -> BytesMut {
        write_headers(&mut self.buf, headers);
        self.buf.put_slice(format!("content-length: {}\r\n", body.len()).as_bytes());
        self.buf.put_slice(CRLF);
        self.buf.put_slice(body);
        self.buf
    }

    /// Append headers and the terminating blank line, with no body.
    pub fn no_body(mut self, headers: &Headers) -> BytesMut {
        write_headers(&mut self.buf, headers);
        self.buf.put_slice(CRLF);
        self.buf
    }

    /// Append headers (plus a `Transfer-Encoding: chunked` header) and the
    /// terminating blank line, returning the finished preamble and a
    /// [`ChunkedWriter`] to stream the body through.
    pub fn chunked(mut self, headers: &Headers) -> (BytesMut, ChunkedWriter) {
        write_headers(&mut self.buf, headers);
        self.buf.put_slice(b"transfer-encoding: chunked\r\n");
        self.buf.put_slice(CRLF);
        (self.buf, ChunkedWriter::new())
    }
}

/// Builds a complete response message with a fixed-length (or absent) body.
pub struct ResponseBuilder {
    buf: BytesMut,
}

impl ResponseBuilder {
    /// Start a status line: `HTTP/1.1 CODE REASON`.
    pub fn new(status: Status) -> Self {
        let mut buf = BytesMut::with_capacity(256);
        buf.put_slice(b"HTTP/1.1 ");
        buf.put_slice(status.to_string().as_bytes());
        buf.put_slice(CRLF);
        buf.put_slice(USER_AGENT_LINE.as_bytes());
        ResponseBuilder { buf }
    }

    /// Append headers, then the body (setting `Content-Length` to its exact
    /// length), and return the finished message.
    pub fn body(mut self, headers: &Headers, body: &[u8]) -> BytesMut {
        write_headers(&mut self.buf, headers);
        self.buf.put_slice(format!("content-length: {}\r\n", body.len()).as_bytes());
        self.buf.put_slice(CRLF);
        self.buf.put_slice(body);
        self.buf
    }

    /// Append headers and the terminating blank line, with no body.
    pub fn no_body(mut self, headers: &Headers) -> BytesMut {
        write_headers(&mut self.buf, headers);
        self.buf.put_slice(CRLF);
        self.buf
    }

    /// Append headers (plus a `Transfer-Encoding: chunked` header) and the
    /// terminating blank line, returning the finished preamble and a
    /// [`ChunkedWriter`] to stream the body through.
    pub fn chunked(mut self, headers: &Headers) -> (BytesMut, ChunkedWriter) {
        write_headers(&mut self.buf, headers);
        self.buf.put_slice(b"transfer-encoding: chunked\r\n");
        self.buf.put_slice(CRLF);
        (self.buf, ChunkedWriter::new())
    }
}

/// Encodes successive body chunks as `N\r\n<data>\r\n`, finishing with the
/// `0\r\n\r\n` terminator.
///
/// Closing is idempotent: calling [`ChunkedWriter::finish`] more than once
/// only emits the terminator the first time. Dropping a writer that was
/// never finished is a programmer error; since `Drop` cannot perform I/O, it
/// logs a warning instead of silently losing the missing terminator.
pub struct ChunkedWriter {
    closed: bool,
}

impl ChunkedWriter {
    fn new() -> Self {
        ChunkedWriter { closed: false }
    }

    /// Encode one chunk. An empty slice is a no-op (it would otherwise be
    /// indistinguishable from the terminating chunk).
    pub fn chunk(&mut self, data: &[u8]) -> BytesMut {
        if data.is_empty() {
            return BytesMut::new();
        }
        let mut buf = BytesMut::with_capacity(data.len() + 16);
        buf.put_slice(format!("{:x}\r\n", data.len()).as_bytes());
        buf.put_slice(data);
        buf.put_slice(CRLF);
        buf
    }

    /// Emit the terminating `0\r\n\r\n` chunk. Safe to call more than once.
    pub fn finish(&mut self) -> BytesMut {
        if self.closed {
            return BytesMut::new();
        }
        self.closed = true;
        BytesMut::from(&b"0\r\n\r\n"[..])
    }
}

impl Drop for ChunkedWriter {
    fn drop(&mut self) {
        if !self.closed {
            log::warn!("ChunkedWriter dropped without finish(); response body left unterminated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_fixed_length_request() {
        let mut headers = Headers::new();
        headers.append("Host", "example.com");
        let msg = RequestBuilder::new(Method::Post, "/widgets").body(&headers, b"payload");
        let text = String::from_utf8(msg.to_vec()).unwrap();
        assert!(text.starts_with("POST /widgets HTTP/1.1\r\n"));
        assert!(text.contains("host: example.com\r\n"));
        assert!(text.contains("content-length: 7\r\n"));
        assert!(text.ends_with("\r\n\r\npayload"));
    }

    #[test]
    fn builds_response_with_no_body() {
        let msg = ResponseBuilder::new(Status::NO_CONTENT).no_body(&Headers::new());
        let text = String::from_utf8(msg.to_vec()).unwrap();
        assert_eq!(
            text,
            format!("HTTP/1.1 204 No Content\r\nuser-agent: protoweb/{}\r\n\r\n", env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn every_message_carries_a_user_agent_header() {
        let req = RequestBuilder::new(Method::Get, "/").no_body(&Headers::new());
        let text = String::from_utf8(req.to_vec()).unwrap();
        assert!(text.contains(&format!("user-agent: protoweb/{}\r\n", env!("CARGO_PKG_VERSION"))));

        let resp = ResponseBuilder::new(Status::OK).no_body(&Headers::new());
        let text = String::from_utf8(resp.to_vec()).unwrap();
        assert!(text.contains(&format!("user-agent: protoweb/{}\r\n", env!("CARGO_PKG_VERSION"))));
    }

    #[test]
    fn chunked_writer_emits_correct_framing() {
        let (preamble, mut writer) = ResponseBuilder::new(Status::OK).chunked(&Headers::new());
        let preamble = String::from_utf8(preamble.to_vec()).unwrap();
        assert!(preamble.contains("transfer-encoding: chunked\r\n"));

        let mut body = BytesMut::new();
        body.extend_from_slice(&writer.chunk(b"Hello "));
        body.extend_from_slice(&writer.chunk(b"world"));
        body.extend_from_slice(&writer.finish());
        assert_eq!(&body[..], b"6\r\nHello \r\n5\r\nworld\r\n0\r\n\r\n");
    }

    #[test]
    fn finish_is_idempotent() {
        let mut writer = ChunkedWriter::new();
        assert_eq!(&writer.finish()[..], b"0\r\n\r\n");
        assert_eq!(writer.finish().len(), 0);
    }

    #[test]
    fn dropping_an_unfinished_writer_logs_a_warning() {
        let _ = env_logger::builder().is_test(true).try_init();
        drop(ChunkedWriter::new());
    }
}
