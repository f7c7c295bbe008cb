// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! HTTP session: pairs an incremental parser with a transport, in either
//! the server or client role.
//!
//! Grounded on `g6::http::session::{server_request, server_response,
//! server_session}` (original_source/include/g6/http/session.hpp): a
//! session owns a read buffer, fills it from the transport, feeds it to the
//! parser, and exposes the parsed preamble/headers/body to the caller; on
//! the write side it formats a response header and either writes a whole
//! body or streams chunks.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::builder::{RequestBuilder, ResponseBuilder};
use super::error::SessionError;
use super::headers::Headers;
use super::method::Method;
use super::parser::{RequestParser, ResponseParser};
use super::status::Status;

const READ_CHUNK: usize = 8 * 1024;

/// A fully parsed request, with its body collected into a single buffer.
///
/// Bodies are bounded in this crate (no streaming-body API is exposed to
/// callers); a handler that needs to stream a request body incrementally
/// should use [`HttpSession::recv_with`] directly.
#[derive(Debug, Clone)]
pub struct Request {
    /// The request method.
    pub method: Method,
    /// The request target, as received on the request line.
    pub path: String,
    /// The protocol version token, e.g. `HTTP/1.1`.
    pub protocol_version: String,
    /// The request headers.
    pub headers: Headers,
    /// The collected request body, empty if none was sent.
    pub body: Vec<u8>,
}

/// A fully parsed response, with its body collected into a single buffer.
#[derive(Debug, Clone)]
pub struct Response {
    /// The response status.
    pub status: Status,
    /// The protocol version token, e.g. `HTTP/1.1`.
    pub protocol_version: String,
    /// The response headers.
    pub headers: Headers,
    /// The collected response body, empty if none was sent.
    pub body: Vec<u8>,
}

/// An HTTP connection bound to a transport, speaking either the server or
/// client role via [`HttpSession::recv_request`]/[`HttpSession::send_response`]
/// or [`HttpSession::send_request`]/[`HttpSession::recv_response`].
pub struct HttpSession<T> {
    transport: T,
    read_buf: BytesMut,
}

impl<T> HttpSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a transport in an HTTP session.
    pub fn new(transport: T) -> Self {
        HttpSession { transport, read_buf: BytesMut::new() }
    }

    /// Consume the session, returning the underlying transport. Any bytes
    /// already read past the last parsed message (e.g. the start of an
    /// upgraded connection's first frame) are returned alongside it.
    pub fn into_parts(self) -> (T, BytesMut) {
        (self.transport, self.read_buf)
    }

    /// Read and parse one request from the transport (server role).
    pub async fn recv_request(&mut self) -> Result<Request, SessionError> {
        let mut parser = RequestParser::new();
        let mut body = Vec::new();
        self.recv_with(&mut parser, &mut body).await?;
        Ok(Request {
            method: parser.method().expect("parser reported done"),
            path: parser.path().to_owned(),
            protocol_version: parser.protocol_version().to_owned(),
            headers: parser.headers().clone(),
            body,
        })
    }

    /// Read and parse one response from the transport (client role).
    pub async fn recv_response(&mut self) -> Result<Response, SessionError> {
        let mut parser = ResponseParser::new();
        let mut body = Vec::new();
        self.recv_with(&mut parser, &mut body).await?;
        Ok(Response {
            status: parser.status().expect("parser reported done"),
            protocol_version: parser.protocol_version().to_owned(),
            headers: parser.headers().clone(),
            body,
        })
    }

    /// Drive `parser` to completion against the transport, appending every
    /// body fragment to `on_body`. Exposed directly so callers that want a
    /// streaming body (rather than `Vec<u8>` collection) can supply their
    /// own parser loop driver.
    pub async fn recv_with<const R: bool>(
        &mut self,
        parser: &mut super::parser::Parser<R>,
        on_body: &mut Vec<u8>,
    ) -> Result<(), SessionError> {
        loop {
            if !self.read_buf.is_empty() {
                let pending = self.read_buf.split();
                let consumed = parser.feed(&pending, |chunk| on_body.extend_from_slice(chunk))?;
                if parser.is_done() {
                    // Bytes past the message boundary belong to whatever
                    // comes next (the next response, or an upgraded
                    // protocol's first frame) — keep them for the caller
                    // instead of discarding them with the rest of `pending`.
                    self.read_buf.extend_from_slice(&pending[consumed..]);
                    return Ok(());
                }
            }
            let mut chunk = [0u8; READ_CHUNK];
            let n = self.transport.read(&mut chunk).await?;
            if n == 0 {
                return Err(SessionError::ConnectionReset);
            }
            self.read_buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Send a request with a fixed-length (or absent) body.
    pub async fn send_request(
        &mut self,
        method: Method,
        path: &str,
        headers: &Headers,
        body: &[u8],
    ) -> Result<(), SessionError> {
        let msg = if body.is_empty() {
            RequestBuilder::new(method, path).no_body(headers)
        } else {
            RequestBuilder::new(method, path).body(headers, body)
        };
        self.transport.write_all(&msg).await?;
        Ok(())
    }

    /// Send a response with a fixed-length (or absent) body.
    pub async fn send_response(
        &mut self,
        status: Status,
        headers: &Headers,
        body: &[u8],
    ) -> Result<(), SessionError> {
        let msg = if body.is_empty() {
            ResponseBuilder::new(status).no_body(headers)
        } else {
            ResponseBuilder::new(status).body(headers, body)
        };
        self.transport.write_all(&msg).await?;
        Ok(())
    }

    /// Send a request whose body is produced incrementally as
    /// `Transfer-Encoding: chunked`, symmetric to
    /// [`HttpSession::send_chunked_response`].
    pub async fn send_chunked_request(
        &mut self,
        method: Method,
        path: &str,
        headers: &Headers,
        mut produce: impl FnMut(&mut super::builder::ChunkedWriter) -> Option<BytesMut>,
    ) -> Result<(), SessionError> {
        let (preamble, mut writer) = RequestBuilder::new(method, path).chunked(headers);
        self.transport.write_all(&preamble).await?;
        while let Some(chunk) = produce(&mut writer) {
            if chunk.is_empty() {
                break;
            }
            self.transport.write_all(&chunk).await?;
        }
        let tail = writer.finish();
        if !tail.is_empty() {
            self.transport.write_all(&tail).await?;
        }
        Ok(())
    }

    /// Send a response whose body is produced incrementally as
    /// `Transfer-Encoding: chunked`. `produce` is called repeatedly with a
    /// [`super::builder::ChunkedWriter`]; it should write each chunk's
    /// encoding and call `finish()` itself once done, returning the bytes to
    /// flush to the transport.
    pub async fn send_chunked_response(
        &mut self,
        status: Status,
        headers: &Headers,
        mut produce: impl FnMut(&mut super::builder::ChunkedWriter) -> Option<BytesMut>,
    ) -> Result<(), SessionError> {
        let (preamble, mut writer) = ResponseBuilder::new(status).chunked(headers);
        self.transport.write_all(&preamble).await?;
        while let Some(chunk) = produce(&mut writer) {
            if chunk.is_empty() {
                break;
            }
            self.transport.write_all(&chunk).await?;
        }
        let tail = writer.finish();
        if !tail.is_empty() {
            self.transport.write_all(&tail).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_fixed_length_request_response() {
        let (client_io, server_io) = tokio::io::duplex(4096);
        let mut client = HttpSession::new(client_io);
        let mut server = HttpSession::new(server_io);

        let mut req_headers = Headers::new();
        req_headers.append("Host", "example.com");

        let send = async {
            client.send_request(Method::Get, "/widgets", &req_headers, b"").await.unwrap();
        };
        let recv = async { server.recv_request().await.unwrap() };
        let (_, request) = tokio::join!(send, recv);
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/widgets");

        let mut resp_headers = Headers::new();
        resp_headers.append("Content-Type", "text/plain");
        let send = async {
            server.send_response(Status::OK, &resp_headers, b"hi").await.unwrap();
        };
        let recv = async { client.recv_response().await.unwrap() };
        let (_, response) = tokio::join!(send, recv);
        assert_eq!(response.status, Status::OK);
        assert_eq!(response.body, b"hi");
    }

    #[tokio::test]
    async fn leftover_bytes_past_the_message_survive_into_parts() {
        let (mut client_io, server_io) = tokio::io::duplex(4096);
        let mut server = HttpSession::new(server_io);

        // A request immediately followed by bytes belonging to whatever
        // comes next (e.g. an upgraded protocol's first frame riding along
        // in the same TCP segment), written together so both are available
        // before the server's first read.
        let send = async {
            client_io.write_all(b"GET / HTTP/1.1\r\n\r\nEXTRA").await.unwrap();
        };
        let recv = async { server.recv_request().await.unwrap() };
        tokio::join!(send, recv);

        let (_, leftover) = server.into_parts();
        assert_eq!(&leftover[..], b"EXTRA");
    }

    #[tokio::test]
    async fn streams_a_chunked_response() {
        let (client_io, server_io) = tokio::io::duplex(4096);
        let mut client = HttpSession::new(client_io);
        let mut server = HttpSession::new(server_io);

        let send = async {
            let mut parts = vec![b"first ".to_vec(), b"second".to_vec()];
            parts.reverse();
            server
                .send_chunked_response(Status::OK, &Headers::new(), |writer| {
                    parts.pop().map(|p| writer.chunk(&p))
                })
                .await
                .unwrap();
        };
        let recv = async { client.recv_response().await.unwrap() };
        let (_, response) = tokio::join!(send, recv);
        assert_eq!(response.body, b"first second");
        assert_eq!(response.headers.get("transfer-encoding"), Some("chunked"));
    }
}
