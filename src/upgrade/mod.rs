// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! The HTTP/1.1 → WebSocket upgrade handshake (RFC 6455 §4).
//!
//! Grounded on `soketto::handshake::{Client, Server}`
//! (examples/paritytech-soketto/src/handshake.rs): the server validates the
//! request line, `Host`, `Upgrade`/`Connection` tokens and
//! `Sec-WebSocket-Version`, then answers with the SHA-1/base64 accept token
//! derived from the client's nonce; the client generates that nonce and
//! later checks the server's answer against it.

use base64::Engine;
use sha1::{Digest, Sha1};

use crate::http::{Headers, Method, Request, Response, Status};

const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Errors that abort the upgrade handshake.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request method was not `GET`.
    #[error("request method must be GET")]
    NotGet,
    /// The request did not carry a `Host` header.
    #[error("request did not carry a Host header")]
    MissingHost,
    /// The `Upgrade` header did not contain the `websocket` token.
    #[error("Upgrade header must contain the websocket token")]
    MissingUpgradeToken,
    /// The `Connection` header did not contain the `Upgrade` token.
    #[error("Connection header must contain the Upgrade token")]
    MissingConnectionToken,
    /// `Sec-WebSocket-Version` was not `13`.
    #[error("Sec-WebSocket-Version must be 13")]
    UnsupportedVersion,
    /// The request did not carry a `Sec-WebSocket-Key` header.
    #[error("request did not carry a Sec-WebSocket-Key header")]
    MissingKey,
    /// The response status was not `101 Switching Protocols`.
    #[error("response status was not 101 Switching Protocols")]
    NotSwitchingProtocols,
    /// `Sec-WebSocket-Accept` did not match the value expected for our nonce.
    #[error("Sec-WebSocket-Accept did not match the expected value for our nonce")]
    AcceptMismatch,
    /// The response did not carry a `Sec-WebSocket-Accept` header.
    #[error("response did not carry a Sec-WebSocket-Accept header")]
    MissingAccept,
}

fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// A validated upgrade request, ready to be answered.
pub struct ServerHandshake {
    accept: String,
    /// `Sec-WebSocket-Protocol` values offered by the client, in order.
    pub protocols: Vec<String>,
}

impl ServerHandshake {
    /// Validate an incoming request as a WebSocket upgrade. Returns the
    /// derived accept token on success.
    pub fn from_request(request: &Request) -> Result<ServerHandshake, Error> {
        if request.method != Method::Get {
            return Err(Error::NotGet);
        }
        if !request.headers.contains("Host") {
            return Err(Error::MissingHost);
        }
        if !request.headers.contains_token("Upgrade", "websocket") {
            return Err(Error::MissingUpgradeToken);
        }
        if !request.headers.contains_token("Connection", "Upgrade") {
            return Err(Error::MissingConnectionToken);
        }
        if request.headers.get("Sec-WebSocket-Version") != Some("13") {
            return Err(Error::UnsupportedVersion);
        }
        let key = request.headers.get("Sec-WebSocket-Key").ok_or(Error::MissingKey)?;
        let protocols = request
            .headers
            .get("Sec-WebSocket-Protocol")
            .map(|v| v.split(',').map(|p| p.trim().to_owned()).collect())
            .unwrap_or_default();
        Ok(ServerHandshake { accept: accept_key(key), protocols })
    }

    /// The `101 Switching Protocols` response headers to send back.
    pub fn response_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.append("Upgrade", "websocket");
        headers.append("Connection", "Upgrade");
        headers.append("Sec-WebSocket-Accept", &self.accept);
        headers
    }
}

/// A pending client-side upgrade: the nonce sent, awaiting the server's
/// accept token to verify.
pub struct ClientHandshake {
    nonce: String,
}

impl ClientHandshake {
    /// Generate a fresh nonce and the request headers carrying it.
    pub fn new() -> ClientHandshake {
        let raw: [u8; 16] = rand::random();
        let nonce = base64::engine::general_purpose::STANDARD.encode(raw);
        ClientHandshake { nonce }
    }

    /// The headers to send on the upgrade request.
    pub fn request_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.append("Upgrade", "websocket");
        headers.append("Connection", "Upgrade");
        headers.append("Sec-WebSocket-Key", &self.nonce);
        headers.append("Sec-WebSocket-Version", "13");
        headers
    }

    /// Verify the server's response against the nonce we sent.
    pub fn verify(&self, response: &Response) -> Result<(), Error> {
        if response.status != Status::SWITCHING_PROTOCOLS {
            return Err(Error::NotSwitchingProtocols);
        }
        let theirs = response.headers.get("Sec-WebSocket-Accept").ok_or(Error::MissingAccept)?;
        let ours = accept_key(&self.nonce);
        if ours != theirs {
            return Err(Error::AcceptMismatch);
        }
        Ok(())
    }
}

impl Default for ClientHandshake {
    fn default() -> Self {
        Self::new()
    }
}
