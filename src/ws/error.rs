// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! WebSocket protocol errors.

use std::io;

/// Errors surfaced by the WebSocket frame codec and session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error was encountered.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The frame used a reserved/unassigned opcode.
    #[error("frame used a reserved/unassigned opcode")]
    ReservedOpCode,
    /// A control frame's payload exceeded the 125-byte limit.
    #[error("control frame payload exceeds 125 bytes")]
    ControlFrameTooLarge,
    /// A continuation frame arrived with no fragmented message open.
    #[error("continuation frame received with no fragmented message in progress")]
    UnexpectedContinuation,
    /// A new data frame started while a fragmented message was still open.
    #[error("new data frame started while a fragmented message was still open")]
    FragmentedMessageInterrupted,
    /// A server sent a masked frame.
    #[error("a server frame must not be masked")]
    UnexpectedMask,
    /// A client sent an unmasked frame.
    #[error("a client frame must be masked")]
    ExpectedMask,
    /// A text frame's payload was not valid UTF-8.
    #[error("text frame payload was not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    /// The assembled message exceeds the configured maximum size.
    #[error("assembled message exceeds the configured maximum size")]
    MessageTooLarge,
    /// A close frame carried a 1-byte payload (a close code needs at least 2).
    #[error("close frame carried a 1-byte payload (a close code needs at least 2)")]
    InvalidClosePayload,
    /// The connection is already closed.
    #[error("connection already closed")]
    Closed,
}
