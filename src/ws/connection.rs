// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! A WebSocket session split into independent send/receive halves.
//!
//! Grounded on `soketto::connection::{Sender, Receiver, Builder}`
//! (examples/paritytech-soketto/src/connection.rs): a shared write handle
//! protected by a lock (there, `futures::lock::BiLock`; here,
//! `tokio::sync::Mutex`, since this crate's stack already carries `tokio`)
//! lets the receive loop answer control frames (PING, and the CLOSE
//! handshake) without the caller driving a separate task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;

use super::data::{CloseCode, Incoming, Message};
use super::error::Error;
use super::header::{apply_mask, Header};
use super::opcode::OpCode;

const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
const READ_CHUNK: usize = 8 * 1024;

/// Which role this endpoint plays. A client MUST mask every frame it sends
/// and MUST NOT accept a masked frame from the server, and vice versa
/// (RFC 6455 §5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Client,
    Server,
}

/// Builds a [`Sender`]/[`Receiver`] pair over a transport.
pub struct Builder<T> {
    transport: T,
    mode: Mode,
    max_message_size: usize,
}

impl<T> Builder<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Start building a session in the given role.
    pub fn new(transport: T, mode: Mode) -> Self {
        Builder { transport, mode, max_message_size: DEFAULT_MAX_MESSAGE_SIZE }
    }

    /// Override the default 16 MiB cap on an assembled message's total size.
    pub fn max_message_size(mut self, n: usize) -> Self {
        self.max_message_size = n;
        self
    }

    /// Split into independent send/receive halves sharing one write lock and
    /// one "have we sent our CLOSE yet" flag.
    pub fn finish(self) -> (Sender<T>, Receiver<T>) {
        let (read, write) = tokio::io::split(self.transport);
        let write = Arc::new(Mutex::new(write));
        let close_sent = Arc::new(AtomicBool::new(false));
        let sender = Sender { write: write.clone(), mode: self.mode, close_sent: close_sent.clone() };
        let receiver = Receiver {
            write,
            read,
            mode: self.mode,
            read_buf: BytesMut::new(),
            fragment: None,
            max_message_size: self.max_message_size,
            close_sent,
            closed: false,
        };
        (sender, receiver)
    }
}

/// Encode one frame and write it to `writer`, masking it if `mode` is
/// [`Mode::Client`].
async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    mode: Mode,
    opcode: OpCode,
    fin: bool,
    payload: &[u8],
) -> Result<(), Error> {
    let mask = match mode {
        Mode::Client => Some(rand::random::<[u8; 4]>()),
        Mode::Server => None,
    };
    let header = Header {
        fin,
        rsv1: false,
        rsv2: false,
        rsv3: false,
        opcode,
        mask,
        payload_len: payload.len() as u64,
    };
    writer.write_all(&header.serialize()).await?;
    if let Some(key) = mask {
        let mut masked = payload.to_vec();
        apply_mask(key, 0, &mut masked);
        writer.write_all(&masked).await?;
    } else {
        writer.write_all(payload).await?;
    }
    Ok(())
}

/// The send half of a WebSocket session.
pub struct Sender<T> {
    write: Arc<Mutex<WriteHalf<T>>>,
    mode: Mode,
    /// Shared with the paired [`Receiver`]: set once this side has sent its
    /// one CLOSE frame, whether that was this initiating call or the
    /// receiver's auto-echo of a peer-initiated CLOSE.
    close_sent: Arc<AtomicBool>,
}

impl<T> Sender<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Send a complete text message as a single unfragmented frame.
    pub async fn send_text(&mut self, text: &str) -> Result<(), Error> {
        let mut w = self.write.lock().await;
        write_frame(&mut *w, self.mode, OpCode::Text, true, text.as_bytes()).await
    }

    /// Send a complete binary message as a single unfragmented frame.
    pub async fn send_binary(&mut self, data: &[u8]) -> Result<(), Error> {
        let mut w = self.write.lock().await;
        write_frame(&mut *w, self.mode, OpCode::Binary, true, data).await
    }

    /// Send one message as a sequence of fragments: `kind` must be
    /// [`OpCode::Text`] or [`OpCode::Binary`]. The first chunk carries
    /// `kind`'s opcode, subsequent chunks carry [`OpCode::Continuation`],
    /// and the last chunk (or a zero-length frame, if `chunks` is empty)
    /// carries `fin = true`.
    pub async fn send_fragmented<I>(&mut self, kind: OpCode, chunks: I) -> Result<(), Error>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        debug_assert!(kind.is_data(), "send_fragmented requires a data opcode");
        let mut w = self.write.lock().await;
        let mut iter = chunks.into_iter().peekable();
        let mut opcode = kind;
        let mut sent_any = false;
        while let Some(chunk) = iter.next() {
            let fin = iter.peek().is_none();
            write_frame(&mut *w, self.mode, opcode, fin, chunk.as_ref()).await?;
            opcode = OpCode::Continuation;
            sent_any = true;
        }
        if !sent_any {
            write_frame(&mut *w, self.mode, kind, true, &[]).await?;
        }
        Ok(())
    }

    /// Send an unsolicited PING with the given application payload (at most
    /// 125 bytes).
    pub async fn send_ping(&mut self, payload: &[u8]) -> Result<(), Error> {
        if payload.len() > 125 {
            return Err(Error::ControlFrameTooLarge);
        }
        let mut w = self.write.lock().await;
        write_frame(&mut *w, self.mode, OpCode::Ping, true, payload).await
    }

    /// Initiate the close handshake. The peer's answering CLOSE frame is
    /// observed as [`Incoming::Closed`] from the corresponding [`Receiver`],
    /// which will not itself echo a CLOSE back, since this side has already
    /// sent its one CLOSE frame.
    pub async fn close(&mut self, code: CloseCode, reason: &str) -> Result<(), Error> {
        let mut payload = Vec::with_capacity(2 + reason.len());
        payload.extend_from_slice(&code.to_u16().to_be_bytes());
        payload.extend_from_slice(reason.as_bytes());
        let mut w = self.write.lock().await;
        self.close_sent.store(true, Ordering::SeqCst);
        write_frame(&mut *w, self.mode, OpCode::Close, true, &payload).await
    }
}

/// The receive half of a WebSocket session.
pub struct Receiver<T> {
    write: Arc<Mutex<WriteHalf<T>>>,
    read: ReadHalf<T>,
    mode: Mode,
    read_buf: BytesMut,
    /// `(opcode, payload-so-far)` of a data message whose first frame had
    /// `fin = false` and is awaiting continuation frames.
    fragment: Option<(OpCode, Vec<u8>)>,
    max_message_size: usize,
    /// Shared with the paired [`Sender`]: set once this side has sent its one
    /// CLOSE frame (either the initiating call or this receiver's echo of a
    /// peer-initiated CLOSE), so the two never both send one.
    close_sent: Arc<AtomicBool>,
    closed: bool,
}

impl<T> Receiver<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Receive the next application-level event: a complete message, an
    /// unsolicited PONG, or session closure. PINGs are answered with PONG
    /// automatically and never surfaced here.
    pub async fn receive(&mut self) -> Result<Incoming, Error> {
        if self.closed {
            return Err(Error::Closed);
        }
        loop {
            let (header, header_len) = self.next_header().await?;
            let total = header_len + header.payload_len as usize;
            self.fill(total).await?;
            let mut frame = self.read_buf.split_to(total);
            let mut payload = frame.split_off(header_len);

            match self.mode {
                Mode::Server if header.mask.is_none() => return Err(Error::ExpectedMask),
                Mode::Client if header.mask.is_some() => return Err(Error::UnexpectedMask),
                _ => {}
            }
            if let Some(key) = header.mask {
                apply_mask(key, 0, &mut payload);
            }

            if header.opcode.is_control() {
                if let Some(incoming) = self.on_control(header.opcode, payload.to_vec()).await? {
                    return Ok(incoming);
                }
                continue;
            }

            if let Some(message) = self.assemble(header.opcode, header.fin, payload.to_vec())? {
                return Ok(Incoming::Message(message));
            }
        }
    }

    async fn on_control(
        &mut self,
        opcode: OpCode,
        payload: Vec<u8>,
    ) -> Result<Option<Incoming>, Error> {
        match opcode {
            OpCode::Ping => {
                let mut w = self.write.lock().await;
                write_frame(&mut *w, self.mode, OpCode::Pong, true, &payload).await?;
                Ok(None)
            }
            OpCode::Pong => Ok(Some(Incoming::Pong(payload))),
            OpCode::Close => {
                let (code, reason) = match payload.len() {
                    0 => (None, String::new()),
                    1 => return Err(Error::InvalidClosePayload),
                    _ => {
                        let code = CloseCode::from_u16(u16::from_be_bytes([payload[0], payload[1]]));
                        let reason = std::str::from_utf8(&payload[2..])?.to_owned();
                        (Some(code), reason)
                    }
                };
                if !self.close_sent.swap(true, Ordering::SeqCst) {
                    let mut w = self.write.lock().await;
                    write_frame(&mut *w, self.mode, OpCode::Close, true, &payload).await?;
                }
                self.closed = true;
                Ok(Some(Incoming::Closed { code, reason }))
            }
            _ => unreachable!("on_control called with a data opcode"),
        }
    }

    fn assemble(
        &mut self,
        opcode: OpCode,
        fin: bool,
        payload: Vec<u8>,
    ) -> Result<Option<Message>, Error> {
        match (opcode, self.fragment.take()) {
            (OpCode::Continuation, Some((first_opcode, mut buf))) => {
                buf.extend_from_slice(&payload);
                if buf.len() > self.max_message_size {
                    return Err(Error::MessageTooLarge);
                }
                if fin {
                    Ok(Some(finish_message(first_opcode, buf)?))
                } else {
                    self.fragment = Some((first_opcode, buf));
                    Ok(None)
                }
            }
            (OpCode::Continuation, None) => Err(Error::UnexpectedContinuation),
            (_, Some(_)) => Err(Error::FragmentedMessageInterrupted),
            (op, None) => {
                if payload.len() > self.max_message_size {
                    return Err(Error::MessageTooLarge);
                }
                if fin {
                    Ok(Some(finish_message(op, payload)?))
                } else {
                    self.fragment = Some((op, payload));
                    Ok(None)
                }
            }
        }
    }

    /// Parse a header from the front of the read buffer, pulling in more
    /// bytes from the transport as needed.
    async fn next_header(&mut self) -> Result<(Header, usize), Error> {
        loop {
            if let Some(result) = Header::parse(&self.read_buf)? {
                return Ok(result);
            }
            self.read_more().await?;
        }
    }

    async fn fill(&mut self, need: usize) -> Result<(), Error> {
        while self.read_buf.len() < need {
            self.read_more().await?;
        }
        Ok(())
    }

    async fn read_more(&mut self) -> Result<(), Error> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self.read.read(&mut chunk).await?;
        if n == 0 {
            return Err(Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }
        self.read_buf.extend_from_slice(&chunk[..n]);
        Ok(())
    }
}

fn finish_message(opcode: OpCode, payload: Vec<u8>) -> Result<Message, Error> {
    Ok(match opcode {
        OpCode::Text => Message::Text(String::from_utf8(payload).map_err(|e| e.utf8_error())?),
        OpCode::Binary => Message::Binary(payload),
        _ => unreachable!("data message with non-data opcode"),
    })
}
