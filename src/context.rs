//! # Connection Context
//!
//! Per-call mutable state for one side of one connection.
//!
//! A [`Context`] bundles the control-channel reader/writer, the request
//! header and raw envelope payload, the bound method and auth material,
//! and the response bookkeeping. It is owned by exactly one task for the
//! duration of one call and never shared across calls.
//!
//! Handlers receive a context, bind their typed params out of it, consume
//! the uploaded bulk stream if the call carried one, and finish by sending
//! exactly one response, [`Context::send_result`] or
//! [`Context::send_error`]. A second send attempt is rejected.

use std::fmt::Display;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::auth::Auth;
use crate::core::envelope::{Empty, Request, RequestHead, Response};
use crate::core::header::{FrameHeader, HEADER_SIZE};
use crate::core::transfer;
use crate::error::{Result, RpcError};

/// Boxed read half of a connection.
pub type ConnReader = Box<dyn AsyncRead + Send + Unpin>;
/// Boxed write half of a connection.
pub type ConnWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Per-call state for one accepted connection.
pub struct Context {
    start: Instant,
    remote_host: String,

    reader: Option<ConnReader>,
    writer: Option<ConnWriter>,

    req_header: FrameHeader,
    req_payload: Vec<u8>,
    method: String,
    auth: Auth,

    res_header: FrameHeader,
    res_error: Option<String>,
    res_sent: bool,
}

impl Context {
    /// A context with no connection attached. Every stream operation on it
    /// reports [`RpcError::NilStream`].
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            remote_host: String::new(),
            reader: None,
            writer: None,
            req_header: FrameHeader::default(),
            req_payload: Vec::new(),
            method: String::new(),
            auth: Auth::default(),
            res_header: FrameHeader::default(),
            res_error: None,
            res_sent: false,
        }
    }

    /// A context bound to the two halves of a connection.
    pub fn attached(reader: ConnReader, writer: ConnWriter, remote_host: String) -> Self {
        Self {
            remote_host,
            reader: Some(reader),
            writer: Some(writer),
            ..Self::new()
        }
    }

    /// Read and unpack the request frame: header, then the rpc payload the
    /// header describes. The bulk payload, if any, stays on the stream for
    /// the handler to consume.
    pub async fn read_request(&mut self) -> Result<()> {
        let reader = self.reader.as_mut().ok_or(RpcError::NilStream)?;

        let mut header_bytes = [0u8; HEADER_SIZE];
        transfer::read_full(reader, &mut header_bytes).await?;
        self.req_header = FrameHeader::unpack(&header_bytes)?;
        self.req_payload = transfer::read_exact_bytes(reader, self.req_header.rpc_size).await?;
        Ok(())
    }

    /// Decode the envelope far enough to learn the method name and auth
    /// material, leaving the params untouched for [`Context::bind_params`].
    pub fn bind_method(&mut self) -> Result<()> {
        let head: RequestHead = Request::unpack(&self.req_payload)?;
        self.method = head.method;
        self.auth = head.auth;
        Ok(())
    }

    /// Re-decode the stored envelope, binding the params slot into `P`.
    pub fn bind_params<P: DeserializeOwned>(&self) -> Result<P> {
        let request: Request<P> = Request::unpack(&self.req_payload)?;
        Ok(request.params)
    }

    /// Write a success response. When `bin_size` is non-zero the caller
    /// must follow up by streaming exactly that many bytes through
    /// [`Context::write_bin`] or [`Context::bin_writer`].
    pub async fn send_result<R: Serialize>(&mut self, result: &R, bin_size: u64) -> Result<()> {
        if self.res_sent {
            return Err(RpcError::AlreadySent);
        }
        let payload = Response {
            error: String::new(),
            result: Some(result),
        }
        .pack()?;
        self.res_header = FrameHeader::new(payload.len() as u64, bin_size);
        self.write_response(&payload).await
    }

    /// Write an error response with no bulk payload.
    pub async fn send_error(&mut self, err: impl Display) -> Result<()> {
        if self.res_sent {
            return Err(RpcError::AlreadySent);
        }
        let message = err.to_string();
        let payload = Response::<Empty>::fail(message.clone()).pack()?;
        self.res_header = FrameHeader::new(payload.len() as u64, 0);
        self.res_error = Some(message);
        self.write_response(&payload).await
    }

    async fn write_response(&mut self, payload: &[u8]) -> Result<()> {
        let header_bytes = self.res_header.pack();
        let writer = self.writer.as_mut().ok_or(RpcError::NilStream)?;
        writer.write_all(&header_bytes).await?;
        writer.write_all(payload).await?;
        writer.flush().await?;
        self.res_sent = true;
        Ok(())
    }

    /// Copy the caller's uploaded bulk payload into `writer`, exactly the
    /// number of bytes the request header announced.
    pub async fn read_bin<W>(&mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let size = self.req_header.bin_size;
        let reader = self.reader.as_mut().ok_or(RpcError::NilStream)?;
        transfer::copy_exact(reader, writer, size).await
    }

    /// Discard the caller's uploaded bulk payload.
    pub async fn drain_bin(&mut self) -> Result<u64> {
        self.read_bin(&mut tokio::io::sink()).await
    }

    /// Stream `size` bytes from `reader` out on the bulk channel. Valid
    /// after a [`Context::send_result`] that announced the same size.
    pub async fn write_bin<R>(&mut self, reader: &mut R, size: u64) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let writer = self.writer.as_mut().ok_or(RpcError::NilStream)?;
        transfer::copy_exact(reader, writer, size).await
    }

    /// Direct access to the inbound bulk stream.
    pub fn bin_reader(&mut self) -> Result<&mut ConnReader> {
        self.reader.as_mut().ok_or(RpcError::NilStream)
    }

    /// Direct access to the outbound bulk stream.
    pub fn bin_writer(&mut self) -> Result<&mut ConnWriter> {
        self.writer.as_mut().ok_or(RpcError::NilStream)
    }

    /// Size of the uploaded bulk payload bound to this call.
    pub fn bin_size(&self) -> u64 {
        self.req_header.bin_size
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn auth_ident(&self) -> &[u8] {
        &self.auth.ident
    }

    pub fn auth_salt(&self) -> &[u8] {
        &self.auth.salt
    }

    pub fn auth_hash(&self) -> &[u8] {
        &self.auth.hash
    }

    pub fn remote_host(&self) -> &str {
        &self.remote_host
    }

    /// Wall time since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Request header as read off the wire.
    pub fn request_header(&self) -> &FrameHeader {
        &self.req_header
    }

    /// Response header as sent, all zeroes until a response goes out.
    pub fn response_header(&self) -> &FrameHeader {
        &self.res_header
    }

    /// Error string of the response, if an error response was sent.
    pub fn response_error(&self) -> Option<&str> {
        self.res_error.as_deref()
    }

    /// Whether a response has already been written.
    pub fn response_sent(&self) -> bool {
        self.res_sent
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detached_context_reports_nil_stream() {
        let mut ctx = Context::new();
        assert!(matches!(ctx.read_request().await, Err(RpcError::NilStream)));
        assert!(matches!(ctx.drain_bin().await, Err(RpcError::NilStream)));
        assert!(matches!(ctx.bin_reader(), Err(RpcError::NilStream)));
        assert!(matches!(ctx.bin_writer(), Err(RpcError::NilStream)));
        assert!(matches!(
            ctx.send_error("boom").await,
            Err(RpcError::NilStream)
        ));
    }

    #[tokio::test]
    async fn second_response_is_rejected() {
        let (local, mut peer) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(local);
        let mut ctx = Context::attached(Box::new(reader), Box::new(writer), "127.0.0.1".into());

        ctx.send_result(&Empty {}, 0).await.expect("first response");
        assert!(ctx.response_sent());
        assert!(matches!(
            ctx.send_error("too late").await,
            Err(RpcError::AlreadySent)
        ));

        // The peer sees exactly one frame.
        drop(ctx);
        let mut received = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut peer, &mut received)
            .await
            .expect("read");
        let header_bytes: [u8; HEADER_SIZE] = received[..HEADER_SIZE].try_into().unwrap();
        let header = FrameHeader::unpack(&header_bytes).expect("header");
        assert_eq!(received.len(), HEADER_SIZE + header.rpc_size as usize);
    }

    #[tokio::test]
    async fn bind_method_then_typed_params() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct SaveParams {
            message: String,
        }

        let request = Request::new(
            "save",
            SaveParams {
                message: "save data!".into(),
            },
            Auth::create(b"qwert", b"12345"),
        );

        let mut ctx = Context::new();
        ctx.req_payload = request.pack().expect("pack");
        ctx.bind_method().expect("bind method");
        assert_eq!(ctx.method(), "save");
        assert_eq!(ctx.auth_ident(), b"qwert");

        let params: SaveParams = ctx.bind_params().expect("bind params");
        assert_eq!(params.message, "save data!");
    }
}
