//! # Client Transport
//!
//! Dialing and the three call shapes a caller can drive against a server.
//!
//! Every call dials a fresh TCP connection, uses it for exactly one
//! exchange, and tears it down; there is no pooling and no reuse. The
//! connection-scoped variants ([`conn_exec`], [`conn_put`], [`conn_get`])
//! accept any duplex byte stream, which is how the in-process transport in
//! [`crate::transport::local`] drives the same code paths without a socket.
//!
//! ## Call Shapes
//! - **exec**: request out, response in, strictly sequential
//! - **put**: request out, then the bulk upload and the response read run
//!   concurrently; the response path is authoritative for the call outcome
//! - **get**: request out, response in, then the announced number of bulk
//!   bytes is downloaded into the caller's writer

use std::io;
use std::net::SocketAddr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{split, AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tracing::debug;

use crate::auth::Auth;
use crate::config::ClientConfig;
use crate::core::envelope::{Request, Response};
use crate::core::header::{FrameHeader, HEADER_SIZE};
use crate::core::transfer;
use crate::error::{Result, RpcError};

/// A client transport carrying its own configuration.
#[derive(Debug, Clone, Default)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Plain call: no bulk data in either direction.
    pub async fn exec<P, R>(&self, address: &str, method: &str, params: &P, auth: &Auth) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let stream = self.dial(address).await?;
        conn_exec(stream, method, params, auth).await
    }

    /// Call with a bulk upload of exactly `bin_size` bytes from `source`.
    pub async fn put<P, R, B>(
        &self,
        address: &str,
        method: &str,
        source: &mut B,
        bin_size: u64,
        params: &P,
        auth: &Auth,
    ) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
        B: AsyncRead + Unpin + ?Sized,
    {
        let stream = self.dial(address).await?;
        conn_put(stream, method, source, bin_size, params, auth).await
    }

    /// Call downloading the bulk payload the response announces into `sink`.
    pub async fn get<P, R, W>(
        &self,
        address: &str,
        method: &str,
        sink: &mut W,
        params: &P,
        auth: &Auth,
    ) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let stream = self.dial(address).await?;
        conn_get(stream, method, sink, params, auth).await
    }

    async fn dial(&self, address: &str) -> Result<TcpStream> {
        let addr: SocketAddr = lookup_host(address)
            .await
            .map_err(|err| RpcError::Config(format!("unable to resolve address {address}: {err}")))?
            .next()
            .ok_or_else(|| RpcError::Config(format!("unable to resolve address {address}")))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        if self.config.keepalive {
            socket.set_keepalive(true)?;
        }

        let stream = tokio::time::timeout(self.config.connect_timeout, socket.connect(addr))
            .await
            .map_err(|_| {
                RpcError::Io(io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))
            })??;
        Ok(stream)
    }
}

/// [`Client::exec`] with the default configuration.
pub async fn exec<P, R>(address: &str, method: &str, params: &P, auth: &Auth) -> Result<R>
where
    P: Serialize,
    R: DeserializeOwned,
{
    Client::default().exec(address, method, params, auth).await
}

/// [`Client::put`] with the default configuration.
pub async fn put<P, R, B>(
    address: &str,
    method: &str,
    source: &mut B,
    bin_size: u64,
    params: &P,
    auth: &Auth,
) -> Result<R>
where
    P: Serialize,
    R: DeserializeOwned,
    B: AsyncRead + Unpin + ?Sized,
{
    Client::default()
        .put(address, method, source, bin_size, params, auth)
        .await
}

/// [`Client::get`] with the default configuration.
pub async fn get<P, R, W>(
    address: &str,
    method: &str,
    sink: &mut W,
    params: &P,
    auth: &Auth,
) -> Result<R>
where
    P: Serialize,
    R: DeserializeOwned,
    W: AsyncWrite + Unpin + ?Sized,
{
    Client::default()
        .get(address, method, sink, params, auth)
        .await
}

/// Drive an exec call over an already-established connection.
pub async fn conn_exec<S, P, R>(stream: S, method: &str, params: &P, auth: &Auth) -> Result<R>
where
    S: AsyncRead + AsyncWrite + Unpin,
    P: Serialize,
    R: DeserializeOwned,
{
    let (mut reader, mut writer) = split(stream);
    write_request(&mut writer, method, params, auth, 0).await?;
    let (_header, payload) = read_response(&mut reader).await?;
    Response::<R>::unpack(&payload)?.into_result()
}

/// Drive a put call over an already-established connection.
///
/// The upload and the response read run concurrently on disjoint halves of
/// the stream: the peer is allowed to answer (an auth rejection, say)
/// before draining the whole bulk stream, and the client must not stay
/// stuck writing to a peer that has stopped reading.
pub async fn conn_put<S, B, P, R>(
    stream: S,
    method: &str,
    source: &mut B,
    bin_size: u64,
    params: &P,
    auth: &Auth,
) -> Result<R>
where
    S: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + Unpin + ?Sized,
    P: Serialize,
    R: DeserializeOwned,
{
    let (mut reader, mut writer) = split(stream);
    write_request(&mut writer, method, params, auth, bin_size).await?;

    let upload = transfer::copy_exact(source, &mut writer, bin_size);
    let response = read_response(&mut reader);
    let (upload_result, response_result) = tokio::join!(upload, response);

    if let Err(err) = upload_result {
        // The response path decides the call outcome.
        debug!(error = %err, "bulk upload ended early");
    }
    let (_header, payload) = response_result?;
    Response::<R>::unpack(&payload)?.into_result()
}

/// Drive a get call over an already-established connection.
///
/// The server writes its whole response envelope before streaming bulk
/// output, so the download runs strictly after the response read.
pub async fn conn_get<S, W, P, R>(
    stream: S,
    method: &str,
    sink: &mut W,
    params: &P,
    auth: &Auth,
) -> Result<R>
where
    S: AsyncRead + AsyncWrite + Unpin,
    W: AsyncWrite + Unpin + ?Sized,
    P: Serialize,
    R: DeserializeOwned,
{
    let (mut reader, mut writer) = split(stream);
    write_request(&mut writer, method, params, auth, 0).await?;
    let (header, payload) = read_response(&mut reader).await?;
    transfer::copy_exact(&mut reader, sink, header.bin_size).await?;
    Response::<R>::unpack(&payload)?.into_result()
}

async fn write_request<W, P>(
    writer: &mut W,
    method: &str,
    params: &P,
    auth: &Auth,
    bin_size: u64,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
    P: Serialize,
{
    let payload = Request::new(method, params, auth.clone()).pack()?;
    let header = FrameHeader::new(payload.len() as u64, bin_size);
    writer.write_all(&header.pack()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_response<R>(reader: &mut R) -> Result<(FrameHeader, Vec<u8>)>
where
    R: AsyncRead + Unpin,
{
    let mut header_bytes = [0u8; HEADER_SIZE];
    transfer::read_full(reader, &mut header_bytes).await?;
    let header = FrameHeader::unpack(&header_bytes)?;
    let payload = transfer::read_exact_bytes(reader, header.rpc_size).await?;
    Ok((header, payload))
}
