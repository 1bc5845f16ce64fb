//! # Local Transport
//!
//! An in-memory duplex pipe standing in for a TCP connection.
//!
//! [`pipe`] returns two connected stream ends: bytes written to one end are
//! read from the other, in both directions. The `local_*` shortcuts drive
//! the exact same connection-scoped client code paths as the TCP transport
//! ([`crate::client::conn_exec`] and friends) against an in-process service
//! loop, so handlers can be exercised without a socket.
//!
//! The client call and the service loop run concurrently on two tasks;
//! payloads larger than the pipe capacity flow through without deadlock
//! because the peer is always draining.

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{duplex, AsyncRead, AsyncWrite, DuplexStream};
use tokio::task::JoinHandle;

use crate::auth::Auth;
use crate::client;
use crate::context::Context;
use crate::error::{Result, RpcError};

/// Buffered capacity of each pipe direction.
pub const PIPE_CAPACITY: usize = 64 * 1024;

/// A connected pair of in-memory duplex stream ends.
pub fn pipe() -> (DuplexStream, DuplexStream) {
    duplex(PIPE_CAPACITY)
}

/// Run an exec call against `handler` without a socket.
pub async fn local_exec<P, R, F>(method: &str, params: &P, auth: &Auth, handler: F) -> Result<R>
where
    P: Serialize,
    R: DeserializeOwned,
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + 'static,
{
    let (client_conn, server_conn) = pipe();
    let server = tokio::spawn(local_service(server_conn, handler));
    let call = client::conn_exec(client_conn, method, params, auth).await;
    finish(call, server).await
}

/// Run a put call against `handler` without a socket, uploading exactly
/// `bin_size` bytes from `source`.
pub async fn local_put<P, R, B, F>(
    method: &str,
    source: &mut B,
    bin_size: u64,
    params: &P,
    auth: &Auth,
    handler: F,
) -> Result<R>
where
    P: Serialize,
    R: DeserializeOwned,
    B: AsyncRead + Unpin + ?Sized,
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + 'static,
{
    let (client_conn, server_conn) = pipe();
    let server = tokio::spawn(local_service(server_conn, handler));
    let call = client::conn_put(client_conn, method, source, bin_size, params, auth).await;
    finish(call, server).await
}

/// Run a get call against `handler` without a socket, downloading the bulk
/// payload into `sink`.
pub async fn local_get<P, R, W, F>(
    method: &str,
    sink: &mut W,
    params: &P,
    auth: &Auth,
    handler: F,
) -> Result<R>
where
    P: Serialize,
    R: DeserializeOwned,
    W: AsyncWrite + Unpin + ?Sized,
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + 'static,
{
    let (client_conn, server_conn) = pipe();
    let server = tokio::spawn(local_service(server_conn, handler));
    let call = client::conn_get(client_conn, method, sink, params, auth).await;
    finish(call, server).await
}

/// Serve exactly one call from `conn`: read the request, bind the method,
/// invoke the handler. No middleware runs on the local path.
pub async fn local_service<F>(conn: DuplexStream, handler: F) -> Result<()>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>>,
{
    let (read_half, write_half) = tokio::io::split(conn);
    let mut ctx = Context::attached(
        Box::new(read_half),
        Box::new(write_half),
        "127.0.0.1".to_string(),
    );

    ctx.read_request().await?;
    ctx.bind_method()?;
    handler(&mut ctx).await
}

async fn finish<R>(call: Result<R>, server: JoinHandle<Result<()>>) -> Result<R> {
    let served = server
        .await
        .map_err(|_| RpcError::Internal("local service task failed".into()))?;
    match (call, served) {
        (Ok(value), _) => Ok(value),
        // An error response that made it across the pipe is the outcome.
        (Err(err @ RpcError::Remote(_)), _) => Err(err),
        // A handler fault explains a client-side stream error better than
        // the bare stream error.
        (Err(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
    }
}
