//! # Stock Middleware
//!
//! Cross-cutting concerns that plug into the server's pre/post pipeline.
//!
//! All middleware share the handler function shape and receive the same
//! per-call [`Context`] as the method handler. [`log_request`] and
//! [`auth_guard`] are meant for the pre chain, [`log_response`] and
//! [`log_access`] for the post chain.
//!
//! Access lines go to the `wirecall::access` tracing target so deployments
//! can route them separately from diagnostic output.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info};

use crate::auth::check_hash;
use crate::context::Context;
use crate::error::{Result, RpcError};

/// Log the bound request at debug level.
pub async fn log_request(ctx: &mut Context) -> Result<()> {
    debug!(
        method = %ctx.method(),
        ident = %String::from_utf8_lossy(ctx.auth_ident()),
        rpc_size = ctx.request_header().rpc_size,
        bin_size = ctx.request_header().bin_size,
        "request"
    );
    Ok(())
}

/// Log the sent response at debug level.
pub async fn log_response(ctx: &mut Context) -> Result<()> {
    debug!(
        error = ctx.response_error().unwrap_or(""),
        rpc_size = ctx.response_header().rpc_size,
        bin_size = ctx.response_header().bin_size,
        "response"
    );
    Ok(())
}

/// Record one access-log line: remote host, identity, method, elapsed
/// wall time.
pub async fn log_access(ctx: &mut Context) -> Result<()> {
    info!(
        target: "wirecall::access",
        remote = %ctx.remote_host(),
        ident = %String::from_utf8_lossy(ctx.auth_ident()),
        method = %ctx.method(),
        elapsed_ms = ctx.elapsed().as_millis() as u64,
        "access"
    );
    Ok(())
}

/// Build an authentication pre-middleware around a secret lookup.
///
/// The guard resolves the presented identity to its secret, recomputes the
/// salted digest, and compares it against the presented hash. Unknown
/// identities and digest mismatches get the same error response, and the
/// call is aborted before routing.
pub fn auth_guard<L>(
    lookup: L,
) -> impl for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static
where
    L: Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
{
    let lookup = Arc::new(lookup);
    move |ctx| check_auth(Arc::clone(&lookup), ctx).boxed()
}

async fn check_auth<L>(lookup: Arc<L>, ctx: &mut Context) -> Result<()>
where
    L: Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync,
{
    let verified = lookup(ctx.auth_ident())
        .map(|secret| check_hash(ctx.auth_ident(), &secret, ctx.auth_salt(), ctx.auth_hash()))
        .unwrap_or(false);

    if !verified {
        let err = RpcError::Auth("auth ident or pass mismatch".into());
        ctx.send_error(&err).await?;
        return Err(err);
    }
    Ok(())
}
