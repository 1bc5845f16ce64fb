//! # Server
//!
//! Listener, per-connection dispatch, and the middleware pipeline.
//!
//! A [`Service`] holds the method handler table and two ordered middleware
//! lists. Registration happens during setup; after [`Service::listen`] the
//! tables are only read. Each accepted connection runs on its own task:
//!
//! ```text
//! accept → read request → bind method → pre-middleware (abort on error)
//!        → route by method name → post-middleware (only after success)
//!        → close
//! ```
//!
//! A panic inside a handler is caught, logged, and closes only that
//! connection; the accept loop and other in-flight connections keep
//! running. [`Service::stop`] cancels the accept loop and waits for
//! in-flight handlers to drain.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::context::Context;
use crate::error::{Result, RpcError};

/// Handler and middleware function type: borrows the per-call context for
/// the duration of one invocation.
pub type HandlerFn =
    Arc<dyn for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync>;

struct Router {
    handlers: RwLock<HashMap<String, HandlerFn>>,
    pre: RwLock<Vec<HandlerFn>>,
    post: RwLock<Vec<HandlerFn>>,
}

impl Router {
    fn lookup(&self, method: &str) -> Result<Option<HandlerFn>> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| RpcError::Internal("handler table lock poisoned".into()))?;
        Ok(handlers.get(method).cloned())
    }

    fn pre_chain(&self) -> Result<Vec<HandlerFn>> {
        let pre = self
            .pre
            .read()
            .map_err(|_| RpcError::Internal("middleware table lock poisoned".into()))?;
        Ok(pre.clone())
    }

    fn post_chain(&self) -> Result<Vec<HandlerFn>> {
        let post = self
            .post
            .read()
            .map_err(|_| RpcError::Internal("middleware table lock poisoned".into()))?;
        Ok(post.clone())
    }

    async fn route(&self, ctx: &mut Context) -> Result<()> {
        match self.lookup(ctx.method())? {
            Some(handler) => handler(ctx).await,
            None => {
                warn!(method = %ctx.method(), "method not found");
                let err = RpcError::MethodNotFound(ctx.method().to_string());
                ctx.send_error(err).await
            }
        }
    }
}

/// An RPC service: handler registry, middleware pipeline, listener.
pub struct Service {
    config: ServerConfig,
    router: Arc<Router>,
    shutdown: CancellationToken,
    active: Arc<Mutex<usize>>,
}

impl Service {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            router: Arc::new(Router {
                handlers: RwLock::new(HashMap::new()),
                pre: RwLock::new(Vec::new()),
                post: RwLock::new(Vec::new()),
            }),
            shutdown: CancellationToken::new(),
            active: Arc::new(Mutex::new(0)),
        }
    }

    /// Register the handler for a method name.
    pub fn handler<F>(&self, method: impl Into<String>, handler: F) -> Result<()>
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        let mut handlers = self
            .router
            .handlers
            .write()
            .map_err(|_| RpcError::Internal("handler table lock poisoned".into()))?;
        handlers.insert(method.into(), Arc::new(handler));
        Ok(())
    }

    /// Append a middleware that runs after the method is bound and before
    /// the handler. An error from it aborts the call.
    pub fn pre_middleware<F>(&self, middleware: F) -> Result<()>
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        let mut pre = self
            .router
            .pre
            .write()
            .map_err(|_| RpcError::Internal("middleware table lock poisoned".into()))?;
        pre.push(Arc::new(middleware));
        Ok(())
    }

    /// Append a middleware that runs after a successful handler.
    pub fn post_middleware<F>(&self, middleware: F) -> Result<()>
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        let mut post = self
            .router
            .post
            .write()
            .map_err(|_| RpcError::Internal("middleware table lock poisoned".into()))?;
        post.push(Arc::new(middleware));
        Ok(())
    }

    /// Bind the listener and accept connections until [`Service::stop`]
    /// fires. Each accepted connection runs on its own task.
    pub async fn listen(&self, address: &str) -> Result<()> {
        let listener = TcpListener::bind(address).await.map_err(|err| {
            RpcError::Config(format!("unable to start listener on {address}: {err}"))
        })?;
        info!(address, "server listening");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("accept loop stopped");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_conn(stream, peer).await,
                        Err(err) => error!(error = %err, "connection accept failed"),
                    }
                }
            }
        }
    }

    async fn spawn_conn(&self, stream: TcpStream, peer: SocketAddr) {
        {
            let mut count = self.active.lock().await;
            *count += 1;
        }
        let router = self.router.clone();
        let active = self.active.clone();

        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(handle_conn(router, stream, peer))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(peer = %peer, error = %err, "connection handler failed"),
                Err(_) => error!(peer = %peer, "connection handler panicked"),
            }
            let mut count = active.lock().await;
            *count -= 1;
        });
    }

    /// Stop accepting and wait for in-flight handlers to finish. A
    /// configured `shutdown_timeout` bounds the wait without aborting the
    /// handlers themselves.
    pub async fn stop(&self) -> Result<()> {
        self.shutdown.cancel();

        let deadline = self.config.shutdown_timeout.map(|t| Instant::now() + t);
        loop {
            let in_flight = *self.active.lock().await;
            if in_flight == 0 {
                break;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!(in_flight, "shutdown wait timed out");
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok(())
    }

    /// Number of connections currently being handled.
    pub async fn active_handlers(&self) -> usize {
        *self.active.lock().await
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

async fn handle_conn(router: Arc<Router>, stream: TcpStream, peer: SocketAddr) -> Result<()> {
    let remote_host = peer.ip().to_string();
    let (read_half, write_half) = stream.into_split();
    let mut ctx = Context::attached(Box::new(read_half), Box::new(write_half), remote_host);

    ctx.read_request().await?;
    ctx.bind_method()?;

    for middleware in router.pre_chain()? {
        middleware(&mut ctx).await?;
    }
    router.route(&mut ctx).await?;
    for middleware in router.post_chain()? {
        middleware(&mut ctx).await?;
    }
    Ok(())
}
