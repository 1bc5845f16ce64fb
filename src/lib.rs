//! # wirecall
//!
//! Binary RPC transport: magic-delimited frames, structured envelopes, a
//! raw bulk side-channel, and per-call salted-hash authentication.
//!
//! Each call is one TCP connection used exactly once. The request and
//! response envelopes travel inside a fixed 32-byte header frame; bulk
//! uploads and downloads flow beside the envelope as unframed byte
//! streams whose lengths the header announces.
//!
//! ## Wire Format
//! ```text
//! [magicA(8)] [rpcSize(8)] [binSize(8)] [magicB(8)] [rpcPayload] [bulk]
//! ```
//!
//! ## Components
//! - **core**: frame header, envelope codec, exact-length transfer
//! - **auth**: per-call salt + digest material and verification
//! - **client**: dialing and the exec/put/get call shapes
//! - **server**: listener, handler registry, middleware pipeline
//! - **context**: per-call state handed to handlers and middleware
//! - **transport**: in-memory duplex pipe for socket-free calls
//!
//! ## Example
//! ```no_run
//! use futures::FutureExt;
//! use serde::{Deserialize, Serialize};
//! use wirecall::{Auth, Context, Service};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Greeting { message: String }
//!
//! async fn hello(ctx: &mut Context) -> wirecall::Result<()> {
//!     let params: Greeting = ctx.bind_params()?;
//!     let result = Greeting { message: format!("hello, {}!", params.message) };
//!     ctx.send_result(&result, 0).await
//! }
//!
//! # async fn run() -> wirecall::Result<()> {
//! let service = Service::default();
//! service.handler("hello", |ctx| hello(ctx).boxed())?;
//! tokio::spawn(async move { service.listen("127.0.0.1:8081").await });
//!
//! let auth = Auth::create(b"user", b"secret");
//! let params = Greeting { message: "server".into() };
//! let result: Greeting =
//!     wirecall::exec("127.0.0.1:8081", "hello", &params, &auth).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod middleware;
pub mod server;
pub mod transport;
pub mod utils;

pub use crate::auth::Auth;
pub use crate::client::{exec, get, put, Client};
pub use crate::config::{ClientConfig, LoggingConfig, ServerConfig};
pub use crate::context::Context;
pub use crate::core::envelope::{Empty, Request, Response};
pub use crate::core::header::FrameHeader;
pub use crate::error::{Result, RpcError};
pub use crate::server::{HandlerFn, Service};
pub use crate::transport::local::{local_exec, local_get, local_put};
