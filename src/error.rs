//! # Error Types
//!
//! Error handling for the RPC transport.
//!
//! This module defines all error variants that can occur during a call,
//! from low-level I/O faults to envelope decode failures and application
//! errors reported by the remote side.
//!
//! ## Error Categories
//! - **Transport faults**: I/O errors, short reads/writes, missing stream endpoints
//! - **Protocol faults**: magic-code mismatch, invalid header sizes
//! - **Codec faults**: envelope encode/decode failures
//! - **Application faults**: authentication rejection, unknown methods,
//!   errors reported by the remote handler
//!
//! Transport, protocol, and codec faults are fatal to the call and tear the
//! connection down. Application faults travel back to the caller as a
//! structured error response over the same connection.

use std::io;
use thiserror::Error;

/// Primary error type for all transport operations.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("wrong protocol magic code")]
    WrongMagic,

    #[error("invalid payload size in header: {0}")]
    InvalidSize(i64),

    #[error("envelope encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("envelope decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("short read: got {got} of {want} bytes")]
    ShortRead { want: u64, got: u64 },

    #[error("short write: wrote {wrote} of {want} bytes")]
    ShortWrite { want: usize, wrote: usize },

    #[error("stream endpoint is not set")]
    NilStream,

    #[error("{0}")]
    Auth(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Error string reported by the remote side, surfaced verbatim.
    #[error("{0}")]
    Remote(String),

    #[error("response already sent")]
    AlreadySent,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Type alias for Results using RpcError
pub type Result<T> = std::result::Result<T, RpcError>;
