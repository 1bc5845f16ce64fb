//! # Request/Response Envelopes
//!
//! The structured payload carried inside the rpc portion of a frame.
//!
//! Envelopes are encoded as MessagePack maps with field names
//! (`rmp_serde::to_vec_named`), so a receiver can always pull `method` and
//! `auth` out of a request before it knows the concrete params type. The
//! params/result slots are type parameters: decoding with a concrete type
//! binds the opaque payload directly into that type, decoding with
//! [`serde::de::IgnoredAny`] skips it.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::auth::Auth;
use crate::error::{Result, RpcError};

/// A request envelope: method name, method-specific params, per-call auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request<P> {
    pub method: String,
    pub params: P,
    pub auth: Auth,
}

/// A response envelope.
///
/// An empty `error` string is the only success signal. `result` is `None`
/// on error responses and must be present on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response<R> {
    pub error: String,
    pub result: Option<R>,
}

/// The well-formed empty object used where no params or result exist.
///
/// Serializes as an empty map, never as nil, so the wire payload stays a
/// structurally valid object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// A request decoded only far enough to expose `method` and `auth`.
pub type RequestHead = Request<IgnoredAny>;

impl<P> Request<P> {
    pub fn new(method: impl Into<String>, params: P, auth: Auth) -> Self {
        Self {
            method: method.into(),
            params,
            auth,
        }
    }

    /// Serialize to the compact binary object encoding.
    pub fn pack(&self) -> Result<Vec<u8>>
    where
        P: Serialize,
    {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Deserialize, binding the params slot into `P`.
    pub fn unpack(bytes: &[u8]) -> Result<Self>
    where
        P: DeserializeOwned,
    {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

impl<R> Response<R> {
    /// A success response carrying `result`.
    pub fn ok(result: R) -> Self {
        Self {
            error: String::new(),
            result: Some(result),
        }
    }

    /// Serialize to the compact binary object encoding.
    pub fn pack(&self) -> Result<Vec<u8>>
    where
        R: Serialize,
    {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Deserialize, binding the result slot into `R`.
    pub fn unpack(bytes: &[u8]) -> Result<Self>
    where
        R: DeserializeOwned,
    {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// Collapse into the caller-facing outcome: a non-empty error string
    /// wins over whatever is in the result slot.
    pub fn into_result(self) -> Result<R> {
        if !self.error.is_empty() {
            return Err(RpcError::Remote(self.error));
        }
        self.result.ok_or_else(|| {
            RpcError::Decode(serde::de::Error::custom("response carries no result"))
        })
    }
}

impl Response<Empty> {
    /// An error response. The result slot is left empty.
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            result: None,
        }
    }
}
