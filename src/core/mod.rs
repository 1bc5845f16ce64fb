//! # Core Protocol Components
//!
//! Low-level frame handling, envelope codec, and exact-length byte transfer.
//!
//! This module provides the foundation for the protocol: the fixed-size
//! frame header, the request/response envelope encoding, and the transfer
//! primitives everything above relies on for exact-length I/O.
//!
//! ## Components
//! - **Header**: fixed 32-byte frame header with two magic guards
//! - **Envelope**: request/response structures in compact binary encoding
//! - **Transfer**: exact-length read/copy with short-read/short-write detection
//!
//! ## Wire Format
//! ```text
//! [magicA(8)] [rpcSize(8)] [binSize(8)] [magicB(8)] [rpcPayload(rpcSize)] [bulk(binSize)]
//! ```
//!
//! All header fields are big-endian signed 64-bit integers. A mismatch on
//! either magic guard is a fatal decode error. The bulk payload, when
//! present, follows the rpc payload as a raw unframed byte stream.

pub mod envelope;
pub mod header;
pub mod transfer;
