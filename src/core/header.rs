//! # Frame Header
//!
//! The fixed 32-byte header that opens every frame on the wire.
//!
//! Two magic guards bracket the two payload sizes:
//!
//! ```text
//! [magicA: i64][rpcSize: i64][binSize: i64][magicB: i64]
//! ```
//!
//! All fields are big-endian. A header whose guards do not match the
//! protocol constants is corrupt; its size fields must not be trusted.

use bytes::{Buf, BufMut};

use crate::error::{Result, RpcError};

/// First magic guard.
pub const MAGIC_CODE_A: i64 = 0xEE00_ABBA;
/// Second magic guard.
pub const MAGIC_CODE_B: i64 = 0xEE44_ABBA;
/// Packed header size in bytes: four i64 fields.
pub const HEADER_SIZE: usize = 32;

/// Sizes carried by one frame header.
///
/// The magic guards are not stored; they are written on pack and checked on
/// unpack. Sizes are kept unsigned: a negative size on the wire is rejected
/// during unpack, so a constructed header always satisfies the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameHeader {
    /// Length of the rpc envelope payload that follows the header.
    pub rpc_size: u64,
    /// Length of the raw bulk payload bound to this call, zero when none.
    pub bin_size: u64,
}

impl FrameHeader {
    pub fn new(rpc_size: u64, bin_size: u64) -> Self {
        Self { rpc_size, bin_size }
    }

    /// Serialize into the fixed 32-byte wire form.
    pub fn pack(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        {
            let mut cursor = &mut buf[..];
            cursor.put_i64(MAGIC_CODE_A);
            cursor.put_i64(self.rpc_size as i64);
            cursor.put_i64(self.bin_size as i64);
            cursor.put_i64(MAGIC_CODE_B);
        }
        buf
    }

    /// Parse the fixed 32-byte wire form.
    ///
    /// Both magic guards are verified before the size fields are used.
    pub fn unpack(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut cursor = &bytes[..];
        let magic_a = cursor.get_i64();
        let rpc_size = cursor.get_i64();
        let bin_size = cursor.get_i64();
        let magic_b = cursor.get_i64();

        if magic_a != MAGIC_CODE_A || magic_b != MAGIC_CODE_B {
            return Err(RpcError::WrongMagic);
        }
        if rpc_size < 0 {
            return Err(RpcError::InvalidSize(rpc_size));
        }
        if bin_size < 0 {
            return Err(RpcError::InvalidSize(bin_size));
        }
        Ok(Self {
            rpc_size: rpc_size as u64,
            bin_size: bin_size as u64,
        })
    }
}
