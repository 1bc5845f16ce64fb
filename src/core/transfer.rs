//! # Exact-Length Byte Transfer
//!
//! Reliable exact-length reads and copies between async streams.
//!
//! These are the only primitives in the crate allowed to observe partial
//! I/O. Every higher layer hands them a size taken from a frame header and
//! assumes the transfer either moves exactly that many bytes or fails:
//! early EOF surfaces as [`RpcError::ShortRead`], a writer that stops
//! accepting bytes as [`RpcError::ShortWrite`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, RpcError};

/// Intermediate buffer size for streamed copies.
pub const COPY_BUFFER_SIZE: usize = 16 * 1024;

/// Fill `buf` completely or fail with `ShortRead`.
pub async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let want = buf.len();
    let mut filled = 0;
    while filled < want {
        let received = reader.read(&mut buf[filled..]).await?;
        if received == 0 {
            return Err(RpcError::ShortRead {
                want: want as u64,
                got: filled as u64,
            });
        }
        filled += received;
    }
    Ok(())
}

/// Read exactly `size` bytes into a fresh buffer.
pub async fn read_exact_bytes<R>(reader: &mut R, size: u64) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let len = usize::try_from(size).map_err(|_| RpcError::InvalidSize(size as i64))?;
    let mut buf = vec![0u8; len];
    read_full(reader, &mut buf).await?;
    Ok(buf)
}

/// Stream exactly `size` bytes from `reader` into `writer` through a
/// bounded intermediate buffer. Returns the number of bytes moved.
///
/// A write returning zero while bytes remain is a `ShortWrite`; partial
/// writes below that are retried until the chunk is fully consumed.
pub async fn copy_exact<R, W>(reader: &mut R, writer: &mut W, size: u64) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total: u64 = 0;

    while total < size {
        let chunk = (size - total).min(COPY_BUFFER_SIZE as u64) as usize;
        let received = reader.read(&mut buffer[..chunk]).await?;
        if received == 0 {
            return Err(RpcError::ShortRead {
                want: size,
                got: total,
            });
        }

        let mut written = 0;
        while written < received {
            let accepted = writer.write(&buffer[written..received]).await?;
            if accepted == 0 {
                return Err(RpcError::ShortWrite {
                    want: received,
                    wrote: written,
                });
            }
            written += accepted;
        }
        total += received as u64;
    }

    writer.flush().await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Writer that accepts nothing, as a peer that stopped reading would.
    struct DeadWriter;

    impl AsyncWrite for DeadWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(0))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn copies_exactly_the_requested_size() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let mut reader = &data[..];
        let mut sink = Vec::new();

        let moved = copy_exact(&mut reader, &mut sink, data.len() as u64)
            .await
            .expect("copy");
        assert_eq!(moved, data.len() as u64);
        assert_eq!(sink, data);
    }

    #[tokio::test]
    async fn early_eof_is_a_short_read() {
        let data = [1u8, 2, 3, 4];
        let mut reader = &data[..];
        let mut sink = Vec::new();

        match copy_exact(&mut reader, &mut sink, 16).await {
            Err(RpcError::ShortRead { want: 16, got: 4 }) => {}
            other => panic!("expected short read, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dead_writer_is_a_short_write() {
        let data = [0u8; 64];
        let mut reader = &data[..];

        match copy_exact(&mut reader, &mut DeadWriter, 64).await {
            Err(RpcError::ShortWrite { wrote: 0, .. }) => {}
            other => panic!("expected short write, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_exact_bytes_returns_full_buffer() {
        let data: Vec<u8> = (0..500u16).map(|i| (i % 256) as u8).collect();
        let mut reader = &data[..];

        let buf = read_exact_bytes(&mut reader, 500).await.expect("read");
        assert_eq!(buf, data);

        let mut rest = &data[..10];
        match read_exact_bytes(&mut rest, 11).await {
            Err(RpcError::ShortRead { want: 11, got: 10 }) => {}
            other => panic!("expected short read, got {other:?}"),
        }
    }
}
