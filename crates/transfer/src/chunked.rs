use std::io::SeekFrom;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use crate::TransferError;

/// A seekable async byte source (a file, an in-memory cursor, ...).
///
/// The source is exclusively owned by one upload for its duration; every
/// read seeks first, so the cursor position between calls is irrelevant.
pub trait ByteSource: AsyncRead + AsyncSeek + Unpin + Send {}

impl<T: AsyncRead + AsyncSeek + Unpin + Send> ByteSource for T {}

/// Returns the total length of `src`, leaving its position unchanged.
pub async fn source_len<S: ByteSource + ?Sized>(src: &mut S) -> Result<u64, TransferError> {
    let pos = src.stream_position().await?;
    let len = src.seek(SeekFrom::End(0)).await?;
    src.seek(SeekFrom::Start(pos)).await?;
    Ok(len)
}

/// Seeks to `offset` and reads up to `max_bytes`.
///
/// Short reads are retried until either the window is full or the source
/// hits EOF, so the returned length is only smaller than `max_bytes` at the
/// end of the source. Reading at or past EOF returns an empty buffer.
pub async fn read_window<S: ByteSource + ?Sized>(
    src: &mut S,
    offset: u64,
    max_bytes: usize,
) -> Result<Vec<u8>, TransferError> {
    if max_bytes == 0 {
        return Err(TransferError::InvalidArgument(
            "max_bytes must be greater than zero".into(),
        ));
    }

    src.seek(SeekFrom::Start(offset)).await?;

    let mut buf = vec![0u8; max_bytes];
    let mut filled = 0;
    while filled < max_bytes {
        let n = src.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}
