// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Newline-delimited JSON framing used on the network link.

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::ChannelError;

/// Upper bound for a single frame; a sample line is well under 200 bytes
pub(crate) const MAX_FRAME_LEN: usize = 64 * 1024;

/// Serialize `value` as one JSON line and flush it
pub(crate) async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), ChannelError>
where
    W: AsyncWrite + Unpin + ?Sized,
    T: Serialize + ?Sized,
{
    let mut frame = serde_json::to_vec(value)?;
    frame.push(b'\n');
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read the next JSON line, `Ok(None)` on a clean end of stream
pub(crate) async fn read_frame<R, T>(
    reader: &mut R,
    line: &mut Vec<u8>,
) -> Result<Option<T>, ChannelError>
where
    R: AsyncBufRead + Unpin + ?Sized,
    T: DeserializeOwned,
{
    line.clear();
    let read = (&mut *reader)
        .take(MAX_FRAME_LEN as u64 + 1)
        .read_until(b'\n', line)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if line.len() > MAX_FRAME_LEN {
        return Err(ChannelError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds {MAX_FRAME_LEN}", line.len()),
        )));
    }
    Ok(Some(serde_json::from_slice(line)?))
}
