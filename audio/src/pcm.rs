//! Caller-supplied PCM byte buffers.
//!
//! The capture side hands over raw byte arrays with an offset and length.
//! `PcmBlock` checks the requested window against the buffer before any
//! use, so a bad offset surfaces as an error instead of reading out of
//! bounds.

use thiserror::Error;

/// Bytes per 16-bit sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// PCM block error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PcmError {
    /// Requested window exceeds the buffer.
    #[error("pcm: window offset {offset} + len {len} exceeds buffer of {buf_len} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        buf_len: usize,
    },
    /// Byte length does not divide into whole samples.
    #[error("pcm: byte length {len} is not a whole number of 16-bit samples")]
    OddLength { len: usize },
}

/// Validated view over one block of interleaved 16-bit little-endian PCM.
#[derive(Debug, Clone, Copy)]
pub struct PcmBlock<'a> {
    data: &'a [u8],
}

impl<'a> PcmBlock<'a> {
    /// Creates a block over `buf[offset..offset + len]`.
    ///
    /// Fails if the window falls outside the buffer or `len` is odd.
    pub fn new(buf: &'a [u8], offset: usize, len: usize) -> Result<Self, PcmError> {
        let out_of_bounds = PcmError::OutOfBounds {
            offset,
            len,
            buf_len: buf.len(),
        };
        let end = offset.checked_add(len).ok_or(out_of_bounds.clone())?;
        if end > buf.len() {
            return Err(out_of_bounds);
        }
        if len % BYTES_PER_SAMPLE != 0 {
            return Err(PcmError::OddLength { len });
        }
        Ok(Self {
            data: &buf[offset..end],
        })
    }

    /// Returns the underlying bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.data
    }

    /// Total number of 16-bit samples across all channels.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.data.len() / BYTES_PER_SAMPLE
    }

    /// Decodes the bytes to i16 samples.
    ///
    /// Caller buffers carry no alignment guarantee, so bytes are converted
    /// rather than reinterpreted in place.
    pub fn to_samples(&self) -> Vec<i16> {
        self.data
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }
}
