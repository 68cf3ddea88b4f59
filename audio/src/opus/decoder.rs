//! Opus decoder.
//!
//! Kept minimal: the uplink never decodes in production, but round-trip
//! and loss-recovery checks need a real decoder on the other end.

use std::ptr;

use thiserror::Error;

use super::ffi::{self, OpusDecoder as OpusDecoderHandle};

/// Opus decoder error.
#[derive(Debug, Error)]
pub enum DecoderError {
    /// Failed to create decoder.
    #[error("opus: decoder create failed: {0}")]
    CreateFailed(String),
    /// Decoder is closed.
    #[error("opus: decoder is closed")]
    Closed,
    /// Decoding failed.
    #[error("opus: decode failed: {0}")]
    DecodeFailed(String),
}

/// Opus decoder.
pub struct Decoder {
    sample_rate: i32,
    channels: i32,
    handle: *mut OpusDecoderHandle,
}

// Safety: The decoder handle is not shared across threads.
unsafe impl Send for Decoder {}

impl Drop for Decoder {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::opus_decoder_destroy(self.handle) };
            self.handle = ptr::null_mut();
        }
    }
}

impl Decoder {
    /// Creates a new Opus decoder.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate to decode at (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    pub fn new(sample_rate: i32, channels: i32) -> Result<Self, DecoderError> {
        let mut error: i32 = 0;
        let handle = unsafe {
            ffi::opus_decoder_create(sample_rate, channels, &mut error)
        };

        if handle.is_null() || error != ffi::OPUS_OK {
            return Err(DecoderError::CreateFailed(ffi::error_string(error)));
        }

        Ok(Self {
            sample_rate,
            channels,
            handle,
        })
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> i32 {
        self.channels
    }

    /// Decodes one packet to a provided buffer. Returns samples per channel.
    ///
    /// An empty `data` slice asks the codec to conceal a lost packet.
    /// With `fec` set, `data` should be the packet after the lost one and
    /// its in-band redundancy is decoded instead of the packet itself.
    pub fn decode_to(&mut self, data: &[u8], buf: &mut [i16], fec: bool) -> Result<i32, DecoderError> {
        if self.handle.is_null() {
            return Err(DecoderError::Closed);
        }

        let (data_ptr, data_len) = if data.is_empty() {
            (ptr::null(), 0)
        } else {
            (data.as_ptr(), data.len() as i32)
        };

        let n = unsafe {
            ffi::opus_decode(
                self.handle,
                data_ptr,
                data_len,
                buf.as_mut_ptr(),
                (buf.len() / self.channels as usize) as i32,
                fec as i32,
            )
        };

        if n < 0 {
            return Err(DecoderError::DecodeFailed(ffi::error_string(n)));
        }

        Ok(n)
    }
}
