//! Opus encoder.

use std::os::raw::c_int;
use std::ptr;

use thiserror::Error;

use super::ffi::{self, OpusEncoder as OpusEncoderHandle};
use super::frame::Frame;

/// Largest compressed packet libopus produces for a single frame.
/// Output buffers of this size never truncate a packet.
pub const MAX_PACKET_SIZE: usize = 4000;

/// Opus application type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Application {
    /// Best quality for voice signals.
    VoIP,
    /// Best quality for non-voice signals.
    Audio,
    /// Minimum possible coding delay.
    RestrictedLowdelay,
}

impl Application {
    fn to_ffi(&self) -> i32 {
        match self {
            Self::VoIP => ffi::OPUS_APPLICATION_VOIP,
            Self::Audio => ffi::OPUS_APPLICATION_AUDIO,
            Self::RestrictedLowdelay => ffi::OPUS_APPLICATION_RESTRICTED_LOWDELAY,
        }
    }
}

/// Signal hint steering the encoder's speech/music mode decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Bias toward the speech codec paths.
    Voice,
    /// Bias toward the music codec paths.
    Music,
}

impl Signal {
    fn to_ffi(&self) -> i32 {
        match self {
            Self::Voice => ffi::OPUS_SIGNAL_VOICE,
            Self::Music => ffi::OPUS_SIGNAL_MUSIC,
        }
    }
}

/// Opus encoder error.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// Failed to create encoder.
    #[error("opus: encoder create failed: {0}")]
    CreateFailed(String),
    /// Encoder is closed.
    #[error("opus: encoder is closed")]
    Closed,
    /// Encoding failed.
    #[error("opus: encode failed: {0}")]
    EncodeFailed(String),
    /// Failed to set an encoder option.
    #[error("opus: set {option} failed: {reason}")]
    SetOptionFailed {
        option: &'static str,
        reason: String,
    },
}

/// Opus encoder.
pub struct Encoder {
    sample_rate: i32,
    channels: i32,
    handle: *mut OpusEncoderHandle,
}

// Safety: The encoder handle is not shared across threads.
unsafe impl Send for Encoder {}

impl Drop for Encoder {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::opus_encoder_destroy(self.handle) };
            self.handle = ptr::null_mut();
        }
    }
}

impl Encoder {
    /// Creates a new Opus encoder.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    /// - `application`: Intended application type
    pub fn new(sample_rate: i32, channels: i32, application: Application) -> Result<Self, EncoderError> {
        let mut error: i32 = 0;
        let handle = unsafe {
            ffi::opus_encoder_create(
                sample_rate,
                channels,
                application.to_ffi(),
                &mut error,
            )
        };

        if handle.is_null() || error != ffi::OPUS_OK {
            return Err(EncoderError::CreateFailed(ffi::error_string(error)));
        }

        Ok(Self {
            sample_rate,
            channels,
            handle,
        })
    }

    /// Creates a new VoIP encoder.
    pub fn new_voip(sample_rate: i32, channels: i32) -> Result<Self, EncoderError> {
        Self::new(sample_rate, channels, Application::VoIP)
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> i32 {
        self.channels
    }

    /// Encodes PCM samples to an Opus frame.
    ///
    /// # Parameters
    /// - `pcm`: Input PCM samples (frame_size * channels samples)
    /// - `frame_size`: Number of samples per channel
    pub fn encode(&mut self, pcm: &[i16], frame_size: i32) -> Result<Frame, EncoderError> {
        if self.handle.is_null() {
            return Err(EncoderError::Closed);
        }

        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let n = unsafe {
            ffi::opus_encode(
                self.handle,
                pcm.as_ptr(),
                frame_size,
                buf.as_mut_ptr(),
                buf.len() as i32,
            )
        };

        if n < 0 {
            return Err(EncoderError::EncodeFailed(ffi::error_string(n)));
        }

        buf.truncate(n as usize);
        Ok(Frame::new(buf))
    }

    /// Encodes to a provided buffer. Returns number of bytes written.
    ///
    /// The buffer length caps the packet size; libopus lowers quality
    /// rather than overrun it.
    pub fn encode_to(&mut self, pcm: &[i16], frame_size: i32, buf: &mut [u8]) -> Result<usize, EncoderError> {
        if self.handle.is_null() {
            return Err(EncoderError::Closed);
        }

        let n = unsafe {
            ffi::opus_encode(
                self.handle,
                pcm.as_ptr(),
                frame_size,
                buf.as_mut_ptr(),
                buf.len() as i32,
            )
        };

        if n < 0 {
            return Err(EncoderError::EncodeFailed(ffi::error_string(n)));
        }

        Ok(n as usize)
    }

    /// Sets the target bitrate in bits per second.
    pub fn set_bitrate(&mut self, bitrate: i32) -> Result<(), EncoderError> {
        self.set_option("bitrate", ffi::OPUS_SET_BITRATE_REQUEST, bitrate)
    }

    /// Sets the encoder complexity (0-10).
    pub fn set_complexity(&mut self, complexity: i32) -> Result<(), EncoderError> {
        self.set_option("complexity", ffi::OPUS_SET_COMPLEXITY_REQUEST, complexity)
    }

    /// Sets the signal hint.
    pub fn set_signal(&mut self, signal: Signal) -> Result<(), EncoderError> {
        self.set_option("signal", ffi::OPUS_SET_SIGNAL_REQUEST, signal.to_ffi())
    }

    /// Enables or disables discontinuous transmission.
    ///
    /// With DTX on, sustained silence produces filler packets of at most
    /// two bytes instead of full frames.
    pub fn set_dtx(&mut self, enabled: bool) -> Result<(), EncoderError> {
        self.set_option("dtx", ffi::OPUS_SET_DTX_REQUEST, enabled as i32)
    }

    /// Enables or disables in-band forward error correction.
    pub fn set_inband_fec(&mut self, enabled: bool) -> Result<(), EncoderError> {
        self.set_option("inband fec", ffi::OPUS_SET_INBAND_FEC_REQUEST, enabled as i32)
    }

    /// Sets the expected packet loss percentage (0-100) used to size FEC.
    pub fn set_packet_loss_perc(&mut self, percentage: i32) -> Result<(), EncoderError> {
        self.set_option("packet loss perc", ffi::OPUS_SET_PACKET_LOSS_PERC_REQUEST, percentage)
    }

    /// Pins the encoder to 20ms frames.
    pub fn set_frame_duration_20ms(&mut self) -> Result<(), EncoderError> {
        self.set_option("frame duration", ffi::OPUS_SET_EXPERT_FRAME_DURATION_REQUEST, ffi::OPUS_FRAMESIZE_20_MS)
    }

    /// Returns the frame size for 20ms frames (recommended default).
    pub fn frame_size_20ms(&self) -> i32 {
        self.sample_rate * 20 / 1000
    }

    fn set_option(&mut self, option: &'static str, request: c_int, value: c_int) -> Result<(), EncoderError> {
        if self.handle.is_null() {
            return Err(EncoderError::Closed);
        }

        let ret = unsafe { ffi::opus_encoder_ctl(self.handle, request, value) };

        if ret != ffi::OPUS_OK {
            return Err(EncoderError::SetOptionFailed {
                option,
                reason: ffi::error_string(ret),
            });
        }

        Ok(())
    }
}
