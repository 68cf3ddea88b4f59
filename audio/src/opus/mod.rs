//! Opus audio codec.
//!
//! Safe wrappers over libopus (RFC 6716) via FFI. The encoder surface
//! exposes the tuning controls a speech uplink needs: bitrate, complexity,
//! signal hint, DTX, in-band FEC and the expected packet loss percentage.
//! The decoder exists mainly to verify encoder output.
//!
//! # Example
//!
//! ```ignore
//! use micwire_audio::opus::{Encoder, Decoder, Application};
//!
//! // Create an encoder
//! let mut encoder = Encoder::new(16000, 1, Application::VoIP)?;
//! encoder.set_bitrate(24000)?;
//!
//! // Encode PCM samples
//! let pcm: Vec<i16> = vec![0i16; 320]; // 20ms at 16kHz
//! let frame = encoder.encode(&pcm, 320)?;
//!
//! // Create a decoder
//! let mut decoder = Decoder::new(16000, 1)?;
//! let mut samples = vec![0i16; 320];
//! let n = decoder.decode_to(frame.as_bytes(), &mut samples, false)?;
//! ```

mod ffi;
mod encoder;
mod decoder;
mod frame;

pub use encoder::*;
pub use decoder::*;
pub use frame::*;
