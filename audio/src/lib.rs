//! Opus voice encoding for microphone uplink streaming.
//!
//! This crate wraps libopus behind safe session objects tuned for
//! low-latency speech:
//!
//! - `opus`: safe encoder/decoder wrappers over libopus via FFI
//! - `pcm`: validated views over caller-supplied 16-bit PCM byte buffers
//! - `session`: encoder sessions holding the uplink tuning profile
//!
//! # Example
//!
//! ```no_run
//! use micwire_audio::session::{EncoderSession, SessionConfig};
//!
//! # fn main() -> Result<(), micwire_audio::session::SessionError> {
//! // Open a session with the default voice profile (48kHz mono, 64kbps)
//! let mut session = EncoderSession::open(SessionConfig::default())?;
//!
//! // Feed exactly one 20ms block of little-endian PCM bytes per call
//! let pcm = vec![0u8; session.frame_bytes()];
//! match session.encode(&pcm, 0, pcm.len())? {
//!     Some(frame) => send(frame.as_bytes()),
//!     None => (), // silence suppressed by DTX, nothing to transmit
//! }
//! # Ok(())
//! # }
//! # fn send(_bytes: &[u8]) {}
//! ```

pub mod opus;
pub mod pcm;
pub mod session;

pub use session::{EncoderSession, SessionConfig};
