//! Encoder sessions.
//!
//! An [`EncoderSession`] owns one Opus encoder tuned for a microphone
//! uplink: VoIP application, voice signal hint, 20ms frames, DTX and
//! in-band FEC. Callers feed exactly one frame of little-endian PCM
//! bytes per call and get back either a compressed frame or nothing
//! when DTX decided the interval is silence.

use thiserror::Error;
use tracing::{debug, warn};

use crate::opus::{Application, Encoder, EncoderError, Frame, Signal, MAX_PACKET_SIZE};
use crate::pcm::{PcmBlock, PcmError, BYTES_PER_SAMPLE};

/// Sample rates libopus accepts.
pub const SUPPORTED_SAMPLE_RATES: [u32; 5] = [8000, 12000, 16000, 24000, 48000];

/// 20ms frames, so fifty per second.
const FRAMES_PER_SECOND: u32 = 50;

/// Encoder session error.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Sample rate outside [`SUPPORTED_SAMPLE_RATES`].
    #[error("session: unsupported sample rate {0} Hz")]
    UnsupportedSampleRate(u32),
    /// Channel count other than mono or stereo.
    #[error("session: channel count must be 1 or 2, got {0}")]
    UnsupportedChannels(u8),
    /// Packet size cap of zero leaves no room for any output.
    #[error("session: max packet size cap must be nonzero")]
    ZeroPacketCap,
    /// Supplied block does not hold exactly one frame.
    #[error("session: block holds {supplied} samples, expected {expected} for one 20ms frame")]
    FrameSizeMismatch { expected: usize, supplied: usize },
    /// PCM window validation failed.
    #[error("session: {0}")]
    Pcm(#[from] PcmError),
    /// Codec rejected the operation.
    #[error("session: {0}")]
    Codec(#[from] EncoderError),
}

/// Configuration for [`EncoderSession`].
///
/// The defaults are the microphone uplink profile: full-band mono voice
/// at a bitrate comfortable for speech.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sample rate in Hz, one of [`SUPPORTED_SAMPLE_RATES`] (default: 48000).
    pub sample_rate: u32,
    /// Interleaved channel count, 1 or 2 (default: 1).
    pub channels: u8,
    /// Target bitrate in bits per second (default: 64000).
    pub bitrate: i32,
    /// Encoder complexity, 0 to 10 (default: 6).
    pub complexity: i32,
    /// Suppress frames during sustained silence (default: true).
    pub dtx: bool,
    /// Embed recovery data for the previous frame (default: true).
    pub inband_fec: bool,
    /// Expected packet loss percentage, 0 to 100, sizing FEC (default: 1).
    pub expected_loss_pct: i32,
    /// Cap on compressed packet size in bytes (default: 4000).
    pub max_packet_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 1,
            bitrate: 64000,
            complexity: 6,
            dtx: true,
            inband_fec: true,
            expected_loss_pct: 1,
            max_packet_bytes: MAX_PACKET_SIZE,
        }
    }
}

/// Running counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames returned to the caller.
    pub frames_encoded: u64,
    /// Frames suppressed by DTX.
    pub frames_suppressed: u64,
    /// Encode calls that failed.
    pub encode_errors: u64,
    /// Compressed bytes handed back, fillers excluded.
    pub bytes_out: u64,
}

/// One Opus encoder plus the uplink tuning profile around it.
pub struct EncoderSession {
    encoder: Encoder,
    sample_rate: u32,
    channels: u8,
    frame_size: usize,
    packet_buf: Vec<u8>,
    stats: SessionStats,
    tuning_warnings: Vec<String>,
}

impl EncoderSession {
    /// Opens a session with the given configuration.
    ///
    /// Creation fails on an unusable rate or channel count. Tuning is
    /// best-effort: a rejected setting keeps the codec default, logs a
    /// warning and lands in [`tuning_warnings`](Self::tuning_warnings).
    pub fn open(config: SessionConfig) -> Result<Self, SessionError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&config.sample_rate) {
            return Err(SessionError::UnsupportedSampleRate(config.sample_rate));
        }
        if !matches!(config.channels, 1 | 2) {
            return Err(SessionError::UnsupportedChannels(config.channels));
        }
        if config.max_packet_bytes == 0 {
            return Err(SessionError::ZeroPacketCap);
        }

        let mut encoder = Encoder::new(
            config.sample_rate as i32,
            i32::from(config.channels),
            Application::VoIP,
        )?;

        let mut tuning_warnings = Vec::new();
        let applied = [
            encoder.set_bitrate(config.bitrate),
            encoder.set_signal(Signal::Voice),
            encoder.set_complexity(config.complexity),
            encoder.set_dtx(config.dtx),
            encoder.set_frame_duration_20ms(),
            encoder.set_inband_fec(config.inband_fec),
            encoder.set_packet_loss_perc(config.expected_loss_pct),
        ];
        for result in applied {
            if let Err(e) = result {
                warn!("session tuning rejected, codec default kept: {}", e);
                tuning_warnings.push(e.to_string());
            }
        }

        debug!(
            "encoder session open: {} Hz, {} ch, {} bps target",
            config.sample_rate, config.channels, config.bitrate
        );

        Ok(Self {
            encoder,
            sample_rate: config.sample_rate,
            channels: config.channels,
            frame_size: (config.sample_rate / FRAMES_PER_SECOND) as usize,
            packet_buf: vec![0u8; config.max_packet_bytes],
            stats: SessionStats::default(),
            tuning_warnings,
        })
    }

    /// Encodes one 20ms frame out of `pcm[offset..offset + len]`.
    ///
    /// The window must hold exactly [`frame_bytes`](Self::frame_bytes)
    /// bytes of little-endian interleaved samples. Returns `Ok(None)`
    /// when DTX suppressed the interval; such fillers carry nothing
    /// worth transmitting. Errors leave the session usable.
    pub fn encode(&mut self, pcm: &[u8], offset: usize, len: usize) -> Result<Option<Frame>, SessionError> {
        match self.encode_block(pcm, offset, len) {
            Ok(Some(frame)) => {
                self.stats.frames_encoded += 1;
                self.stats.bytes_out += frame.len() as u64;
                Ok(Some(frame))
            }
            Ok(None) => {
                self.stats.frames_suppressed += 1;
                Ok(None)
            }
            Err(e) => {
                self.stats.encode_errors += 1;
                Err(e)
            }
        }
    }

    fn encode_block(&mut self, pcm: &[u8], offset: usize, len: usize) -> Result<Option<Frame>, SessionError> {
        let block = PcmBlock::new(pcm, offset, len)?;

        let expected = self.frame_size * self.channels as usize;
        let supplied = block.sample_count();
        if supplied != expected {
            return Err(SessionError::FrameSizeMismatch { expected, supplied });
        }

        let samples = block.to_samples();
        let written = self
            .encoder
            .encode_to(&samples, self.frame_size as i32, &mut self.packet_buf)?;

        let frame = Frame::from_slice(&self.packet_buf[..written]);
        if frame.is_dtx_filler() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    /// Samples per channel in one frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Bytes of PCM one [`encode`](Self::encode) call consumes.
    pub fn frame_bytes(&self) -> usize {
        self.frame_size * self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Returns a snapshot of the session counters.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Tuning settings the codec rejected at open.
    pub fn tuning_warnings(&self) -> &[String] {
        &self.tuning_warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opus::Decoder;

    fn sine_pcm_bytes(frame_size: usize, channels: usize, sample_rate: f32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(frame_size * channels * 2);
        for i in 0..frame_size {
            let sample =
                ((i as f32 * 440.0 * 2.0 * std::f32::consts::PI / sample_rate).sin() * 10000.0) as i16;
            for _ in 0..channels {
                bytes.extend_from_slice(&sample.to_le_bytes());
            }
        }
        bytes
    }

    fn config_16k() -> SessionConfig {
        SessionConfig {
            sample_rate: 16000,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.bitrate, 64000);
        assert_eq!(config.complexity, 6);
        assert!(config.dtx);
        assert!(config.inband_fec);
        assert_eq!(config.expected_loss_pct, 1);
        assert_eq!(config.max_packet_bytes, MAX_PACKET_SIZE);
    }

    #[test]
    fn test_open_default() {
        let session = EncoderSession::open(SessionConfig::default()).unwrap();
        assert_eq!(session.sample_rate(), 48000);
        assert_eq!(session.channels(), 1);
        assert_eq!(session.frame_size(), 960);
        assert_eq!(session.frame_bytes(), 1920);
        assert!(session.tuning_warnings().is_empty());
        assert_eq!(session.stats(), SessionStats::default());
    }

    #[test]
    fn test_open_rejects_unsupported_rate() {
        for rate in [0, 22050, 44100, 96000] {
            let config = SessionConfig {
                sample_rate: rate,
                ..Default::default()
            };
            assert!(matches!(
                EncoderSession::open(config),
                Err(SessionError::UnsupportedSampleRate(r)) if r == rate
            ));
        }
    }

    #[test]
    fn test_open_rejects_bad_channels() {
        for channels in [0, 3, 255] {
            let config = SessionConfig {
                channels,
                ..Default::default()
            };
            assert!(matches!(
                EncoderSession::open(config),
                Err(SessionError::UnsupportedChannels(c)) if c == channels
            ));
        }
    }

    #[test]
    fn test_open_rejects_zero_packet_cap() {
        let config = SessionConfig {
            max_packet_bytes: 0,
            ..Default::default()
        };
        assert!(matches!(
            EncoderSession::open(config),
            Err(SessionError::ZeroPacketCap)
        ));
    }

    #[test]
    fn test_open_each_supported_rate() {
        for rate in SUPPORTED_SAMPLE_RATES {
            let config = SessionConfig {
                sample_rate: rate,
                ..Default::default()
            };
            let session = EncoderSession::open(config).unwrap();
            assert_eq!(session.frame_size(), (rate / 50) as usize);
        }
    }

    #[test]
    fn test_encode_voiced_frame() {
        let mut session = EncoderSession::open(config_16k()).unwrap();
        let pcm = sine_pcm_bytes(320, 1, 16000.0);

        let frame = session.encode(&pcm, 0, pcm.len()).unwrap();
        let frame = frame.expect("voiced frame should not be suppressed");
        assert!(!frame.is_dtx_filler());

        let stats = session.stats();
        assert_eq!(stats.frames_encoded, 1);
        assert_eq!(stats.frames_suppressed, 0);
        assert_eq!(stats.encode_errors, 0);
        assert_eq!(stats.bytes_out, frame.len() as u64);
    }

    #[test]
    fn test_encode_roundtrip_through_decoder() {
        let mut session = EncoderSession::open(config_16k()).unwrap();
        let pcm = sine_pcm_bytes(320, 1, 16000.0);
        let frame = session.encode(&pcm, 0, pcm.len()).unwrap().unwrap();

        let mut decoder = Decoder::new(16000, 1).unwrap();
        let mut decoded = vec![0i16; 320];
        let n = decoder.decode_to(frame.as_bytes(), &mut decoded, false).unwrap();
        assert_eq!(n, 320);
    }

    #[test]
    fn test_silence_suppressed_with_dtx() {
        let mut session = EncoderSession::open(SessionConfig::default()).unwrap();
        let silence = vec![0u8; session.frame_bytes()];

        let mut returned = 0u64;
        let mut suppressed = 0u64;
        for _ in 0..100 {
            match session.encode(&silence, 0, silence.len()).unwrap() {
                Some(_) => returned += 1,
                None => suppressed += 1,
            }
        }

        assert!(suppressed > 0, "sustained silence should hit DTX");
        let stats = session.stats();
        assert_eq!(stats.frames_encoded, returned);
        assert_eq!(stats.frames_suppressed, suppressed);
        assert_eq!(stats.encode_errors, 0);
    }

    #[test]
    fn test_silence_transmits_without_dtx() {
        let config = SessionConfig {
            dtx: false,
            ..Default::default()
        };
        let mut session = EncoderSession::open(config).unwrap();
        let silence = vec![0u8; session.frame_bytes()];

        for _ in 0..50 {
            let frame = session.encode(&silence, 0, silence.len()).unwrap();
            assert!(frame.is_some());
        }
        assert_eq!(session.stats().frames_suppressed, 0);
    }

    #[test]
    fn test_frame_size_mismatch_strict() {
        let mut session = EncoderSession::open(SessionConfig::default()).unwrap();
        let pcm = vec![0u8; 1920];

        // Half a frame
        let err = session.encode(&pcm, 0, 1000).unwrap_err();
        assert!(matches!(
            err,
            SessionError::FrameSizeMismatch {
                expected: 960,
                supplied: 500
            }
        ));
        assert_eq!(session.stats().encode_errors, 1);

        // Session stays usable
        let result = session.encode(&pcm, 0, pcm.len());
        assert!(result.is_ok());
    }

    #[test]
    fn test_window_out_of_bounds() {
        let mut session = EncoderSession::open(SessionConfig::default()).unwrap();
        let pcm = vec![0u8; 1920];

        let err = session.encode(&pcm, 1910, 1920).unwrap_err();
        assert!(matches!(err, SessionError::Pcm(PcmError::OutOfBounds { .. })));
        assert_eq!(session.stats().encode_errors, 1);
    }

    #[test]
    fn test_window_odd_length() {
        let mut session = EncoderSession::open(SessionConfig::default()).unwrap();
        let pcm = vec![0u8; 1920];

        let err = session.encode(&pcm, 0, 1919).unwrap_err();
        assert!(matches!(err, SessionError::Pcm(PcmError::OddLength { len: 1919 })));
    }

    #[test]
    fn test_encode_at_offset() {
        let mut session = EncoderSession::open(config_16k()).unwrap();
        let frame_bytes = session.frame_bytes();

        // Two frames back to back in one buffer
        let mut pcm = sine_pcm_bytes(320, 1, 16000.0);
        pcm.extend_from_slice(&sine_pcm_bytes(320, 1, 16000.0));

        assert!(session.encode(&pcm, 0, frame_bytes).is_ok());
        assert!(session.encode(&pcm, frame_bytes, frame_bytes).is_ok());
        assert_eq!(session.stats().encode_errors, 0);
    }

    #[test]
    fn test_tuning_failure_is_nonfatal() {
        // Zero is not a valid target bitrate, the codec rejects it
        let config = SessionConfig {
            bitrate: 0,
            ..Default::default()
        };
        let mut session = EncoderSession::open(config).unwrap();

        assert_eq!(session.tuning_warnings().len(), 1);
        assert!(session.tuning_warnings()[0].contains("bitrate"));

        // Encoder default bitrate still encodes
        let pcm = sine_pcm_bytes(960, 1, 48000.0);
        let frame = session.encode(&pcm, 0, pcm.len()).unwrap();
        assert!(frame.is_some());
    }

    #[test]
    fn test_multiple_tuning_failures_collected() {
        let config = SessionConfig {
            complexity: 11,
            expected_loss_pct: 101,
            ..Default::default()
        };
        let session = EncoderSession::open(config).unwrap();
        assert_eq!(session.tuning_warnings().len(), 2);
    }

    #[test]
    fn test_stereo_session() {
        let config = SessionConfig {
            channels: 2,
            dtx: false,
            ..Default::default()
        };
        let mut session = EncoderSession::open(config).unwrap();
        assert_eq!(session.frame_bytes(), 960 * 2 * 2);

        let pcm = sine_pcm_bytes(960, 2, 48000.0);
        let frame = session.encode(&pcm, 0, pcm.len()).unwrap();
        assert!(frame.is_some());
    }

    #[test]
    fn test_stats_accumulate() {
        let config = SessionConfig {
            sample_rate: 16000,
            dtx: false,
            ..Default::default()
        };
        let mut session = EncoderSession::open(config).unwrap();
        let pcm = sine_pcm_bytes(320, 1, 16000.0);

        for _ in 0..10 {
            session.encode(&pcm, 0, pcm.len()).unwrap();
        }

        let stats = session.stats();
        assert_eq!(stats.frames_encoded, 10);
        assert_eq!(stats.encode_errors, 0);
        assert!(stats.bytes_out > 0);
    }

    #[test]
    fn test_packet_cap_respected() {
        let config = SessionConfig {
            sample_rate: 16000,
            max_packet_bytes: 100,
            ..Default::default()
        };
        let mut session = EncoderSession::open(config).unwrap();
        let pcm = sine_pcm_bytes(320, 1, 16000.0);

        for _ in 0..5 {
            if let Some(frame) = session.encode(&pcm, 0, pcm.len()).unwrap() {
                assert!(frame.len() <= 100);
            }
        }
    }
}
