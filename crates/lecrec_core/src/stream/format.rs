//! Audio sample format and time/byte arithmetic.

use crate::error::{RecordingError, RecordingResult};

/// How samples are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    /// Signed integer PCM (unsigned for 8-bit, as WAV defines it).
    Pcm,
    /// IEEE float.
    Float,
}

/// Sample format of an audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    /// Frames per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Bits per single-channel sample.
    pub bits_per_sample: u16,
    /// Sample encoding.
    pub encoding: SampleEncoding,
}

impl AudioFormat {
    /// Creates an integer PCM format.
    #[must_use]
    pub const fn pcm(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
            encoding: SampleEncoding::Pcm,
        }
    }

    /// Checks that the format can be streamed and exported.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for zero rates or channels and for sample
    /// widths other than 8/16/24/32-bit PCM or 32-bit float.
    pub fn validate(&self) -> RecordingResult<()> {
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(RecordingError::invalid_argument(format!(
                "sample rate and channel count must be non-zero: {self:?}"
            )));
        }
        match (self.encoding, self.bits_per_sample) {
            (SampleEncoding::Pcm, 8 | 16 | 24 | 32) | (SampleEncoding::Float, 32) => Ok(()),
            (encoding, bits) => Err(RecordingError::invalid_argument(format!(
                "unsupported sample format: {bits}-bit {encoding:?}"
            ))),
        }
    }

    /// Bytes per single-channel sample.
    #[must_use]
    pub const fn bytes_per_sample(&self) -> u32 {
        (self.bits_per_sample as u32).div_ceil(8)
    }

    /// Bytes per frame (one sample for every channel).
    #[must_use]
    pub const fn frame_size(&self) -> u32 {
        self.bytes_per_sample() * self.channels as u32
    }

    /// `sample_rate × bytes_per_sample × channels`.
    #[must_use]
    pub const fn bytes_per_second(&self) -> u64 {
        self.sample_rate as u64 * self.frame_size() as u64
    }

    /// Byte offset of `millis`, rounded to the nearest whole frame.
    ///
    /// 44.1 kHz mono 16-bit: `millis_to_bytes(1000) == 88_200`.
    #[must_use]
    pub fn millis_to_bytes(&self, millis: u64) -> u64 {
        let frames = (u128::from(self.sample_rate) * u128::from(millis) + 500) / 1000;
        let bytes = frames * u128::from(self.frame_size());
        u64::try_from(bytes).unwrap_or(u64::MAX)
    }

    /// Milliseconds covered by `bytes`, truncated.
    #[must_use]
    pub fn bytes_to_millis(&self, bytes: u64) -> u64 {
        let per_second = self.bytes_per_second();
        if per_second == 0 {
            return 0;
        }
        let millis = u128::from(bytes) * 1000 / u128::from(per_second);
        u64::try_from(millis).unwrap_or(u64::MAX)
    }

    /// Milliseconds covered by `bytes`, rounded up.
    #[must_use]
    pub fn bytes_to_millis_ceil(&self, bytes: u64) -> u64 {
        let per_second = u128::from(self.bytes_per_second());
        if per_second == 0 {
            return 0;
        }
        let millis = (u128::from(bytes) * 1000).div_ceil(per_second);
        u64::try_from(millis).unwrap_or(u64::MAX)
    }

    /// Rounds `bytes` down to a frame boundary.
    #[must_use]
    pub fn align_to_frame(&self, bytes: u64) -> u64 {
        let frame = u64::from(self.frame_size());
        if frame == 0 {
            return bytes;
        }
        bytes - bytes % frame
    }

    /// The equivalent `hound` WAV spec.
    #[must_use]
    pub fn to_wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: match self.encoding {
                SampleEncoding::Pcm => hound::SampleFormat::Int,
                SampleEncoding::Float => hound::SampleFormat::Float,
            },
        }
    }
}

impl From<hound::WavSpec> for AudioFormat {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            encoding: match spec.sample_format {
                hound::SampleFormat::Int => SampleEncoding::Pcm,
                hound::SampleFormat::Float => SampleEncoding::Float,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cd_mono_arithmetic() {
        let format = AudioFormat::pcm(44_100, 1, 16);
        assert_eq!(format.bytes_per_sample(), 2);
        assert_eq!(format.frame_size(), 2);
        assert_eq!(format.bytes_per_second(), 88_200);
        assert_eq!(format.millis_to_bytes(1000), 88_200);
        assert_eq!(format.millis_to_bytes(500), 44_100);
        assert_eq!(format.bytes_to_millis(88_200), 1000);
    }

    #[test]
    fn millis_round_to_whole_frames() {
        let format = AudioFormat::pcm(44_100, 2, 16);
        // 5 ms is 220.5 frames; rounds to 221 frames of 4 bytes.
        assert_eq!(format.millis_to_bytes(5), 884);
        assert_eq!(format.millis_to_bytes(5) % u64::from(format.frame_size()), 0);
    }

    #[test]
    fn bytes_to_millis_rounding() {
        let format = AudioFormat::pcm(8_000, 1, 16);
        assert_eq!(format.bytes_to_millis(15), 0);
        assert_eq!(format.bytes_to_millis_ceil(15), 1);
        assert_eq!(format.bytes_to_millis_ceil(16_000), 1000);
    }

    #[test]
    fn align_to_frame() {
        let format = AudioFormat::pcm(48_000, 2, 24);
        assert_eq!(format.frame_size(), 6);
        assert_eq!(format.align_to_frame(13), 12);
    }

    #[test]
    fn validation() {
        assert!(AudioFormat::pcm(44_100, 1, 16).validate().is_ok());
        assert!(AudioFormat::pcm(0, 1, 16).validate().is_err());
        assert!(AudioFormat::pcm(44_100, 1, 12).validate().is_err());

        let float = AudioFormat {
            encoding: SampleEncoding::Float,
            ..AudioFormat::pcm(48_000, 2, 32)
        };
        assert!(float.validate().is_ok());
        assert_eq!(AudioFormat::from(float.to_wav_spec()), float);
    }
}
