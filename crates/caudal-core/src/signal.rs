//! Signal format descriptors.
//!
//! A [`SignalSpec`] describes the sample stream at one point in the pipeline:
//! rate, encoding, and channel count. The chain builder threads a running
//! `SignalSpec` forward through every stage, producing a new descriptor per
//! stage rather than mutating a shared one, so the finalized chain's formats
//! are consistent end-to-end.

/// Sample encoding for a stream at the file boundary.
///
/// Stages always exchange `f32` samples internally; the encoding tag records
/// what the source decoded from or what the sink will encode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    /// 8-bit signed PCM.
    Pcm8,
    /// 16-bit signed PCM.
    Pcm16,
    /// 24-bit signed PCM.
    Pcm24,
    /// 32-bit signed PCM.
    Pcm32,
    /// 32-bit IEEE float.
    Float32,
}

impl SampleEncoding {
    /// Bit width of one encoded sample.
    pub const fn bits(self) -> u16 {
        match self {
            SampleEncoding::Pcm8 => 8,
            SampleEncoding::Pcm16 => 16,
            SampleEncoding::Pcm24 => 24,
            SampleEncoding::Pcm32 | SampleEncoding::Float32 => 32,
        }
    }
}

/// Format of a sample stream at one point in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalSpec {
    /// Sample rate in Hz.
    pub rate: u32,
    /// Encoding at the file boundary.
    pub encoding: SampleEncoding,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl SignalSpec {
    /// Create a new spec.
    pub const fn new(rate: u32, encoding: SampleEncoding, channels: u16) -> Self {
        Self {
            rate,
            encoding,
            channels,
        }
    }

    /// True when every field matches.
    pub fn compatible_with(&self, other: &SignalSpec) -> bool {
        self == other
    }

    /// Copy of this spec with a different channel count.
    pub const fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Copy of this spec with a different sample rate.
    pub const fn with_rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }
}

impl Default for SignalSpec {
    fn default() -> Self {
        Self {
            rate: 48000,
            encoding: SampleEncoding::Float32,
            channels: 1,
        }
    }
}
