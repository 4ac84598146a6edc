//! WAV file reading and writing.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};
use tracing::debug;

use caudal_core::{ChainError, Result, SampleEncoding, SampleSink, SampleSource, SignalSpec};

fn codec_err(err: hound::Error) -> ChainError {
    match err {
        hound::Error::IoError(io) => ChainError::Io(io),
        other => ChainError::Format(other.to_string()),
    }
}

fn encoding_from_spec(spec: &hound::WavSpec) -> Result<SampleEncoding> {
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => Ok(SampleEncoding::Float32),
        (SampleFormat::Int, 8) => Ok(SampleEncoding::Pcm8),
        (SampleFormat::Int, 16) => Ok(SampleEncoding::Pcm16),
        (SampleFormat::Int, 24) => Ok(SampleEncoding::Pcm24),
        (SampleFormat::Int, 32) => Ok(SampleEncoding::Pcm32),
        (format, bits) => Err(ChainError::Format(format!(
            "unsupported WAV encoding: {bits}-bit {format:?}"
        ))),
    }
}

fn hound_spec(spec: SignalSpec) -> hound::WavSpec {
    let sample_format = match spec.encoding {
        SampleEncoding::Float32 => SampleFormat::Float,
        _ => SampleFormat::Int,
    };
    hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.rate,
        bits_per_sample: spec.encoding.bits(),
        sample_format,
    }
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// The stream format as a chain signal descriptor.
    pub spec: SignalSpec,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path).map_err(codec_err)?;
    let spec = reader.spec();
    let encoding = encoding_from_spec(&spec)?;
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels);
    Ok(WavInfo {
        spec: SignalSpec::new(spec.sample_rate, encoding, spec.channels),
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
    })
}

/// Streaming WAV source. Samples are decoded to f32 in blocks as the
/// scheduler pulls them; integer PCM is normalized to [-1, 1).
pub struct WavSource {
    reader: WavReader<BufReader<File>>,
    spec: SignalSpec,
}

impl std::fmt::Debug for WavSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavSource")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl WavSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = WavReader::open(&path).map_err(codec_err)?;
        let wav_spec = reader.spec();
        let encoding = encoding_from_spec(&wav_spec)?;
        let spec = SignalSpec::new(wav_spec.sample_rate, encoding, wav_spec.channels);
        debug!(
            path = %path.as_ref().display(),
            rate = spec.rate,
            channels = spec.channels,
            bits = spec.encoding.bits(),
            "opened WAV source"
        );
        Ok(Self { reader, spec })
    }

    /// Total samples across all channels, as declared by the header.
    pub fn total_samples(&self) -> u64 {
        u64::from(self.reader.len())
    }
}

impl SampleSource for WavSource {
    fn spec(&self) -> SignalSpec {
        self.spec
    }

    fn read(&mut self, buf: &mut [f32]) -> Result<usize> {
        let mut filled = 0;
        match self.spec.encoding {
            SampleEncoding::Float32 => {
                for sample in self.reader.samples::<f32>().take(buf.len()) {
                    buf[filled] = sample.map_err(codec_err)?;
                    filled += 1;
                }
            }
            encoding => {
                let scale = (1i64 << (encoding.bits() - 1)) as f32;
                for sample in self.reader.samples::<i32>().take(buf.len()) {
                    buf[filled] = sample.map_err(codec_err)? as f32 / scale;
                    filled += 1;
                }
            }
        }
        Ok(filled)
    }
}

/// Streaming WAV sink. Encodes f32 back to the destination encoding; the
/// header is patched with the final length on `finalize`.
pub struct WavSink {
    writer: Option<WavWriter<BufWriter<File>>>,
    spec: SignalSpec,
}

impl WavSink {
    pub fn create<P: AsRef<Path>>(path: P, spec: SignalSpec) -> Result<Self> {
        let writer = WavWriter::create(&path, hound_spec(spec)).map_err(codec_err)?;
        debug!(
            path = %path.as_ref().display(),
            rate = spec.rate,
            channels = spec.channels,
            bits = spec.encoding.bits(),
            "created WAV sink"
        );
        Ok(Self {
            writer: Some(writer),
            spec,
        })
    }

    fn writer(&mut self) -> Result<&mut WavWriter<BufWriter<File>>> {
        self.writer
            .as_mut()
            .ok_or_else(|| ChainError::Format("write after finalize".to_string()))
    }
}

impl SampleSink for WavSink {
    fn spec(&self) -> SignalSpec {
        self.spec
    }

    fn write(&mut self, buf: &[f32]) -> Result<usize> {
        let encoding = self.spec.encoding;
        let writer = self.writer()?;
        match encoding {
            SampleEncoding::Float32 => {
                for &sample in buf {
                    writer.write_sample(sample).map_err(codec_err)?;
                }
            }
            encoding => {
                let scale = (1i64 << (encoding.bits() - 1)) as f32;
                for &sample in buf {
                    let quantized = (sample * scale).clamp(-scale, scale - 1.0) as i32;
                    writer.write_sample(quantized).map_err(codec_err)?;
                }
            }
        }
        Ok(buf.len())
    }

    fn finalize(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(codec_err)?;
        }
        Ok(())
    }
}
