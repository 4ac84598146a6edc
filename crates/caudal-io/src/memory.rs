//! In-memory sample transport, mainly for tests and library callers that
//! already hold their signal in a `Vec`.

use caudal_core::{Result, SampleSink, SampleSource, SignalSpec};

/// Source over an owned sample buffer.
pub struct BufferSource {
    data: Vec<f32>,
    pos: usize,
    spec: SignalSpec,
}

impl BufferSource {
    pub fn new(data: Vec<f32>, spec: SignalSpec) -> Self {
        Self { data, pos: 0, spec }
    }
}

impl SampleSource for BufferSource {
    fn spec(&self) -> SignalSpec {
        self.spec
    }

    fn read(&mut self, buf: &mut [f32]) -> Result<usize> {
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Sink that appends into a growable buffer.
pub struct BufferSink {
    data: Vec<f32>,
    spec: SignalSpec,
}

impl BufferSink {
    pub fn new(spec: SignalSpec) -> Self {
        Self {
            data: Vec::new(),
            spec,
        }
    }

    /// Everything written so far.
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.data
    }
}

impl SampleSink for BufferSink {
    fn spec(&self) -> SignalSpec {
        self.spec
    }

    fn write(&mut self, buf: &[f32]) -> Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }
}
