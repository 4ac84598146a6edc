//! Source and sink traits at the codec boundary.
//!
//! File-format decoding and encoding live outside this crate; the scheduler
//! only needs a block reader and a block writer exchanging interleaved `f32`
//! samples. `caudal-io` provides WAV and in-memory implementations.

use crate::error::Result;
use crate::signal::SignalSpec;

/// A decoded sample stream feeding the chain.
pub trait SampleSource {
    /// Format of the decoded stream.
    fn spec(&self) -> SignalSpec;

    /// Read up to `buf.len()` interleaved samples.
    ///
    /// Returns the number of samples read; 0 signals exhaustion. A return of
    /// 0 is sticky: once exhausted, every further call returns 0.
    fn read(&mut self, buf: &mut [f32]) -> Result<usize>;
}

/// An encoder consuming the chain's output.
pub trait SampleSink {
    /// Format the sink encodes to.
    fn spec(&self) -> SignalSpec;

    /// Write `buf` interleaved samples, returning how many were accepted.
    fn write(&mut self, buf: &[f32]) -> Result<usize>;

    /// Flush and close the destination. Called after every stage has
    /// stopped; no writes follow.
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A sink that discards everything, for preview and analysis-only runs.
#[derive(Debug, Clone)]
pub struct NullSink {
    spec: SignalSpec,
    written: usize,
}

impl NullSink {
    /// Create a null sink claiming the given format.
    pub fn new(spec: SignalSpec) -> Self {
        Self { spec, written: 0 }
    }

    /// Total samples discarded so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl SampleSink for NullSink {
    fn spec(&self) -> SignalSpec {
        self.spec
    }

    fn write(&mut self, buf: &[f32]) -> Result<usize> {
        self.written += buf.len();
        Ok(buf.len())
    }
}
