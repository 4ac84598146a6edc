//! Signal statistics.

use caudal_core::{Caps, ChainError, EffectHandler, Result, SignalSpec, StartStatus};
use tracing::info;

/// Report-only passthrough that accumulates peak and RMS over everything it
/// sees and logs the totals when the chain stops. Because it is flagged
/// `report_only`, the chain builder keeps it out of format resolution.
#[derive(Debug, Clone, Default)]
pub struct Stat {
    count: u64,
    peak: f32,
    sum_squares: f64,
}

impl Stat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct from user arguments (takes none).
    pub fn from_args(args: &[String]) -> Result<Self> {
        if !args.is_empty() {
            return Err(ChainError::bad_arguments(
                "stat",
                format!("takes no arguments, got {}", args.len()),
            ));
        }
        Ok(Self::new())
    }

    pub fn sample_count(&self) -> u64 {
        self.count
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn rms(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        (self.sum_squares / self.count as f64).sqrt() as f32
    }
}

impl EffectHandler for Stat {
    fn name(&self) -> &'static str {
        "stat"
    }

    fn caps(&self) -> Caps {
        Caps {
            multichannel: true,
            report_only: true,
            ..Caps::NONE
        }
    }

    fn start(&mut self, _input: &SignalSpec, _output: &SignalSpec) -> Result<StartStatus> {
        self.count = 0;
        self.peak = 0.0;
        self.sum_squares = 0.0;
        Ok(StartStatus::Ready)
    }

    fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)> {
        let n = input.len().min(output.len());
        for &x in &input[..n] {
            let mag = x.abs();
            if mag > self.peak {
                self.peak = mag;
            }
            self.sum_squares += f64::from(x) * f64::from(x);
        }
        self.count += n as u64;
        output[..n].copy_from_slice(&input[..n]);
        Ok((n, n))
    }

    fn stop(&mut self) -> Result<()> {
        info!(
            samples = self.count,
            peak = self.peak,
            rms = self.rms(),
            "signal statistics"
        );
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(self.clone())
    }
}
