//! One-pole low-pass filter.

use caudal_core::{Caps, ChainError, EffectHandler, Result, SignalSpec, StartStatus};

/// Single-pole IIR low-pass. Gentle 6 dB/octave slope; the coefficient is
/// derived from the cutoff and the resolved input rate at `start`.
///
/// Single-channel; on 2-channel data the chain builder runs a shadow pair
/// over de-interleaved streams.
#[derive(Debug, Clone)]
pub struct Lowpass {
    cutoff_hz: f32,
    coeff: f32,
    state: f32,
}

impl Lowpass {
    pub fn new(cutoff_hz: f32) -> Result<Self> {
        if cutoff_hz <= 0.0 || !cutoff_hz.is_finite() {
            return Err(ChainError::bad_arguments(
                "lowpass",
                format!("cutoff must be a positive frequency in Hz, got {cutoff_hz}"),
            ));
        }
        Ok(Self {
            cutoff_hz,
            coeff: 0.0,
            state: 0.0,
        })
    }

    /// Construct from user arguments: `lowpass CUTOFF_HZ`.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let [cutoff] = args else {
            return Err(ChainError::bad_arguments(
                "lowpass",
                format!("expected 1 argument (cutoff in Hz), got {}", args.len()),
            ));
        };
        let cutoff_hz: f32 = cutoff.parse().map_err(|_| {
            ChainError::bad_arguments("lowpass", format!("'{cutoff}' is not a number"))
        })?;
        Self::new(cutoff_hz)
    }
}

impl EffectHandler for Lowpass {
    fn name(&self) -> &'static str {
        "lowpass"
    }

    fn caps(&self) -> Caps {
        Caps::NONE
    }

    fn start(&mut self, input: &SignalSpec, _output: &SignalSpec) -> Result<StartStatus> {
        let nyquist = input.rate as f32 / 2.0;
        if self.cutoff_hz >= nyquist {
            return Err(ChainError::unsupported_format(
                "lowpass",
                format!(
                    "cutoff {} Hz is at or above Nyquist ({} Hz) for a {} Hz stream",
                    self.cutoff_hz, nyquist, input.rate
                ),
            ));
        }
        self.coeff =
            (-2.0 * std::f32::consts::PI * self.cutoff_hz / input.rate as f32).exp();
        self.state = 0.0;
        Ok(StartStatus::Ready)
    }

    fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)> {
        let n = input.len().min(output.len());
        for (out, &x) in output[..n].iter_mut().zip(&input[..n]) {
            self.state = (1.0 - self.coeff) * x + self.coeff * self.state;
            *out = self.state;
        }
        Ok((n, n))
    }

    fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caudal_core::SampleEncoding;

    fn spec(rate: u32) -> SignalSpec {
        SignalSpec::new(rate, SampleEncoding::Float32, 1)
    }

    #[test]
    fn dc_passes_through() {
        let mut lp = Lowpass::new(100.0).unwrap();
        lp.start(&spec(8000), &spec(8000)).unwrap();

        let input = vec![1.0f32; 4000];
        let mut output = vec![0.0f32; 4000];
        lp.flow(&input, &mut output).unwrap();
        // Settles toward the DC level.
        assert!((output[3999] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn attenuates_alternating_signal() {
        let mut lp = Lowpass::new(100.0).unwrap();
        lp.start(&spec(8000), &spec(8000)).unwrap();

        // Signal at Nyquist alternates sign every sample.
        let input: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let mut output = vec![0.0f32; 1000];
        lp.flow(&input, &mut output).unwrap();
        let peak = output[500..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak < 0.05, "peak {peak}");
    }

    #[test]
    fn cutoff_at_nyquist_is_unsupported() {
        let mut lp = Lowpass::new(4000.0).unwrap();
        let err = lp.start(&spec(8000), &spec(8000)).unwrap_err();
        assert!(matches!(err, ChainError::UnsupportedFormat { .. }));
    }

    #[test]
    fn rejects_nonpositive_cutoff() {
        assert!(matches!(
            Lowpass::new(0.0),
            Err(ChainError::BadArguments { .. })
        ));
        assert!(matches!(
            Lowpass::from_args(&["-50".into()]),
            Err(ChainError::BadArguments { .. })
        ));
    }
}
