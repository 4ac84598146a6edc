//! Sample-rate conversion by linear interpolation.

use caudal_core::{Caps, ChainError, EffectHandler, Result, SignalSpec, StartStatus};

/// Linear-interpolation resampler between the resolved input and output
/// rates. This is the implicit converter the chain builder inserts when the
/// rates differ.
///
/// The converter is inherently single-channel; on 2-channel data the chain
/// builder runs a shadow pair over de-interleaved streams.
#[derive(Debug, Clone)]
pub struct RateConverter {
    /// Input samples advanced per output sample.
    step: f64,
    /// Fractional position between `prev` and the next input sample.
    pos: f64,
    prev: f32,
    primed: bool,
}

impl RateConverter {
    /// Create a converter; the rates are resolved at `start`.
    pub fn new() -> Self {
        Self {
            step: 1.0,
            pos: 0.0,
            prev: 0.0,
            primed: false,
        }
    }

    /// Construct from user arguments (the converter takes none; it reads
    /// both rates from its resolved formats).
    pub fn from_args(args: &[String]) -> Result<Self> {
        if !args.is_empty() {
            return Err(ChainError::bad_arguments(
                "rate",
                format!("takes no arguments, got {}", args.len()),
            ));
        }
        Ok(Self::new())
    }
}

impl Default for RateConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectHandler for RateConverter {
    fn name(&self) -> &'static str {
        "rate"
    }

    fn caps(&self) -> Caps {
        Caps {
            changes_rate: true,
            ..Caps::NONE
        }
    }

    fn start(&mut self, input: &SignalSpec, output: &SignalSpec) -> Result<StartStatus> {
        if input.rate == output.rate {
            return Ok(StartStatus::Bypass);
        }
        self.step = f64::from(input.rate) / f64::from(output.rate);
        self.pos = 0.0;
        self.prev = 0.0;
        self.primed = false;
        Ok(StartStatus::Ready)
    }

    fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)> {
        let mut consumed = 0;
        let mut produced = 0;
        if !self.primed {
            if input.is_empty() {
                return Ok((0, 0));
            }
            self.prev = input[0];
            consumed = 1;
            self.primed = true;
        }
        loop {
            if self.pos >= 1.0 {
                if consumed >= input.len() {
                    break;
                }
                self.prev = input[consumed];
                consumed += 1;
                self.pos -= 1.0;
                continue;
            }
            if produced >= output.len() || consumed >= input.len() {
                break;
            }
            let next = input[consumed];
            output[produced] = self.prev + (next - self.prev) * self.pos as f32;
            produced += 1;
            self.pos += self.step;
        }
        Ok((consumed, produced))
    }

    fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(self.clone())
    }
}
