//! Gain adjustment.

use caudal_core::{Caps, ChainError, EffectHandler, Result, SignalSpec, StartStatus};

/// Scales every sample by a fixed gain given in decibels.
#[derive(Debug, Clone)]
pub struct Vol {
    gain_db: f32,
    factor: f32,
}

impl Vol {
    /// Create a gain stage from a dB value.
    pub fn new(gain_db: f32) -> Self {
        Self {
            gain_db,
            factor: 10f32.powf(gain_db / 20.0),
        }
    }

    /// Construct from user arguments: `vol GAIN_DB`.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let [gain] = args else {
            return Err(ChainError::bad_arguments(
                "vol",
                format!("expected 1 argument (gain in dB), got {}", args.len()),
            ));
        };
        let gain_db: f32 = gain.parse().map_err(|_| {
            ChainError::bad_arguments("vol", format!("'{gain}' is not a number"))
        })?;
        if !gain_db.is_finite() {
            return Err(ChainError::bad_arguments("vol", "gain must be finite"));
        }
        Ok(Self::new(gain_db))
    }

    /// The configured gain in dB.
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }
}

impl EffectHandler for Vol {
    fn name(&self) -> &'static str {
        "vol"
    }

    fn caps(&self) -> Caps {
        Caps {
            multichannel: true,
            ..Caps::NONE
        }
    }

    fn start(&mut self, _input: &SignalSpec, _output: &SignalSpec) -> Result<StartStatus> {
        if self.gain_db == 0.0 {
            return Ok(StartStatus::Bypass);
        }
        Ok(StartStatus::Ready)
    }

    fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)> {
        let n = input.len().min(output.len());
        for (out, inp) in output[..n].iter_mut().zip(&input[..n]) {
            *out = inp * self.factor;
        }
        Ok((n, n))
    }

    fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(self.clone())
    }
}
