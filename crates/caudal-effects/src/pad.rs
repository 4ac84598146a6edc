//! Trailing silence.

use caudal_core::{Caps, ChainError, EffectHandler, Result, SignalSpec, StartStatus};

/// Appends a fixed stretch of silence after the input ends. Flow is a pure
/// passthrough; the silence is produced during drain.
#[derive(Debug, Clone)]
pub struct Pad {
    seconds: f32,
    remaining: usize,
}

impl Pad {
    pub fn new(seconds: f32) -> Result<Self> {
        if seconds < 0.0 || !seconds.is_finite() {
            return Err(ChainError::bad_arguments(
                "pad",
                format!("pad length must be a non-negative number of seconds, got {seconds}"),
            ));
        }
        Ok(Self {
            seconds,
            remaining: 0,
        })
    }

    /// Construct from user arguments: `pad SECONDS`.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let [seconds] = args else {
            return Err(ChainError::bad_arguments(
                "pad",
                format!("expected 1 argument (seconds), got {}", args.len()),
            ));
        };
        let secs: f32 = seconds.parse().map_err(|_| {
            ChainError::bad_arguments("pad", format!("'{seconds}' is not a number"))
        })?;
        Self::new(secs)
    }
}

impl EffectHandler for Pad {
    fn name(&self) -> &'static str {
        "pad"
    }

    fn caps(&self) -> Caps {
        Caps {
            multichannel: true,
            ..Caps::NONE
        }
    }

    fn start(&mut self, input: &SignalSpec, _output: &SignalSpec) -> Result<StartStatus> {
        if self.seconds == 0.0 {
            return Ok(StartStatus::Bypass);
        }
        let frames = (f64::from(self.seconds) * f64::from(input.rate)).round() as usize;
        self.remaining = frames * usize::from(input.channels);
        Ok(StartStatus::Ready)
    }

    fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)> {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        Ok((n, n))
    }

    fn drain(&mut self, output: &mut [f32]) -> Result<usize> {
        let n = output.len().min(self.remaining);
        output[..n].fill(0.0);
        self.remaining -= n;
        Ok(n)
    }

    fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(self.clone())
    }
}
