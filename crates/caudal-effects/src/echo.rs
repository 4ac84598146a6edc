//! Feedback delay line.

use caudal_core::{Caps, ChainError, EffectHandler, Result, SignalSpec, StartStatus};

/// Classic feedback echo: each sample is mixed with a decayed copy of the
/// signal from `delay_ms` earlier, and the mix is fed back into the line.
///
/// The line works on a single channel; on 2-channel data the chain builder
/// runs a shadow pair over de-interleaved streams.
#[derive(Debug, Clone)]
pub struct Echo {
    gain_in: f32,
    gain_out: f32,
    delay_ms: f32,
    decay: f32,
    line: Vec<f32>,
    pos: usize,
    tail_remaining: usize,
}

impl Echo {
    pub fn new(gain_in: f32, gain_out: f32, delay_ms: f32, decay: f32) -> Result<Self> {
        if delay_ms <= 0.0 || !delay_ms.is_finite() {
            return Err(ChainError::bad_arguments(
                "echo",
                format!("delay must be a positive number of milliseconds, got {delay_ms}"),
            ));
        }
        if !(0.0..1.0).contains(&decay) {
            return Err(ChainError::bad_arguments(
                "echo",
                format!("decay must be in [0, 1), got {decay}"),
            ));
        }
        if !gain_in.is_finite() || !gain_out.is_finite() {
            return Err(ChainError::bad_arguments("echo", "gains must be finite"));
        }
        Ok(Self {
            gain_in,
            gain_out,
            delay_ms,
            decay,
            line: Vec::new(),
            pos: 0,
            tail_remaining: 0,
        })
    }

    /// Construct from user arguments: `echo GAIN_IN GAIN_OUT DELAY_MS DECAY`.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let [gain_in, gain_out, delay_ms, decay] = args else {
            return Err(ChainError::bad_arguments(
                "echo",
                format!(
                    "expected 4 arguments (gain-in gain-out delay-ms decay), got {}",
                    args.len()
                ),
            ));
        };
        let parse = |name: &str, s: &str| -> Result<f32> {
            s.parse().map_err(|_| {
                ChainError::bad_arguments("echo", format!("{name} '{s}' is not a number"))
            })
        };
        Self::new(
            parse("gain-in", gain_in)?,
            parse("gain-out", gain_out)?,
            parse("delay-ms", delay_ms)?,
            parse("decay", decay)?,
        )
    }

    /// Delay line length in samples at the resolved rate.
    pub fn delay_samples(&self) -> usize {
        self.line.len()
    }
}

impl EffectHandler for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn caps(&self) -> Caps {
        Caps::NONE
    }

    fn start(&mut self, input: &SignalSpec, _output: &SignalSpec) -> Result<StartStatus> {
        let samples = (f64::from(self.delay_ms) / 1000.0 * f64::from(input.rate)).round() as usize;
        if samples == 0 {
            return Err(ChainError::unsupported_format(
                "echo",
                format!("delay of {} ms is under one sample at {} Hz", self.delay_ms, input.rate),
            ));
        }
        self.line = vec![0.0; samples];
        self.pos = 0;
        self.tail_remaining = samples;
        Ok(StartStatus::Ready)
    }

    fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)> {
        let n = input.len().min(output.len());
        for (out, &x) in output[..n].iter_mut().zip(&input[..n]) {
            let delayed = self.line[self.pos];
            let wet = x * self.gain_in + delayed * self.decay;
            self.line[self.pos] = wet;
            self.pos = (self.pos + 1) % self.line.len();
            *out = wet * self.gain_out;
        }
        Ok((n, n))
    }

    fn drain(&mut self, output: &mut [f32]) -> Result<usize> {
        // Flush one delay's worth of decayed signal, then fall silent.
        let n = output.len().min(self.tail_remaining);
        for out in &mut output[..n] {
            let delayed = self.line[self.pos];
            self.line[self.pos] = 0.0;
            self.pos = (self.pos + 1) % self.line.len();
            *out = delayed * self.decay * self.gain_out;
        }
        self.tail_remaining -= n;
        Ok(n)
    }

    fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(self.clone())
    }
}
