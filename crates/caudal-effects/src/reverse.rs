//! Whole-signal reversal.

use caudal_core::{Caps, ChainError, EffectHandler, Result, SignalSpec, StartStatus};

/// Buffers the entire input during flow and emits it reversed during drain.
/// Nothing reaches downstream stages until the input is exhausted, so memory
/// use is proportional to the signal length.
///
/// Single-channel; on 2-channel data the chain builder runs a shadow pair,
/// which reverses each channel independently and keeps frames intact.
#[derive(Debug, Clone, Default)]
pub struct Reverse {
    held: Vec<f32>,
    emitted: usize,
}

impl Reverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct from user arguments (takes none).
    pub fn from_args(args: &[String]) -> Result<Self> {
        if !args.is_empty() {
            return Err(ChainError::bad_arguments(
                "reverse",
                format!("takes no arguments, got {}", args.len()),
            ));
        }
        Ok(Self::new())
    }
}

impl EffectHandler for Reverse {
    fn name(&self) -> &'static str {
        "reverse"
    }

    fn caps(&self) -> Caps {
        Caps::NONE
    }

    fn start(&mut self, _input: &SignalSpec, _output: &SignalSpec) -> Result<StartStatus> {
        self.held.clear();
        self.emitted = 0;
        Ok(StartStatus::Ready)
    }

    fn flow(&mut self, input: &[f32], _output: &mut [f32]) -> Result<(usize, usize)> {
        self.held.extend_from_slice(input);
        Ok((input.len(), 0))
    }

    fn drain(&mut self, output: &mut [f32]) -> Result<usize> {
        let remaining = self.held.len() - self.emitted;
        let n = output.len().min(remaining);
        for (i, out) in output[..n].iter_mut().enumerate() {
            *out = self.held[self.held.len() - 1 - self.emitted - i];
        }
        self.emitted += n;
        Ok(n)
    }

    fn stop(&mut self) -> Result<()> {
        self.held = Vec::new();
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caudal_core::SignalSpec;

    #[test]
    fn emits_input_reversed() {
        let mut rev = Reverse::new();
        let spec = SignalSpec::default();
        rev.start(&spec, &spec).unwrap();

        let mut sink = [0.0f32; 8];
        let (consumed, produced) = rev.flow(&[1.0, 2.0, 3.0], &mut sink).unwrap();
        assert_eq!((consumed, produced), (3, 0));
        rev.flow(&[4.0, 5.0], &mut sink).unwrap();

        let n = rev.drain(&mut sink).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&sink[..5], &[5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(rev.drain(&mut sink).unwrap(), 0);
    }

    #[test]
    fn drains_across_small_buffers() {
        let mut rev = Reverse::new();
        let spec = SignalSpec::default();
        rev.start(&spec, &spec).unwrap();

        let input: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let mut scratch = [0.0f32; 16];
        rev.flow(&input, &mut scratch).unwrap();

        let mut out = Vec::new();
        let mut buf = [0.0f32; 3];
        loop {
            let n = rev.drain(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        let expected: Vec<f32> = (0..10).rev().map(|i| i as f32).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn rejects_arguments() {
        assert!(matches!(
            Reverse::from_args(&["now".into()]),
            Err(ChainError::BadArguments { .. })
        ));
    }
}
