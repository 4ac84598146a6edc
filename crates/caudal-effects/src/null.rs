//! Declared no-op.

use caudal_core::{Caps, ChainError, EffectHandler, Result, SignalSpec, StartStatus};

/// Pure passthrough, mainly useful for exercising the chain machinery. The
/// `null_op` flag lets callers drop it from a chain without changing the
/// result.
#[derive(Debug, Clone, Default)]
pub struct Null;

impl Null {
    pub fn new() -> Self {
        Self
    }

    /// Construct from user arguments (takes none).
    pub fn from_args(args: &[String]) -> Result<Self> {
        if !args.is_empty() {
            return Err(ChainError::bad_arguments(
                "null",
                format!("takes no arguments, got {}", args.len()),
            ));
        }
        Ok(Self)
    }
}

impl EffectHandler for Null {
    fn name(&self) -> &'static str {
        "null"
    }

    fn caps(&self) -> Caps {
        Caps {
            multichannel: true,
            null_op: true,
            ..Caps::NONE
        }
    }

    fn start(&mut self, _input: &SignalSpec, _output: &SignalSpec) -> Result<StartStatus> {
        Ok(StartStatus::Ready)
    }

    fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)> {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        Ok((n, n))
    }

    fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(Self)
    }
}
