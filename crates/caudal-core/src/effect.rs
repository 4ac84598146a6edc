//! The effect lifecycle contract.
//!
//! Every effect moves through five states in strict order:
//!
//! 1. **Configured** — constructed from user arguments by a registry factory.
//! 2. **Started** — [`EffectHandler::start`] is called once the chain builder
//!    has resolved the effect's input and output [`SignalSpec`]s.
//! 3. **Flowing** — [`EffectHandler::flow`] converts input blocks to output
//!    blocks, repeatedly, until the source is exhausted.
//! 4. **Draining** — [`EffectHandler::drain`] emits retained state
//!    (delay-line tails, buffered windows), repeatedly, until it returns 0.
//!    The scheduler never calls `drain` again after it returns 0.
//! 5. **Stopped** — [`EffectHandler::stop`] releases resources. Runs before
//!    the source and destination are closed.
//!
//! Only the scheduler drives these transitions; effects never call each other.

use crate::error::Result;
use crate::signal::SignalSpec;

/// Capability flags declared by an effect.
///
/// The chain builder reads these to validate the chain and to decide which
/// stages need the stereo-split treatment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caps {
    /// The effect may emit a different channel count than it consumes.
    pub changes_channels: bool,
    /// The effect may emit a different sample rate than it consumes.
    pub changes_rate: bool,
    /// The effect processes interleaved multichannel data natively.
    /// Without this, 2-channel stages run as two independent mono instances.
    pub multichannel: bool,
    /// The effect only observes the stream; it never alters samples.
    pub report_only: bool,
    /// The effect is a declared no-op.
    pub null_op: bool,
}

impl Caps {
    /// No capabilities: mono in, mono out, audio-altering.
    pub const NONE: Caps = Caps {
        changes_channels: false,
        changes_rate: false,
        multichannel: false,
        report_only: false,
        null_op: false,
    };
}

/// Outcome of [`EffectHandler::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    /// The effect is active for this run.
    Ready,
    /// The effect is a no-op for this run (e.g. zero padding requested).
    /// The scheduler passes data through it untouched.
    Bypass,
}

/// A stateful audio transform with the five-operation lifecycle.
///
/// Implementations are constructed in the Configured state by a registry
/// factory, then driven exclusively by the scheduler. An effect's private
/// state is opaque to the scheduler; the scheduler only sees sample slices
/// and `(consumed, produced)` counts.
///
/// # Example
///
/// ```rust
/// use caudal_core::{Caps, EffectHandler, Result, SignalSpec, StartStatus};
///
/// #[derive(Clone)]
/// struct Gain {
///     factor: f32,
/// }
///
/// impl EffectHandler for Gain {
///     fn name(&self) -> &'static str {
///         "gain"
///     }
///
///     fn caps(&self) -> Caps {
///         Caps {
///             multichannel: true,
///             ..Caps::NONE
///         }
///     }
///
///     fn start(&mut self, _input: &SignalSpec, _output: &SignalSpec) -> Result<StartStatus> {
///         Ok(StartStatus::Ready)
///     }
///
///     fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)> {
///         let n = input.len().min(output.len());
///         for (out, inp) in output[..n].iter_mut().zip(&input[..n]) {
///             *out = inp * self.factor;
///         }
///         Ok((n, n))
///     }
///
///     fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
///         Box::new(self.clone())
///     }
/// }
/// ```
pub trait EffectHandler {
    /// Registry name of this effect.
    fn name(&self) -> &'static str;

    /// Capability flags. Defaults to [`Caps::NONE`].
    fn caps(&self) -> Caps {
        Caps::NONE
    }

    /// Bind the effect to its resolved input and output formats.
    ///
    /// Called exactly once, after the chain builder has finalized this
    /// stage's position. Implementations size internal buffers from the now
    /// known rate and channel count, and may reject the format with
    /// [`ChainError::UnsupportedFormat`](crate::ChainError::UnsupportedFormat)
    /// or declare themselves a no-op for this run via [`StartStatus::Bypass`].
    fn start(&mut self, input: &SignalSpec, output: &SignalSpec) -> Result<StartStatus>;

    /// Convert one block of input samples into output samples.
    ///
    /// Returns `(consumed, produced)`. Must consume no more than
    /// `input.len()` and produce no more than `output.len()`; either count
    /// may be zero (an effect buffering a full analysis window consumes
    /// without producing for several calls). Never called after the source
    /// is exhausted.
    fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)>;

    /// Emit retained state once input is exhausted.
    ///
    /// Returns the number of samples written into `output`. Called
    /// repeatedly until it returns 0, and never again afterward. Effects
    /// with no retained state use the default.
    fn drain(&mut self, output: &mut [f32]) -> Result<usize> {
        let _ = output;
        Ok(0)
    }

    /// Release resources. Called exactly once, in stage order, before the
    /// source and destination are closed.
    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    /// A fresh Configured-state copy of this effect.
    ///
    /// The chain builder uses this to allocate the stereo-split shadow
    /// instance: same configuration, independent state. Only called before
    /// [`start`](Self::start).
    fn duplicate(&self) -> Box<dyn EffectHandler + Send>;
}

impl std::fmt::Debug for dyn EffectHandler + Send {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandler")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Passthrough;

    impl EffectHandler for Passthrough {
        fn name(&self) -> &'static str {
            "passthrough"
        }
        fn start(&mut self, _: &SignalSpec, _: &SignalSpec) -> Result<StartStatus> {
            Ok(StartStatus::Ready)
        }
        fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)> {
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            Ok((n, n))
        }
        fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn default_drain_returns_zero() {
        let mut fx = Passthrough;
        let mut buf = [0.0f32; 8];
        assert_eq!(fx.drain(&mut buf).unwrap(), 0);
    }

    #[test]
    fn default_stop_succeeds() {
        let mut fx = Passthrough;
        assert!(fx.stop().is_ok());
    }

    #[test]
    fn default_caps_are_none() {
        assert_eq!(Passthrough.caps(), Caps::NONE);
    }

    #[test]
    fn flow_respects_capacity() {
        let mut fx = Passthrough;
        let input = [1.0f32, 2.0, 3.0, 4.0];
        let mut output = [0.0f32; 2];
        let (consumed, produced) = fx.flow(&input, &mut output).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(produced, 2);
        assert_eq!(output, [1.0, 2.0]);
    }
}
