//! Channel-count conversion by averaging or duplication.

use caudal_core::{Caps, ChainError, EffectHandler, Result, SignalSpec, StartStatus};

/// Mixes N channels down to one by averaging, or fans one channel out to N
/// by duplication. This is the implicit channel converter the chain builder
/// inserts when source and destination channel counts differ.
///
/// General N-to-M remixing is not supported; such chains need a dedicated
/// matrix effect.
#[derive(Debug, Clone, Default)]
pub struct ChannelMixer {
    in_channels: usize,
    out_channels: usize,
}

impl ChannelMixer {
    /// Create a mixer; the channel counts are resolved at `start`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct from user arguments (the mixer takes none).
    pub fn from_args(args: &[String]) -> Result<Self> {
        if !args.is_empty() {
            return Err(ChainError::bad_arguments(
                "mixer",
                format!("takes no arguments, got {}", args.len()),
            ));
        }
        Ok(Self::new())
    }
}

impl EffectHandler for ChannelMixer {
    fn name(&self) -> &'static str {
        "mixer"
    }

    fn caps(&self) -> Caps {
        Caps {
            changes_channels: true,
            multichannel: true,
            ..Caps::NONE
        }
    }

    fn start(&mut self, input: &SignalSpec, output: &SignalSpec) -> Result<StartStatus> {
        self.in_channels = usize::from(input.channels);
        self.out_channels = usize::from(output.channels);
        if self.in_channels == self.out_channels {
            return Ok(StartStatus::Bypass);
        }
        if self.in_channels != 1 && self.out_channels != 1 {
            return Err(ChainError::unsupported_format(
                "mixer",
                format!(
                    "can only mix down to or up from one channel, not {} -> {}",
                    self.in_channels, self.out_channels
                ),
            ));
        }
        Ok(StartStatus::Ready)
    }

    fn flow(&mut self, input: &[f32], output: &mut [f32]) -> Result<(usize, usize)> {
        if self.out_channels == 1 {
            // Average each input frame down to one sample.
            let n = self.in_channels;
            let frames = (input.len() / n).min(output.len());
            for (frame, out) in input.chunks_exact(n).zip(output.iter_mut()).take(frames) {
                *out = frame.iter().sum::<f32>() / n as f32;
            }
            Ok((frames * n, frames))
        } else {
            // Duplicate each input sample across every output channel.
            let n = self.out_channels;
            let frames = input.len().min(output.len() / n);
            for (inp, frame) in input.iter().zip(output.chunks_exact_mut(n)).take(frames) {
                frame.fill(*inp);
            }
            Ok((frames, frames * n))
        }
    }

    fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(self.clone())
    }
}
