//! Caudal Effects - Built-in effects for the caudal processing chain
//!
//! Every effect here implements [`caudal_core::EffectHandler`] and follows
//! the configure/start/flow/drain/stop lifecycle:
//!
//! - [`ChannelMixer`] - N-to-1 average / 1-to-N duplicate channel converter
//! - [`RateConverter`] - Linear-interpolation resampler
//! - [`Vol`] - Gain in decibels
//! - [`Echo`] - Feedback delay line
//! - [`Lowpass`] - One-pole low-pass filter
//! - [`Pad`] - Trailing silence
//! - [`Reverse`] - Whole-signal reversal
//! - [`Stat`] - Peak/RMS reporting passthrough
//! - [`Null`] - Declared no-op
//!
//! [`BuiltinConverters`] wires the mixer and rate converter into
//! [`caudal_core::ChainBuilder`] as its implicit format converters.
//!
//! ## Example
//!
//! ```rust,ignore
//! use caudal_core::{ChainBuilder, PullScheduler, SignalSpec};
//! use caudal_effects::{BuiltinConverters, Echo, Vol};
//!
//! let mut builder = ChainBuilder::new(source.spec(), Some(sink.spec()));
//! builder.push(Box::new(Vol::new(-3.0)));
//! builder.push(Box::new(Echo::new(0.8, 0.9, 250.0, 0.4)?));
//! let chain = builder.build(&BuiltinConverters)?;
//! PullScheduler::new(chain).run(&mut source, &mut sink)?;
//! ```

pub mod echo;
pub mod lowpass;
pub mod mixer;
pub mod null;
pub mod pad;
pub mod rate;
pub mod reverse;
pub mod stat;
pub mod vol;

pub use echo::Echo;
pub use lowpass::Lowpass;
pub use mixer::ChannelMixer;
pub use null::Null;
pub use pad::Pad;
pub use rate::RateConverter;
pub use reverse::Reverse;
pub use stat::Stat;
pub use vol::Vol;

use caudal_core::{EffectHandler, ImplicitEffects};

/// The standard implicit-converter provider: [`ChannelMixer`] for channel
/// mismatches, [`RateConverter`] for rate mismatches.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinConverters;

impl ImplicitEffects for BuiltinConverters {
    fn channel_mixer(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(ChannelMixer::new())
    }

    fn rate_converter(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(RateConverter::new())
    }
}
