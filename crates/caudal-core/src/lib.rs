//! Caudal Core - the effect-chain execution engine
//!
//! This crate contains the scheduling heart of caudal: the contract every
//! effect implements, the builder that turns user requests into a runnable
//! chain, and the pull scheduler that moves sample blocks through it.
//!
//! # Core Abstractions
//!
//! - [`SignalSpec`] - rate / encoding / channel-count descriptor for a point
//!   in the pipeline
//! - [`EffectHandler`] - the five-operation effect lifecycle (configure,
//!   start, flow, drain, stop) with [`Caps`] capability flags
//! - [`ChainBuilder`] / [`Chain`] - validation, implicit converter
//!   insertion, format propagation, stereo-split shadow allocation
//! - [`PullScheduler`] - block-by-block backward-pull execution and the
//!   front-to-back drain phase
//! - [`SampleSource`] / [`SampleSink`] - the narrow seam to file-format
//!   codecs, which live outside this crate
//!
//! # Example
//!
//! ```rust,ignore
//! use caudal_core::{ChainBuilder, PullScheduler};
//!
//! let mut builder = ChainBuilder::new(source.spec(), Some(dest_spec));
//! builder.push(registry.create("echo", &["0.8", "0.9", "60", "0.4"])?);
//! let chain = builder.build(&converters)?;
//! let stats = PullScheduler::new(chain).run(&mut source, &mut sink)?;
//! println!("{} in, {} out", stats.samples_in, stats.samples_out);
//! ```
//!
//! # Design Principles
//!
//! - **Pull, don't push**: fixed per-stage buffers, backward sweeps
//! - **Explicit lifecycle**: no effect state outlives `stop`
//! - **Single-threaded**: one in-flight block, no locking

pub mod chain;
pub mod effect;
pub mod error;
pub mod io;
pub mod scheduler;
pub mod signal;
pub mod stereo;

pub use chain::{Chain, ChainBuilder, DEFAULT_BLOCK_SIZE, ImplicitEffects};
pub use effect::{Caps, EffectHandler, StartStatus};
pub use error::{ChainError, Result};
pub use io::{NullSink, SampleSink, SampleSource};
pub use scheduler::{PullScheduler, RunStats};
pub use signal::{SampleEncoding, SignalSpec};
pub use stereo::{deinterleave, interleave};
