//! Effect registry and factory for the caudal processing chain.
//!
//! This crate provides a centralized registry for discovering and
//! instantiating effects. It enables effect selection by name on the command
//! line and provides metadata for help output.
//!
//! # Example
//!
//! ```rust
//! use caudal_registry::EffectRegistry;
//!
//! let registry = EffectRegistry::new();
//!
//! // List all effects
//! for effect in registry.all_effects() {
//!     println!("{}: {}", effect.name, effect.description);
//! }
//!
//! // Create an effect by name with its arguments
//! let vol = registry.create("vol", &["-6.0".to_string()]).unwrap();
//! assert_eq!(vol.name(), "vol");
//! ```

use caudal_core::{Caps, ChainError, EffectHandler, Result};
use caudal_effects::{ChannelMixer, Echo, Lowpass, Null, Pad, RateConverter, Reverse, Stat, Vol};

/// Describes an effect in the registry.
#[derive(Debug, Clone)]
pub struct EffectDescriptor {
    /// Unique identifier, as written on the command line.
    pub name: &'static str,
    /// Brief description of the effect.
    pub description: &'static str,
    /// Argument synopsis for help output.
    pub usage: &'static str,
    /// The capabilities the effect will declare once configured.
    pub caps: Caps,
}

/// Factory function type for configuring effects from their arguments.
type EffectFactory = fn(&[String]) -> Result<Box<dyn EffectHandler + Send>>;

struct RegistryEntry {
    descriptor: EffectDescriptor,
    factory: EffectFactory,
}

/// Registry of all available effects.
///
/// All built-in effects are registered on construction; `create` hands back
/// a configured handler ready to be pushed into a chain builder.
pub struct EffectRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    /// Create a new registry with all built-in effects registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(9),
        };
        registry.register_builtin_effects();
        registry
    }

    fn register_builtin_effects(&mut self) {
        self.register(
            EffectDescriptor {
                name: "vol",
                description: "Adjust gain by a fixed amount in decibels",
                usage: "vol GAIN_DB",
                caps: Caps {
                    multichannel: true,
                    ..Caps::NONE
                },
            },
            |args| Ok(Box::new(Vol::from_args(args)?)),
        );

        self.register(
            EffectDescriptor {
                name: "echo",
                description: "Feedback delay line",
                usage: "echo GAIN_IN GAIN_OUT DELAY_MS DECAY",
                caps: Caps::NONE,
            },
            |args| Ok(Box::new(Echo::from_args(args)?)),
        );

        self.register(
            EffectDescriptor {
                name: "lowpass",
                description: "One-pole low-pass filter",
                usage: "lowpass CUTOFF_HZ",
                caps: Caps::NONE,
            },
            |args| Ok(Box::new(Lowpass::from_args(args)?)),
        );

        self.register(
            EffectDescriptor {
                name: "pad",
                description: "Append trailing silence",
                usage: "pad SECONDS",
                caps: Caps {
                    multichannel: true,
                    ..Caps::NONE
                },
            },
            |args| Ok(Box::new(Pad::from_args(args)?)),
        );

        self.register(
            EffectDescriptor {
                name: "reverse",
                description: "Reverse the entire signal",
                usage: "reverse",
                caps: Caps::NONE,
            },
            |args| Ok(Box::new(Reverse::from_args(args)?)),
        );

        self.register(
            EffectDescriptor {
                name: "stat",
                description: "Report peak and RMS without altering the signal",
                usage: "stat",
                caps: Caps {
                    multichannel: true,
                    report_only: true,
                    ..Caps::NONE
                },
            },
            |args| Ok(Box::new(Stat::from_args(args)?)),
        );

        self.register(
            EffectDescriptor {
                name: "null",
                description: "Pass the signal through unchanged",
                usage: "null",
                caps: Caps {
                    multichannel: true,
                    null_op: true,
                    ..Caps::NONE
                },
            },
            |args| Ok(Box::new(Null::from_args(args)?)),
        );

        self.register(
            EffectDescriptor {
                name: "mixer",
                description: "Convert channel count by averaging or duplication",
                usage: "mixer",
                caps: Caps {
                    changes_channels: true,
                    multichannel: true,
                    ..Caps::NONE
                },
            },
            |args| Ok(Box::new(ChannelMixer::from_args(args)?)),
        );

        self.register(
            EffectDescriptor {
                name: "rate",
                description: "Resample to the destination rate",
                usage: "rate",
                caps: Caps {
                    changes_rate: true,
                    ..Caps::NONE
                },
            },
            |args| Ok(Box::new(RateConverter::from_args(args)?)),
        );
    }

    fn register(&mut self, descriptor: EffectDescriptor, factory: EffectFactory) {
        debug_assert!(
            self.lookup(descriptor.name).is_none(),
            "duplicate effect name {}",
            descriptor.name
        );
        self.entries.push(RegistryEntry { descriptor, factory });
    }

    /// Look up an effect's descriptor by name.
    pub fn lookup(&self, name: &str) -> Option<&EffectDescriptor> {
        self.entries
            .iter()
            .map(|entry| &entry.descriptor)
            .find(|d| d.name == name)
    }

    /// Configure an effect by name from its command-line arguments.
    pub fn create(&self, name: &str, args: &[String]) -> Result<Box<dyn EffectHandler + Send>> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.descriptor.name == name)
            .ok_or_else(|| ChainError::UnknownEffect(name.to_string()))?;
        (entry.factory)(args)
    }

    /// All registered effect descriptors, in registration order.
    pub fn all_effects(&self) -> impl Iterator<Item = &EffectDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    /// Number of registered effects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
