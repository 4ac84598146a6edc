//! Chain construction and validation.
//!
//! [`ChainBuilder`] turns a source format, an optional destination format,
//! and an ordered list of Configured effects into a finalized [`Chain`]:
//! implicit format converters are inserted where the formats demand them,
//! each stage's input/output [`SignalSpec`] pair is resolved by threading a
//! running descriptor forward, 2-channel stages without native multichannel
//! support get a stereo-split shadow instance, and finally every instance is
//! started in order.
//!
//! Converter placement follows a cost heuristic: shrinking conversions
//! (fewer channels, lower rate) go before all user effects so downstream
//! stages see fewer samples; growing conversions go after them. Correctness
//! only requires that each conversion happens exactly once, at a point where
//! every downstream stage sees final channel/rate values.

use tracing::debug;

use crate::effect::{Caps, EffectHandler, StartStatus};
use crate::error::{ChainError, Result};
use crate::signal::SignalSpec;

/// Default per-stage buffer capacity in samples.
pub const DEFAULT_BLOCK_SIZE: usize = 8192;

/// Supplier of the implicit format-converting effects.
///
/// The builder inserts a channel mixer or rate converter when the source and
/// destination formats differ and no user effect covers the change. The
/// concrete effects live in `caudal-effects`; this trait keeps the builder
/// independent of them.
pub trait ImplicitEffects {
    /// A Configured channel-mixing effect (declares `changes_channels`).
    fn channel_mixer(&self) -> Box<dyn EffectHandler + Send>;

    /// A Configured rate-converting effect (declares `changes_rate`).
    fn rate_converter(&self) -> Box<dyn EffectHandler + Send>;
}

/// Per-channel scratch buffers for a stereo-split stage.
#[derive(Debug, Default)]
pub(crate) struct SplitScratch {
    pub(crate) left_in: Vec<f32>,
    pub(crate) right_in: Vec<f32>,
    pub(crate) left_out: Vec<f32>,
    pub(crate) right_out: Vec<f32>,
}

/// How a stage processes samples.
pub(crate) enum StageKind {
    /// Position 0: holds each freshly read source block. Never flowed.
    Input,
    /// One instance processing the full (mono or native-multichannel) stream.
    Mono(Box<dyn EffectHandler + Send>),
    /// Two independent instances of the same effect: `left` processes
    /// even-indexed samples, `right` (the shadow) odd-indexed ones.
    Stereo {
        left: Box<dyn EffectHandler + Send>,
        right: Box<dyn EffectHandler + Send>,
        scratch: SplitScratch,
    },
}

/// One position in the finalized chain: an effect instance (or the input
/// slot) plus its fixed-capacity output buffer and flow counters.
pub(crate) struct Stage {
    pub(crate) kind: StageKind,
    pub(crate) name: &'static str,
    pub(crate) input_spec: SignalSpec,
    pub(crate) output_spec: SignalSpec,
    /// Set when `start` returned [`StartStatus::Bypass`]; the scheduler
    /// copies data through without calling the effect.
    pub(crate) bypassed: bool,
    /// Output buffer. Invariant: `consumed <= produced <= buf.len()`.
    pub(crate) buf: Vec<f32>,
    pub(crate) produced: usize,
    pub(crate) consumed: usize,
}

impl Stage {
    fn input(spec: SignalSpec, block_size: usize) -> Self {
        Stage {
            kind: StageKind::Input,
            name: "input",
            input_spec: spec,
            output_spec: spec,
            bypassed: false,
            buf: vec![0.0; frame_aligned(block_size, spec.channels)],
            produced: 0,
            consumed: 0,
        }
    }

    fn effect(kind: StageKind, input: SignalSpec, output: SignalSpec, block_size: usize) -> Self {
        let name = match &kind {
            StageKind::Input => "input",
            StageKind::Mono(fx) => fx.name(),
            StageKind::Stereo { left, .. } => left.name(),
        };
        Stage {
            kind,
            name,
            input_spec: input,
            output_spec: output,
            bypassed: false,
            buf: vec![0.0; frame_aligned(block_size, output.channels)],
            produced: 0,
            consumed: 0,
        }
    }

    pub(crate) fn has_unconsumed(&self) -> bool {
        self.consumed < self.produced
    }

    fn start(&mut self) -> Result<()> {
        let input = self.input_spec;
        let output = self.output_spec;
        match &mut self.kind {
            StageKind::Input => Ok(()),
            StageKind::Mono(fx) => {
                if fx.start(&input, &output)? == StartStatus::Bypass {
                    self.bypassed = true;
                }
                Ok(())
            }
            StageKind::Stereo { left, right, .. } => {
                // Each half sees the per-channel format it actually processes.
                let half_in = input.with_channels(1);
                let half_out = output.with_channels(1);
                if left.start(&half_in, &half_out)? == StartStatus::Bypass {
                    self.bypassed = true;
                    return Ok(());
                }
                if right.start(&half_in, &half_out)? == StartStatus::Bypass {
                    return Err(ChainError::InvariantViolation(format!(
                        "stereo halves of '{}' disagree on bypass",
                        self.name
                    )));
                }
                Ok(())
            }
        }
    }

    fn stop(&mut self) -> Result<()> {
        match &mut self.kind {
            StageKind::Input => Ok(()),
            StageKind::Mono(fx) => fx.stop(),
            StageKind::Stereo { left, right, .. } => {
                let first = left.stop();
                let second = right.stop();
                first.and(second)
            }
        }
    }
}

/// Round `block_size` down to a whole number of frames, keeping at least one.
fn frame_aligned(block_size: usize, channels: u16) -> usize {
    let ch = usize::from(channels.max(1));
    let aligned = block_size - block_size % ch;
    aligned.max(ch)
}

/// The finalized, ordered list of effect stages for one run.
///
/// Owned exclusively by the [`PullScheduler`](crate::PullScheduler) while
/// running. Position 0 is the input slot; effect stages start at 1.
pub struct Chain {
    pub(crate) stages: Vec<Stage>,
    input_spec: SignalSpec,
    output_spec: SignalSpec,
    block_size: usize,
    stopped: bool,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("stage_names", &self.stage_names())
            .field("input_spec", &self.input_spec)
            .field("output_spec", &self.output_spec)
            .field("block_size", &self.block_size)
            .field("stopped", &self.stopped)
            .finish()
    }
}

impl Chain {
    /// Number of effect stages (excluding the input slot).
    pub fn effect_count(&self) -> usize {
        self.stages.len() - 1
    }

    /// Names of the effect stages, in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages[1..].iter().map(|s| s.name).collect()
    }

    /// True if the stage at `index` (0-based over effect stages) runs as a
    /// stereo-split pair.
    pub fn is_split(&self, index: usize) -> bool {
        matches!(
            self.stages.get(index + 1).map(|s| &s.kind),
            Some(StageKind::Stereo { .. })
        )
    }

    /// True if the stage at `index` was bypassed at start.
    pub fn is_bypassed(&self, index: usize) -> bool {
        self.stages.get(index + 1).is_some_and(|s| s.bypassed)
    }

    /// Format entering the chain.
    pub fn input_spec(&self) -> SignalSpec {
        self.input_spec
    }

    /// Format leaving the last stage.
    pub fn output_spec(&self) -> SignalSpec {
        self.output_spec
    }

    /// Per-stage buffer capacity in samples.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Stop every effect stage in order.
    ///
    /// Runs each `stop` even if an earlier one failed, returning the first
    /// error. Idempotent: later calls are no-ops.
    pub(crate) fn stop_all(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        let mut first_err = None;
        for stage in &mut self.stages[1..] {
            if let Err(e) = stage.stop() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Builds a [`Chain`] from formats and Configured effects.
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = ChainBuilder::new(source.spec(), Some(sink.spec()));
/// builder.push(registry.create("echo", &args)?);
/// let chain = builder.build(&converters)?;
/// ```
pub struct ChainBuilder {
    source: SignalSpec,
    dest: Option<SignalSpec>,
    effects: Vec<Box<dyn EffectHandler + Send>>,
    block_size: usize,
}

impl ChainBuilder {
    /// Start a build for the given source format and destination format.
    ///
    /// `dest = None` means a preview/analysis-only run: no destination file,
    /// and no implicit converters are inserted.
    pub fn new(source: SignalSpec, dest: Option<SignalSpec>) -> Self {
        Self {
            source,
            dest,
            effects: Vec::new(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Override the per-stage buffer capacity.
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(2);
        self
    }

    /// Append a user-requested effect (already Configured).
    pub fn push(&mut self, effect: Box<dyn EffectHandler + Send>) -> &mut Self {
        self.effects.push(effect);
        self
    }

    /// Validate, insert implicit converters, resolve per-stage formats,
    /// allocate stereo-split shadows, and start every instance.
    ///
    /// On a start failure, instances already started are stopped before the
    /// error is returned.
    pub fn build(self, implicit: &dyn ImplicitEffects) -> Result<Chain> {
        let src = self.source;
        let dest = self.dest;

        let haschan = self
            .effects
            .iter()
            .filter(|e| e.caps().changes_channels)
            .count();
        let hasrate = self.effects.iter().filter(|e| e.caps().changes_rate).count();
        if haschan > 1 {
            return Err(ChainError::ConflictingEffects("channel count"));
        }
        if hasrate > 1 {
            return Err(ChainError::ConflictingEffects("sample rate"));
        }
        if let Some(d) = dest {
            if haschan == 1 && d.channels == src.channels {
                return Err(ChainError::RedundantEffect(format!(
                    "channel-changing effect requested but both formats have {} channel(s)",
                    src.channels
                )));
            }
            if hasrate == 1 && d.rate == src.rate {
                return Err(ChainError::RedundantEffect(format!(
                    "rate-changing effect requested but both formats are {} Hz",
                    src.rate
                )));
            }
        }

        // Assemble the effect order: shrinking converters first, user
        // effects in their given order, growing converters last.
        let mut ordered: Vec<Box<dyn EffectHandler + Send>> = Vec::new();
        if let Some(d) = dest {
            if d.channels < src.channels && haschan == 0 {
                debug!(from = src.channels, to = d.channels, "inserting channel mixer before user effects");
                ordered.push(implicit.channel_mixer());
            }
            if d.rate < src.rate && hasrate == 0 {
                debug!(from = src.rate, to = d.rate, "inserting rate converter before user effects");
                ordered.push(implicit.rate_converter());
            }
        }
        ordered.extend(self.effects);
        if let Some(d) = dest {
            let projected = ordered
                .iter()
                .fold(src, |running, fx| advance_spec(running, fx.caps(), dest));
            if projected.rate != d.rate {
                debug!(from = projected.rate, to = d.rate, "inserting rate converter after user effects");
                ordered.push(implicit.rate_converter());
            }
            let projected = ordered
                .iter()
                .fold(src, |running, fx| advance_spec(running, fx.caps(), dest));
            if projected.channels != d.channels {
                debug!(from = projected.channels, to = d.channels, "inserting channel mixer after user effects");
                ordered.push(implicit.channel_mixer());
            }
        }

        // Resolve per-stage formats and allocate stereo-split shadows.
        let mut stages = vec![Stage::input(src, self.block_size)];
        let mut running = src;
        for fx in ordered {
            let caps = fx.caps();
            let out = advance_spec(running, caps, dest);
            let kind = if !caps.multichannel && running.channels == 2 && out.channels == 2 {
                let shadow = fx.duplicate();
                StageKind::Stereo {
                    left: fx,
                    right: shadow,
                    scratch: SplitScratch::default(),
                }
            } else if !caps.multichannel && (running.channels > 2 || out.channels > 2) {
                return Err(ChainError::unsupported_format(
                    fx.name(),
                    format!(
                        "{} channels require native multichannel support",
                        running.channels.max(out.channels)
                    ),
                ));
            } else {
                StageKind::Mono(fx)
            };
            stages.push(Stage::effect(kind, running, out, self.block_size));
            running = out;
        }

        if let Some(d) = dest
            && (running.rate != d.rate || running.channels != d.channels)
        {
            return Err(ChainError::InvariantViolation(format!(
                "chain output {}/{}ch does not reach destination {}/{}ch",
                running.rate, running.channels, d.rate, d.channels
            )));
        }

        // Start every instance in order; unwind on failure.
        for i in 1..stages.len() {
            if let Err(e) = stages[i].start() {
                for stage in &mut stages[1..i] {
                    let _ = stage.stop();
                }
                return Err(e);
            }
        }

        debug!(
            stages = stages.len() - 1,
            in_rate = src.rate,
            in_channels = src.channels,
            out_rate = running.rate,
            out_channels = running.channels,
            "chain built"
        );

        Ok(Chain {
            stages,
            input_spec: src,
            output_spec: running,
            block_size: self.block_size,
            stopped: false,
        })
    }
}

/// Output format of a stage given its input format and capabilities.
///
/// A format-changing effect lands on the destination's value; everything
/// else passes the running format through.
fn advance_spec(running: SignalSpec, caps: Caps, dest: Option<SignalSpec>) -> SignalSpec {
    let mut out = running;
    if let Some(d) = dest {
        if caps.changes_channels {
            out.channels = d.channels;
        }
        if caps.changes_rate {
            out.rate = d.rate;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SampleEncoding;

    #[derive(Clone)]
    struct FakeEffect {
        name: &'static str,
        caps: Caps,
        start_result: Option<StartStatus>,
    }

    impl FakeEffect {
        fn new(name: &'static str, caps: Caps) -> Self {
            Self {
                name,
                caps,
                start_result: Some(StartStatus::Ready),
            }
        }

        fn boxed(name: &'static str, caps: Caps) -> Box<dyn EffectHandler + Send> {
            Box::new(Self::new(name, caps))
        }
    }

    impl EffectHandler for FakeEffect {
        fn name(&self) -> &'static str {
            self.name
        }
        fn caps(&self) -> Caps {
            self.caps
        }
        fn start(&mut self, _: &SignalSpec, _: &SignalSpec) -> Result<StartStatus> {
            match self.start_result {
                Some(status) => Ok(status),
                None => Err(ChainError::unsupported_format(self.name, "rejected")),
            }
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

    struct FakeImplicit;

    impl ImplicitEffects for FakeImplicit {
        fn channel_mixer(&self) -> Box<dyn EffectHandler + Send> {
            FakeEffect::boxed(
                "mixer",
                Caps {
                    changes_channels: true,
                    multichannel: true,
                    ..Caps::NONE
                },
            )
        }
        fn rate_converter(&self) -> Box<dyn EffectHandler + Send> {
            FakeEffect::boxed(
                "rate",
                Caps {
                    changes_rate: true,
                    ..Caps::NONE
                },
            )
        }
    }

    fn spec(rate: u32, channels: u16) -> SignalSpec {
        SignalSpec::new(rate, SampleEncoding::Float32, channels)
    }

    fn chan_caps() -> Caps {
        Caps {
            changes_channels: true,
            multichannel: true,
            ..Caps::NONE
        }
    }

    fn rate_caps() -> Caps {
        Caps {
            changes_rate: true,
            ..Caps::NONE
        }
    }

    #[test]
    fn equal_formats_insert_nothing() {
        let mut builder = ChainBuilder::new(spec(8000, 1), Some(spec(8000, 1)));
        builder.push(FakeEffect::boxed("fx", Caps::NONE));
        let chain = builder.build(&FakeImplicit).unwrap();
        assert_eq!(chain.effect_count(), 1);
        assert_eq!(chain.stage_names(), vec!["fx"]);
    }

    #[test]
    fn two_channel_changers_conflict() {
        let mut builder = ChainBuilder::new(spec(8000, 2), Some(spec(8000, 1)));
        builder.push(FakeEffect::boxed("a", chan_caps()));
        builder.push(FakeEffect::boxed("b", chan_caps()));
        let err = builder.build(&FakeImplicit).unwrap_err();
        assert!(matches!(err, ChainError::ConflictingEffects("channel count")));
    }

    #[test]
    fn two_rate_changers_conflict() {
        let mut builder = ChainBuilder::new(spec(8000, 1), Some(spec(16000, 1)));
        builder.push(FakeEffect::boxed("a", rate_caps()));
        builder.push(FakeEffect::boxed("b", rate_caps()));
        let err = builder.build(&FakeImplicit).unwrap_err();
        assert!(matches!(err, ChainError::ConflictingEffects("sample rate")));
    }

    #[test]
    fn redundant_channel_changer_rejected() {
        let mut builder = ChainBuilder::new(spec(8000, 2), Some(spec(8000, 2)));
        builder.push(FakeEffect::boxed("a", chan_caps()));
        let err = builder.build(&FakeImplicit).unwrap_err();
        assert!(matches!(err, ChainError::RedundantEffect(_)));
    }

    #[test]
    fn redundant_rate_changer_rejected() {
        let mut builder = ChainBuilder::new(spec(8000, 1), Some(spec(8000, 1)));
        builder.push(FakeEffect::boxed("a", rate_caps()));
        let err = builder.build(&FakeImplicit).unwrap_err();
        assert!(matches!(err, ChainError::RedundantEffect(_)));
    }

    #[test]
    fn shrinking_conversions_go_first() {
        // Stereo 48k -> mono 24k with one user effect: mixer and rate
        // converter both shrink, so both precede the user effect.
        let mut builder = ChainBuilder::new(spec(48000, 2), Some(spec(24000, 1)));
        builder.push(FakeEffect::boxed(
            "fx",
            Caps {
                multichannel: true,
                ..Caps::NONE
            },
        ));
        let chain = builder.build(&FakeImplicit).unwrap();
        assert_eq!(chain.stage_names(), vec!["mixer", "rate", "fx"]);
    }

    #[test]
    fn growing_conversions_go_last() {
        let mut builder = ChainBuilder::new(spec(8000, 1), Some(spec(16000, 2)));
        builder.push(FakeEffect::boxed("fx", Caps::NONE));
        let chain = builder.build(&FakeImplicit).unwrap();
        assert_eq!(chain.stage_names(), vec!["fx", "rate", "mixer"]);
    }

    #[test]
    fn user_rate_changer_suppresses_implicit() {
        let mut builder = ChainBuilder::new(spec(48000, 1), Some(spec(8000, 1)));
        builder.push(FakeEffect::boxed("myrate", rate_caps()));
        let chain = builder.build(&FakeImplicit).unwrap();
        assert_eq!(chain.stage_names(), vec!["myrate"]);
        assert_eq!(chain.output_spec().rate, 8000);
    }

    #[test]
    fn preview_run_suppresses_implicit_conversion() {
        let mut builder = ChainBuilder::new(spec(48000, 2), None);
        builder.push(FakeEffect::boxed(
            "fx",
            Caps {
                multichannel: true,
                ..Caps::NONE
            },
        ));
        let chain = builder.build(&FakeImplicit).unwrap();
        assert_eq!(chain.effect_count(), 1);
        assert_eq!(chain.output_spec(), spec(48000, 2));
    }

    #[test]
    fn stereo_non_multichannel_gets_shadow() {
        let mut builder = ChainBuilder::new(spec(8000, 2), Some(spec(8000, 2)));
        builder.push(FakeEffect::boxed("fx", Caps::NONE));
        let chain = builder.build(&FakeImplicit).unwrap();
        assert!(chain.is_split(0));
    }

    #[test]
    fn implicit_rate_converter_on_stereo_runs_split() {
        let mut builder = ChainBuilder::new(spec(48000, 2), Some(spec(24000, 2)));
        let chain = builder.build(&FakeImplicit).unwrap();
        assert_eq!(chain.stage_names(), vec!["rate"]);
        assert!(chain.is_split(0));
    }

    #[test]
    fn more_than_two_channels_need_native_support() {
        let mut builder = ChainBuilder::new(spec(8000, 4), Some(spec(8000, 4)));
        builder.push(FakeEffect::boxed("fx", Caps::NONE));
        let err = builder.build(&FakeImplicit).unwrap_err();
        assert!(matches!(err, ChainError::UnsupportedFormat { .. }));
    }

    #[test]
    fn start_failure_aborts_build() {
        let mut builder = ChainBuilder::new(spec(8000, 1), Some(spec(8000, 1)));
        let mut failing = FakeEffect::new("bad", Caps::NONE);
        failing.start_result = None;
        builder.push(Box::new(failing));
        let err = builder.build(&FakeImplicit).unwrap_err();
        assert!(matches!(err, ChainError::UnsupportedFormat { .. }));
    }

    #[test]
    fn bypass_at_start_marks_stage() {
        let mut builder = ChainBuilder::new(spec(8000, 1), Some(spec(8000, 1)));
        let mut fx = FakeEffect::new("maybe", Caps::NONE);
        fx.start_result = Some(StartStatus::Bypass);
        builder.push(Box::new(fx));
        let chain = builder.build(&FakeImplicit).unwrap();
        assert!(chain.is_bypassed(0));
    }

    #[test]
    fn buffers_are_frame_aligned() {
        assert_eq!(frame_aligned(8192, 2), 8192);
        assert_eq!(frame_aligned(8191, 2), 8190);
        assert_eq!(frame_aligned(100, 3), 99);
        assert_eq!(frame_aligned(1, 2), 2);
    }
}
