//! The pull scheduler: drives sample blocks through a finalized [`Chain`].
//!
//! Processing is driven backward — pull, don't push. Every stage owns a
//! fixed-capacity output buffer, and a stage only flows when its own buffer
//! has been fully consumed downstream; a naive forward push could overflow a
//! downstream buffer before it is emptied. Each pull pass sweeps the chain
//! from the last stage toward the first, writes whatever the last stage
//! produced, and repeats until no stage holds leftover data — this is what
//! lets a stage produce output in smaller or larger chunks than it consumes.
//!
//! Once the source is exhausted the scheduler drains stages front to back:
//! an upstream stage's retained tail (an echo decay, a buffered file) must
//! still pass through every downstream stage before the next stage drains.

use tracing::{debug, trace};

use crate::chain::{Chain, Stage, StageKind};
use crate::error::{ChainError, Result};
use crate::io::{SampleSink, SampleSource};
use crate::stereo;

/// Totals for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Interleaved samples read from the source.
    pub samples_in: usize,
    /// Interleaved samples written to the destination.
    pub samples_out: usize,
}

/// Drives one run of a finalized chain from a source to a sink.
///
/// Single-threaded and synchronous: every `flow`/`drain`/`stop` call runs to
/// completion before the scheduler proceeds. A fatal error mid-run still
/// stops every started stage before propagating, so effects holding external
/// resources can release them.
pub struct PullScheduler {
    chain: Chain,
    stats: RunStats,
}

impl PullScheduler {
    /// Wrap a finalized chain for one run.
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            stats: RunStats::default(),
        }
    }

    /// The chain being driven.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Run the chain to completion: flow every source block, drain every
    /// stage, stop every stage, then finalize the sink.
    ///
    /// Consumes the scheduler; a chain is good for exactly one run.
    pub fn run(
        mut self,
        source: &mut dyn SampleSource,
        sink: &mut dyn SampleSink,
    ) -> Result<RunStats> {
        let flow_result = self.run_inner(source, sink);
        // Stages holding external resources must be stopped even on failure,
        // and file closing happens strictly after every stop.
        let stop_result = self.chain.stop_all();
        flow_result?;
        stop_result?;
        sink.finalize()?;
        Ok(self.stats)
    }

    fn run_inner(
        &mut self,
        source: &mut dyn SampleSource,
        sink: &mut dyn SampleSink,
    ) -> Result<()> {
        let src_spec = source.spec();
        let in_spec = self.chain.input_spec();
        if src_spec.rate != in_spec.rate || src_spec.channels != in_spec.channels {
            return Err(ChainError::Format(format!(
                "source is {} Hz/{}ch but the chain was built for {} Hz/{}ch",
                src_spec.rate, src_spec.channels, in_spec.rate, in_spec.channels
            )));
        }
        let sink_spec = sink.spec();
        let out_spec = self.chain.output_spec();
        if sink_spec.rate != out_spec.rate || sink_spec.channels != out_spec.channels {
            return Err(ChainError::Format(format!(
                "destination is {} Hz/{}ch but the chain produces {} Hz/{}ch",
                sink_spec.rate, sink_spec.channels, out_spec.rate, out_spec.channels
            )));
        }

        let mut blocks = 0usize;
        loop {
            let n = source.read(&mut self.chain.stages[0].buf)?;
            if n == 0 {
                break;
            }
            blocks += 1;
            self.stats.samples_in += n;
            self.chain.stages[0].produced = n;
            self.chain.stages[0].consumed = 0;
            // Every pull pass ends with all buffers fully consumed, so the
            // reset discards nothing.
            for stage in &mut self.chain.stages[1..] {
                stage.produced = 0;
                stage.consumed = 0;
            }
            self.pull_pass(1, sink)?;
        }

        debug!(
            blocks,
            samples_in = self.stats.samples_in,
            "source exhausted, draining"
        );
        self.drain_all(sink)
    }

    /// One backward pull pass over stages `first..`, seeded by whatever
    /// stage `first - 1` holds. Repeats until no stage in the sub-chain has
    /// unconsumed output, writing the last stage's output every iteration.
    fn pull_pass(&mut self, first: usize, sink: &mut dyn SampleSink) -> Result<()> {
        let last = self.chain.stages.len() - 1;
        if first > last {
            // Effect-free chain: the seed stage is also the output stage.
            return self.write_last(sink);
        }
        loop {
            let mut moved = false;
            for i in (first..=last).rev() {
                let (head, tail) = self.chain.stages.split_at_mut(i);
                let upstream = &mut head[i - 1];
                let stage = &mut tail[0];
                if stage.has_unconsumed() || !upstream.has_unconsumed() {
                    continue;
                }
                stage.produced = 0;
                stage.consumed = 0;
                let (consumed, produced) = flow_stage(stage, upstream)?;
                trace!(stage = stage.name, consumed, produced, "flow");
                if consumed > 0 || produced > 0 {
                    moved = true;
                }
            }
            if self.chain.stages[last].has_unconsumed() {
                self.write_last(sink)?;
                moved = true;
            }
            let havedata = self.chain.stages[first - 1..last]
                .iter()
                .any(Stage::has_unconsumed);
            if !havedata {
                return Ok(());
            }
            if !moved {
                let stuck = self.chain.stages[first - 1..last]
                    .iter()
                    .find(|s| s.has_unconsumed())
                    .map_or("?", |s| s.name);
                return Err(ChainError::InvariantViolation(format!(
                    "chain stalled: stage '{stuck}' holds data no downstream stage will take"
                )));
            }
        }
    }

    /// Flush the last stage's unconsumed output to the sink.
    fn write_last(&mut self, sink: &mut dyn SampleSink) -> Result<()> {
        let stage = self.chain.stages.last_mut().expect("chain has stages");
        if !stage.has_unconsumed() {
            return Ok(());
        }
        let mut slice = &stage.buf[stage.consumed..stage.produced];
        let len = slice.len();
        while !slice.is_empty() {
            let n = sink.write(slice)?;
            if n == 0 {
                return Err(ChainError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "destination accepted no samples",
                )));
            }
            slice = &slice[n..];
        }
        stage.consumed = stage.produced;
        self.stats.samples_out += len;
        Ok(())
    }

    /// Drain stages front to back, routing each stage's drained output
    /// through the entire downstream sub-chain before moving on.
    fn drain_all(&mut self, sink: &mut dyn SampleSink) -> Result<()> {
        let last = self.chain.stages.len() - 1;
        for i in 1..=last {
            loop {
                let stage = &mut self.chain.stages[i];
                stage.produced = 0;
                stage.consumed = 0;
                let produced = drain_stage(stage)?;
                stage.produced = produced;
                trace!(stage = stage.name, produced, "drain");
                if produced == 0 {
                    break;
                }
                self.pull_pass(i + 1, sink)?;
            }
        }
        Ok(())
    }
}

/// Flow one stage from its upstream neighbor's unconsumed output.
///
/// The stage's buffer must be empty (counters reset by the caller). Updates
/// `upstream.consumed` and `stage.produced`, and returns the counts.
fn flow_stage(stage: &mut Stage, upstream: &mut Stage) -> Result<(usize, usize)> {
    let avail = &upstream.buf[upstream.consumed..upstream.produced];

    if stage.bypassed {
        let n = avail.len().min(stage.buf.len());
        stage.buf[..n].copy_from_slice(&avail[..n]);
        upstream.consumed += n;
        stage.produced = n;
        return Ok((n, n));
    }

    match &mut stage.kind {
        StageKind::Input => Err(ChainError::InvariantViolation(
            "flow called on the input slot".into(),
        )),
        StageKind::Mono(fx) => {
            let (consumed, produced) = fx.flow(avail, &mut stage.buf)?;
            if consumed > avail.len() || produced > stage.buf.len() {
                return Err(ChainError::InvariantViolation(format!(
                    "effect '{}' overran its buffers (consumed {consumed}/{}, produced {produced}/{})",
                    stage.name,
                    avail.len(),
                    stage.buf.len()
                )));
            }
            upstream.consumed += consumed;
            stage.produced = produced;
            Ok((consumed, produced))
        }
        StageKind::Stereo {
            left,
            right,
            scratch,
        } => {
            let half = stage.buf.len() / 2;
            stereo::deinterleave(avail, &mut scratch.left_in, &mut scratch.right_in);
            scratch.left_out.resize(half, 0.0);
            scratch.right_out.resize(half, 0.0);

            let (cl, pl) = left.flow(&scratch.left_in, &mut scratch.left_out[..half])?;
            let (cr, pr) = right.flow(&scratch.right_in, &mut scratch.right_out[..half])?;
            if cl > scratch.left_in.len() || cr > scratch.right_in.len() || pl > half || pr > half {
                return Err(ChainError::InvariantViolation(format!(
                    "effect '{}' overran its buffers in stereo split",
                    stage.name
                )));
            }
            if pl != pr {
                return Err(ChainError::InvariantViolation(format!(
                    "stereo halves of '{}' produced mismatched counts ({pl} vs {pr})",
                    stage.name
                )));
            }
            // The halves must stay in lock-step: either both consumed the
            // same count, or the whole input went (left may hold one extra
            // sample when the input count was odd).
            let consumed = cl + cr;
            if !(cl == cr || (consumed == avail.len() && cl == cr + 1)) {
                return Err(ChainError::InvariantViolation(format!(
                    "stereo halves of '{}' consumed mismatched counts ({cl} vs {cr})",
                    stage.name
                )));
            }

            let produced = stereo::interleave(&scratch.left_out, &scratch.right_out, pl, &mut stage.buf);
            upstream.consumed += consumed;
            stage.produced = produced;
            Ok((consumed, produced))
        }
    }
}

/// Drain one stage into its own buffer, returning the sample count.
fn drain_stage(stage: &mut Stage) -> Result<usize> {
    if stage.bypassed {
        return Ok(0);
    }
    match &mut stage.kind {
        StageKind::Input => Ok(0),
        StageKind::Mono(fx) => {
            let n = fx.drain(&mut stage.buf)?;
            if n > stage.buf.len() {
                return Err(ChainError::InvariantViolation(format!(
                    "effect '{}' overran its buffer in drain",
                    stage.name
                )));
            }
            Ok(n)
        }
        StageKind::Stereo {
            left,
            right,
            scratch,
        } => {
            let half = stage.buf.len() / 2;
            scratch.left_out.resize(half, 0.0);
            scratch.right_out.resize(half, 0.0);
            let pl = left.drain(&mut scratch.left_out[..half])?;
            let pr = right.drain(&mut scratch.right_out[..half])?;
            if pl > half || pr > half {
                return Err(ChainError::InvariantViolation(format!(
                    "effect '{}' overran its buffer in drain",
                    stage.name
                )));
            }
            if pl != pr {
                return Err(ChainError::InvariantViolation(format!(
                    "stereo halves of '{}' drained mismatched counts ({pl} vs {pr})",
                    stage.name
                )));
            }
            Ok(stereo::interleave(
                &scratch.left_out,
                &scratch.right_out,
                pl,
                &mut stage.buf,
            ))
        }
    }
}
