//! Property-based tests for the fan-out/fan-in helpers and the scheduler's
//! conservation guarantee.

use proptest::prelude::*;

use caudal_core::{
    ChainBuilder, EffectHandler, ImplicitEffects, PullScheduler, Result as ChainResult,
    SampleEncoding, SampleSink, SampleSource, SignalSpec, StartStatus, deinterleave, interleave,
};

struct VecSource {
    data: Vec<f32>,
    pos: usize,
    spec: SignalSpec,
}

impl SampleSource for VecSource {
    fn spec(&self) -> SignalSpec {
        self.spec
    }
    fn read(&mut self, buf: &mut [f32]) -> ChainResult<usize> {
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

struct VecSink {
    data: Vec<f32>,
    spec: SignalSpec,
}

impl SampleSink for VecSink {
    fn spec(&self) -> SignalSpec {
        self.spec
    }
    fn write(&mut self, buf: &[f32]) -> ChainResult<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }
}

#[derive(Clone)]
struct Identity;

impl EffectHandler for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }
    fn start(&mut self, _: &SignalSpec, _: &SignalSpec) -> ChainResult<StartStatus> {
        Ok(StartStatus::Ready)
    }
    fn flow(&mut self, input: &[f32], output: &mut [f32]) -> ChainResult<(usize, usize)> {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        Ok((n, n))
    }
    fn duplicate(&self) -> Box<dyn EffectHandler + Send> {
        Box::new(self.clone())
    }
}

struct NoConverters;

impl ImplicitEffects for NoConverters {
    fn channel_mixer(&self) -> Box<dyn EffectHandler + Send> {
        unimplemented!()
    }
    fn rate_converter(&self) -> Box<dyn EffectHandler + Send> {
        unimplemented!()
    }
}

proptest! {
    /// De-interleaving then re-interleaving reproduces any even-length
    /// sequence exactly.
    #[test]
    fn fan_out_fan_in_round_trip(frames in prop::collection::vec(-1.0f32..=1.0f32, 0..300)) {
        let mut interleaved = frames.clone();
        if interleaved.len() % 2 == 1 {
            interleaved.pop();
        }
        let mut left = Vec::new();
        let mut right = Vec::new();
        deinterleave(&interleaved, &mut left, &mut right);
        let mut out = vec![0.0; interleaved.len()];
        let n = interleave(&left, &right, left.len(), &mut out);
        prop_assert_eq!(n, interleaved.len());
        prop_assert_eq!(out, interleaved);
    }

    /// De-interleaving 2k+1 samples yields k+1 left samples and k right.
    #[test]
    fn odd_split_favors_left(k in 0usize..200) {
        let data: Vec<f32> = (0..2 * k + 1).map(|i| i as f32).collect();
        let mut left = Vec::new();
        let mut right = Vec::new();
        deinterleave(&data, &mut left, &mut right);
        prop_assert_eq!(left.len(), k + 1);
        prop_assert_eq!(right.len(), k);
        for (i, &s) in left.iter().enumerate() {
            prop_assert_eq!(s, (2 * i) as f32);
        }
        for (i, &s) in right.iter().enumerate() {
            prop_assert_eq!(s, (2 * i + 1) as f32);
        }
    }

    /// Samples read equals samples written through an identity chain, for
    /// arbitrary input lengths, block sizes, and channel counts.
    #[test]
    fn identity_chain_conservation(
        frames in 0usize..2000,
        block in 4usize..512,
        stereo in proptest::bool::ANY,
    ) {
        let channels: u16 = if stereo { 2 } else { 1 };
        let len = frames * usize::from(channels);
        let input: Vec<f32> = (0..len).map(|i| (i as f32 * 0.01).sin()).collect();
        let io_spec = SignalSpec::new(8000, SampleEncoding::Float32, channels);

        let mut builder = ChainBuilder::new(io_spec, Some(io_spec)).block_size(block);
        builder.push(Box::new(Identity));
        let chain = builder.build(&NoConverters).unwrap();

        let mut source = VecSource { data: input.clone(), pos: 0, spec: io_spec };
        let mut sink = VecSink { data: Vec::new(), spec: io_spec };
        let stats = PullScheduler::new(chain).run(&mut source, &mut sink).unwrap();

        prop_assert_eq!(stats.samples_in, len);
        prop_assert_eq!(stats.samples_out, len);
        prop_assert_eq!(sink.data, input);
    }
}
