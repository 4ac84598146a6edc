//! File-based effect chain processing command.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::debug;

use caudal_core::{
    ChainBuilder, PullScheduler, Result as ChainResult, SampleEncoding, SampleSource, SignalSpec,
};
use caudal_effects::BuiltinConverters;
use caudal_io::{WavSink, WavSource};
use caudal_registry::EffectRegistry;

use crate::chain_spec::parse_chain;

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Effect chain specification (e.g., "vol:-6|echo:0.8,0.9,250,0.4")
    #[arg(short, long)]
    effects: Option<String>,

    /// Preset file (TOML)
    #[arg(short, long)]
    preset: Option<PathBuf>,

    /// Output channel count (defaults to the input's)
    #[arg(long)]
    channels: Option<u16>,

    /// Output sample rate in Hz (defaults to the input's)
    #[arg(long)]
    rate: Option<u32>,

    /// Output bit depth (8, 16, 24, or 32; 32 is float)
    #[arg(long)]
    bit_depth: Option<u16>,

    /// Per-stage buffer size in samples
    #[arg(long, default_value_t = caudal_core::DEFAULT_BLOCK_SIZE)]
    block_size: usize,
}

/// Preset file format.
#[derive(Debug, Deserialize)]
struct Preset {
    name: String,
    #[serde(default)]
    description: Option<String>,
    effects: Vec<EffectConfig>,
}

#[derive(Debug, Deserialize)]
struct EffectConfig {
    #[serde(rename = "type")]
    effect_type: String,
    #[serde(default)]
    args: Vec<String>,
}

/// Source wrapper that advances a progress bar as samples are pulled.
struct ProgressSource<'a> {
    inner: &'a mut WavSource,
    bar: &'a ProgressBar,
    read_so_far: u64,
}

impl SampleSource for ProgressSource<'_> {
    fn spec(&self) -> SignalSpec {
        self.inner.spec()
    }

    fn read(&mut self, buf: &mut [f32]) -> ChainResult<usize> {
        let n = self.inner.read(buf)?;
        self.read_so_far += n as u64;
        self.bar.set_position(self.read_so_far);
        Ok(n)
    }
}

fn encoding_for_bit_depth(bits: u16) -> anyhow::Result<SampleEncoding> {
    match bits {
        8 => Ok(SampleEncoding::Pcm8),
        16 => Ok(SampleEncoding::Pcm16),
        24 => Ok(SampleEncoding::Pcm24),
        32 => Ok(SampleEncoding::Float32),
        other => anyhow::bail!("unsupported bit depth {other} (expected 8, 16, 24, or 32)"),
    }
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();

    let mut effects = if let Some(preset_path) = &args.preset {
        let preset_content = std::fs::read_to_string(preset_path)?;
        let preset: Preset = toml::from_str(&preset_content)?;

        println!("Loading preset: {}", preset.name);
        if let Some(description) = &preset.description {
            println!("  {description}");
        }
        let mut effects = Vec::with_capacity(preset.effects.len());
        for config in &preset.effects {
            effects.push(registry.create(&config.effect_type, &config.args)?);
        }
        effects
    } else if let Some(chain) = &args.effects {
        parse_chain(chain, &registry)?
    } else {
        Vec::new()
    };

    println!("Reading {}...", args.input.display());
    let mut source = WavSource::open(&args.input)?;
    let source_spec = source.spec();
    let total_samples = source.total_samples();

    println!(
        "  {} Hz, {} channel(s), {}-bit, {:.2}s",
        source_spec.rate,
        source_spec.channels,
        source_spec.encoding.bits(),
        total_samples as f64 / f64::from(source_spec.rate) / f64::from(source_spec.channels)
    );

    let mut dest_spec = source_spec;
    if let Some(channels) = args.channels {
        dest_spec = dest_spec.with_channels(channels);
    }
    if let Some(rate) = args.rate {
        dest_spec = dest_spec.with_rate(rate);
    }
    if let Some(bits) = args.bit_depth {
        dest_spec.encoding = encoding_for_bit_depth(bits)?;
    }

    let mut builder =
        ChainBuilder::new(source_spec, Some(dest_spec)).block_size(args.block_size);
    for effect in effects.drain(..) {
        builder.push(effect);
    }
    let chain = builder.build(&BuiltinConverters)?;

    println!(
        "Processing with {} stage(s): {}",
        chain.effect_count(),
        chain.stage_names().join(" -> ")
    );

    // Only clean up an output file this run created.
    let output_preexisted = args.output.exists();
    let mut sink = WavSink::create(&args.output, dest_spec)?;

    let bar = ProgressBar::new(total_samples);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut progress_source = ProgressSource {
        inner: &mut source,
        bar: &bar,
        read_so_far: 0,
    };

    let outcome = PullScheduler::new(chain).run(&mut progress_source, &mut sink);
    match outcome {
        Ok(stats) => {
            bar.finish_with_message("done");
            println!(
                "Wrote {} ({} samples in, {} samples out)",
                args.output.display(),
                stats.samples_in,
                stats.samples_out
            );
            Ok(())
        }
        Err(err) => {
            bar.abandon();
            drop(sink);
            if !output_preexisted {
                debug!(path = %args.output.display(), "removing partial output file");
                let _ = std::fs::remove_file(&args.output);
            }
            Err(err.into())
        }
    }
}
