//! Full file-to-file runs: WAV source, effect chain, WAV sink.

use caudal_core::{ChainBuilder, PullScheduler, SampleEncoding, SampleSource, SignalSpec};
use caudal_effects::{BuiltinConverters, Vol};
use caudal_io::{WavSink, WavSource, read_wav_info};
use tempfile::tempdir;

fn write_fixture(path: &std::path::Path, spec: SignalSpec, samples: &[f32]) {
    use caudal_core::SampleSink;
    let mut sink = WavSink::create(path, spec).unwrap();
    sink.write(samples).unwrap();
    sink.finalize().unwrap();
}

#[test]
fn file_to_file_gain_run() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("in.wav");
    let output_path = dir.path().join("out.wav");

    let spec = SignalSpec::new(8000, SampleEncoding::Float32, 1);
    let samples: Vec<f32> = (0..800).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();
    write_fixture(&input_path, spec, &samples);

    let mut source = WavSource::open(&input_path).unwrap();
    let mut sink = WavSink::create(&output_path, spec).unwrap();

    let mut builder = ChainBuilder::new(source.spec(), Some(spec));
    builder.push(Box::new(Vol::new(-6.0)));
    let chain = builder.build(&BuiltinConverters).unwrap();

    let stats = PullScheduler::new(chain)
        .run(&mut source, &mut sink)
        .unwrap();
    assert_eq!(stats.samples_in, 800);
    assert_eq!(stats.samples_out, 800);

    let mut reloaded = WavSource::open(&output_path).unwrap();
    let mut out = vec![0.0f32; 800];
    assert_eq!(reloaded.read(&mut out).unwrap(), 800);
    let factor = 10f32.powf(-6.0 / 20.0);
    for (x, y) in samples.iter().zip(&out) {
        assert!((y - x * factor).abs() < 1e-6);
    }
}

#[test]
fn stereo_file_to_mono_file_inserts_the_mixer() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("stereo.wav");
    let output_path = dir.path().join("mono.wav");

    let in_spec = SignalSpec::new(8000, SampleEncoding::Pcm16, 2);
    let out_spec = SignalSpec::new(8000, SampleEncoding::Pcm16, 1);
    // Left channel at +0.5, right at -0.5; the average is silence.
    let samples: Vec<f32> = (0..400).flat_map(|_| [0.5, -0.5]).collect();
    write_fixture(&input_path, in_spec, &samples);

    let mut source = WavSource::open(&input_path).unwrap();
    let mut sink = WavSink::create(&output_path, out_spec).unwrap();

    let chain = ChainBuilder::new(source.spec(), Some(out_spec))
        .build(&BuiltinConverters)
        .unwrap();
    assert_eq!(chain.effect_count(), 1);

    PullScheduler::new(chain).run(&mut source, &mut sink).unwrap();

    let info = read_wav_info(&output_path).unwrap();
    assert_eq!(info.spec, out_spec);
    assert_eq!(info.num_frames, 400);

    let mut reloaded = WavSource::open(&output_path).unwrap();
    let mut out = vec![0.0f32; 400];
    assert_eq!(reloaded.read(&mut out).unwrap(), 400);
    for &s in &out {
        assert!(s.abs() < 1e-4);
    }
}

#[test]
fn resampled_output_reports_the_new_rate() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("in.wav");
    let output_path = dir.path().join("out.wav");

    let in_spec = SignalSpec::new(8000, SampleEncoding::Float32, 1);
    let out_spec = in_spec.with_rate(16000);
    let samples: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.02).sin()).collect();
    write_fixture(&input_path, in_spec, &samples);

    let mut source = WavSource::open(&input_path).unwrap();
    let mut sink = WavSink::create(&output_path, out_spec).unwrap();
    let chain = ChainBuilder::new(in_spec, Some(out_spec))
        .build(&BuiltinConverters)
        .unwrap();
    let stats = PullScheduler::new(chain).run(&mut source, &mut sink).unwrap();

    assert_eq!(stats.samples_in, 1000);
    assert!((stats.samples_out as i64 - 2000).abs() <= 2);

    let info = read_wav_info(&output_path).unwrap();
    assert_eq!(info.spec.rate, 16000);
    assert_eq!(info.num_frames, stats.samples_out as u64);
}
