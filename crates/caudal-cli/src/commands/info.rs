//! WAV inspection command.

use std::path::PathBuf;

use clap::Args;

use caudal_io::read_wav_info;

#[derive(Args)]
pub struct InfoArgs {
    /// WAV file to inspect
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let info = read_wav_info(&args.file)?;
    println!("{}", args.file.display());
    println!("  Sample rate:  {} Hz", info.spec.rate);
    println!("  Channels:     {}", info.spec.channels);
    println!("  Bit depth:    {}", info.spec.encoding.bits());
    println!("  Frames:       {}", info.num_frames);
    println!("  Duration:     {:.3}s", info.duration_secs);
    Ok(())
}
