//! Caudal IO - sample transport for the caudal processing chain
//!
//! Implements [`caudal_core::SampleSource`] and [`caudal_core::SampleSink`]
//! over WAV files ([`WavSource`], [`WavSink`]) and in-memory buffers
//! ([`BufferSource`], [`BufferSink`]). WAV decoding normalizes integer PCM
//! to f32 in [-1, 1); encoding quantizes back to the destination encoding.

pub mod memory;
pub mod wav;

pub use memory::{BufferSink, BufferSource};
pub use wav::{WavInfo, WavSink, WavSource, read_wav_info};
