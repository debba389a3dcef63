//! WAV audio input/output utilities.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};

fn float_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

fn write_samples<W: Write + Seek>(writer: W, samples: &[f32], sample_rate: u32) -> Result<()> {
    let mut writer =
        WavWriter::new(writer, float_spec(sample_rate)).context("Failed to start WAV stream")?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .context("Failed to write sample")?;
    }
    writer.finalize().context("Failed to finalize WAV data")?;
    Ok(())
}

/// Save mono samples to a 32-bit float WAV file.
///
/// Args:
///     samples: Audio samples, nominally in [-1.0, 1.0]
///     path: Output file path
///     sample_rate: Sample rate in Hz (24000 for Kokoro)
pub fn save_wav(samples: &[f32], path: &Path, sample_rate: u32) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create WAV file {}", path.display()))?;
    write_samples(std::io::BufWriter::new(file), samples, sample_rate)
}

/// Encode mono samples as an in-memory 32-bit float WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(64 + samples.len() * 4));
    write_samples(&mut cursor, samples, sample_rate)?;
    Ok(cursor.into_inner())
}

/// Write samples to a temporary `.wav` file that outlives this process.
pub fn write_temp_wav(samples: &[f32], sample_rate: u32) -> Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix("kokoro_")
        .suffix(".wav")
        .tempfile()
        .context("Failed to create temporary WAV file")?;
    write_samples(file.as_file(), samples, sample_rate)?;
    let (_, path) = file.keep().context("Failed to persist temporary WAV file")?;
    Ok(path)
}

/// Decode a WAV body into mono `f32` samples.
///
/// Integer PCM is scaled to [-1.0, 1.0]; multi-channel audio is averaged
/// down to one channel. Returns the samples and the sample rate.
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader = WavReader::new(Cursor::new(bytes)).context("Failed to parse WAV header")?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, hound::Error>>()
            .context("Failed to read float samples")?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 * scale))
                .collect::<std::result::Result<Vec<f32>, hound::Error>>()
                .context("Failed to read integer samples")?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    if channels == 1 {
        return Ok((interleaved, spec.sample_rate));
    }

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}
