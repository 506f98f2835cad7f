//! Fixed-length amplitude envelope for waveform display.

use tracing::warn;

use crate::types::WaveformEnvelope;

/// Default number of envelope points.
pub const DEFAULT_POINTS: usize = 500;

/// Summarize samples into `points` normalized RMS values.
///
/// Each point covers `len / points` consecutive samples; the trailing
/// remainder is dropped. Values are divided by the loudest bucket so the peak
/// is 1.0; silence stays all zeros. Returns an empty envelope when there are
/// fewer samples than points.
///
/// Non-finite samples are the one failure this function absorbs: the envelope
/// is replaced by `points` zeros and a warning is logged.
pub fn summarize_waveform(samples: &[f32], points: usize) -> WaveformEnvelope {
    match try_summarize(samples, points) {
        Ok(envelope) => envelope,
        Err(NonFinite { bucket }) => {
            warn!(bucket, points, "non-finite waveform energy, returning silent envelope");
            vec![0.0; points]
        }
    }
}

#[derive(Debug)]
struct NonFinite {
    bucket: usize,
}

fn try_summarize(samples: &[f32], points: usize) -> Result<WaveformEnvelope, NonFinite> {
    if points == 0 {
        return Ok(Vec::new());
    }

    let bucket_len = samples.len() / points;
    if bucket_len == 0 {
        return Ok(Vec::new());
    }

    let mut envelope = Vec::with_capacity(points);
    for (bucket, chunk) in samples.chunks_exact(bucket_len).take(points).enumerate() {
        let rms = bucket_rms(chunk);
        if !rms.is_finite() {
            return Err(NonFinite { bucket });
        }
        envelope.push(rms);
    }

    let max = envelope.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for value in &mut envelope {
            *value /= max;
        }
    }

    Ok(envelope)
}

fn bucket_rms(chunk: &[f32]) -> f64 {
    let sum_sq: f64 = chunk.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / chunk.len() as f64).sqrt()
}
