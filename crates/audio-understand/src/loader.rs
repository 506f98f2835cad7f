//! Audio loading: decode, mix to mono, resample to the analysis rate.
//!
//! WAV goes through hound; MP3, FLAC, OGG/Vorbis and M4A/AAC through
//! symphonia. Resampling uses rubato's windowed-sinc resampler.

use std::io::Cursor;
use std::path::Path;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer as SymphoniaBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::SampleBuffer;

/// Why a byte stream could not be turned into samples.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("wav: {0}")]
    Wav(#[from] hound::Error),

    #[error("{0}")]
    Codec(#[from] symphonia::core::errors::Error),

    #[error("no audio track found")]
    NoTrack,

    #[error("stream does not declare a sample rate")]
    NoSampleRate,
}

/// Interleaved audio as stored in the file.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples (L, R, L, R, ...)
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl DecodedAudio {
    /// Average all channels into one.
    pub fn to_mono(&self) -> Vec<f32> {
        let channels = self.channels.max(1) as usize;
        if channels == 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

/// Decode WAV bytes using hound.
pub fn decode_wav(data: &[u8]) -> std::result::Result<DecodedAudio, DecodeError> {
    let reader = hound::WavReader::new(Cursor::new(data))?;

    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Decode compressed audio (MP3, FLAC, OGG, M4A) using symphonia.
///
/// `extension` is only a probe hint; the container is detected from content.
pub fn decode_symphonia(
    data: &[u8],
    extension: Option<&str>,
) -> std::result::Result<DecodedAudio, DecodeError> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;
    let track = format.default_track().ok_or(DecodeError::NoTrack)?;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::NoSampleRate)?;
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let track_id = track.id;
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet)?;

        let spec = *decoded.spec();
        if channels == 0 {
            channels = spec.channels.count() as u16;
        }

        let mut sample_buf = SymphoniaBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        samples.extend(sample_buf.samples());
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels: channels.max(1),
    })
}

/// Decode audio from raw bytes: WAV via hound, everything else via symphonia.
pub fn decode_audio(
    data: &[u8],
    extension: Option<&str>,
) -> std::result::Result<DecodedAudio, DecodeError> {
    if data.len() >= 4 && &data[0..4] == b"RIFF" {
        return decode_wav(data);
    }
    decode_symphonia(data, extension)
}

/// Resample mono audio with a windowed-sinc filter.
///
/// The output is aligned with the input (the filter delay is trimmed) and
/// holds `round(len * to_rate / from_rate)` samples. Content above the target
/// Nyquist frequency is filtered out rather than folded back.
pub fn resample(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
) -> std::result::Result<Vec<f32>, String> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let expected = (samples.len() as f64 * ratio).round() as usize;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .map_err(|e| format!("resampler error: {}", e))?;
    let delay = resampler.output_delay();

    let mut output = resampler
        .process(&[samples], None)
        .map_err(|e| format!("resample failed: {}", e))?
        .swap_remove(0);

    // Flush the filter tail until the delayed samples are all out.
    let flush: Option<&[Vec<f32>]> = None;
    while output.len() < expected + delay {
        let tail = resampler
            .process_partial(flush, None)
            .map_err(|e| format!("resample failed: {}", e))?
            .swap_remove(0);
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }

    let mut aligned: Vec<f32> = output.into_iter().skip(delay).take(expected).collect();
    aligned.resize(expected, 0.0);
    Ok(aligned)
}

/// Load an audio file as mono samples at `target_rate`.
pub fn load(path: &Path, target_rate: u32) -> Result<SampleBuffer> {
    let decode_err = |message: String| Error::Decode {
        path: path.to_path_buf(),
        message,
    };

    let bytes = std::fs::read(path).map_err(|e| decode_err(e.to_string()))?;
    let extension = path.extension().and_then(|e| e.to_str());
    let decoded = decode_audio(&bytes, extension).map_err(|e| decode_err(e.to_string()))?;

    let mono = decoded.to_mono();
    let samples = resample(&mono, decoded.sample_rate, target_rate).map_err(decode_err)?;

    debug!(
        path = %path.display(),
        source_rate = decoded.sample_rate,
        channels = decoded.channels,
        samples = samples.len(),
        "audio loaded"
    );

    Ok(SampleBuffer::new(samples, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn wav_bytes(channels: u16, rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn crc8(data: &[u8]) -> u8 {
        let mut crc = 0u8;
        for &byte in data {
            crc ^= byte;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 {
                    (crc << 1) ^ 0x07
                } else {
                    crc << 1
                };
            }
        }
        crc
    }

    fn crc16(data: &[u8]) -> u16 {
        let mut crc = 0u16;
        for &byte in data {
            crc ^= (byte as u16) << 8;
            for _ in 0..8 {
                crc = if crc & 0x8000 != 0 {
                    (crc << 1) ^ 0x8005
                } else {
                    crc << 1
                };
            }
        }
        crc
    }

    /// Minimal mono 16-bit FLAC stream: STREAMINFO plus verbatim frames of
    /// 256 samples each. `samples.len()` must be a multiple of 256.
    fn flac_bytes(rate: u32, samples: &[i16]) -> Vec<u8> {
        const BLOCK: usize = 256;
        assert_eq!(samples.len() % BLOCK, 0);

        let mut out = b"fLaC".to_vec();
        out.extend([0x80, 0x00, 0x00, 34]);
        out.extend((BLOCK as u16).to_be_bytes());
        out.extend((BLOCK as u16).to_be_bytes());
        out.extend([0; 6]);
        let packed = ((rate as u64) << 44) | (15u64 << 36) | samples.len() as u64;
        out.extend(packed.to_be_bytes());
        out.extend([0; 16]);

        for (number, block) in samples.chunks(BLOCK).enumerate() {
            let mut frame = vec![0xFF, 0xF8, 0x60, 0x08, number as u8, (BLOCK - 1) as u8];
            frame.push(crc8(&frame));
            frame.push(0x02);
            for &s in block {
                frame.extend(s.to_be_bytes());
            }
            let crc = crc16(&frame);
            frame.extend(crc.to_be_bytes());
            out.extend(frame);
        }
        out
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    fn sine(freq: f32, rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn stereo_is_mixed_to_mono() {
        let decoded = DecodedAudio {
            samples: vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0],
            sample_rate: 22050,
            channels: 2,
        };
        assert_eq!(decoded.to_mono(), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 22050, 22050).unwrap(), samples);
    }

    #[test]
    fn resample_halves_length_and_keeps_in_band_tone() {
        let input = sine(440.0, 44100, 44100);
        let out = resample(&input, 44100, 22050).unwrap();
        assert_eq!(out.len(), 22050);

        let middle = &out[2000..20000];
        assert!((rms(middle) - rms(&input)).abs() < 0.05, "rms {}", rms(middle));
    }

    #[test]
    fn resample_removes_tone_above_nyquist() {
        // 15 kHz cannot be represented at 22.05 kHz and must not alias down.
        let input = sine(15000.0, 44100, 44100);
        let out = resample(&input, 44100, 22050).unwrap();

        let middle = &out[2000..20000];
        assert!(rms(middle) < 0.05, "aliased energy {}", rms(middle));
    }

    #[test]
    fn load_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let bytes = wav_bytes(2, 22050, &[16384, 16384, -16384, -16384, 0, 0, 8192, 8192]);
        std::fs::write(&path, bytes).unwrap();

        let buffer = load(&path, 22050).unwrap();
        assert_eq!(buffer.sample_rate, 22050);
        assert_eq!(buffer.samples, vec![0.5, -0.5, 0.0, 0.25]);
    }

    #[test]
    fn load_resamples_to_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<i16> = sine(220.0, 44100, 8820)
            .iter()
            .map(|s| (s * 16000.0) as i16)
            .collect();
        std::fs::write(&path, wav_bytes(1, 44100, &samples)).unwrap();

        let buffer = load(&path, 22050).unwrap();
        assert_eq!(buffer.sample_rate, 22050);
        assert_eq!(buffer.samples.len(), 4410);
        assert!((buffer.duration() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn load_flac_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.flac");
        let samples: Vec<i16> = (0..1024).map(|i| ((i % 64) as i16 - 32) * 256).collect();
        std::fs::write(&path, flac_bytes(22050, &samples)).unwrap();

        let buffer = load(&path, 22050).unwrap();
        assert_eq!(buffer.sample_rate, 22050);
        assert_eq!(buffer.samples.len(), 1024);
        assert_eq!(buffer.samples[0], -0.25);
        assert_eq!(buffer.samples[33], 1.0 / 128.0);
    }

    #[test]
    fn symphonia_decodes_wav_too() {
        let bytes = wav_bytes(1, 22050, &[16384, -16384, 0]);
        let decoded = decode_symphonia(&bytes, Some("wav")).unwrap();
        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples, vec![0.5, -0.5, 0.0]);
    }

    #[test]
    fn missing_file_is_decode_error() {
        let err = load(Path::new("/nonexistent/track.wav"), 22050).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["garbage.wav", "garbage.mp3", "garbage.txt"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"not an audio file at all").unwrap();
            assert!(matches!(load(&path, 22050), Err(Error::Decode { .. })), "{}", name);
        }
    }
}
