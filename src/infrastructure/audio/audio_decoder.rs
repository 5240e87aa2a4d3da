use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::SpeechModelError;

/// Sample rate Whisper expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Reads an audio file and returns 16 kHz mono PCM in `[-1.0, 1.0]`.
pub fn decode_audio_file(path: &Path) -> Result<Vec<f32>, SpeechModelError> {
    let file = File::open(path).map_err(|e| {
        SpeechModelError::AudioDecodingFailed(format!("open {}: {}", path.display(), e))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| SpeechModelError::AudioDecodingFailed(format!("probe: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| SpeechModelError::AudioDecodingFailed("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| SpeechModelError::AudioDecodingFailed("unknown sample rate".to_string()))?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1).max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| SpeechModelError::AudioDecodingFailed(format!("codec: {}", e)))?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(SpeechModelError::AudioDecodingFailed(format!("packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => {
                return Err(SpeechModelError::AudioDecodingFailed(format!("decode: {}", e)));
            }
        };

        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let mut buffer = SampleBuffer::<f32>::new(frames as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);
        downmix_into(buffer.samples(), channels, &mut mono);
    }

    if mono.is_empty() {
        return Err(SpeechModelError::AudioDecodingFailed(
            "no audio samples decoded".to_string(),
        ));
    }

    let pcm = if source_rate == TARGET_SAMPLE_RATE {
        mono
    } else {
        resample(&mono, source_rate, TARGET_SAMPLE_RATE)?
    };

    tracing::debug!(
        path = %path.display(),
        source_rate,
        channels,
        samples = pcm.len(),
        duration_secs = pcm.len() as f32 / TARGET_SAMPLE_RATE as f32,
        "Audio decoded to 16kHz mono PCM"
    );

    Ok(pcm)
}

/// Averages interleaved frames into a single channel.
pub fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
    );
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, SpeechModelError> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    const CHUNK_SIZE: usize = 1024;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = f64::from(to_rate) / f64::from(from_rate);

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_SIZE, 1)
        .map_err(|e| SpeechModelError::AudioDecodingFailed(format!("resampler init: {}", e)))?;

    let expected_len = (samples.len() as f64 * ratio) as usize;
    let mut output = Vec::with_capacity(expected_len + CHUNK_SIZE);

    for chunk in samples.chunks(CHUNK_SIZE) {
        let mut input = chunk.to_vec();
        input.resize(CHUNK_SIZE, 0.0);

        let resampled = resampler
            .process(&[input], None)
            .map_err(|e| SpeechModelError::AudioDecodingFailed(format!("resample: {}", e)))?;
        if let Some(channel) = resampled.first() {
            output.extend_from_slice(channel);
        }
    }

    // The final chunk was zero-padded.
    output.truncate(expected_len);

    Ok(output)
}
