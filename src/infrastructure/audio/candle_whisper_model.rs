use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use candle_core::{D, DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::application::ports::{
    DecodeOptions, Decoding, SpeechModel, SpeechModelError, SpeechModelLoader,
};
use crate::domain::{ComputeBackend, ModelSize, Precision, TranscriptSegment};

use super::audio_decoder::{TARGET_SAMPLE_RATE, decode_audio_file};

const MEL_FILTERS_REPO: &str = "FL33TW00D-HF/whisper-base";
const MAX_DECODE_TOKENS: usize = 224;
const FALLBACK_LANGUAGE: &str = "en";

const LANGUAGES: [&str; 99] = [
    "en", "zh", "de", "es", "ru", "ko", "fr", "ja", "pt", "tr", "pl", "ca", "nl", "ar", "sv",
    "it", "id", "hi", "fi", "vi", "he", "uk", "el", "ms", "cs", "ro", "da", "hu", "ta", "no",
    "th", "ur", "hr", "bg", "lt", "la", "mi", "ml", "cy", "sk", "te", "fa", "lv", "bn", "sr",
    "az", "sl", "kn", "et", "mk", "br", "eu", "is", "hy", "ne", "mn", "bs", "kk", "sq", "sw",
    "gl", "mr", "pa", "si", "km", "sn", "yo", "so", "af", "oc", "ka", "be", "tg", "sd", "gu",
    "am", "yi", "lo", "uz", "fo", "ht", "ps", "tk", "nn", "mt", "sa", "lb", "my", "bo", "tl",
    "mg", "as", "tt", "haw", "ln", "ha", "ba", "jw", "su",
];

/// Loads `openai/whisper-*` checkpoints from the Hugging Face hub with candle.
pub struct CandleWhisperLoader {
    repo_prefix: String,
}

impl CandleWhisperLoader {
    pub fn new() -> Self {
        Self {
            repo_prefix: "openai/whisper-".to_string(),
        }
    }

    pub fn model_id(&self, size: ModelSize) -> String {
        format!("{}{}", self.repo_prefix, size.as_str())
    }

    /// CUDA first, then Metal. Errors when neither was compiled in or present.
    pub fn select_device(backend: ComputeBackend) -> Result<Device, SpeechModelError> {
        match backend {
            ComputeBackend::Generic => Ok(Device::Cpu),
            ComputeBackend::Accelerated => Device::new_cuda(0)
                .or_else(|_| Device::new_metal(0))
                .map_err(|e| {
                    SpeechModelError::ModelLoadFailed(format!("no accelerator available: {}", e))
                }),
        }
    }

    pub fn select_dtype(precision: Precision) -> DType {
        match precision {
            Precision::Float16 => DType::F16,
            Precision::Float32 => DType::F32,
        }
    }
}

impl Default for CandleWhisperLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechModelLoader for CandleWhisperLoader {
    fn load(
        &self,
        size: ModelSize,
        backend: ComputeBackend,
        precision: Precision,
    ) -> Result<Arc<dyn SpeechModel>, SpeechModelError> {
        let device = Self::select_device(backend)?;
        let dtype = Self::select_dtype(precision);
        let model_id = self.model_id(size);

        tracing::info!(
            device = ?device,
            dtype = ?dtype,
            model = %model_id,
            "Initializing Candle Whisper model"
        );

        let api = Api::new().map_err(|e| SpeechModelError::ModelLoadFailed(e.to_string()))?;
        let repo = api.repo(Repo::new(model_id.clone(), RepoType::Model));
        let fetch = |repo: &hf_hub::api::sync::ApiRepo, file: &str| {
            repo.get(file)
                .map_err(|e| SpeechModelError::ModelLoadFailed(format!("{}: {}", file, e)))
        };

        let config_path = fetch(&repo, "config.json")?;
        let tokenizer_path = fetch(&repo, "tokenizer.json")?;
        let weights_path = fetch(&repo, "model.safetensors")?;
        let mel_path = fetch(
            &api.repo(Repo::new(MEL_FILTERS_REPO.to_string(), RepoType::Model)),
            "melfilters.bytes",
        )?;

        let config_contents = std::fs::read_to_string(&config_path)
            .map_err(|e| SpeechModelError::ModelLoadFailed(format!("read config: {}", e)))?;
        let config: Config = serde_json::from_str(&config_contents)
            .map_err(|e| SpeechModelError::ModelLoadFailed(format!("parse config: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| SpeechModelError::ModelLoadFailed(format!("tokenizer: {}", e)))?;
        let special = SpecialTokens::resolve(&tokenizer)?;

        let mel_bytes = std::fs::read(&mel_path)
            .map_err(|e| SpeechModelError::ModelLoadFailed(format!("mel filters: {}", e)))?;
        let mel_filters = read_mel_filters(&mel_bytes, &config)?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], dtype, &device)
                .map_err(|e| SpeechModelError::ModelLoadFailed(format!("weights: {}", e)))?
        };
        let model = m::model::Whisper::load(&vb, config.clone())
            .map_err(|e| SpeechModelError::ModelLoadFailed(format!("model: {}", e)))?;

        tracing::info!(model = %model_id, "Candle Whisper model loaded");

        Ok(Arc::new(CandleWhisperModel {
            inner: Arc::new(WhisperRuntime {
                model: Mutex::new(model),
                tokenizer,
                config,
                device,
                dtype,
                mel_filters,
                special,
            }),
        }))
    }
}

pub struct CandleWhisperModel {
    inner: Arc<WhisperRuntime>,
}

impl SpeechModel for CandleWhisperModel {
    fn decode(
        &self,
        audio_path: &Path,
        options: DecodeOptions,
    ) -> Result<Decoding, SpeechModelError> {
        let pcm = decode_audio_file(audio_path)?;
        let runtime = &self.inner;

        let mel = m::audio::pcm_to_mel(&runtime.config, &pcm, &runtime.mel_filters);
        let n_mel = runtime.config.num_mel_bins;
        let n_frames = mel.len() / n_mel;
        let mel = Tensor::from_vec(mel, (1, n_mel, n_frames), &runtime.device)
            .and_then(|t| t.to_dtype(runtime.dtype))
            .map_err(candle_error("mel tensor"))?;

        let content_frames = (pcm.len() / m::HOP_LENGTH).min(n_frames);
        let language = runtime.detect_language(&mel, content_frames)?;

        let mut prompt = vec![runtime.special.sot];
        if let Some(token) = runtime.special.language_token(&language) {
            prompt.push(token);
        }
        prompt.push(runtime.special.transcribe);
        prompt.push(runtime.special.no_timestamps);

        tracing::debug!(
            language = %language,
            frames = content_frames,
            beam_size = options.beam_size,
            "Starting windowed Whisper decode"
        );

        Ok(Decoding {
            language,
            segments: Box::new(WindowDecoder {
                runtime: Arc::clone(&self.inner),
                mel,
                content_frames,
                seek: 0,
                beam_size: options.beam_size.max(1),
                prompt,
            }),
        })
    }
}

struct WhisperRuntime {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    dtype: DType,
    mel_filters: Vec<f32>,
    special: SpecialTokens,
}

impl WhisperRuntime {
    fn lock_model(&self) -> Result<MutexGuard<'_, m::model::Whisper>, SpeechModelError> {
        self.model
            .lock()
            .map_err(|_| SpeechModelError::TranscriptionFailed("model lock poisoned".to_string()))
    }

    /// Most likely language of the first 30 seconds.
    fn detect_language(
        &self,
        mel: &Tensor,
        content_frames: usize,
    ) -> Result<String, SpeechModelError> {
        if self.special.languages.is_empty() || content_frames == 0 {
            return Ok(FALLBACK_LANGUAGE.to_string());
        }

        let window = mel
            .narrow(2, 0, content_frames.min(m::N_FRAMES))
            .map_err(candle_error("language window"))?;

        let mut model = self.lock_model()?;
        let features = model
            .encoder
            .forward(&window, true)
            .map_err(candle_error("encoder"))?;
        let tokens = Tensor::new(&[[self.special.sot]], &self.device)
            .map_err(candle_error("sot tensor"))?;
        let ys = model
            .decoder
            .forward(&tokens, &features, true)
            .map_err(candle_error("decoder"))?;
        let logits = ys
            .i(..1)
            .and_then(|y| model.decoder.final_linear(&y))
            .and_then(|l| l.i(0))
            .and_then(|l| l.i(0))
            .map_err(candle_error("language logits"))?;
        model.reset_kv_cache();
        drop(model);

        let ids: Vec<u32> = self.special.languages.iter().map(|(_, id)| *id).collect();
        let best = Tensor::new(ids.as_slice(), &self.device)
            .and_then(|ids| logits.index_select(&ids, 0))
            .and_then(|l| l.argmax(0))
            .and_then(|t| t.to_scalar::<u32>())
            .map_err(candle_error("language argmax"))?;

        Ok(self
            .special
            .languages
            .get(best as usize)
            .map(|(code, _)| code.to_string())
            .unwrap_or_else(|| FALLBACK_LANGUAGE.to_string()))
    }

    /// Beam search over one mel window. Returns the decoded text.
    fn beam_search(
        &self,
        window: &Tensor,
        prompt: &[u32],
        beam_size: usize,
    ) -> Result<String, SpeechModelError> {
        let mut model = self.lock_model()?;
        let features = model
            .encoder
            .forward(window, true)
            .map_err(candle_error("encoder"))?;

        let mut beams = vec![Hypothesis {
            tokens: prompt.to_vec(),
            log_prob: 0.0,
            finished: false,
        }];

        for _ in 0..MAX_DECODE_TOKENS {
            let mut candidates = Vec::with_capacity(beams.len() * beam_size);
            for hypothesis in &beams {
                if hypothesis.finished {
                    candidates.push(hypothesis.clone());
                    continue;
                }
                let log_probs =
                    next_token_log_probs(&mut model, &features, &hypothesis.tokens, &self.device)?;
                for (token, log_prob) in top_k(&log_probs, beam_size) {
                    let finished = token == self.special.eot;
                    let mut tokens = hypothesis.tokens.clone();
                    if !finished {
                        tokens.push(token);
                    }
                    candidates.push(Hypothesis {
                        tokens,
                        log_prob: hypothesis.log_prob + f64::from(log_prob),
                        finished,
                    });
                }
            }

            candidates.sort_by(|a, b| b.score(prompt.len()).total_cmp(&a.score(prompt.len())));
            candidates.truncate(beam_size);
            beams = candidates;

            if beams.iter().all(|h| h.finished) {
                break;
            }
        }

        model.reset_kv_cache();
        drop(model);

        let generated = beams
            .into_iter()
            .max_by(|a, b| a.score(prompt.len()).total_cmp(&b.score(prompt.len())))
            .and_then(|h| h.tokens.get(prompt.len()..).map(<[u32]>::to_vec))
            .unwrap_or_default();

        self.tokenizer
            .decode(&generated, true)
            .map(|text| text.trim().to_string())
            .map_err(|e| SpeechModelError::TranscriptionFailed(format!("detokenize: {}", e)))
    }
}

/// Lazily decodes one 30 second mel window per step.
struct WindowDecoder {
    runtime: Arc<WhisperRuntime>,
    mel: Tensor,
    content_frames: usize,
    seek: usize,
    beam_size: usize,
    prompt: Vec<u32>,
}

impl WindowDecoder {
    fn decode_window(
        &self,
        start: usize,
        frames: usize,
    ) -> Result<TranscriptSegment, SpeechModelError> {
        let window = self
            .mel
            .narrow(2, start, frames)
            .map_err(candle_error("mel window"))?;
        let text = self
            .runtime
            .beam_search(&window, &self.prompt, self.beam_size)?;

        tracing::debug!(
            start_secs = frames_to_seconds(start),
            chars = text.len(),
            "Decoded audio window"
        );

        Ok(TranscriptSegment {
            start: frames_to_seconds(start),
            end: frames_to_seconds(start + frames),
            text,
        })
    }
}

impl Iterator for WindowDecoder {
    type Item = Result<TranscriptSegment, SpeechModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.seek < self.content_frames {
            let start = self.seek;
            let frames = (self.content_frames - start).min(m::N_FRAMES);
            self.seek += frames;

            match self.decode_window(start, frames) {
                Ok(segment) if segment.text.is_empty() => continue,
                other => return Some(other),
            }
        }
        None
    }
}

#[derive(Debug, Clone)]
struct Hypothesis {
    tokens: Vec<u32>,
    log_prob: f64,
    finished: bool,
}

impl Hypothesis {
    /// Length-normalized log probability of the generated tokens.
    fn score(&self, prompt_len: usize) -> f64 {
        let generated = self.tokens.len().saturating_sub(prompt_len).max(1);
        self.log_prob / generated as f64
    }
}

struct SpecialTokens {
    sot: u32,
    transcribe: u32,
    no_timestamps: u32,
    eot: u32,
    languages: Vec<(&'static str, u32)>,
}

impl SpecialTokens {
    fn resolve(tokenizer: &Tokenizer) -> Result<Self, SpeechModelError> {
        let required = |token: &str| {
            tokenizer.token_to_id(token).ok_or_else(|| {
                SpeechModelError::ModelLoadFailed(format!("token not found: {}", token))
            })
        };

        let languages = LANGUAGES
            .iter()
            .filter_map(|code| {
                tokenizer
                    .token_to_id(&format!("<|{}|>", code))
                    .map(|id| (*code, id))
            })
            .collect();

        Ok(Self {
            sot: required(m::SOT_TOKEN)?,
            transcribe: required(m::TRANSCRIBE_TOKEN)?,
            no_timestamps: required(m::NO_TIMESTAMPS_TOKEN)?,
            eot: required(m::EOT_TOKEN)?,
            languages,
        })
    }

    fn language_token(&self, language: &str) -> Option<u32> {
        self.languages
            .iter()
            .find(|(code, _)| *code == language)
            .map(|(_, id)| *id)
    }
}

fn next_token_log_probs(
    model: &mut m::model::Whisper,
    features: &Tensor,
    tokens: &[u32],
    device: &Device,
) -> Result<Vec<f32>, SpeechModelError> {
    let input = Tensor::new(tokens, device)
        .and_then(|t| t.unsqueeze(0))
        .map_err(candle_error("token tensor"))?;
    let ys = model
        .decoder
        .forward(&input, features, true)
        .map_err(candle_error("decoder"))?;
    let seq_len = ys.dim(1).map_err(candle_error("decoder output"))?;

    ys.i((..1, seq_len.saturating_sub(1)..))
        .and_then(|last| model.decoder.final_linear(&last))
        .and_then(|logits| logits.i(0))
        .and_then(|logits| logits.i(0))
        .and_then(|logits| logits.to_dtype(DType::F32))
        .and_then(|logits| candle_nn::ops::log_softmax(&logits, D::Minus1))
        .and_then(|log_probs| log_probs.to_vec1::<f32>())
        .map_err(candle_error("next token"))
}

/// Indices and values of the `k` largest entries, unordered.
fn top_k(values: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut indexed: Vec<(u32, f32)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as u32, *v))
        .collect();
    let k = k.min(indexed.len());
    if k == 0 {
        return Vec::new();
    }
    indexed.select_nth_unstable_by(k - 1, |a, b| b.1.total_cmp(&a.1));
    indexed.truncate(k);
    indexed
}

fn frames_to_seconds(frames: usize) -> f64 {
    (frames * m::HOP_LENGTH) as f64 / f64::from(TARGET_SAMPLE_RATE)
}

fn candle_error(context: &'static str) -> impl Fn(candle_core::Error) -> SpeechModelError {
    move |e| SpeechModelError::TranscriptionFailed(format!("{}: {}", context, e))
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, SpeechModelError> {
    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(SpeechModelError::ModelLoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .take(expected_len)
        .filter_map(|chunk| chunk.try_into().ok().map(f32::from_le_bytes))
        .collect())
}
