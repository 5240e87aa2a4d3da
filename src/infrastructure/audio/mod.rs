pub mod audio_decoder;
mod candle_whisper_model;

pub use candle_whisper_model::{CandleWhisperLoader, CandleWhisperModel};
