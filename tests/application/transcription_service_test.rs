use std::path::Path;
use std::sync::Arc;

use medscribe::application::ports::DecodeOptions;
use medscribe::application::services::{BEAM_SIZE, TranscriptionError};
use medscribe::domain::ModelSize;

use crate::support::{ScriptedModel, segment, transcription_service};

#[tokio::test]
async fn given_decoded_segments_when_transcribing_then_result_joins_segment_texts() {
    let model = Arc::new(ScriptedModel::new(
        "ko",
        vec![segment(0.0, 30.0, "안녕하세요."), segment(30.0, 45.2, "기침이 있어요.")],
    ));
    let service = transcription_service(model.clone());

    let result = service
        .transcribe(Path::new("visit.wav"), ModelSize::Base)
        .await
        .unwrap();

    assert_eq!(result.full_text, "안녕하세요. 기침이 있어요.");
    assert_eq!(result.detected_language, "ko");
    assert_eq!(result.segments.len(), 2);
    assert_eq!(result.segments[1].end, 45.2);
    assert!(result.elapsed_seconds >= 0.0);
}

#[tokio::test]
async fn given_any_request_when_transcribing_then_beam_width_five_is_used() {
    let model = Arc::new(ScriptedModel::new("en", vec![segment(0.0, 1.0, "hi")]));
    let service = transcription_service(model.clone());

    service
        .transcribe(Path::new("/tmp/staged.wav"), ModelSize::Small)
        .await
        .unwrap();

    assert_eq!(BEAM_SIZE, 5);
    assert_eq!(model.last_options(), Some(DecodeOptions { beam_size: 5 }));
    assert_eq!(model.last_path().unwrap(), Path::new("/tmp/staged.wav"));
}

#[tokio::test]
async fn given_silent_audio_when_transcribing_then_text_is_empty() {
    let model = Arc::new(ScriptedModel::new("en", Vec::new()));
    let service = transcription_service(model);

    let result = service
        .transcribe(Path::new("silence.wav"), ModelSize::Base)
        .await
        .unwrap();

    assert_eq!(result.full_text, "");
    assert!(result.segments.is_empty());
}

#[tokio::test]
async fn given_undecodable_audio_when_transcribing_then_decoding_error_is_returned() {
    let model = Arc::new(ScriptedModel::failing("corrupt header"));
    let service = transcription_service(model);

    let err = service
        .transcribe(Path::new("broken.m4a"), ModelSize::Base)
        .await
        .unwrap_err();

    assert!(matches!(err, TranscriptionError::Decoding(_)));
    assert!(err.to_string().contains("corrupt header"));
}

#[tokio::test]
async fn given_failure_mid_stream_when_transcribing_then_whole_request_fails() {
    let model = Arc::new(ScriptedModel::failing_after(
        vec![segment(0.0, 30.0, "first window")],
        "decoder diverged",
    ));
    let service = transcription_service(model);

    let result = service
        .transcribe(Path::new("visit.mp3"), ModelSize::Base)
        .await;

    assert!(matches!(result, Err(TranscriptionError::Decoding(_))));
}

#[tokio::test]
async fn given_repeated_requests_when_transcribing_then_cached_model_is_reused() {
    let model = Arc::new(ScriptedModel::new("en", vec![segment(0.0, 1.0, "ok")]));
    let service = transcription_service(model.clone());

    for _ in 0..3 {
        service
            .transcribe(Path::new("visit.wav"), ModelSize::Base)
            .await
            .unwrap();
    }

    assert_eq!(model.decode_calls(), 3);
}
