mod summary_service_test;
mod transcription_service_test;
