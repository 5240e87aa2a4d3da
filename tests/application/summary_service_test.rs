use std::path::Path;
use std::sync::Arc;

use medscribe::application::services::{LLM_TEMPERATURE, SummaryService};
use medscribe::domain::{SummaryFailure, SummaryOutcome, SummaryStrategy};

use crate::support::{CapturingLlmClient, summary_config};

const TRANSCRIPT: &str = "I have had a cough for two weeks. No fever. I sleep badly. My chest hurts.";

fn prompt_file(contents: &str) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), contents).unwrap();
    file
}

#[tokio::test]
async fn given_empty_text_when_summarizing_with_either_strategy_then_summary_is_empty() {
    let client = Arc::new(CapturingLlmClient::replying("unused"));
    let service = SummaryService::new(
        client.clone(),
        summary_config("openai", Some("sk-test"), Path::new("missing.txt")),
    );

    for strategy in [SummaryStrategy::RuleBased, SummaryStrategy::Llm] {
        let outcome = service.summarize("", strategy, None).await;
        assert_eq!(outcome, SummaryOutcome::Summary(String::new()));
    }
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn given_rule_based_strategy_when_summarizing_then_first_three_sentences_are_returned() {
    let client = Arc::new(CapturingLlmClient::replying("unused"));
    let service = SummaryService::new(
        client.clone(),
        summary_config("openai", None, Path::new("missing.txt")),
    );

    let outcome = service
        .summarize(TRANSCRIPT, SummaryStrategy::RuleBased, None)
        .await;

    assert_eq!(
        outcome.into_text(),
        "I have had a cough for two weeks. No fever. I sleep badly."
    );
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn given_hosted_provider_without_key_when_summarizing_with_llm_then_message_mentions_api_key()
{
    let client = Arc::new(CapturingLlmClient::replying("unused"));
    let service = SummaryService::new(
        client.clone(),
        summary_config("openai", None, Path::new("missing.txt")),
    );

    let outcome = service.summarize(TRANSCRIPT, SummaryStrategy::Llm, None).await;

    assert!(matches!(
        outcome,
        SummaryOutcome::Unavailable(SummaryFailure::MissingCredential { .. })
    ));
    assert!(outcome.into_text().contains("API key"));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn given_blank_key_when_summarizing_with_llm_then_it_counts_as_missing() {
    let client = Arc::new(CapturingLlmClient::replying("unused"));
    let service = SummaryService::new(
        client.clone(),
        summary_config("openai", Some("   "), Path::new("missing.txt")),
    );

    let outcome = service.summarize(TRANSCRIPT, SummaryStrategy::Llm, None).await;

    assert!(!outcome.is_summary());
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn given_hosted_provider_with_key_when_summarizing_then_template_is_system_prompt() {
    let template = prompt_file("Write a SOAP note.\n\nConversation:\n{text}\n");
    let client = Arc::new(CapturingLlmClient::replying("S: cough\nO: -\nA: bronchitis\nP: rest"));
    let service = SummaryService::new(
        client.clone(),
        summary_config("openai", Some("sk-test"), template.path()),
    );

    let outcome = service.summarize(TRANSCRIPT, SummaryStrategy::Llm, None).await;

    assert_eq!(
        outcome,
        SummaryOutcome::Summary("S: cough\nO: -\nA: bronchitis\nP: rest".to_string())
    );
    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    let (endpoint, request) = &calls[0];
    assert_eq!(endpoint.provider, "openai");
    assert_eq!(endpoint.api_key, "sk-test");
    assert_eq!(endpoint.base_url, "https://api.openai.com/v1");
    assert_eq!(request.system_prompt, "Write a SOAP note.\n\nConversation:");
    assert_eq!(request.user_text, TRANSCRIPT);
    assert_eq!(request.temperature, LLM_TEMPERATURE);
}

#[tokio::test]
async fn given_custom_prompt_when_summarizing_then_it_replaces_template_without_placeholder() {
    let client = Arc::new(CapturingLlmClient::replying("custom summary"));
    let service = SummaryService::new(
        client.clone(),
        summary_config("openai", Some("sk-test"), Path::new("missing.txt")),
    );

    let outcome = service
        .summarize(
            TRANSCRIPT,
            SummaryStrategy::Llm,
            Some("Summarize for a referral letter: {text}"),
        )
        .await;

    assert_eq!(outcome.into_text(), "custom summary");
    let (_, request) = &client.calls()[0];
    assert_eq!(request.system_prompt, "Summarize for a referral letter:");
    assert!(!request.system_prompt.contains("{text}"));
}

#[tokio::test]
async fn given_blank_custom_prompt_when_summarizing_then_template_is_used() {
    let template = prompt_file("Template prompt {text}");
    let client = Arc::new(CapturingLlmClient::replying("ok"));
    let service = SummaryService::new(
        client.clone(),
        summary_config("openai", Some("sk-test"), template.path()),
    );

    service
        .summarize(TRANSCRIPT, SummaryStrategy::Llm, Some("  "))
        .await;

    let (_, request) = &client.calls()[0];
    assert_eq!(request.system_prompt, "Template prompt");
}

#[tokio::test]
async fn given_ollama_provider_when_summarizing_then_self_hosted_endpoint_is_used_without_key() {
    let template = prompt_file("SOAP {text}");
    let client = Arc::new(CapturingLlmClient::replying("local summary"));
    let service = SummaryService::new(
        client.clone(),
        summary_config("ollama", None, template.path()),
    );

    let outcome = service.summarize(TRANSCRIPT, SummaryStrategy::Llm, None).await;

    assert_eq!(outcome.into_text(), "local summary");
    let (endpoint, _) = &client.calls()[0];
    assert_eq!(endpoint.provider, "ollama");
    assert_eq!(endpoint.base_url, "http://ollama.local:11434/v1");
    assert_eq!(endpoint.api_key, "ollama");
    assert_eq!(endpoint.model, "llama3.1");
}

#[tokio::test]
async fn given_unreadable_template_when_summarizing_then_outcome_explains_missing_prompt() {
    let client = Arc::new(CapturingLlmClient::replying("unused"));
    let service = SummaryService::new(
        client.clone(),
        summary_config("openai", Some("sk-test"), Path::new("/nonexistent/soap.txt")),
    );

    let outcome = service.summarize(TRANSCRIPT, SummaryStrategy::Llm, None).await;

    match outcome {
        SummaryOutcome::Unavailable(SummaryFailure::PromptUnavailable { path, .. }) => {
            assert_eq!(path, "/nonexistent/soap.txt");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn given_unreachable_provider_when_summarizing_then_failure_is_a_value_not_an_error() {
    let template = prompt_file("SOAP {text}");
    let client = Arc::new(CapturingLlmClient::unreachable());
    let service = SummaryService::new(
        client.clone(),
        summary_config("ollama", None, template.path()),
    );

    let outcome = service.summarize(TRANSCRIPT, SummaryStrategy::Llm, None).await;

    let text = outcome.into_text();
    assert!(text.starts_with("[LLM summary failed]"));
    assert!(text.contains("connection refused"));
}

#[tokio::test]
async fn given_template_file_when_reading_prompt_then_raw_contents_are_returned() {
    let template = prompt_file("Raw {text} template\n");
    let service = SummaryService::new(
        Arc::new(CapturingLlmClient::unreachable()),
        summary_config("openai", None, template.path()),
    );

    let raw = service.prompt_template().await.unwrap();

    assert_eq!(raw, "Raw {text} template\n");
}
