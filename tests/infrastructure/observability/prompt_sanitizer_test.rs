use medscribe::infrastructure::observability::sanitize_prompt;

#[test]
fn given_blank_text_when_sanitizing_then_placeholder_is_returned() {
    assert_eq!(sanitize_prompt("   \n"), "[EMPTY]");
}

#[test]
fn given_short_text_when_sanitizing_then_text_is_trimmed_only() {
    assert_eq!(sanitize_prompt("  Summarize as SOAP  "), "Summarize as SOAP");
}

#[test]
fn given_long_text_when_sanitizing_then_prefix_and_length_are_logged() {
    let text = "a".repeat(250);

    let sanitized = sanitize_prompt(&text);

    assert!(sanitized.starts_with(&"a".repeat(100)));
    assert!(sanitized.ends_with("... (250 chars total)"));
}

#[test]
fn given_long_korean_text_when_sanitizing_then_truncation_respects_char_boundaries() {
    let text = "환자가 기침을 호소함. ".repeat(20);

    let sanitized = sanitize_prompt(&text);

    assert!(sanitized.contains("chars total"));
    assert_eq!(
        sanitized.split("...").next().unwrap().chars().count(),
        100
    );
}

#[test]
fn given_bearer_token_when_sanitizing_then_token_is_redacted() {
    let sanitized = sanitize_prompt("Authorization: Bearer sk-abc123 please summarize");

    assert!(!sanitized.contains("abc123"));
    assert!(sanitized.contains("[REDACTED]"));
    assert!(sanitized.ends_with("please summarize"));
}

#[test]
fn given_repeated_api_keys_when_sanitizing_then_every_occurrence_is_redacted() {
    let sanitized = sanitize_prompt("first api_key=one then api_key=two");

    assert!(!sanitized.contains("one"));
    assert!(!sanitized.contains("two"));
    assert_eq!(sanitized.matches("api_key=[REDACTED]").count(), 2);
}
