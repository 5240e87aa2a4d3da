const MAX_SENTENCES: usize = 3;

/// Keeps the first three period-delimited sentences.
///
/// Text with three sentences or fewer is returned unchanged, byte for byte.
pub fn summarize_extractive(text: &str) -> String {
    let mut sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.len() <= MAX_SENTENCES {
        return text.to_string();
    }

    sentences.truncate(MAX_SENTENCES);
    format!("{}.", sentences.join(". "))
}
