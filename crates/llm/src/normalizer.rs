//! Strips markdown code-fence wrappers LLMs commonly add around JSON
//! output, before the caller attempts `serde_json::from_str`.

/// Extract the JSON payload from an LLM response, handling markdown code
/// blocks (with or without a `json` language tag) and prose preceding a
/// raw `{...}` object.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` blocks
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Handle ``` ... ``` blocks
    if let Some(start) = trimmed.find("```") {
        let json_start = start + 3;
        let after_tick = &trimmed[json_start..];
        let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after_tick[content_start..].find("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    // Try raw JSON (starts with {)
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_raw() {
        let input = r#"{"sentiment": "neutral"}"#;
        assert_eq!(extract_json(input), r#"{"sentiment": "neutral"}"#);
    }

    #[test]
    fn extract_json_code_block_with_tag() {
        let input = "Here you go:\n```json\n{\"sentiment\": \"neutral\"}\n```\n";
        assert_eq!(extract_json(input), r#"{"sentiment": "neutral"}"#);
    }

    #[test]
    fn extract_json_code_block_without_tag() {
        let input = "```\n{\"sentiment\": \"neutral\"}\n```";
        assert_eq!(extract_json(input), r#"{"sentiment": "neutral"}"#);
    }

    #[test]
    fn extract_json_with_surrounding_prose() {
        let input = "Sure! Here's the analysis: {\"sentiment\": \"neutral\"} Hope that helps.";
        assert_eq!(extract_json(input), r#"{"sentiment": "neutral"}"#);
    }
}
