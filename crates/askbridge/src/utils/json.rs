// crates/askbridge/src/utils/json.rs
// Hardened JSON extraction from LLM output

use crate::llm::{LlmClient, Message};
use crate::utils::prefix;
use serde::de::DeserializeOwned;

/// Parse JSON from LLM output with multiple fallback strategies.
///
/// Tries in order:
/// 1. Direct parse of trimmed content
/// 2. Strip markdown code fences, then parse
/// 3. Extract first `{...}` or `[...]` block, then parse
pub fn parse_json_hardened<T: DeserializeOwned>(content: &str) -> Result<T, String> {
    let trimmed = content.trim();

    if let Ok(v) = serde_json::from_str::<T>(trimmed) {
        return Ok(v);
    }

    let stripped = strip_code_fences(trimmed);
    if stripped != trimmed {
        if let Ok(v) = serde_json::from_str::<T>(stripped) {
            return Ok(v);
        }
    }

    if let Some(extracted) = extract_json_block(trimmed) {
        if let Ok(v) = serde_json::from_str::<T>(extracted) {
            return Ok(v);
        }
    }

    Err(format!(
        "Failed to parse JSON from LLM output (tried direct, fence-strip, brace-extract). Content start: {}",
        prefix(trimmed, 200)
    ))
}

/// Parse JSON, asking the model to repair its output up to `max_fixes` times.
pub async fn parse_json_with_retry<T: DeserializeOwned>(
    content: &str,
    client: &dyn LlmClient,
    type_description: &str,
    max_fixes: u32,
) -> Result<T, String> {
    if let Ok(v) = parse_json_hardened::<T>(content) {
        return Ok(v);
    }

    let mut last_content = content.to_string();
    for attempt in 1..=max_fixes {
        tracing::debug!(attempt, "JSON parse failed, asking LLM to fix output");

        let fix_prompt = format!(
            "Your previous response was not valid JSON. Please fix it and return ONLY valid JSON.\n\n\
             Expected format: {}\n\n\
             Your broken output:\n```\n{}\n```\n\n\
             Return ONLY the corrected JSON, no markdown fences or explanations.",
            type_description,
            prefix(&last_content, 2000)
        );

        match client.chat(vec![Message::user(fix_prompt)], None).await {
            Ok(result) => {
                if let Some(fixed) = result.content {
                    if let Ok(v) = parse_json_hardened::<T>(&fixed) {
                        tracing::debug!(attempt, "LLM fix succeeded");
                        return Ok(v);
                    }
                    last_content = fixed;
                }
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "LLM fix call failed");
            }
        }
    }

    Err(format!(
        "Failed to parse JSON after {} LLM retries. Last content start: {}",
        max_fixes,
        prefix(&last_content, 200)
    ))
}

/// Strip a surrounding ```json ... ``` (or bare ```) fence.
fn strip_code_fences(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Skip the language tag line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Find the first balanced `{...}` or `[...]` block, honoring string literals.
fn extract_json_block(s: &str) -> Option<&str> {
    let start = s.find(['{', '['])?;
    let open = s[start..].chars().next()?;
    let close = if open == '{' { '}' } else { ']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in s[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
