use crate::error::{Error, Result};
use crate::models::TechStack;

/// Parse the tech-stack answer. Unknown keys are ignored, missing ones empty.
pub fn parse_tech_stack(response: &str) -> Result<TechStack> {
    let json_str = extract_json(response)?;

    let stack: TechStack = serde_json::from_str(&json_str)
        .map_err(|e| Error::ParseError(format!("Failed to parse tech stack: {}", e)))?;

    Ok(dedup_categories(stack))
}

fn dedup_categories(mut stack: TechStack) -> TechStack {
    for items in [
        &mut stack.primary_languages,
        &mut stack.frameworks,
        &mut stack.databases,
        &mut stack.tools_and_services,
        &mut stack.deployment,
        &mut stack.testing,
        &mut stack.build_tools,
        &mut stack.package_managers,
        &mut stack.development_tools,
        &mut stack.api_technologies,
    ] {
        let mut seen = std::collections::HashSet::new();
        items.retain(|item| !item.trim().is_empty() && seen.insert(item.to_lowercase()));
    }
    stack
}

pub fn extract_json(text: &str) -> Result<String> {
    // Try to find JSON block in markdown code blocks
    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return Ok(text[start..start + end].trim().to_string());
        }
    }

    // Try plain code block
    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip any language identifier on the same line
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            let content = text[start..start + end].trim();
            if content.starts_with('{') {
                return Ok(content.to_string());
            }
        }
    }

    // Try to find raw JSON object
    if let Some(start) = text.find('{') {
        let mut depth = 0;
        let mut end = start;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, c) in text[start..].char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match c {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        end = start + i + c.len_utf8();
                        break;
                    }
                }
                _ => {}
            }
        }

        if depth == 0 && end > start {
            return Ok(text[start..end].to_string());
        }
    }

    Err(Error::ParseError("No valid JSON found in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_markdown() {
        let input = r#"Here's the stack:
```json
{"frameworks": []}
```
"#;
        let result = extract_json(input).unwrap();
        assert_eq!(result, r#"{"frameworks": []}"#);
    }

    #[test]
    fn test_extract_raw_json() {
        let input = r#"The result is {"frameworks": [], "testing": ["a}b"]}"#;
        let result = extract_json(input).unwrap();
        assert_eq!(result, r#"{"frameworks": [], "testing": ["a}b"]}"#);
    }

    #[test]
    fn test_parse_tech_stack_from_fenced_answer() {
        let input = concat!(
            "```json\n",
            r#"{"primary_languages": ["Rust", "rust"], "frameworks": ["axum"], "extra": 1}"#,
            "\n```"
        );
        let stack = parse_tech_stack(input).unwrap();
        assert_eq!(stack.primary_languages, vec!["Rust"]);
        assert_eq!(stack.frameworks, vec!["axum"]);
        assert!(stack.databases.is_empty());
    }

    #[test]
    fn test_parse_tech_stack_rejects_prose() {
        assert!(parse_tech_stack("I could not determine the stack.").is_err());
        assert!(parse_tech_stack("{\"frameworks\": \"not a list\"}").is_err());
    }
}
