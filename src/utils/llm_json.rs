use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Strips a surrounding markdown code fence (```` ```json ```` or bare ```` ``` ````).
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence, if any.
    let rest = match rest.find('\n') {
        Some(idx) if rest[..idx].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[idx + 1..],
        _ => rest,
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Narrows `text` to its outermost `{...}` span when prose surrounds the object.
fn outer_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parses an LLM reply as JSON, tolerating fences and surrounding prose.
pub fn parse_llm_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    let cleaned = strip_json_fences(text);
    serde_json::from_str(cleaned)
        .or_else(|_| serde_json::from_str(outer_object(cleaned)))
        .ok()
}

/// First number found in `text`, e.g. `"Score: 82/100"` gives `82.0`.
pub fn parse_llm_number(text: &str) -> Option<f64> {
    let cleaned = strip_json_fences(text);
    if let Ok(value) = cleaned.parse::<f64>() {
        return value.is_finite().then_some(value);
    }
    let start = cleaned.find(|c: char| c.is_ascii_digit())?;
    let tail = &cleaned[start..];
    let end = tail
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(tail.len());
    tail[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Numeric reading of a JSON value; quoted numbers such as `"85"` count.
pub fn number_from_value(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        JsonValue::String(s) => parse_llm_number(s),
        _ => None,
    }
}

fn text_from_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// The helpers below are `deserialize_with` targets for fields the model fills
// in. A field of the wrong shape falls back to its default instead of failing
// the enclosing object.

/// Strings, numbers and booleans become text; anything else is empty.
pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    Ok(text_from_value(&value).unwrap_or_default())
}

/// A list of scalars, or a single scalar as a one-item list. Blank and
/// non-scalar items are dropped.
pub fn lenient_string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    let items = match JsonValue::deserialize(deserializer)? {
        JsonValue::Array(items) => items,
        other => vec![other],
    };
    Ok(items
        .iter()
        .filter_map(text_from_value)
        .filter(|s| !s.is_empty())
        .collect())
}

/// A list of objects, keeping only the entries that deserialize.
pub fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match JsonValue::deserialize(deserializer)? {
        JsonValue::Array(items) => items,
        single @ JsonValue::Object(_) => vec![single],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// `T::default()` when the value does not deserialize as `T`.
pub fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Keyed {
        key: String,
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Entry {
        #[serde(deserialize_with = "lenient_string")]
        name: String,
        #[serde(deserialize_with = "lenient_string_list")]
        tags: Vec<String>,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Listing {
        #[serde(deserialize_with = "lenient_list")]
        entries: Vec<Entry>,
        #[serde(deserialize_with = "lenient_or_default")]
        count: u32,
    }

    #[test]
    fn strips_tagged_and_bare_fences() {
        assert_eq!(strip_json_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn unclosed_fence_keeps_body() {
        assert_eq!(strip_json_fences("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn parses_object_wrapped_in_prose() {
        let keyed: Keyed = parse_llm_json("Here you go: {\"key\": \"v\"} Hope it helps").unwrap();
        assert_eq!(keyed.key, "v");
        assert!(parse_llm_json::<Keyed>("no json here").is_none());
    }

    #[test]
    fn extracts_numbers() {
        assert_eq!(parse_llm_number("72"), Some(72.0));
        assert_eq!(parse_llm_number("Fit score: 64.5."), Some(64.5));
        assert_eq!(parse_llm_number("n/a"), None);
    }

    #[test]
    fn numbers_read_from_numbers_and_quoted_strings() {
        assert_eq!(number_from_value(&serde_json::json!(85)), Some(85.0));
        assert_eq!(number_from_value(&serde_json::json!("85")), Some(85.0));
        assert_eq!(number_from_value(&serde_json::json!("about 70/100")), Some(70.0));
        assert_eq!(number_from_value(&serde_json::json!([1])), None);
        assert_eq!(number_from_value(&serde_json::json!(null)), None);
    }

    #[test]
    fn mistyped_fields_fall_back_without_losing_the_object() {
        let listing: Listing = serde_json::from_str(
            r#"{"entries": [{"name": 2020, "tags": "solo"}, "junk", {"name": "ok", "tags": [1, "", {"x": 1}, "b"]}],
                "count": "many"}"#,
        )
        .unwrap();
        assert_eq!(
            listing.entries,
            vec![
                Entry { name: "2020".to_string(), tags: vec!["solo".to_string()] },
                Entry { name: "ok".to_string(), tags: vec!["1".to_string(), "b".to_string()] },
            ]
        );
        assert_eq!(listing.count, 0);

        let empty: Entry = serde_json::from_str(r#"{"name": null, "tags": null}"#).unwrap();
        assert_eq!(empty, Entry::default());
    }
}
