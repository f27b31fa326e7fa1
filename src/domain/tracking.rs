//! Normalisation of tracking numbers and URLs sent alongside 3PL payloads.

use crate::{domain::config::UrlWhitespace, payload::unescape_entities};

/// Maximum length of the host's package tracking number field, minus slack
/// for the host's own formatting.
pub const MAX_TRACKING_NUMBER_LEN: usize = 62;

/// Normalises a raw tracking number.
///
/// Providers send either a single number or a serialised array of numbers,
/// sometimes with HTML-escaped quotes. Arrays are joined with `", "`. The
/// result is truncated to [`MAX_TRACKING_NUMBER_LEN`] characters. Blank input
/// yields `None`.
#[must_use]
pub fn normalize_tracking_number(raw: &str) -> Option<String> {
    let unescaped = unescape_entities(raw.trim());
    if unescaped.is_empty() {
        return None;
    }

    let joined = match serde_json::from_str::<Vec<serde_json::Value>>(&unescaped) {
        Ok(numbers) => numbers
            .iter()
            .filter_map(|value| match value {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Err(_) => unescaped.into_owned(),
    };

    let truncated: String = joined.chars().take(MAX_TRACKING_NUMBER_LEN).collect();
    (!truncated.is_empty()).then_some(truncated)
}

/// Normalises a tracking URL according to the provider's whitespace rule.
/// Blank input yields `None`.
#[must_use]
pub fn normalize_tracking_url(raw: &str, whitespace: UrlWhitespace) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let url = match whitespace {
        UrlWhitespace::Encode => trimmed.replace(' ', "%20"),
        UrlWhitespace::Strip => trimmed.chars().filter(|c| !c.is_whitespace()).collect(),
    };
    Some(url)
}
