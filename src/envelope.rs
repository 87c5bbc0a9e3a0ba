//! The `j:` JSON envelope convention.
//!
//! A cookie value of the form `j:<JSON text>` marks its remainder as a
//! JSON-serialized value to be inflated back into structured data. The
//! envelope composes with plain values only: signed and encrypted cookies
//! are inflated *after* verification, never on their raw wire form.
use crate::{SignedValue, Value};
use std::collections::HashMap;

const JSON_PREFIX: &str = "j:";

/// Decodes a `j:`-prefixed JSON envelope.
///
/// Returns `None` when the prefix is absent or the body is not valid JSON.
/// Malformed envelopes are not an error: the caller keeps the original
/// string.
///
/// # Example
///
/// ```rust
/// use crumble::envelope;
///
/// assert_eq!(
///     envelope::decode("j:{\"foo\":\"bar\"}"),
///     Some(serde_json::json!({"foo": "bar"})),
/// );
/// assert_eq!(envelope::decode("{\"foo\":\"bar\"}"), None);
/// assert_eq!(envelope::decode("j:{\"foo\":"), None);
/// ```
pub fn decode(value: &str) -> Option<serde_json::Value> {
    let body = value.strip_prefix(JSON_PREFIX)?;
    serde_json::from_str(body).ok()
}

/// Inflates every JSON envelope in a cookie mapping.
///
/// Entries whose value is not an envelope, or whose envelope body fails to
/// parse, keep their original value.
pub fn decode_mapping(cookies: &mut HashMap<String, Value>) {
    for value in cookies.values_mut() {
        value.inflate();
    }
}

/// Inflates JSON envelopes inside successfully verified values.
///
/// Failed verifications carry no payload and are left untouched.
pub fn decode_signed_mapping(cookies: &mut HashMap<String, SignedValue>) {
    for value in cookies.values_mut() {
        value.inflate();
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, decode_mapping};
    use crate::Value;
    use std::collections::HashMap;

    #[test]
    fn decodes_json_envelopes() {
        assert_eq!(
            decode("j:{\"foo\":\"bar\"}"),
            Some(serde_json::json!({"foo": "bar"}))
        );
        assert_eq!(decode("j:[1,2,3]"), Some(serde_json::json!([1, 2, 3])));
        assert_eq!(decode("j:\"text\""), Some(serde_json::json!("text")));
    }

    #[test]
    fn ignores_values_without_the_prefix() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("foo"), None);
        assert_eq!(decode("{}"), None);
        // The prefix must be at the very start.
        assert_eq!(decode(" j:{}"), None);
    }

    #[test]
    fn swallows_invalid_json() {
        assert_eq!(decode("j:"), None);
        assert_eq!(decode("j:{foo:\"bar\"}"), None);
        assert_eq!(decode("j:{\"foo\":"), None);
    }

    #[test]
    fn mapping_pass_inflates_envelopes_and_keeps_the_rest() {
        let mut cookies: HashMap<String, Value> = HashMap::from([
            ("plain".to_string(), Value::from("bar")),
            ("json".to_string(), Value::from("j:{\"a\":1}")),
            ("broken".to_string(), Value::from("j:{\"a\":")),
        ]);
        decode_mapping(&mut cookies);

        assert_eq!(cookies["plain"].as_text(), Some("bar"));
        assert_eq!(cookies["json"].as_json(), Some(&serde_json::json!({"a": 1})));
        // Malformed JSON keeps the original string.
        assert_eq!(cookies["broken"].as_text(), Some("j:{\"a\":"));
    }
}
