use crate::envelope;

/// The value of a cookie, after JSON envelopes have been inflated.
///
/// Most cookies are plain text. A cookie whose value uses the `j:` envelope
/// convention is inflated into structured JSON data instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A plain string value.
    Text(String),
    /// A value that was carried inside a `j:` JSON envelope.
    Json(serde_json::Value),
}

impl Value {
    /// Returns the plain string value, if this is a [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Json(_) => None,
        }
    }

    /// Returns the inflated JSON value, if this is a [`Value::Json`].
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Text(_) => None,
            Value::Json(json) => Some(json),
        }
    }

    /// Replaces a [`Value::Text`] carrying a JSON envelope with its inflated
    /// form. Anything else is left untouched.
    pub(crate) fn inflate(&mut self) {
        if let Value::Text(text) = self {
            if let Some(json) = envelope::decode(text) {
                *self = Value::Json(json);
            }
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// The outcome of verifying a signed or encrypted cookie value.
///
/// A [`SignedValue::Failed`] covers both a signature that matched none of the
/// configured secrets and a payload that authenticated but could not be
/// decrypted. The two causes are indistinguishable on purpose: callers must
/// not be able to learn whether a forged cookie got past signature
/// verification.
#[derive(Debug, Clone, PartialEq)]
pub enum SignedValue {
    /// The value was authenticated (and, for encrypted values, decrypted)
    /// with one of the configured secrets.
    Valid(Value),
    /// The value could not be authenticated or decrypted with any of the
    /// configured secrets.
    Failed,
}

impl SignedValue {
    /// Returns the verified value, if verification succeeded.
    pub fn value(&self) -> Option<&Value> {
        match self {
            SignedValue::Valid(value) => Some(value),
            SignedValue::Failed => None,
        }
    }

    /// `true` if verification or decryption failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, SignedValue::Failed)
    }

    pub(crate) fn inflate(&mut self) {
        if let SignedValue::Valid(value) = self {
            value.inflate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SignedValue, Value};

    #[test]
    fn inflate_replaces_json_envelopes() {
        let mut value = Value::from("j:{\"foo\":\"bar\"}");
        value.inflate();

        assert_eq!(
            value.as_json(),
            Some(&serde_json::json!({"foo": "bar"}))
        );
    }

    #[test]
    fn inflate_keeps_plain_text() {
        let mut value = Value::from("just text");
        value.inflate();

        assert_eq!(value.as_text(), Some("just text"));
    }

    #[test]
    fn failed_values_never_inflate() {
        let mut value = SignedValue::Failed;
        value.inflate();

        assert!(value.is_failed());
        assert_eq!(value.value(), None);
    }
}
