use anyhow::Context;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;

/// A secret used to sign and encrypt cookie values.
///
/// Secrets are compared in constant time and their content is redacted from
/// the `Debug` representation.
///
/// # Rotation
///
/// [`ParserConfig`] accepts an ordered list of secrets: the first entry is
/// the one used to sign and encrypt new values, while the remaining entries
/// are older secrets that incoming cookies may still be signed with.
///
/// [`ParserConfig`]: crate::ParserConfig
#[allow(clippy::derived_hash_with_manual_eq)]
#[derive(Clone, Eq, Hash)]
pub struct Secret(String);

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;

        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Secret").field(&"***").finish()
    }
}

impl Secret {
    /// Creates a new [`Secret`] from a non-empty string.
    ///
    /// # Panics
    ///
    /// Panics if `secret` is empty.
    /// For a non-panicking version, use [`Secret::try_from()`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use crumble::Secret;
    ///
    /// let secret = Secret::new("keyboard cat");
    /// ```
    pub fn new(secret: impl Into<String>) -> Secret {
        Secret::try_from(secret.into()).expect("Invalid secret")
    }

    /// The secret's text, as supplied by the caller.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Secret {
    type Error = EmptySecretError;

    /// A fallible version of [`Secret::new()`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use crumble::Secret;
    ///
    /// assert!(Secret::try_from("keyboard cat".to_string()).is_ok());
    /// assert!(Secret::try_from(String::new()).is_err());
    /// ```
    fn try_from(secret: String) -> Result<Self, Self::Error> {
        if secret.is_empty() {
            Err(EmptySecretError)
        } else {
            Ok(Secret(secret))
        }
    }
}

impl TryFrom<&str> for Secret {
    type Error = EmptySecretError;

    fn try_from(secret: &str) -> Result<Self, Self::Error> {
        Secret::try_from(secret.to_string())
    }
}

#[derive(Debug)]
/// The error returned by [`Secret::try_from()`] when the provided secret is empty.
pub struct EmptySecretError;

impl std::fmt::Display for EmptySecretError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a secret cannot be empty")
    }
}

impl std::error::Error for EmptySecretError {}

/// How a [`Secret`] is turned into raw key bytes when decrypting an
/// encrypted cookie value.
///
/// It has no effect on signature verification, which always operates on
/// the literal secret text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretEncoding {
    /// The key bytes are the literal secret text.
    #[default]
    Utf8,
    /// The secret is standard-base64-decoded before key derivation.
    Base64,
}

impl SecretEncoding {
    /// Interprets `secret` as raw key bytes according to this encoding.
    pub(crate) fn secret_bytes(&self, secret: &Secret) -> Result<Vec<u8>, anyhow::Error> {
        match self {
            SecretEncoding::Utf8 => Ok(secret.as_str().as_bytes().to_vec()),
            SecretEncoding::Base64 => BASE64_STANDARD
                .decode(secret.as_str())
                .context("Failed to decode the secret using base64 (standard)"),
        }
    }
}

impl std::fmt::Display for SecretEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretEncoding::Utf8 => write!(f, "utf8"),
            SecretEncoding::Base64 => write!(f, "base64"),
        }
    }
}
