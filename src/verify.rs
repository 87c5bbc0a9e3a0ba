//! Classification and verification of signed (`s:`) and encrypted (`e:`)
//! cookie values.
//!
//! Values are tried against every candidate secret in order, so that cookies
//! issued under an older secret remain valid during a rotation window.
//! Encrypted values are authenticated before any decryption is attempted,
//! and only ever decrypted with the secret that authenticated them.
use crate::crypto::{cipher, signing};
use crate::{Secret, SecretEncoding, SignedValue, Value};
use std::collections::HashMap;

pub(crate) const SIGNED_PREFIX: &str = "s:";
pub(crate) const ENCRYPTED_PREFIX: &str = "e:";

/// The outcome of classifying a single cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The value carries no `s:`/`e:` tag; there is nothing to verify.
    Untouched,
    /// The value was authenticated (and, if encrypted, decrypted) with one
    /// of the candidate secrets.
    Verified(String),
    /// Authentication or decryption failed for every candidate secret.
    Failed,
}

/// Classifies a cookie value by its two-character prefix tag and verifies it.
///
/// - No recognized tag: the value is returned [`Resolution::Untouched`].
/// - `s:`: the remainder is a `value.signature` payload, verified against
///   each secret in order.
/// - `e:`: the remainder is a `blob.signature` payload, verified and then
///   decrypted with the secret that authenticated it.
///
/// JSON envelopes are *not* unwrapped here; that is a separate pass applied
/// uniformly after classification (see [`envelope`]).
///
/// [`envelope`]: crate::envelope
pub fn resolve(value: &str, secrets: &[Secret], encoding: SecretEncoding) -> Resolution {
    if let Some(payload) = value.strip_prefix(SIGNED_PREFIX) {
        match unsign_any(payload, secrets) {
            Some((value, _)) => Resolution::Verified(value),
            None => {
                tracing::debug!("signature did not match any candidate secret");
                Resolution::Failed
            }
        }
    } else if let Some(payload) = value.strip_prefix(ENCRYPTED_PREFIX) {
        match unwrap_encrypted(payload, secrets, encoding) {
            Some(value) => Resolution::Verified(value),
            None => Resolution::Failed,
        }
    } else {
        Resolution::Untouched
    }
}

/// Moves every signed or encrypted entry out of `cookies` into the returned
/// mapping.
///
/// Entries that fail verification are moved too, recorded as
/// [`SignedValue::Failed`]: a tagged value was *meant* to be verified, and
/// must not linger in the plain mapping whatever the outcome. Untagged
/// entries stay where they are. The two mappings partition the original key
/// set.
pub fn extract_verified(
    cookies: &mut HashMap<String, String>,
    secrets: &[Secret],
    encoding: SecretEncoding,
) -> HashMap<String, SignedValue> {
    let mut verified = HashMap::new();
    cookies.retain(|name, value| match resolve(value, secrets, encoding) {
        Resolution::Untouched => true,
        Resolution::Verified(value) => {
            verified.insert(name.clone(), SignedValue::Valid(Value::Text(value)));
            false
        }
        Resolution::Failed => {
            verified.insert(name.clone(), SignedValue::Failed);
            false
        }
    });
    verified
}

/// Attempts signature verification against every candidate secret, in order.
///
/// Returns the verified value together with the secret that produced the
/// first match. The iteration order is a hard contract: it determines which
/// secret "wins" when several would match, and therefore which key material
/// is used for any subsequent decryption.
fn unsign_any<'s>(payload: &str, secrets: &'s [Secret]) -> Option<(String, &'s Secret)> {
    for secret in secrets {
        if let Ok(value) = signing::unsign(payload, secret.as_str().as_bytes()) {
            return Some((value, secret));
        }
    }
    None
}

/// Verifies and then decrypts an `e:`-tagged payload.
///
/// Decryption is never attempted on an unverified blob, and only ever with
/// the secret that authenticated it. Any cipher error is folded into `None`,
/// indistinguishable from a signature mismatch at the public boundary.
fn unwrap_encrypted(
    payload: &str,
    secrets: &[Secret],
    encoding: SecretEncoding,
) -> Option<String> {
    let Some((blob, secret)) = unsign_any(payload, secrets) else {
        tracing::debug!("signature did not match any candidate secret");
        return None;
    };

    let outcome = encoding
        .secret_bytes(secret)
        .map(|bytes| cipher::derive_key(&bytes))
        .and_then(|key| cipher::decrypt(&blob, &key));
    match outcome {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::debug!(%error, "failed to decrypt an authenticated cookie payload");
            None
        }
    }
}
