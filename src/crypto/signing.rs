use anyhow::Context;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Signs `value` with `key`, producing a `value.signature` payload.
///
/// The signature is the HMAC-SHA256 of the value, base64-encoded
/// (URL-safe, no padding).
pub(crate) fn sign(value: &str, key: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("good key");
    mac.update(value.as_bytes());

    let signature = BASE64_URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{value}.{signature}")
}

/// Verifies a `value.signature` payload against `key`, returning the bare value.
///
/// The payload is split at the *last* dot, so values containing dots
/// round-trip correctly.
pub(crate) fn unsign(payload: &str, key: &[u8]) -> Result<String, anyhow::Error> {
    let (value, signature) = payload
        .rsplit_once('.')
        .context("The payload carries no signature segment")?;
    let digest = BASE64_URL_SAFE_NO_PAD
        .decode(signature)
        .context("Failed to decode the signature using base64 (URL-safe, no padding)")?;

    // Perform the verification. `verify_slice` compares in constant time.
    let mut mac = Hmac::<Sha256>::new_from_slice(key).context("Invalid signing key")?;
    mac.update(value.as_bytes());
    mac.verify_slice(&digest)
        .context("Failed to verify the payload using HMAC")?;

    Ok(value.to_string())
}
