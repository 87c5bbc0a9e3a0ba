use aes_gcm::aead::{generic_array::GenericArray, Aead, AeadInPlace, KeyInit, Payload};
use aes_gcm::Aes256Gcm;
use anyhow::Context;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

pub(crate) const NONCE_LEN: usize = 12;
pub(crate) const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
const KDF_INFO: &[u8] = b"crumble cookie cipher";

/// Derives a 256-bit cipher key from the raw secret bytes using HKDF-SHA256.
///
/// Secrets can be of any length; the derivation always yields a key of the
/// size AES-256-GCM expects.
pub(crate) fn derive_key(secret: &[u8]) -> [u8; KEY_LEN] {
    let hkdf = Hkdf::<Sha256>::new(None, secret);
    let mut key = [0u8; KEY_LEN];
    hkdf.expand(KDF_INFO, &mut key)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    key
}

/// Encrypts a cookie value using the given key.
pub(crate) fn encrypt(value: &[u8], key: &[u8]) -> String {
    // Create a vec to hold the [nonce | cookie value | tag].
    let mut data = vec![0; NONCE_LEN + value.len() + TAG_LEN];

    // Split data into three: nonce, input/output, tag. Copy input.
    let (nonce, in_out) = data.split_at_mut(NONCE_LEN);
    let (in_out, tag) = in_out.split_at_mut(value.len());
    in_out.copy_from_slice(value);

    // Fill nonce piece with random data.
    let mut rng = rand::thread_rng();
    rng.try_fill_bytes(nonce)
        .expect("couldn't random fill nonce");
    let nonce = GenericArray::clone_from_slice(nonce);

    // Perform the actual sealing operation.
    let aead = Aes256Gcm::new(GenericArray::from_slice(key));
    let aad_tag = aead
        .encrypt_in_place_detached(&nonce, b"", in_out)
        .expect("encryption failed!");

    // Copy the tag into the tag piece.
    tag.copy_from_slice(&aad_tag);

    // Base64 encode [nonce | encrypted value | tag].
    BASE64_URL_SAFE_NO_PAD.encode(&data)
}

/// Decrypts a cookie value blob using the given key.
pub(crate) fn decrypt(blob: &str, key: &[u8]) -> Result<String, anyhow::Error> {
    let data = BASE64_URL_SAFE_NO_PAD
        .decode(blob)
        .context("Failed to decode cookie value using base64 (URL-safe, no padding)")?;
    if data.len() <= NONCE_LEN {
        anyhow::bail!("The cookie value was too short to contain a nonce");
    }

    let (nonce, cipher) = data.split_at(NONCE_LEN);
    let payload = Payload {
        msg: cipher,
        aad: b"",
    };

    let aead = Aes256Gcm::new(GenericArray::from_slice(key));
    let decrypted = aead
        .decrypt(GenericArray::from_slice(nonce), payload)
        .map_err(|_| anyhow::anyhow!("Failed to decrypt cookie value using AES-GCM"))?;
    String::from_utf8(decrypted).context("Cookie value was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::{decrypt, derive_key, encrypt};

    #[test]
    fn roundtrip() {
        let key = derive_key(b"keyboard cat");
        let blob = encrypt(b"tamper-proof", &key);

        assert_eq!(decrypt(&blob, &key).unwrap(), "tamper-proof");
    }

    #[test]
    fn key_derivation_is_deterministic() {
        assert_eq!(derive_key(b"keyboard cat"), derive_key(b"keyboard cat"));
        assert_ne!(derive_key(b"keyboard cat"), derive_key(b"nyan cat"));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let blob = encrypt(b"tamper-proof", &derive_key(b"keyboard cat"));

        assert!(decrypt(&blob, &derive_key(b"nyan cat")).is_err());
    }

    #[test]
    fn tampered_blob_is_rejected() {
        let key = derive_key(b"keyboard cat");
        let blob = encrypt(b"tamper-proof", &key);
        let mut tampered = blob.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(decrypt(&tampered, &key).is_err());
    }

    #[test]
    fn short_blob_is_rejected() {
        let key = derive_key(b"keyboard cat");

        assert!(decrypt("", &key).is_err());
        assert!(decrypt("AAAA", &key).is_err());
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let key = derive_key(b"keyboard cat");

        assert!(decrypt("not base64!", &key).is_err());
    }
}
