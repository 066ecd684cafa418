//! Message content encoding.
//!
//! Message text is stored encoded; the broker and the store treat the encoded
//! form as an opaque string and only the DTO layer decodes it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

/// Minimum length of the configured secret; the first 32 bytes form the key.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The configured secret is shorter than [`MIN_SECRET_LEN`] bytes.
    #[error("secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,
    /// Encryption or randomness failure.
    #[error("failed to encrypt message content")]
    Seal,
    /// Stored content is not valid base64, is truncated, or fails
    /// authentication.
    #[error("stored message content is malformed")]
    Malformed,
}

/// Reversible transform between plaintext and stored message content.
pub trait ContentCodec: Send + Sync {
    fn encode(&self, text: &str) -> Result<String, CodecError>;
    fn decode(&self, encoded: &str) -> Result<String, CodecError>;
}

/// AES-256-GCM with a fresh random nonce per message.
///
/// Encoded form: base64(`nonce ‖ ciphertext ‖ tag`).
pub struct AesGcmCodec {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl AesGcmCodec {
    pub fn new(secret: &str) -> Result<Self, CodecError> {
        let bytes = secret.as_bytes();
        if bytes.len() < MIN_SECRET_LEN {
            return Err(CodecError::WeakSecret);
        }
        let unbound =
            UnboundKey::new(&AES_256_GCM, &bytes[..MIN_SECRET_LEN]).map_err(|_| CodecError::WeakSecret)?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }
}

impl ContentCodec for AesGcmCodec {
    fn encode(&self, text: &str) -> Result<String, CodecError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng.fill(&mut nonce_bytes).map_err(|_| CodecError::Seal)?;

        let mut in_out = text.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CodecError::Seal)?;

        let mut out = Vec::with_capacity(NONCE_LEN + in_out.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&in_out);
        Ok(STANDARD.encode(out))
    }

    fn decode(&self, encoded: &str) -> Result<String, CodecError> {
        let raw = STANDARD.decode(encoded).map_err(|_| CodecError::Malformed)?;
        if raw.len() < NONCE_LEN {
            return Err(CodecError::Malformed);
        }
        let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| CodecError::Malformed)?;

        let mut in_out = sealed.to_vec();
        let plain = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CodecError::Malformed)?;

        String::from_utf8(plain.to_vec()).map_err(|_| CodecError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "12345678901234567890123456789012";

    #[test]
    fn decodes_what_it_encodes() {
        let codec = AesGcmCodec::new(SECRET).unwrap();
        let encoded = codec.encode("Hello World").unwrap();
        assert_ne!(encoded, "Hello World");
        assert_eq!(codec.decode(&encoded).unwrap(), "Hello World");
    }

    #[test]
    fn same_text_encodes_differently_each_time() {
        let codec = AesGcmCodec::new(SECRET).unwrap();
        assert_ne!(codec.encode("hi").unwrap(), codec.encode("hi").unwrap());
    }

    #[test]
    fn short_secret_is_rejected() {
        assert_eq!(AesGcmCodec::new("too-short").err(), Some(CodecError::WeakSecret));
    }

    #[test]
    fn only_first_32_bytes_of_secret_matter() {
        let a = AesGcmCodec::new(SECRET).unwrap();
        let b = AesGcmCodec::new(&format!("{SECRET}-ignored-suffix")).unwrap();
        let encoded = a.encode("shared").unwrap();
        assert_eq!(b.decode(&encoded).unwrap(), "shared");
    }

    #[test]
    fn errors_render_readable_messages() {
        assert_eq!(CodecError::WeakSecret.to_string(), "secret must be at least 32 bytes");
        assert_eq!(CodecError::Malformed.to_string(), "stored message content is malformed");
        let boxed: Box<dyn std::error::Error> = Box::new(CodecError::Seal);
        assert_eq!(boxed.to_string(), "failed to encrypt message content");
    }

    #[test]
    fn tampered_or_foreign_content_is_malformed() {
        let codec = AesGcmCodec::new(SECRET).unwrap();
        let other = AesGcmCodec::new("abcdefghijklmnopqrstuvwxyz012345").unwrap();
        let encoded = codec.encode("secret text").unwrap();

        assert_eq!(other.decode(&encoded), Err(CodecError::Malformed));
        assert_eq!(codec.decode("not base64!"), Err(CodecError::Malformed));
        assert_eq!(codec.decode(&STANDARD.encode([1u8, 2, 3])), Err(CodecError::Malformed));

        let mut raw = STANDARD.decode(&encoded).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        assert_eq!(codec.decode(&STANDARD.encode(raw)), Err(CodecError::Malformed));
    }
}
