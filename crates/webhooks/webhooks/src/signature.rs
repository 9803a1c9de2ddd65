//! HMAC signature generation and verification for provider deliveries.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the signature header value.
const SHA256_PREFIX: &str = "sha256=";

/// Signs and verifies delivery bodies with the shared secret token.
pub struct PayloadSigner {
    secret: String,
}

impl PayloadSigner {
    /// Creates a new signer with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Generates the hex digest for a body.
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Generates a full signature header value (`sha256=<hex>`).
    pub fn sign_header(&self, payload: &[u8]) -> String {
        format!("{}{}", SHA256_PREFIX, self.sign(payload))
    }

    /// Parses and verifies a signature header.
    pub fn verify_header(&self, header: &str, payload: &[u8]) -> Result<(), SignatureError> {
        let signature = header
            .trim()
            .strip_prefix(SHA256_PREFIX)
            .ok_or(SignatureError::InvalidFormat)?;

        let digest = hex::decode(signature).map_err(|_| SignatureError::InvalidFormat)?;

        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(payload);
        mac.verify_slice(&digest).map_err(|_| SignatureError::Invalid)
    }
}

/// Signature verification errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Invalid signature format.
    InvalidFormat,
    /// Signature does not match the body.
    Invalid,
}

impl std::fmt::Display for SignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureError::InvalidFormat => write!(f, "Invalid signature format"),
            SignatureError::Invalid => write!(f, "Bad signature"),
        }
    }
}

impl std::error::Error for SignatureError {}
