use hmac::{Hmac, Mac};
use pitchside_shared::pii::masked_preview;
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Computes and checks gateway callback signatures.
///
/// The gateway signs `"{order_id}|{payment_id}"` with the shared key
/// secret and hex-encodes the HMAC-SHA256 digest. Comparison runs in
/// constant time; any malformed input counts as a mismatch.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key length");
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn verify(&self, order_id: &str, payment_id: &str, supplied: &str) -> bool {
        let Ok(supplied_bytes) = hex::decode(supplied) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key length");
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        mac.verify_slice(&supplied_bytes).is_ok()
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &masked_preview(&self.secret))
            .finish()
    }
}
