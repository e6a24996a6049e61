//! Webhook signature validation.
//!
//! GitHub signs every webhook delivery with `HMAC-SHA1(secret, body)` and sends
//! the result in the `x-hub-signature` header as `sha1=<hex>`. The digest must
//! be computed over the raw request bytes exactly as received; re-serialising a
//! parsed body changes key order and whitespace and therefore the digest.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Name of the header carrying the signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

const SIGNATURE_PREFIX: &str = "sha1=";

/// The shared secret configured on both the webhook sender and this receiver.
///
/// `Debug` is redacted so the secret never reaches log output.
#[derive(Clone)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    /// Creates a secret, returning `None` if it is empty.
    pub fn new(secret: impl Into<Vec<u8>>) -> Option<Self> {
        let bytes = secret.into();
        if bytes.is_empty() {
            None
        } else {
            Some(Self(bytes))
        }
    }

    fn mac(&self) -> HmacSha1 {
        // HMAC accepts keys of any length, so this cannot fail.
        <HmacSha1 as Mac>::new_from_slice(&self.0).unwrap_or_else(|_| unreachable!())
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

/// Computes the `x-hub-signature` value for `body`.
pub fn sign(secret: &WebhookSecret, body: &[u8]) -> String {
    let mut mac = secret.mac();
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    format!("{SIGNATURE_PREFIX}{}", hex::encode(digest))
}

/// Returns `true` if `header` is a valid signature of `body` under `secret`.
///
/// A missing header, a missing `sha1=` prefix, or a non-hex digest all
/// validate as `false`. Digest comparison is constant-time.
#[must_use]
pub fn validate(secret: &WebhookSecret, body: &[u8], header: Option<&str>) -> bool {
    let Some(header) = header else {
        return false;
    };
    let Some(hex_digest) = header.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let mut mac = secret.mac();
    mac.update(body);
    let computed = mac.finalize().into_bytes();

    computed.as_slice().ct_eq(&expected).into()
}
