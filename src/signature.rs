//! The OAuth 1.0a signature method family.
//!
//! A closed set of variants behind one value type: HMAC-SHA1 (the
//! platform default), PLAINTEXT (secure-channel only) and RSA-SHA1 with
//! injected key-retrieval hooks. Signature output is never URL-encoded
//! here; encoding happens exactly once, during serialization.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use log::debug;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};

use crate::error::SignResult;
use crate::request::SignableRequest;
use crate::secrets::Credentials;

type HmacSha1 = Hmac<Sha1>;

/// Retrieves RSA key material for a request. How keys are looked up
/// (trusted cert table, discovery, fetch-by-URL) is the caller's business.
pub type RsaKeyFetcher<K> = Arc<dyn Fn(&SignableRequest) -> SignResult<K> + Send + Sync>;

#[derive(Clone)]
pub enum SignatureMethod {
    /// base64(HMAC-SHA1(base string, signing key)). The default, and the
    /// only variant the platform API accepts in practice.
    HmacSha1,
    /// The signing key itself, unhashed. Only acceptable over TLS.
    Plaintext,
    /// base64(PKCS#1 v1.5 SHA-1 signature over the base string).
    RsaSha1 {
        fetch_private_key: RsaKeyFetcher<RsaPrivateKey>,
        fetch_public_key: RsaKeyFetcher<RsaPublicKey>,
    },
}

impl fmt::Debug for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for SignatureMethod {
    fn default() -> Self {
        SignatureMethod::HmacSha1
    }
}

impl SignatureMethod {
    /// The protocol name carried in `oauth_signature_method`.
    pub fn name(&self) -> &'static str {
        match self {
            SignatureMethod::HmacSha1 => "HMAC-SHA1",
            SignatureMethod::Plaintext => "PLAINTEXT",
            SignatureMethod::RsaSha1 { .. } => "RSA-SHA1",
        }
    }

    /// Computes the signature for `request`, recording the base string
    /// (or, for PLAINTEXT, the signing key) on the request for
    /// diagnostics.
    pub fn build_signature(
        &self,
        request: &mut SignableRequest,
        credentials: &Credentials,
    ) -> SignResult<String> {
        match self {
            SignatureMethod::HmacSha1 => {
                let base_string = request.signature_base_string();
                debug!("signature base string: {}", base_string);
                let key = credentials.signing_key();
                request.base_string = Some(base_string.clone());
                let mut mac = HmacSha1::new_from_slice(key.as_bytes())?;
                mac.update(base_string.as_bytes());
                Ok(BASE64.encode(mac.finalize().into_bytes()))
            }
            SignatureMethod::Plaintext => {
                let key = credentials.signing_key();
                request.base_string = Some(key.clone());
                Ok(key)
            }
            SignatureMethod::RsaSha1 {
                fetch_private_key, ..
            } => {
                let base_string = request.signature_base_string();
                debug!("signature base string: {}", base_string);
                request.base_string = Some(base_string.clone());
                let private_key = fetch_private_key(request)?;
                let digest = Sha1::digest(base_string.as_bytes());
                let signature = private_key.sign(Pkcs1v15Sign::new::<Sha1>(), &digest)?;
                Ok(BASE64.encode(signature))
            }
        }
    }

    /// Verifies a signature against a freshly computed one.
    pub fn check_signature(
        &self,
        request: &mut SignableRequest,
        credentials: &Credentials,
        signature: &str,
    ) -> SignResult<bool> {
        match self {
            SignatureMethod::RsaSha1 {
                fetch_public_key, ..
            } => {
                let decoded = match BASE64.decode(signature) {
                    Ok(bytes) => bytes,
                    Err(_) => return Ok(false),
                };
                let base_string = request.signature_base_string();
                request.base_string = Some(base_string.clone());
                let public_key = fetch_public_key(request)?;
                let digest = Sha1::digest(base_string.as_bytes());
                Ok(public_key
                    .verify(Pkcs1v15Sign::new::<Sha1>(), &digest, &decoded)
                    .is_ok())
            }
            _ => Ok(self.build_signature(request, credentials)? == signature),
        }
    }
}
