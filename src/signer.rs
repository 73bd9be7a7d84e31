//! Builds default OAuth protocol parameters and drives the signature.

use std::time::{SystemTime, UNIX_EPOCH};

use http::Method;
use rand::distributions::Alphanumeric;
use rand::Rng;
use url::Url;

use crate::codec::ParamList;
use crate::error::SignResult;
use crate::request::SignableRequest;
use crate::secrets::Credentials;
use crate::signature::SignatureMethod;
use crate::{
    OAUTH_CONSUMER_KEY, OAUTH_NONCE_KEY, OAUTH_SIGNATURE_KEY, OAUTH_SIGNATURE_METHOD_KEY,
    OAUTH_TIMESTAMP_KEY, OAUTH_TOKEN_KEY, OAUTH_VERSION_KEY,
};

const OAUTH_VERSION_VALUE: &str = "1.0";

/// Orchestrates signing: seeds protocol defaults, merges caller
/// parameters and attaches the signature.
#[derive(Debug, Clone)]
pub struct Signer<'a> {
    credentials: &'a Credentials,
    method: SignatureMethod,
}

impl<'a> Signer<'a> {
    /// A signer using HMAC-SHA1, the platform default.
    pub fn new(credentials: &'a Credentials) -> Self {
        Signer {
            credentials,
            method: SignatureMethod::HmacSha1,
        }
    }

    pub fn with_signature_method(credentials: &'a Credentials, method: SignatureMethod) -> Self {
        Signer {
            credentials,
            method,
        }
    }

    /// Builds a request seeded with `oauth_version`, a fresh nonce and
    /// timestamp, the consumer key and (when held) the token key.
    /// `extra` parameters are appended after the defaults; duplicates
    /// accumulate rather than overwrite.
    pub fn prepare(&self, http_method: Method, url: Url, extra: &ParamList) -> SignResult<SignableRequest> {
        let mut params = ParamList::new();
        params.set(OAUTH_VERSION_KEY, OAUTH_VERSION_VALUE);
        params.set(OAUTH_NONCE_KEY, generate_nonce());
        params.set(OAUTH_TIMESTAMP_KEY, generate_timestamp()?);
        params.set(OAUTH_CONSUMER_KEY, self.credentials.consumer.key.clone());
        if let Some(token_key) = self.credentials.token_key() {
            params.set(OAUTH_TOKEN_KEY, token_key.to_string());
        }
        params.extend_from(extra);
        Ok(SignableRequest::new(http_method, url, params))
    }

    /// Sets `oauth_signature_method` and `oauth_signature` on the request,
    /// both overwriting any prior value. Re-signing a request whose nonce
    /// and timestamp are held fixed reproduces the same signature.
    pub fn sign(&self, request: &mut SignableRequest) -> SignResult<()> {
        request.set_parameter(OAUTH_SIGNATURE_METHOD_KEY, self.method.name(), false);
        let signature = self.method.build_signature(request, self.credentials)?;
        request.set_parameter(OAUTH_SIGNATURE_KEY, signature, false);
        Ok(())
    }

    /// Convenience: [`prepare`](Self::prepare) followed by
    /// [`sign`](Self::sign).
    pub fn signed_request(
        &self,
        http_method: Method,
        url: Url,
        extra: &ParamList,
    ) -> SignResult<SignableRequest> {
        let mut request = self.prepare(http_method, url, extra)?;
        self.sign(&mut request)?;
        Ok(request)
    }
}

/// Uniqueness matters here, unpredictability does not; 32 random
/// alphanumeric characters make cross-call collisions implausible
/// without any locking.
fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn generate_timestamp() -> SignResult<String> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)?
        .as_secs()
        .to_string())
}
