//! The signable view of one HTTP request.
//!
//! A [`SignableRequest`] is created per request attempt, gains the
//! `oauth_*` protocol parameters during signing and is discarded after
//! the exchange. It is never reused; nonce and timestamp must be fresh
//! every time.

use http::Method;
use url::Url;

use crate::codec::{self, ParamList};
use crate::error::{SignError, SignResult};
use crate::{OAUTH_KEY_PREFIX, OAUTH_SIGNATURE_KEY};

#[derive(Debug, Clone)]
pub struct SignableRequest {
    method: Method,
    url: Url,
    parameters: ParamList,
    /// The most recently computed signature base string, kept for
    /// diagnostics. PLAINTEXT records the signing key here instead.
    pub base_string: Option<String>,
}

impl SignableRequest {
    /// Builds a request, merging any query string embedded in `url` with
    /// the explicitly supplied parameters.
    ///
    /// When both the URL and `params` bind the same name, both values
    /// survive as a multi-value entry with the URL-derived values first.
    pub fn new(method: Method, url: Url, params: ParamList) -> Self {
        let mut parameters = match url.query() {
            Some(query) => codec::parse_query(query),
            None => ParamList::new(),
        };
        parameters.extend_from(&params);
        SignableRequest {
            method,
            url,
            parameters,
            base_string: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn parameters(&self) -> &ParamList {
        &self.parameters
    }

    /// Sets a parameter; with `allow_duplicates` a prior binding is
    /// extended instead of replaced.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<String>, allow_duplicates: bool) {
        if allow_duplicates && self.parameters.contains(name) {
            self.parameters.append(name, value);
        } else {
            self.parameters.set(name, value);
        }
    }

    pub fn get_parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name)
    }

    /// Scheme, host and path with default ports (80/http, 443/https)
    /// stripped; no query, no fragment.
    pub fn normalized_url(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            // `Url::port` is `None` when the port matches the scheme default.
            Some(port) => format!("{}://{}:{}{}", self.url.scheme(), host, port, self.url.path()),
            None => format!("{}://{}{}", self.url.scheme(), host, self.url.path()),
        }
    }

    /// The request parameters, sorted and concatenated into a normalized
    /// string. Any `oauth_signature` entry is excluded.
    pub fn signable_parameter_string(&self) -> String {
        let mut params = self.parameters.clone();
        let _ = params.remove(OAUTH_SIGNATURE_KEY);
        codec::build_query(&params)
    }

    /// The canonical string that gets signed: uppercased method, the
    /// normalized URL and the normalized parameter string, each RFC
    /// 3986-encoded and joined with `&`.
    pub fn signature_base_string(&self) -> String {
        format!(
            "{}&{}&{}",
            self.method.as_str().to_uppercase(),
            codec::encode(&self.normalized_url()),
            codec::encode(&self.signable_parameter_string()),
        )
    }

    /// A URL usable for a GET request: normalized URL plus the full
    /// parameter set as a query string.
    pub fn to_url(&self) -> String {
        let query = self.to_post_data();
        if query.is_empty() {
            self.normalized_url()
        } else {
            format!("{}?{}", self.normalized_url(), query)
        }
    }

    /// The data one would send as a form-encoded POST body.
    pub fn to_post_data(&self) -> String {
        codec::build_query(&self.parameters)
    }

    /// Renders the `Authorization: OAuth ...` header value, carrying only
    /// `oauth`-prefixed parameters.
    ///
    /// Fails when an oauth parameter holds multiple values; arrays are
    /// not representable in a single header field.
    pub fn to_authorization_header(&self, realm: Option<&str>) -> SignResult<String> {
        let mut pairs = Vec::new();
        if let Some(realm) = realm {
            pairs.push(format!("realm=\"{}\"", codec::encode(realm)));
        }
        for (name, values) in self.parameters.iter() {
            if !name.starts_with(OAUTH_KEY_PREFIX) {
                continue;
            }
            if values.len() > 1 {
                return Err(SignError::MultiValuedHeaderParameter(name.to_string()));
            }
            let value = values.first().map(String::as_str).unwrap_or_default();
            pairs.push(format!("{}=\"{}\"", codec::encode(name), codec::encode(value)));
        }
        Ok(format!("OAuth {}", pairs.join(", ")))
    }
}
