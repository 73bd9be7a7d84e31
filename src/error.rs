use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type SignResult<T> = std::result::Result<T, SignError>;
pub type TokenResult<T> = std::result::Result<T, TokenError>;

/// Anything a request through the client can fail with.
#[derive(Error, Debug)]
pub enum Error {
    #[error("OAuth sign failed : {0}")]
    Sign(#[from] SignError),
    /// Network-level failure; no HTTP status was received.
    #[error("request failed : {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with HTTP >= 400.
    #[error("server error #{status} : {message}")]
    Api { status: u16, message: String },
    /// A 2xx response whose body fits none of the recognized content types.
    #[error("invalid server response : {0}")]
    Decode(String),
    /// A local media path was unreadable before any network call.
    #[error("cannot read the file {0}. Check if file exists on disk and check its permissions")]
    FileNotFound(PathBuf),
    #[error("invalid resource URL : {0}")]
    Url(#[from] url::ParseError),
    #[error("token acquisition failed : {0}")]
    Token(#[from] TokenError),
}

impl Error {
    /// The HTTP status carried by this error, or 0 when none applies.
    pub fn status(&self) -> u16 {
        match self {
            Error::Api { status, .. } => *status,
            Error::Transport(e) => e.status().map(|s| s.as_u16()).unwrap_or(0),
            _ => 0,
        }
    }
}

/// Malformed input to signing or serialization.
#[derive(Error, Debug)]
pub enum SignError {
    /// Arrays are not representable in a single Authorization header field.
    #[error("parameter {0} holds multiple values and cannot be serialized into a header")]
    MultiValuedHeaderParameter(String),
    #[error("failed to compute time since Unix epoch : {0}")]
    Clock(#[from] std::time::SystemTimeError),
    #[error("invalid HMAC key : {0}")]
    HmacKey(#[from] hmac::digest::InvalidLength),
    #[error("RSA key material is unusable : {0}")]
    RsaKey(String),
    #[error("RSA signing failed : {0}")]
    Rsa(#[from] rsa::Error),
}

#[derive(Error, Debug, Clone)]
pub enum TokenError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
}
