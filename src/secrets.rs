use crate::codec;

/// The registered application's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    pub key: String,
    pub secret: String,
}

impl Consumer {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Consumer {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

/// A user's delegated-access identity; absent for app-only calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub key: String,
    pub secret: String,
}

impl Token {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Token {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

/// Consumer plus optional token, immutable once built.
///
/// ```
/// use chirp_client::Credentials;
///
/// let creds = Credentials::new("consumer-key", "consumer-secret")
///     .token("access-token", "access-token-secret");
/// assert!(creds.token.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer: Consumer,
    pub token: Option<Token>,
}

impl Credentials {
    /// Creates 2-legged credentials from a consumer key pair.
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Credentials {
            consumer: Consumer::new(consumer_key, consumer_secret),
            token: None,
        }
    }

    /// Attaches an access token, upgrading to 3-legged credentials.
    pub fn token(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.token = Some(Token::new(key, secret));
        self
    }

    pub fn token_key(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.key.as_str())
    }

    /// The HMAC/PLAINTEXT signing key: encoded consumer secret and encoded
    /// token secret joined by `&`, the token side empty when no token is
    /// held.
    pub fn signing_key(&self) -> String {
        let token_secret = self.token.as_ref().map(|t| t.secret.as_str()).unwrap_or("");
        format!(
            "{}&{}",
            codec::encode(&self.consumer.secret),
            codec::encode(token_secret)
        )
    }
}
