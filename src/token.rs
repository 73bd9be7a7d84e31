//! Parsing of `oauth/request_token` and `oauth/access_token` responses.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use reqwest::Response;

use crate::codec;
use crate::error::{Error, Result, TokenError, TokenResult};
use crate::secrets::Token;

const OAUTH_TOKEN_KEY: &str = "oauth_token";
const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";

/// A token grant as returned by the platform's token endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    /// Other attributes, e.g. `oauth_callback_confirmed` or the user's
    /// screen name.
    pub remain: HashMap<String, String>,
}

impl TokenResponse {
    pub fn into_token(self) -> Token {
        Token::new(self.oauth_token, self.oauth_token_secret)
    }
}

/// Adds `parse_oauth_token` to `reqwest::Response`.
// this trait is sealed
#[async_trait(?Send)]
pub trait TokenReader: private::Sealed {
    async fn parse_oauth_token(self) -> Result<TokenResponse>;
}

#[async_trait(?Send)]
impl TokenReader for Response {
    async fn parse_oauth_token(self) -> Result<TokenResponse> {
        let text = self.text().await?;
        Ok(read_oauth_token(&text)?)
    }
}

/// Adds `parse_oauth_token` to futures resolving to a `reqwest::Response`.
// also sealed
#[async_trait(?Send)]
pub trait TokenReaderFuture: private::SealedWrapper {
    async fn parse_oauth_token(self) -> Result<TokenResponse>;
}

#[async_trait(?Send)]
impl<T, E> TokenReaderFuture for T
where
    T: Future<Output = std::result::Result<Response, E>>,
    E: Into<Error> + 'static,
{
    async fn parse_oauth_token(self) -> Result<TokenResponse> {
        match self.await {
            Ok(response) => response.parse_oauth_token().await,
            Err(err) => Err(err.into()),
        }
    }
}

fn read_oauth_token(text: &str) -> TokenResult<TokenResponse> {
    let mut params = codec::parse_query(text);
    let oauth_token = params
        .remove(OAUTH_TOKEN_KEY)
        .and_then(|values| values.into_iter().next());
    let oauth_token_secret = params
        .remove(OAUTH_TOKEN_SECRET_KEY)
        .and_then(|values| values.into_iter().next());
    match (oauth_token, oauth_token_secret) {
        (Some(token), Some(secret)) => Ok(TokenResponse {
            oauth_token: token,
            oauth_token_secret: secret,
            remain: params
                .iter()
                .map(|(name, values)| {
                    (
                        name.to_string(),
                        values.first().cloned().unwrap_or_default(),
                    )
                })
                .collect(),
        }),
        (None, _) => Err(TokenError::TokenKeyNotFound(OAUTH_TOKEN_KEY, text.to_string())),
        (_, _) => Err(TokenError::TokenKeyNotFound(
            OAUTH_TOKEN_SECRET_KEY,
            text.to_string(),
        )),
    }
}

mod private {
    use std::future::Future;

    use reqwest::Response;

    use crate::error::Error;

    pub trait Sealed {}
    impl Sealed for Response {}
    pub trait SealedWrapper {}
    impl<T, E> SealedWrapper for T
    where
        T: Future<Output = Result<Response, E>>,
        E: Into<Error>,
    {
    }
}
