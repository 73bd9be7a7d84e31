/*!
chirp-client: an OAuth 1.0a signed client for the X (Twitter) REST API.

# Overview

The crate implements the OAuth 1.0a request-signing protocol itself
(RFC 3986 parameter normalization, signature base string construction,
HMAC-SHA1 / PLAINTEXT / RSA-SHA1 signature methods) and a small client
on top of it: sign, transmit through [reqwest](https://crates.io/crates/reqwest),
decode, classify. Convenience methods cover the common platform
operations and an optional read-through file cache backs the GET path.

# How to use

## Sending a status update

```no_run
use chirp_client::{Client, Credentials};

# async fn run() -> chirp_client::Result<()> {
let credentials = Credentials::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]")
    .token("[ACCESS_TOKEN]", "[TOKEN_SECRET]");

let client = Client::new(credentials)?;
let tweet = client.send("Hello, world!").await?;
println!("posted {:?}", tweet.id_str);
# Ok(())
# }
```

## Signing a request by hand

```
use chirp_client::{Credentials, ParamList, Signer};
use http::Method;
use url::Url;

# fn run() -> Result<(), chirp_client::SignError> {
let credentials = Credentials::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]");
let signer = Signer::new(&credentials);

let params: ParamList = [("status", "Hello!")].into_iter().collect();
let request = signer.signed_request(
    Method::POST,
    Url::parse("https://api.twitter.com/1.1/statuses/update.json").unwrap(),
    &params,
)?;
let header = request.to_authorization_header(None)?;
assert!(header.starts_with("OAuth "));
# Ok(())
# }
```

## Acquiring an access token

```no_run
use chirp_client::TokenReaderFuture;

# async fn run() -> chirp_client::Result<()> {
let response = reqwest::Client::new()
    .post("https://api.twitter.com/oauth/request_token")
    .send()
    .parse_oauth_token()
    .await?;
println!("token: {}", response.oauth_token);
# Ok(())
# }
```
*/

mod api;
mod cache;
mod client;
mod codec;
mod entities;
mod error;
mod request;
mod secrets;
mod signature;
mod signer;
mod token;

pub use api::Timeline;
pub use cache::CacheConfig;
pub use client::{Client, ClientBuilder, API_URL, UPLOAD_URL};
pub use codec::{build_query, decode, encode, parse_query, ParamList};
pub use entities::{clickable, Entities, Hashtag, Media, Mention, Tweet, UrlEntity};
pub use error::{Error, Result, SignError, SignResult, TokenError, TokenResult};
pub use request::SignableRequest;
pub use secrets::{Consumer, Credentials, Token};
pub use signature::{RsaKeyFetcher, SignatureMethod};
pub use signer::Signer;
pub use token::{TokenReader, TokenReaderFuture, TokenResponse};

// exposed constant variables
/// Prefix shared by all protocol parameters.
pub const OAUTH_KEY_PREFIX: &str = "oauth";
/// Represents `oauth_consumer_key`.
pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_signature`.
pub const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
/// Represents `oauth_signature_method`.
pub const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";
