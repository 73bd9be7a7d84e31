//! Read-through file cache for GET requests.
//!
//! The cache is explicit configuration threaded into the client, never
//! process-wide state. One file per request key; concurrent writers to
//! the same key resolve as last-writer-wins.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use http::Method;
use log::debug;
use serde_json::Value;
use sha1::{Digest, Sha1};

use crate::client::Client;
use crate::codec::{self, ParamList};
use crate::error::Result;
use crate::secrets::Credentials;

/// Where cached responses live and how long they stay fresh.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub expire: Duration,
}

impl CacheConfig {
    pub fn new(dir: impl Into<PathBuf>, expire: Duration) -> Self {
        CacheConfig {
            dir: dir.into(),
            expire,
        }
    }
}

impl Client {
    /// A GET [`request`](Client::request) backed by the configured file
    /// cache.
    ///
    /// A fresh cached payload is returned without touching the network.
    /// On a failed refresh a stale payload is returned if one exists;
    /// otherwise the error propagates unchanged. Without a configured
    /// cache this is a plain request.
    pub async fn cached_request(
        &self,
        resource: &str,
        data: &ParamList,
        expire: Option<Duration>,
    ) -> Result<Value> {
        let config = match &self.cache {
            Some(config) => config,
            None => return self.request(resource, Method::GET, data).await,
        };
        let file = config
            .dir
            .join(format!("chirp.{}.json", cache_key(resource, data, &self.credentials)));
        let expire = expire.unwrap_or(config.expire);

        if let Some(cached) = read_cached(&file, Some(expire)) {
            debug!("cache hit for {}", resource);
            return Ok(cached);
        }

        match self.request(resource, Method::GET, data).await {
            Ok(payload) => {
                if let Ok(serialized) = serde_json::to_vec(&payload) {
                    // a failed write only costs the next call a refresh
                    let _ = fs::write(&file, serialized);
                }
                Ok(payload)
            }
            Err(err) => match read_cached(&file, None) {
                Some(stale) => {
                    debug!("serving stale cache for {} after: {}", resource, err);
                    Ok(stale)
                }
                None => Err(err),
            },
        }
    }
}

/// Content-derived key: resource, canonical query and credential
/// identity, so distinct users and parameter sets never share a file.
fn cache_key(resource: &str, data: &ParamList, credentials: &Credentials) -> String {
    let mut hasher = Sha1::new();
    hasher.update(resource.as_bytes());
    hasher.update(codec::build_query(data).as_bytes());
    hasher.update(credentials.consumer.key.as_bytes());
    hasher.update(credentials.token_key().unwrap_or_default().as_bytes());
    hex::encode(hasher.finalize())
}

/// Reads a cached payload; with `max_age` set, only if the file is
/// still fresh by modification time.
fn read_cached(file: &Path, max_age: Option<Duration>) -> Option<Value> {
    if let Some(max_age) = max_age {
        let modified = fs::metadata(file).ok()?.modified().ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > max_age {
            return None;
        }
    }
    let contents = fs::read_to_string(file).ok()?;
    serde_json::from_str(&contents).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientBuilder;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> Credentials {
        Credentials::new("CK", "CS").token("TK", "TS")
    }

    #[test]
    fn cache_key_is_stable_and_credential_sensitive() {
        let data: ParamList = [("count", "20")].into_iter().collect();
        let a = cache_key("statuses/user_timeline", &data, &creds());
        let b = cache_key("statuses/user_timeline", &data, &creds());
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);

        let other_user = Credentials::new("CK", "CS").token("TK2", "TS2");
        assert_ne!(a, cache_key("statuses/user_timeline", &data, &other_user));
        assert_ne!(a, cache_key("statuses/home_timeline", &data, &creds()));
        let more: ParamList = [("count", "40")].into_iter().collect();
        assert_ne!(a, cache_key("statuses/user_timeline", &more, &creds()));
    }

    #[test]
    fn read_cached_respects_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("chirp.test.json");
        fs::write(&file, r#"{"cached":true}"#).unwrap();

        assert!(read_cached(&file, Some(Duration::from_secs(60))).is_some());
        std::thread::sleep(Duration::from_millis(50));
        assert!(read_cached(&file, Some(Duration::from_millis(10))).is_none());
        // stale reads ignore age entirely
        assert!(read_cached(&file, None).is_some());
        assert!(read_cached(&dir.path().join("missing.json"), None).is_none());
    }

    #[tokio::test]
    async fn second_request_within_ttl_is_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/users/show.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"id":7}"#, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = ClientBuilder::new(creds())
            .base_url(format!("{}/1.1/", server.uri()))
            .cache(CacheConfig::new(dir.path(), Duration::from_secs(600)))
            .build()
            .unwrap();

        let first = client.cached_request("users/show", &ParamList::new(), None).await.unwrap();
        let second = client.cached_request("users/show", &ParamList::new(), None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn stale_cache_is_served_when_the_refresh_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"id":7}"#, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = ClientBuilder::new(creds())
            .base_url(format!("{}/1.1/", server.uri()))
            .cache(CacheConfig::new(dir.path(), Duration::from_secs(600)))
            .build()
            .unwrap();

        let first = client.cached_request("users/show", &ParamList::new(), None).await.unwrap();

        server.reset().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_raw(r#"{"error":"down"}"#, "application/json"))
            .mount(&server)
            .await;

        // let the entry age past a tiny TTL so the refresh is attempted
        tokio::time::sleep(Duration::from_millis(50)).await;
        let stale = client
            .cached_request("users/show", &ParamList::new(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        assert_eq!(first, stale);
    }

    #[tokio::test]
    async fn error_propagates_when_no_cached_value_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_raw(r#"{"error":"down"}"#, "application/json"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = ClientBuilder::new(creds())
            .base_url(format!("{}/1.1/", server.uri()))
            .cache(CacheConfig::new(dir.path(), Duration::from_secs(600)))
            .build()
            .unwrap();

        let err = client.cached_request("users/show", &ParamList::new(), None).await.unwrap_err();
        assert_eq!(err.status(), 500);
    }
}
