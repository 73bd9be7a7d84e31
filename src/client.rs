//! One HTTP exchange: resolve, sign, transmit, classify.

use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use log::trace;
use reqwest::Client as HttpClient;
use serde_json::Value;
use url::Url;

use crate::cache::CacheConfig;
use crate::codec::{self, ParamList};
use crate::error::{Error, Result};
use crate::secrets::Credentials;
use crate::signer::Signer;

/// Base URL the legacy multi-format API resources resolve against.
pub const API_URL: &str = "https://api.twitter.com/1.1/";
/// Media uploads live on a different host and go through the same
/// signing path as a fully-qualified resource.
pub const UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Signed client for the platform REST API.
///
/// Holds immutable credentials and a reqwest client; individual calls
/// share no other state, so concurrent requests through one `Client`
/// are safe. Retries are the caller's responsibility.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) http: HttpClient,
    pub(crate) credentials: Credentials,
    pub(crate) base_url: String,
    pub(crate) cache: Option<CacheConfig>,
}

impl Client {
    /// A client with the default base URL, timeout and no cache.
    pub fn new(credentials: Credentials) -> Result<Self> {
        ClientBuilder::new(credentials).build()
    }

    pub fn builder(credentials: Credentials) -> ClientBuilder {
        ClientBuilder::new(credentials)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Processes one signed HTTP exchange.
    ///
    /// A `resource` without `://` is resolved against the base API URL,
    /// with a missing extension defaulted to `.json`. Business
    /// parameters are merged into the signed parameter set; oauth
    /// parameters travel in the `Authorization` header, business
    /// parameters in the query string (GET/DELETE) or the form body.
    pub async fn request(&self, resource: &str, method: Method, data: &ParamList) -> Result<Value> {
        let (url, business) = self.resolve(resource, data)?;
        let auth = self.authorization_header(method.clone(), url.clone(), &business)?;
        let query = codec::build_query(&business);

        let builder = if wants_body(&method) {
            self.http
                .request(method, url)
                .header(AUTHORIZATION, auth)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(query)
        } else {
            let target = if query.is_empty() {
                url.to_string()
            } else {
                format!("{}?{}", url, query)
            };
            self.http.request(method, target).header(AUTHORIZATION, auth)
        };

        let response = builder.send().await?;
        classify(response).await
    }

    /// Like [`request`](Self::request), but transmits a multipart body
    /// with the given `(name, path)` file attachments.
    ///
    /// Each path is validated up front; an unreadable file is a local
    /// error that never reaches the network. The multipart payload is
    /// excluded from the signature, so only parameters carried by the
    /// resource URL itself are signed, and they stay on the transmitted
    /// URL.
    #[cfg(feature = "multipart")]
    pub async fn request_with_files(
        &self,
        resource: &str,
        method: Method,
        data: &ParamList,
        files: &[(&str, &std::path::Path)],
    ) -> Result<Value> {
        use reqwest::multipart::{Form, Part};

        for (_, path) in files {
            if !path.is_file() {
                return Err(Error::FileNotFound(path.to_path_buf()));
            }
        }

        let (url, url_params) = self.resolve(resource, &ParamList::new())?;
        let auth = self.authorization_header(method.clone(), url.clone(), &url_params)?;
        let query = codec::build_query(&url_params);
        let target = if query.is_empty() {
            url.to_string()
        } else {
            format!("{}?{}", url, query)
        };

        let mut form = Form::new();
        for (name, values) in data.iter() {
            for value in values {
                form = form.text(name.to_string(), value.clone());
            }
        }
        for (name, path) in files {
            let contents = std::fs::read(path).map_err(|_| Error::FileNotFound(path.to_path_buf()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            form = form.part(name.to_string(), Part::bytes(contents).file_name(file_name));
        }

        let response = self
            .http
            .request(method, target)
            .header(AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await?;
        classify(response).await
    }

    /// Resolves the resource and splits off the business parameter set
    /// (caller data plus any query already on the URL).
    fn resolve(&self, resource: &str, data: &ParamList) -> Result<(Url, ParamList)> {
        let absolute = if resource.contains("://") {
            resource.to_string()
        } else {
            let mut name = resource.to_string();
            if !name.contains('.') {
                name.push_str(".json");
            }
            format!("{}{}", self.base_url, name)
        };
        let mut url = Url::parse(&absolute)?;
        let mut business = match url.query() {
            Some(query) => codec::parse_query(query),
            None => ParamList::new(),
        };
        business.extend_from(data);
        url.set_query(None);
        trace!("resolved resource {} -> {}", resource, url);
        Ok((url, business))
    }

    fn authorization_header(&self, method: Method, url: Url, business: &ParamList) -> Result<String> {
        let signer = Signer::new(&self.credentials);
        let request = signer.signed_request(method, url, business)?;
        Ok(request.to_authorization_header(None)?)
    }
}

fn wants_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Maps one HTTP response to a decoded payload or a typed error.
async fn classify(response: reqwest::Response) -> Result<Value> {
    let status = response.status().as_u16();
    if status == 204 {
        return Ok(Value::Bool(true));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let body = response.text().await?;

    if status >= 400 {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|payload| extract_error_message(&payload))
            .unwrap_or_else(|| format!("Server error #{}", status));
        return Err(Error::Api { status, message });
    }

    if body.is_empty() {
        return Ok(Value::Null);
    }
    if content_type.contains("json") {
        return serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()));
    }
    if content_type.contains(FORM_CONTENT_TYPE) || content_type.starts_with("text/html") {
        // best-effort key=value parse, e.g. oauth token endpoints
        return Ok(params_to_value(&codec::parse_query(&body)));
    }
    Err(Error::Decode(format!(
        "unrecognized content type `{}`",
        content_type
    )))
}

/// Tries the error payload shapes the platform is known to produce, in
/// order: `{detail}`, `{errors: [{message}]}`, `{error}`.
fn extract_error_message(payload: &Value) -> Option<String> {
    if let Some(detail) = payload.get("detail").and_then(Value::as_str) {
        return Some(detail.to_string());
    }
    if let Some(message) = payload
        .get("errors")
        .and_then(|errors| errors.get(0))
        .and_then(|first| first.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }
    payload
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn params_to_value(params: &ParamList) -> Value {
    let mut object = serde_json::Map::new();
    for (name, values) in params.iter() {
        let value = match values {
            [single] => Value::String(single.clone()),
            many => Value::Array(many.iter().cloned().map(Value::String).collect()),
        };
        let _ = object.insert(name.to_string(), value);
    }
    Value::Object(object)
}

/// Configures a [`Client`]: base URL, bounded request timeout (passed
/// through to the transport) and the optional response cache.
#[derive(Debug)]
pub struct ClientBuilder {
    credentials: Credentials,
    base_url: String,
    timeout: Duration,
    cache: Option<CacheConfig>,
}

impl ClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        ClientBuilder {
            credentials,
            base_url: API_URL.to_string(),
            timeout: Duration::from_secs(20),
            cache: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Client> {
        let http = HttpClient::builder().timeout(self.timeout).build()?;
        Ok(Client {
            http,
            credentials: self.credentials,
            base_url: self.base_url,
            cache: self.cache,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> Client {
        Client::builder(Credentials::new("CK", "CS").token("TK", "TS"))
            .base_url(format!("{}/1.1/", server.uri()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn get_sends_query_and_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/users/show.json"))
            .and(query_param("screen_name", "rustlang"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"id":12}"#, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let data: ParamList = [("screen_name", "rustlang")].into_iter().collect();
        let payload = client.request("users/show", Method::GET, &data).await.unwrap();
        assert_eq!(payload.get("id").and_then(Value::as_u64), Some(12));
    }

    #[tokio::test]
    async fn missing_extension_defaults_to_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/statuses/home_timeline.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let payload = client
            .request("statuses/home_timeline", Method::GET, &ParamList::new())
            .await
            .unwrap();
        assert_eq!(payload, Value::Array(vec![]));
    }

    #[tokio::test]
    async fn no_content_becomes_boolean_true() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let payload = client
            .request("friendships/create", Method::POST, &ParamList::new())
            .await
            .unwrap();
        assert_eq!(payload, Value::Bool(true));
    }

    #[tokio::test]
    async fn api_error_message_from_errors_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_raw(
                r#"{"errors":[{"message":"Invalid or expired token."}]}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .request("account/verify_credentials", Method::GET, &ParamList::new())
            .await
            .unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid or expired token.");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn api_error_prefers_detail_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_raw(
                r#"{"detail":"Forbidden.","error":"nope"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.request("tweets", Method::GET, &ParamList::new()).await.unwrap_err();
        assert_eq!(err.status(), 403);
        assert!(err.to_string().contains("Forbidden."));
    }

    #[tokio::test]
    async fn api_error_without_recognizable_payload_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_raw("overloaded", "text/plain"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.request("anything", Method::GET, &ParamList::new()).await.unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "Server error #503");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn form_encoded_success_parses_as_pairs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "oauth_token=abc&oauth_token_secret=def",
                "application/x-www-form-urlencoded",
            ))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let payload = client
            .request("oauth/request_token", Method::POST, &ParamList::new())
            .await
            .unwrap();
        assert_eq!(payload.get("oauth_token").and_then(Value::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn unrecognized_content_type_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(&b"\x89PNG"[..], "image/png"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.request("whatever", Method::GET, &ParamList::new()).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn transport_errors_carry_status_zero() {
        let client = Client::builder(Credentials::new("CK", "CS"))
            .base_url("http://127.0.0.1:1/1.1/")
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        let err = client.request("users/show", Method::GET, &ParamList::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(err.status(), 0);
    }

    #[tokio::test]
    async fn https_is_rejected_at_the_socket_not_the_scheme() {
        // an unroutable https target must fail on connect; a transport
        // without a TLS backend refuses the scheme before connecting
        let client = Client::builder(Credentials::new("CK", "CS"))
            .base_url("https://127.0.0.1:1/1.1/")
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        let err = client.request("users/show", Method::GET, &ParamList::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(!err.to_string().contains("scheme is not http"));
    }

    #[cfg(feature = "multipart")]
    #[tokio::test]
    async fn multipart_keeps_and_signs_the_url_query() {
        use std::io::Write;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/media/upload.json"))
            .and(query_param("chunked", "true"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"media_id_string":"1"}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();

        let client = client_for(&server).await;
        client
            .request_with_files(
                &format!("{}/media/upload.json?chunked=true", server.uri()),
                Method::POST,
                &ParamList::new(),
                &[("media", file.path())],
            )
            .await
            .unwrap();
    }

    #[cfg(feature = "multipart")]
    #[tokio::test]
    async fn missing_upload_file_fails_before_any_network_call() {
        let client = Client::builder(Credentials::new("CK", "CS"))
            .base_url("http://127.0.0.1:1/1.1/")
            .build()
            .unwrap();
        let missing = std::path::Path::new("/definitely/not/here.png");
        let err = client
            .request_with_files("media/upload", Method::POST, &ParamList::new(), &[("media", missing)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn extract_error_message_order() {
        let detail: Value = serde_json::from_str(r#"{"detail":"d","error":"e"}"#).unwrap();
        assert_eq!(extract_error_message(&detail).unwrap(), "d");
        let list: Value =
            serde_json::from_str(r#"{"errors":[{"message":"first"},{"message":"second"}]}"#).unwrap();
        assert_eq!(extract_error_message(&list).unwrap(), "first");
        let flat: Value = serde_json::from_str(r#"{"error":"flat"}"#).unwrap();
        assert_eq!(extract_error_message(&flat).unwrap(), "flat");
        let none: Value = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert_eq!(extract_error_message(&none), None);
    }
}
