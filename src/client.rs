use std::{fmt, sync::Arc, time::Duration};

use reqwest::{
    header::{self, HeaderValue},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    error::TransportError,
    options::ClientConfig,
    request::{attempts_from, Destination, OutgoingRequest, Response},
    transport::{release, Transport},
    ClientOption, Clusters, Error, Pools, ResponseError, Result, RetryPolicy, Roles, Users,
};

const MEDIA_TYPE: &str = "application/json";

/// Async client for the ECO managed Kubernetes API.
///
/// Cheap to clone; clones share configuration and connection pool.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: Transport,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Client {
    /// Creates a client from an ordered list of options.
    ///
    /// `http` defaults to a fresh `reqwest::Client`. Any timeout configured on
    /// it keeps applying once the retry layer is installed.
    pub fn new(
        http: Option<reqwest::Client>,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self> {
        let mut config = ClientConfig::default();
        ClientOption::Retry(RetryPolicy::default()).apply(&mut config)?;
        for option in options {
            option.apply(&mut config)?;
        }

        let http = http.unwrap_or_default();
        let transport = Transport::new(http, config.retry.clone());
        Ok(Self {
            inner: Arc::new(ClientInner { config, transport }),
        })
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn clusters(&self) -> Clusters<'_> {
        Clusters::new(self)
    }

    pub fn pools(&self) -> Pools<'_> {
        Pools::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn roles(&self) -> Roles<'_> {
        Roles::new(self)
    }

    /// Builds a request for `path`, resolved against the base URL.
    ///
    /// `body` is ignored for GET, HEAD and OPTIONS. For other methods a
    /// present body is sent as JSON.
    pub fn build_request<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<OutgoingRequest>
    where
        B: Serialize + ?Sized,
    {
        let config = &self.inner.config;
        let base = config
            .base_url
            .as_ref()
            .ok_or_else(|| Error::Config("base URL is not set".to_owned()))?;
        let url = join_url(base, path)?;

        let mut headers = header::HeaderMap::new();
        let mut payload = None;
        if !is_safe(&method) {
            if let Some(body) = body {
                let bytes = serde_json::to_vec(body).map_err(|source| Error::Encode {
                    method: method.clone(),
                    url: url.clone(),
                    source,
                })?;
                payload = Some(bytes);
            }
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
        }

        for (name, value) in &config.headers {
            headers.insert(name.clone(), value.clone());
        }
        headers.insert(header::ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        let user_agent = HeaderValue::try_from(config.user_agent.as_str())
            .map_err(|err| Error::Config(format!("invalid user agent: {err}")))?;
        headers.insert(header::USER_AGENT, user_agent);

        Ok(OutgoingRequest {
            method,
            url,
            headers,
            body: payload,
            timeout: config.timeout,
            deadline: None,
        })
    }

    /// Sends the request and stores a successful body in `destination`.
    ///
    /// Statuses outside 200–299 come back as [`Error::Remote`]. A 204, or
    /// [`Destination::Discard`], leaves the body undecoded. A deadline set on
    /// the request covers the body read as well as the round trip.
    pub async fn execute<T>(
        &self,
        request: OutgoingRequest,
        destination: Destination<'_, T>,
    ) -> Result<Response>
    where
        T: DeserializeOwned,
    {
        let Some(limit) = request.deadline else {
            return self.round_trip(request, destination).await;
        };
        let method = request.method.clone();
        let url = request.url.clone();
        match tokio::time::timeout(limit, self.round_trip(request, destination)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Transport {
                method,
                url,
                source: TransportError::DeadlineExceeded(limit),
            }),
        }
    }

    async fn round_trip<T>(
        &self,
        request: OutgoingRequest,
        destination: Destination<'_, T>,
    ) -> Result<Response>
    where
        T: DeserializeOwned,
    {
        let method = request.method.clone();
        let url = request.url.clone();

        let mut response = self
            .inner
            .transport
            .send(request.into_http())
            .await
            .map_err(|err| Error::Transport {
                method: method.clone(),
                url: url.clone(),
                source: err.into(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(check_response(method, url, response).await);
        }

        let meta = Response::new(status, response.headers().clone());
        if status == StatusCode::NO_CONTENT {
            release(response).await;
            return Ok(meta);
        }

        match destination {
            Destination::Discard => release(response).await,
            Destination::WriteRaw(sink) => loop {
                let chunk = response.chunk().await.map_err(|err| Error::Transport {
                    method: method.clone(),
                    url: url.clone(),
                    source: err.into(),
                })?;
                let Some(chunk) = chunk else { break };
                sink.write_all(&chunk).map_err(|source| Error::Write {
                    method: method.clone(),
                    url: url.clone(),
                    source,
                })?;
            },
            Destination::DecodeInto(target) => {
                let body = response.bytes().await.map_err(|err| Error::Transport {
                    method: method.clone(),
                    url: url.clone(),
                    source: err.into(),
                })?;
                *target = serde_json::from_slice(&body).map_err(|source| Error::Decode {
                    method,
                    url,
                    source,
                })?;
            }
        }

        Ok(meta)
    }

    /// Builds and executes a request, decoding the JSON body into `T`.
    pub(crate) async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let request = self.build_request(method, path, body)?;
        let mut value = T::default();
        self.execute(request, Destination::DecodeInto(&mut value)).await?;
        Ok(value)
    }

    /// Builds and executes a request, ignoring any body in the response.
    pub(crate) async fn call_discard<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let request = self.build_request(method, path, body)?;
        self.execute::<()>(request, Destination::Discard).await?;
        Ok(())
    }

    /// `v1/cluster/{project}/{region}`, the root of every scoped resource path.
    pub(crate) fn scope_path(&self) -> String {
        let config = &self.inner.config;
        format!("v1/cluster/{}/{}", config.project_id, config.region_id)
    }
}

/// Collects options and applies them, in order, at [`ClientBuilder::build`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    http: Option<reqwest::Client>,
    options: Vec<ClientOption>,
}

impl ClientBuilder {
    /// Starts a builder from environment variables.
    ///
    /// Reads:
    /// - `ECO_API_URL` — base URL of the API (required)
    /// - `ECO_API_KEY` — API key, `apikey ` prefix optional (required)
    /// - `ECO_PROJECT_ID`, `ECO_REGION_ID` — default scope (optional)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use eco_client::ClientBuilder;
    ///
    /// let client = ClientBuilder::from_env()?.build()?;
    /// # Ok::<(), eco_client::Error>(())
    /// ```
    pub fn from_env() -> Result<Self> {
        let url = required_env("ECO_API_URL")?;
        let key = required_env("ECO_API_KEY")?;
        let mut builder = Self::default().base_url(url).api_key(key);
        if let Ok(project) = std::env::var("ECO_PROJECT_ID") {
            builder = builder.project_id(project);
        }
        if let Ok(region) = std::env::var("ECO_REGION_ID") {
            builder = builder.region_id(region);
        }
        Ok(builder)
    }

    /// Uses the given HTTP client as the base transport.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn option(mut self, option: ClientOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn base_url(self, url: impl Into<String>) -> Self {
        self.option(ClientOption::BaseUrl(url.into()))
    }

    pub fn project_id(self, id: impl Into<String>) -> Self {
        self.option(ClientOption::ProjectId(id.into()))
    }

    pub fn region_id(self, id: impl Into<String>) -> Self {
        self.option(ClientOption::RegionId(id.into()))
    }

    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.option(ClientOption::ApiKey(key.into()))
    }

    pub fn user_agent(self, product: impl Into<String>) -> Self {
        self.option(ClientOption::UserAgent(product.into()))
    }

    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.option(ClientOption::Headers(vec![(name.into(), value.into())]))
    }

    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = headers
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        self.option(ClientOption::Headers(pairs))
    }

    pub fn retry(self, policy: RetryPolicy) -> Self {
        self.option(ClientOption::Retry(policy))
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.option(ClientOption::Timeout(timeout))
    }

    pub fn build(self) -> Result<Client> {
        Client::new(self.http, self.options)
    }
}

fn required_env(name: &str) -> Result<String> {
    let value = std::env::var(name)
        .map_err(|_| Error::Config(format!("missing {name} environment variable")))?;
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} is set but empty")));
    }
    Ok(value)
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Appends `path` to the base URL with exactly one `/` between them.
fn join_url(base: &reqwest::Url, path: &str) -> Result<reqwest::Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    reqwest::Url::parse(&joined)
        .map_err(|err| Error::Config(format!("invalid request URL '{joined}': {err}")))
}

/// Turns a non-2xx response into [`Error::Remote`].
///
/// A body that cannot be read means no complete response arrived, which is
/// reported as a transport error.
async fn check_response(method: Method, url: reqwest::Url, response: reqwest::Response) -> Error {
    let status = response.status();
    let attempts = attempts_from(response.headers());
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(err) => {
            return Error::Transport {
                method,
                url,
                source: err.into(),
            }
        }
    };

    ResponseError {
        method,
        url,
        status,
        message: error_message(&body),
        attempts,
    }
    .into()
}

/// `message` of a JSON error object, or the raw body when it is not one.
fn error_message(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => String::new(),
        Ok(Value::Object(fields)) => match fields.get("message") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(message)) => message.clone(),
            Some(_) => String::from_utf8_lossy(body).into_owned(),
        },
        _ => String::from_utf8_lossy(body).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client(base: &str) -> Client {
        Client::builder()
            .base_url(base)
            .api_key("apikey token-1")
            .build()
            .expect("client must build")
    }

    #[test]
    fn joins_base_and_path_with_single_separator() {
        for base in ["https://api.example.com/k8s", "https://api.example.com/k8s/"] {
            for path in ["v1/cluster/p/r/list", "/v1/cluster/p/r/list"] {
                let request = client(base)
                    .build_request::<()>(Method::GET, path, None)
                    .unwrap();
                assert_eq!(
                    request.url().as_str(),
                    "https://api.example.com/k8s/v1/cluster/p/r/list",
                    "base {base:?} path {path:?}"
                );
            }
        }
    }

    #[test]
    fn joins_root_base_url() {
        let request = client("https://api.example.com")
            .build_request::<()>(Method::GET, "/version", None)
            .unwrap();
        assert_eq!(request.url().as_str(), "https://api.example.com/version");
    }

    #[test]
    fn missing_base_url_is_a_config_error() {
        let client = Client::builder().build().unwrap();
        let err = client
            .build_request::<()>(Method::GET, "version", None)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn safe_methods_send_no_body() {
        let body = json!({"name": "ignored"});
        let request = client("https://api.example.com")
            .build_request(Method::GET, "version", Some(&body))
            .unwrap();
        assert!(request.body().is_none());
        assert!(request.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn mutating_methods_send_json() {
        let body = json!({"name": "prod"});
        let request = client("https://api.example.com")
            .build_request(Method::POST, "v1/cluster/p/r", Some(&body))
            .unwrap();
        let sent: serde_json::Value = serde_json::from_slice(request.body().unwrap()).unwrap();
        assert_eq!(sent, body);
        assert_eq!(request.headers()[header::CONTENT_TYPE], MEDIA_TYPE);
    }

    #[test]
    fn wire_headers_are_set() {
        let request = client("https://api.example.com")
            .build_request::<()>(Method::DELETE, "v1/cluster/p/r/1", None)
            .unwrap();
        let headers = request.headers();
        assert_eq!(headers[header::AUTHORIZATION], "apikey token-1");
        assert_eq!(headers[header::ACCEPT], MEDIA_TYPE);
        assert_eq!(headers[header::USER_AGENT], "eco-client");
        assert_eq!(headers[header::CONTENT_TYPE], MEDIA_TYPE);
        assert!(request.body().is_none());
    }

    #[test]
    fn custom_headers_cannot_override_accept_or_user_agent() {
        let client = Client::builder()
            .base_url("https://api.example.com")
            .user_agent("ops-bot")
            .headers([("Accept", "text/plain"), ("User-Agent", "spoof"), ("X-Team", "infra")])
            .build()
            .unwrap();
        let request = client.build_request::<()>(Method::GET, "version", None).unwrap();
        let headers = request.headers();
        assert_eq!(headers[header::ACCEPT], MEDIA_TYPE);
        assert_eq!(headers[header::USER_AGENT], "ops-bot eco-client");
        assert_eq!(headers["x-team"], "infra");
    }

    #[test]
    fn query_pairs_are_encoded() {
        let request = client("https://api.example.com")
            .build_request::<()>(Method::GET, "v1/cluster/p/r/1/kube/admin", None)
            .unwrap()
            .with_query([("ttl", "1h 30m")]);
        assert_eq!(request.url().query(), Some("ttl=1h+30m"));
    }

    #[test]
    fn construction_fails_on_first_invalid_option() {
        let err = Client::builder()
            .base_url("https://ok.example.com")
            .base_url("::broken::")
            .api_key("k")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn default_retry_policy_is_applied_and_overridable() {
        let client = Client::builder().build().unwrap();
        assert_eq!(client.config().retry().max_retries, 3);

        let client = Client::builder().retry(RetryPolicy::disabled()).build().unwrap();
        assert_eq!(client.config().retry().max_retries, 0);
    }

    #[test]
    fn debug_redacts_api_key() {
        let debug = format!("{:?}", client("https://api.example.com"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("token-1"));
    }

    #[test]
    fn error_message_reads_message_field() {
        assert_eq!(error_message(br#"{"message":"cluster not found"}"#), "cluster not found");
        assert_eq!(error_message(br#"{"message":"x","code":12}"#), "x");
    }

    #[test]
    fn error_message_is_empty_for_objects_without_message() {
        assert_eq!(error_message(b""), "");
        assert_eq!(error_message(br#"{"error":"bad"}"#), "");
        assert_eq!(error_message(br#"{"message":null}"#), "");
        assert_eq!(error_message(b"null"), "");
    }

    #[test]
    fn error_message_falls_back_to_raw_text() {
        assert_eq!(error_message(br#"["oops"]"#), r#"["oops"]"#);
        assert_eq!(error_message(br#"{"message":42}"#), r#"{"message":42}"#);
        assert_eq!(error_message(b"upstream timed out"), "upstream timed out");
        assert_eq!(error_message(b"\"quoted\""), "\"quoted\"");
    }

    #[test]
    fn scope_path_uses_project_and_region() {
        let client = Client::builder()
            .project_id("42")
            .region_id("7")
            .build()
            .unwrap();
        assert_eq!(client.scope_path(), "v1/cluster/42/7");
    }
}
