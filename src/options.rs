use std::{fmt, time::Duration};

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION},
    Url,
};

use crate::{Error, Result, RetryPolicy};

pub(crate) const DEFAULT_USER_AGENT: &str = "eco-client";

/// Settings resolved from the options passed at construction.
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) base_url: Option<Url>,
    pub(crate) project_id: String,
    pub(crate) region_id: String,
    pub(crate) api_key: Option<String>,
    pub(crate) user_agent: String,
    pub(crate) headers: HeaderMap,
    pub(crate) retry: RetryPolicy,
    pub(crate) timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Custom headers, including `Authorization` once an API key is set.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            project_id: String::new(),
            region_id: String::new(),
            api_key: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: HeaderMap::new(),
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<_> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let value = if name == AUTHORIZATION {
                    "<redacted>"
                } else {
                    value.to_str().unwrap_or("<binary>")
                };
                (name.as_str(), value)
            })
            .collect();
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("project_id", &self.project_id)
            .field("region_id", &self.region_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("headers", &headers)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// One configuration step. Steps are applied in order; the first failing
/// step aborts construction.
#[derive(Clone, Debug)]
pub enum ClientOption {
    /// Base URL every relative request path is resolved against.
    BaseUrl(String),
    ProjectId(String),
    RegionId(String),
    /// API key, with or without the `apikey ` prefix.
    ApiKey(String),
    /// Product token prefixed to the default user agent.
    UserAgent(String),
    /// Extra request headers, merged into the existing set.
    Headers(Vec<(String, String)>),
    Retry(RetryPolicy),
    /// Timeout applied to every attempt of every request.
    Timeout(Duration),
}

impl ClientOption {
    pub(crate) fn apply(self, config: &mut ClientConfig) -> Result<()> {
        match self {
            Self::BaseUrl(raw) => {
                let url = Url::parse(raw.trim()).map_err(|err| {
                    Error::Config(format!("invalid base URL '{raw}': {err}"))
                })?;
                if url.cannot_be_a_base() {
                    return Err(Error::Config(format!(
                        "base URL '{raw}' cannot be used as a base"
                    )));
                }
                config.base_url = Some(url);
            }
            Self::ProjectId(id) => config.project_id = id,
            Self::RegionId(id) => config.region_id = id,
            Self::ApiKey(key) => {
                let key = strip_apikey_prefix(&key).to_owned();
                let value = HeaderValue::try_from(format!("apikey {key}"))
                    .map_err(|err| Error::Config(format!("invalid API key: {err}")))?;
                config.headers.insert(AUTHORIZATION, value);
                config.api_key = Some(key);
            }
            Self::UserAgent(product) => {
                config.user_agent = format!("{product} {}", config.user_agent);
            }
            Self::Headers(pairs) => {
                for (name, value) in pairs {
                    let header_name = HeaderName::try_from(name.as_str()).map_err(|err| {
                        Error::Config(format!("invalid header name '{name}': {err}"))
                    })?;
                    let header_value = HeaderValue::try_from(value).map_err(|err| {
                        Error::Config(format!("invalid value for header '{name}': {err}"))
                    })?;
                    config.headers.insert(header_name, header_value);
                }
            }
            Self::Retry(policy) => {
                policy.validate().map_err(Error::Config)?;
                config.retry = policy;
            }
            Self::Timeout(timeout) => config.timeout = Some(timeout),
        }
        Ok(())
    }
}

/// Strips a case-insensitive `apikey ` prefix.
fn strip_apikey_prefix(key: &str) -> &str {
    match key.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("apikey") => token,
        _ => key,
    }
}
