use std::{fmt, sync::Arc, time::Duration};

use reqwest::{header, Method, StatusCode, Url};

pub(crate) const DEFAULT_MAX_RETRIES: u32 = 3;
pub(crate) const DEFAULT_MIN_WAIT: Duration = Duration::from_secs(1);
pub(crate) const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(30);

/// Delay schedule between retry attempts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Backoff {
    /// `min_wait * 2^n`, capped at `max_wait`.
    #[default]
    Exponential,
    /// `min_wait * (n + 1)`, capped at `max_wait`.
    Linear,
}

/// Configures the retry layer installed around the HTTP transport.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt. `0` disables the retry layer.
    pub max_retries: u32,
    /// Lower bound of the wait between attempts.
    pub min_wait: Duration,
    /// Upper bound of the wait between attempts.
    pub max_wait: Duration,
    pub backoff: Backoff,
    /// Optional sink for attempt-level events.
    pub logger: Option<Arc<dyn RetryLogger>>,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_wait(mut self, min_wait: Duration, max_wait: Duration) -> Self {
        self.min_wait = min_wait;
        self.max_wait = max_wait;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn RetryLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.max_retries > 0 && self.min_wait > self.max_wait {
            return Err(format!(
                "retry min wait {:?} exceeds max wait {:?}",
                self.min_wait, self.max_wait
            ));
        }
        Ok(())
    }

    pub(crate) fn should_retry_status(&self, status: StatusCode) -> bool {
        // 501 will not change on replay.
        status == StatusCode::TOO_MANY_REQUESTS
            || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
    }

    pub(crate) fn should_retry_transport(&self, err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
    }

    /// Wait before retry number `retry` (zero-based).
    ///
    /// A `Retry-After` header given in seconds on 429/503 replaces the
    /// computed delay, still bounded by `max_wait`.
    pub(crate) fn wait_for(&self, retry: u32, response: Option<&reqwest::Response>) -> Duration {
        if let Some(wait) = response.and_then(retry_after) {
            return wait.min(self.max_wait);
        }

        let wait = match self.backoff {
            Backoff::Exponential => {
                let exp = retry.min(16);
                self.min_wait.saturating_mul(1u32 << exp)
            }
            Backoff::Linear => self.min_wait.saturating_mul(retry.saturating_add(1)),
        };
        wait.clamp(self.min_wait, self.max_wait.max(self.min_wait))
    }

    pub(crate) fn log(&self, event: RetryEvent<'_>) {
        if let Some(logger) = &self.logger {
            logger.log(&event);
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_wait: DEFAULT_MIN_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
            backoff: Backoff::Exponential,
            logger: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("min_wait", &self.min_wait)
            .field("max_wait", &self.max_wait)
            .field("backoff", &self.backoff)
            .field("logger", &self.logger.as_ref().map(|_| "<sink>"))
            .finish()
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    if !matches!(
        response.status(),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
    ) {
        return None;
    }
    let seconds = response
        .headers()
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_secs(seconds))
}

/// What made an attempt fail.
#[derive(Debug)]
pub enum RetryCause<'a> {
    Status(StatusCode),
    Transport(&'a reqwest::Error),
}

impl fmt::Display for RetryCause<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "status {status}"),
            Self::Transport(err) => write!(f, "{err}"),
        }
    }
}

/// Attempt-level event handed to a [`RetryLogger`].
#[derive(Debug)]
pub enum RetryEvent<'a> {
    /// Attempt `attempt` failed and another one is scheduled after `wait`.
    Retrying {
        method: &'a Method,
        url: &'a Url,
        attempt: u32,
        wait: Duration,
        cause: RetryCause<'a>,
    },
    /// Attempt `attempt` failed and the retry budget is spent.
    GivingUp {
        method: &'a Method,
        url: &'a Url,
        attempt: u32,
        cause: RetryCause<'a>,
    },
}

/// Sink for retry events.
///
/// The client never inspects what the sink does with the event.
pub trait RetryLogger: Send + Sync {
    fn log(&self, event: &RetryEvent<'_>);
}

/// Forwards retry events to `tracing`.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingRetryLogger;

#[cfg(feature = "tracing")]
impl RetryLogger for TracingRetryLogger {
    fn log(&self, event: &RetryEvent<'_>) {
        match event {
            RetryEvent::Retrying {
                method,
                url,
                attempt,
                wait,
                cause,
            } => tracing::debug!(
                %method,
                %url,
                attempt,
                wait_ms = wait.as_millis() as u64,
                %cause,
                "retrying request"
            ),
            RetryEvent::GivingUp {
                method,
                url,
                attempt,
                cause,
            } => tracing::warn!(%method, %url, attempt, %cause, "giving up on request"),
        }
    }
}
