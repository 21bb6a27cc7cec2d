use reqwest::header::HeaderValue;
use tokio::time::sleep;

use crate::retry::{RetryCause, RetryEvent, RetryPolicy};

/// Response header carrying the number of attempts a call needed.
///
/// Written here, read back by error classification in the client.
pub(crate) const RETRY_ATTEMPTS_HEADER: &str = "x-eco-retry-attempts";

/// Unread bodies up to this size are drained so the connection can be reused.
const MAX_BODY_SLURP_SIZE: u64 = 2 << 10;

/// The HTTP transport, optionally wrapped with the retry layer.
#[derive(Clone, Debug)]
pub(crate) enum Transport {
    Direct(reqwest::Client),
    Retrying {
        http: reqwest::Client,
        policy: RetryPolicy,
    },
}

impl Transport {
    pub(crate) fn new(http: reqwest::Client, policy: RetryPolicy) -> Self {
        if policy.max_retries == 0 {
            Self::Direct(http)
        } else {
            Self::Retrying { http, policy }
        }
    }

    pub(crate) async fn send(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, reqwest::Error> {
        match self {
            Self::Direct(http) => http.execute(request).await,
            Self::Retrying { http, policy } => send_with_retry(http, policy, request).await,
        }
    }
}

async fn send_with_retry(
    http: &reqwest::Client,
    policy: &RetryPolicy,
    request: reqwest::Request,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;

        // Streaming bodies cannot be replayed; such requests get one shot.
        let Some(this_try) = request.try_clone() else {
            return http.execute(request).await;
        };

        let outcome = http.execute(this_try).await;
        let cause = match &outcome {
            Ok(response) if policy.should_retry_status(response.status()) => {
                Some(RetryCause::Status(response.status()))
            }
            Err(err) if policy.should_retry_transport(err) => Some(RetryCause::Transport(err)),
            _ => None,
        };
        let Some(cause) = cause else {
            return outcome.map(|response| stamp_attempts(response, attempt));
        };

        if attempt > policy.max_retries {
            policy.log(RetryEvent::GivingUp {
                method: request.method(),
                url: request.url(),
                attempt,
                cause,
            });
            return outcome.map(|response| stamp_attempts(response, attempt));
        }

        let wait = policy.wait_for(attempt - 1, outcome.as_ref().ok());
        policy.log(RetryEvent::Retrying {
            method: request.method(),
            url: request.url(),
            attempt,
            wait,
            cause,
        });
        if let Ok(response) = outcome {
            release(response).await;
        }
        sleep(wait).await;
    }
}

/// Reads and discards a small body; larger ones are dropped unread.
pub(crate) async fn release(mut response: reqwest::Response) {
    if response
        .content_length()
        .is_some_and(|len| len > MAX_BODY_SLURP_SIZE)
    {
        return;
    }
    let mut read = 0u64;
    while read < MAX_BODY_SLURP_SIZE {
        match response.chunk().await {
            Ok(Some(chunk)) => read += chunk.len() as u64,
            _ => break,
        }
    }
}

fn stamp_attempts(mut response: reqwest::Response, attempt: u32) -> reqwest::Response {
    if attempt > 1 {
        response
            .headers_mut()
            .insert(RETRY_ATTEMPTS_HEADER, HeaderValue::from(attempt));
    }
    response
}
