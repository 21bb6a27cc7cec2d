use std::{io::Write, time::Duration};

use reqwest::{header::HeaderMap, Method, StatusCode, Url};

use crate::transport::RETRY_ATTEMPTS_HEADER;

/// A fully formed request, ready for [`Client::execute`](crate::Client::execute).
#[derive(Clone, Debug)]
pub struct OutgoingRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) deadline: Option<Duration>,
}

impl OutgoingRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// JSON body, absent for safe methods.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Replaces the query string with the given pairs.
    pub fn with_query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.url.query_pairs_mut().clear().extend_pairs(pairs);
        self
    }

    /// Bounds the whole call, retries and backoff waits included.
    ///
    /// Expiry surfaces as a transport error.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub(crate) fn into_http(self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method, self.url);
        *request.headers_mut() = self.headers;
        *request.timeout_mut() = self.timeout;
        if let Some(body) = self.body {
            *request.body_mut() = Some(body.into());
        }
        request
    }
}

/// Where [`Client::execute`](crate::Client::execute) puts a successful body.
pub enum Destination<'a, T = ()> {
    /// Decode the JSON body into the target.
    DecodeInto(&'a mut T),
    /// Copy the raw body, unmodified, into the sink.
    WriteRaw(&'a mut (dyn Write + Send)),
    /// Release the body without looking at it.
    Discard,
}

/// Status and headers of a successful call.
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
}

impl Response {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Attempts made by the retry layer, present only when it retried.
    pub fn attempts(&self) -> Option<u32> {
        attempts_from(&self.headers)
    }
}

pub(crate) fn attempts_from(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(RETRY_ATTEMPTS_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
