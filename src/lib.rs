//! `eco-client` is an async HTTP client for the ECO managed Kubernetes API.
//!
//! Every call goes through one pipeline:
//! [`Client::build_request`] resolves the path and sets the wire headers,
//! [`Client::execute`] sends it through the (optionally retrying) transport,
//! decodes the body and normalizes failures into [`Error`].
//!
//! Resource services sit on top of it:
//! - [`Client::clusters`]
//! - [`Client::pools`]
//! - [`Client::users`]
//! - [`Client::roles`]

mod client;
mod clusters;
mod error;
mod options;
mod pools;
mod request;
mod retry;
mod roles;
mod transport;
mod types;
mod users;

pub use client::{Client, ClientBuilder};
pub use clusters::Clusters;
pub use error::{Error, ResponseError, TransportError};
pub use options::{ClientConfig, ClientOption};
pub use pools::Pools;
pub use request::{Destination, OutgoingRequest, Response};
#[cfg(feature = "tracing")]
pub use retry::TracingRetryLogger;
pub use retry::{Backoff, RetryCause, RetryEvent, RetryLogger, RetryPolicy};
pub use roles::Roles;
pub use types::{Cluster, ClusterOpt, Pool, PoolOpt, ResourceId, Role, UserConfig, UserOpt};
pub use users::Users;

/// Re-exported so callers can name methods and statuses without depending on `reqwest`.
pub use reqwest::{Method, StatusCode};

/// Name of the response header that reports how many attempts a call needed.
pub const RETRY_ATTEMPTS_HEADER: &str = transport::RETRY_ATTEMPTS_HEADER;

pub type Result<T> = std::result::Result<T, Error>;
