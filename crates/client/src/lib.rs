//! dispatch-client: talks to the incident backend.
//!
//! - [`HttpClient`] -- [`IncidentApi`] over REST with bearer auth
//! - [`QueryClient`] -- cached reads, invalidation after mutations
//! - [`spawn_poller`] -- interval refresh published on a watch channel
//! - [`ClientConfig`] -- `dispatch.toml` plus `DISPATCH_*` overrides

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod poll;

pub use api::{BulkOutcome, IncidentApi, Session};
pub use cache::{ActionInput, QueryCache, QueryClient, QueryKey, StaleTimes};
pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpClient;
pub use poll::{spawn_poller, PollHandle, Polled};
