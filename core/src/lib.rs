//! Typed client core for the Kibana Fleet API.
//!
//! # Overview
//! Every Fleet endpoint is a request type implementing [`Operation`]. A
//! single generic executor, [`FleetClient::execute`], validates the request,
//! resolves its path and query, applies per-call [`RequestOption`]s and
//! hands the result to a caller-supplied [`Transport`]. The response is
//! classified against the operation's success predicate into either an
//! [`ApiResponse`] or an [`ApiError::Status`] carrying an [`ErrorResponse`].
//!
//! # Design
//! - The core never performs network I/O (host-does-IO). Transports are
//!   plain trait objects; the integration tests drive one built on `ureq`.
//! - Instrumentation is an optional capability of the transport, so an
//!   uninstrumented transport costs nothing and needs no configuration.
//! - Endpoints are data: an [`Endpoint`] constant plus a few accessor
//!   methods. Adding an endpoint never adds control flow.
//! - Wire DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod instrumentation;
pub mod operation;
pub mod option;
pub mod query;
pub mod response;
pub mod transport;
pub mod types;

pub use client::{parse_response, FleetClient};
pub use config::ClientConfig;
pub use context::{CancelHandle, Context, ContextError};
pub use error::{ApiError, BoxError, ConfigError};
pub use http::{Body, HttpMethod, HttpRequest, HttpResponse};
pub use instrumentation::{Instrumentation, TracingInstrumentation};
pub use operation::{Endpoint, Operation, RequestBody, SuccessStatus};
pub use option::RequestOption;
pub use query::Query;
pub use response::{ApiResponse, ErrorPayload, ErrorResponse};
pub use transport::{Instrumented, Transport, TransportError};
