//! Recipe API library modules.
//!
//! The crate follows a ports-and-adapters layout: [`domain`] holds the model,
//! services and port traits; [`inbound`] exposes them over HTTP and
//! [`outbound`] implements the driven ports for PostgreSQL, memory and the
//! local filesystem.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
