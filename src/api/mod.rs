//! Report API: HTTP surface over the status and appointment reports.
//!
//! Every request opens its own database connection and computes the report
//! from scratch. Routes are nested under `/api/`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::report_api_router;
pub use server::serve;
pub use types::ApiContext;
