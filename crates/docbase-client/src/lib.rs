//! DocBase document-store client.
//!
//! Wraps the DocBase REST API behind typed convenience methods: CRUD,
//! search, aggregation, change history, binary file storage and document
//! reference resolution. Heterogeneous HTTP outcomes (success payloads,
//! validation failures, network failures, malformed JSON) normalize into
//! one [`Error`] taxonomy.
//!
//! # Example
//!
//! ```no_run
//! use docbase_client::{Connector, Params, query};
//!
//! # async fn run() -> docbase_client::Result<()> {
//! let connector = Connector::new("my-api-key");
//!
//! let person = connector
//!     .get_by_id("Person", "507f1f77bcf86cd799439011", Params::default(), None)
//!     .await?;
//!
//! let overdue = connector
//!     .search(
//!         "Invoice",
//!         query::eq("debtor._id", person["_id"].clone()),
//!         Params::new().with_fields(["invoiceNumber", "total"]).with_limit(25),
//!     )
//!     .await?;
//! # let _ = overdue;
//! # Ok(())
//! # }
//! ```
//!
//! Callers that cannot await use [`blocking::Connector`], which drives the
//! identical implementation through an owned runtime.

pub mod binary;
pub mod blocking;
pub mod client;
pub mod error;
pub mod history;
pub mod id;
pub mod logging;
pub mod params;
pub mod query;
pub mod reference;
pub mod response;
pub mod transport;

#[cfg(test)]
mod test_util;

pub use crate::client::{Connector, SERVICE_PRODUCTION_URL};
pub use crate::error::{ApiError, DecodeKind, Error, Result};
pub use crate::history::HistoryEntry;
pub use crate::id::{IdGenerator, generate_id, id_timestamp, is_valid_id};
pub use crate::logging::{ConsoleLogger, QueryLog, QueryLogEntry, QueryLogger, QueryToken};
pub use crate::params::{FieldSpec, Params};
pub use crate::query::QueryBuilder;
pub use crate::reference::{DocumentReference, PathStep};
pub use crate::response::parse_result;
pub use crate::transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, RequestBody, Transport,
};
