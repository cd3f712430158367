//! Document sinks.
//!
//! A sink receives every document that passed the restriction check, in
//! listing order, exactly once. Deduplication and storage layout belong to
//! whoever consumes the sink's output.
//!
//! # Submodules
//!
//! - [`memory`]: Collects documents in a `Vec`
//! - [`json`]: Appends documents as JSON lines to a file or stdout

use crate::error::Result;
use crate::models::Document;

pub mod json;
pub mod memory;

pub use json::JsonLinesSink;
pub use memory::MemorySink;

/// Receives completed documents.
#[allow(async_fn_in_trait)]
pub trait DocumentSink {
    async fn submit(&mut self, document: Document) -> Result<()>;
}
