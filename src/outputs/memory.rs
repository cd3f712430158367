//! In-memory sink.

use tracing::debug;

use super::DocumentSink;
use crate::error::Result;
use crate::models::Document;

/// Keeps submitted documents in submission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    documents: Vec<Document>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

impl DocumentSink for MemorySink {
    async fn submit(&mut self, document: Document) -> Result<()> {
        debug!(link = %document.link, "Collected document");
        self.documents.push(document);
        Ok(())
    }
}
