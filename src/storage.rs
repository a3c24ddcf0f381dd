//! Document storage.
//!
//! `DocumentStore` is the seam between the HTTP layer and where PDFs live;
//! `LocalDocumentStore` keeps them as flat files under one directory.

mod local;

pub use local::LocalDocumentStore;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::generators::GeneratorError;
use crate::invoice::models::InvoiceData;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create storage directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render document: {0}")]
    Render(#[from] GeneratorError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no document stored at {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("render task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A stored document loaded fully into memory.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Base name, used for the download's `Content-Disposition`.
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Render and persist the invoice unless a document for its seller/buyer
    /// pair already exists. Returns the absolute path either way.
    async fn generate(&self, invoice: &InvoiceData) -> Result<PathBuf, StoreError>;

    /// Where the document for a seller/buyer pair lives. Pure name computation.
    fn resolve_path(&self, seller: &str, buyer: &str) -> PathBuf;

    /// Load the document for a seller/buyer pair.
    async fn fetch(&self, seller: &str, buyer: &str) -> Result<StoredDocument, StoreError>;
}
