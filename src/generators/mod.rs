//! Generators module - business logic for turning invoice data into PDF documents.
//!
//! - `engine` - page layout on top of `printpdf`
//! - `layout` - table model handed to the engine
//! - `invoice` - the invoice document itself

pub mod common;
pub mod engine;
pub mod invoice;
pub mod layout;
pub mod traits;
pub mod validation;

pub use engine::PdfRenderEngine;
pub use invoice::InvoiceGenerator;
pub use traits::{Generator, Validator};

use thiserror::Error;

/// Errors that can occur during document generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invoice has no item list")]
    MissingItems,
    #[error("PDF library error: {0}")]
    Pdf(String),
    #[error("invalid table layout: {0}")]
    Layout(String),
    #[error("failed to serialize PDF: {0}")]
    Serialize(#[source] std::io::Error),
}

/// Result of a successful document generation.
#[derive(Debug)]
pub struct GeneratedDocument {
    pub filename: String,
    pub pdf: Vec<u8>,
}
