//! Seams between request validation, document generators and the store.

use super::validation::ValidationErrors;
use super::{GeneratedDocument, GeneratorError};

/// Trait for validating request objects.
pub trait Validator {
    /// Collect every problem with the object, not just the first.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Trait for document generators.
pub trait Generator<Req: ?Sized> {
    /// Render the document from the request.
    fn generate(&self, request: &Req) -> Result<GeneratedDocument, GeneratorError>;
}
