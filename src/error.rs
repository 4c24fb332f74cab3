//! Error types for docling-reader.

use std::io;
use thiserror::Error;

/// Result type alias for docling-reader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting, rendering or loading documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The source locator is empty or malformed.
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// No converter is able to open this kind of source.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// The file format is not handled by any registered converter.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The converter reported a failed conversion.
    #[error("Conversion failed for {locator}: {message}")]
    Conversion {
        /// Source locator that failed
        locator: String,
        /// Converter message
        message: String,
    },

    /// A `$ref` pointer is syntactically invalid.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A child reference does not resolve to a node in the document.
    #[error("Unresolved reference {reference} (listed by {owner})")]
    UnresolvedReference {
        /// The dangling pointer
        reference: String,
        /// The node listing it as a child
        owner: String,
    },

    /// A child node's parent pointer does not point back at its owner.
    #[error("Node {node} has parent {actual:?}, expected {expected}")]
    InconsistentParent {
        /// The child node
        node: String,
        /// The node listing it as a child
        expected: String,
        /// The parent recorded on the child
        actual: Option<String>,
    },

    /// A node is reachable more than once from the document roots.
    #[error("Node {0} is referenced more than once (cycle or shared child)")]
    CyclicReference(String),

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
