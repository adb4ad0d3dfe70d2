//! Error types for astmap.

use thiserror::Error;

use crate::tree::SourceRange;

/// Result type alias for astmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading trees or matching them.
#[derive(Error, Debug)]
pub enum Error {
    /// Tree dump parsing error.
    #[error("tree parse error: {0}")]
    Parse(String),

    /// A node type label that is not part of the grammar.
    #[error("unknown node kind: {0}")]
    UnknownKind(String),

    /// A location key that does not resolve to a node.
    #[error("no node at {range} in {file}")]
    LocationNotFound {
        /// File path of the key.
        file: String,
        /// Source range of the key.
        range: SourceRange,
    },

    /// A fragment whose pruned projection cannot be built.
    #[error("malformed fragment: {0}")]
    MalformedFragment(String),

    /// The matching deadline was exceeded.
    #[error("matching cancelled: deadline exceeded")]
    Cancelled,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl Error {
    /// Returns true for the cancellation condition, the only error that
    /// unwinds out of a matching run.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
