/// Error types for picture operations.
use thiserror::Error;

use crate::images::codec::CodecError;
use crate::ooxml::opc::error::OpcError;

/// Result type for picture operations.
pub type Result<T> = std::result::Result<T, PictureError>;

#[derive(Error, Debug)]
pub enum PictureError {
    /// The codec could not interpret the image bytes
    #[error("Decode error: {0}")]
    Decode(#[source] CodecError),

    /// The codec could not produce the target format
    #[error("Encode error: {0}")]
    Encode(#[source] CodecError),

    /// A hash was bound to a second relationship, bypassing deduplication
    #[error("Image hash {hash} is already bound to {existing}, cannot bind it to {requested}")]
    DuplicateHash {
        hash: String,
        existing: String,
        requested: String,
    },

    /// A relationship id did not lead to a usable part
    #[error("Cannot resolve relationship '{r_id}': {source}")]
    RelationshipResolution {
        r_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Rejected before any mutation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The shape tree has no picture with this id
    #[error("Shape not found: {0}")]
    ShapeNotFound(u32),

    /// Malformed drawing XML
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] OpcError),
}

impl PictureError {
    pub(crate) fn unresolved(r_id: &str, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        PictureError::RelationshipResolution {
            r_id: r_id.to_string(),
            source: source.into(),
        }
    }
}

impl From<CodecError> for PictureError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Decode(_) => PictureError::Decode(err),
            CodecError::Encode { .. } => PictureError::Encode(err),
        }
    }
}

impl From<quick_xml::Error> for PictureError {
    fn from(err: quick_xml::Error) -> Self {
        PictureError::Xml(err.to_string())
    }
}

impl From<std::fmt::Error> for PictureError {
    fn from(err: std::fmt::Error) -> Self {
        PictureError::Xml(format!("XML write error: {}", err))
    }
}
