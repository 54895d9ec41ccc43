/// Open Packaging Conventions (OPC) implementation.
///
/// This module provides the in-memory side of an OPC package: the parts a
/// drawing needs to read and write, their relationships, and pack URI
/// arithmetic. Reading and writing the physical ZIP container is left to the
/// caller; parts are handed in and taken out as raw bytes.
///
/// - Package structure (parts, relationships)
/// - Relationship id allocation (`rId1`, `rId2`, ...)
/// - Relative reference resolution between parts
/// - Uses hash maps for O(1) lookups

pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod rel;

// Re-export commonly used types
pub use error::{OpcError, Result};
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::{BlobPart, Part, PartFactory, XmlPart};
pub use rel::{Relationship, Relationships};
