//! Office Open XML (OOXML) pieces needed to place pictures.
//!
//! # Architecture
//!
//! 1. **OPC Layer** (`opc`): in-memory package parts, relationships and pack URIs
//! 2. **Drawings** (`drawings`): picture shapes of SpreadsheetML drawing parts
//!
//! # Example: Inserting a picture twice
//!
//! ```rust
//! use ooxml_pictures::images::RasterCodec;
//! use ooxml_pictures::ooxml::drawings::{Drawing, DrawingConfig, PictureResource};
//! use ooxml_pictures::ooxml::{OpcPackage, PackURI};
//!
//! let mut package = OpcPackage::new();
//! let mut drawing = Drawing::create(&mut package, PackURI::new("/xl/drawings/drawing1.xml")?)?;
//! let config = DrawingConfig::default();
//! let mut ctx = drawing.context(&mut package, &RasterCodec, &config)?;
//!
//! let logo = image::DynamicImage::new_rgba8(32, 32);
//! let a = PictureResource::from_image(&mut ctx, logo.clone().into(), None)?;
//! let b = PictureResource::from_image(&mut ctx, logo.into(), None)?;
//!
//! // same content, one media part
//! assert_eq!(a.relationship_id(), b.relationship_id());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod drawings;
pub mod opc;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};
