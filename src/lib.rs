//! ooxml-pictures - picture resources for Office Open XML drawing parts
//!
//! This library manages the raster images embedded in the drawing parts of
//! an OOXML package: it turns caller images or files into media parts,
//! deduplicates identical content by hash, wires the drawing relationships
//! and writes the `xdr:pic` markup that places each image on the sheet.
//!
//! # Features
//!
//! - **Content types**: extension and MIME lookup for the image formats a package can carry
//! - **Codec boundary**: decode and re-encode through [`images::ImageCodec`]
//! - **Deduplication**: one media part per distinct image per package, reference counted
//! - **Hyperlinks**: click-through links on pictures, with optional tooltips
//! - **Round trip**: read pictures back from existing drawing parts
//!
//! # Example - Placing an image file
//!
//! ```no_run
//! use ooxml_pictures::images::RasterCodec;
//! use ooxml_pictures::ooxml::drawings::{Drawing, DrawingConfig, HyperlinkTarget, PictureResource};
//! use ooxml_pictures::ooxml::{OpcPackage, PackURI};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut package = OpcPackage::new();
//! let mut drawing = Drawing::create(&mut package, PackURI::new("/xl/drawings/drawing1.xml")?)?;
//! let config = DrawingConfig::default();
//! let mut ctx = drawing.context(&mut package, &RasterCodec, &config)?;
//!
//! let mut picture = PictureResource::from_file(
//!     &mut ctx,
//!     "logo.png",
//!     Some(HyperlinkTarget::with_tooltip("https://example.com", "Home page")),
//! )?;
//! picture.resize_by_percent(&mut ctx, 50)?;
//! ctx.flush()?;
//!
//! println!("{}x{} as {}", picture.width(), picture.height(), picture.content_type());
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Operations emit `tracing` events; install a subscriber to see them.

pub mod images;
pub mod ooxml;

pub use images::{ContentHash, ImageCodec, RasterCodec, RawImage};
pub use ooxml::drawings::{
    Drawing, DrawingConfig, DrawingContext, HyperlinkTarget, PictureError, PictureResource,
};
