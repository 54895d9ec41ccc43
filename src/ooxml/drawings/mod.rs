//! DrawingML pictures for SpreadsheetML drawing parts.
//!
//! A drawing part (`xdr:wsDr`) lists anchored shapes. This module manages the
//! picture shapes among them: the image bytes behind each picture, stored
//! once per distinct content in a media part, the relationships that bind
//! them, optional click-through hyperlinks, and the `xdr:pic` markup.
//!
//! - [`Drawing`]: one drawing part with its [`ImageStore`] and [`ShapeTree`]
//! - [`DrawingContext`]: the borrowed state a picture operation works on
//! - [`PictureResource`]: insert, load, replace, resize and delete pictures
//! - [`AnchorFragmentBuilder`]: the `xdr:pic` markup of a new picture

pub mod anchor;
pub mod blip;
pub mod config;
pub mod context;
pub mod drawing;
pub mod error;
pub mod hyperlink;
pub mod picture;
pub mod shape_tree;
pub mod store;
pub mod xfrm;

pub use anchor::{
    AnchorFragmentBuilder, AnchorKind, CellMarker, EMU_PER_PIXEL, HlinkClick, PicFragment, PictureAnchor,
};
pub use config::DrawingConfig;
pub use context::DrawingContext;
pub use drawing::Drawing;
pub use error::{PictureError, Result};
pub use hyperlink::HyperlinkTarget;
pub use picture::PictureResource;
pub use shape_tree::ShapeTree;
pub use store::{ImageStore, Release};
