//! A drawing part together with its picture state.

use tracing::debug;

use crate::images::codec::ImageCodec;
use crate::ooxml::drawings::config::DrawingConfig;
use crate::ooxml::drawings::context::DrawingContext;
use crate::ooxml::drawings::error::{PictureError, Result};
use crate::ooxml::drawings::picture::PictureResource;
use crate::ooxml::drawings::shape_tree::ShapeTree;
use crate::ooxml::drawings::store::ImageStore;
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::{OpcPackage, PackURI, XmlPart};

/// Owns the image store and shape tree of one drawing part.
///
/// The package is borrowed per operation through [`Drawing::context`], so
/// several drawings can live next to the same package.
///
/// ```
/// use ooxml_pictures::images::RasterCodec;
/// use ooxml_pictures::ooxml::drawings::{Drawing, DrawingConfig, HyperlinkTarget, PictureResource};
/// use ooxml_pictures::ooxml::opc::{OpcPackage, PackURI};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut package = OpcPackage::new();
/// let mut drawing = Drawing::create(&mut package, PackURI::new("/xl/drawings/drawing1.xml")?)?;
/// let config = DrawingConfig::default();
///
/// let mut ctx = drawing.context(&mut package, &RasterCodec, &config)?;
/// let image = image::DynamicImage::new_rgb8(16, 16).into();
/// let picture = PictureResource::from_image(
///     &mut ctx,
///     image,
///     Some(HyperlinkTarget::external("https://example.com")),
/// )?;
/// ctx.flush()?;
///
/// assert_eq!((picture.width(), picture.height()), (16, 16));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Drawing {
    partname: PackURI,
    store: ImageStore,
    shapes: ShapeTree,
}

impl Drawing {
    /// Add an empty drawing part to the package.
    pub fn create(package: &mut OpcPackage, partname: PackURI) -> Result<Self> {
        if package.contains_part(&partname) {
            return Err(PictureError::InvalidArgument(format!(
                "part {} already exists",
                partname
            )));
        }
        let shapes = ShapeTree::new();
        let xml = shapes.to_xml()?;
        package.add_part(Box::new(XmlPart::new(
            partname.clone(),
            ct::OFC_DRAWING.to_string(),
            xml.into_bytes(),
        )));
        debug!(part = %partname, "created drawing part");
        Ok(Self {
            partname,
            store: ImageStore::new(),
            shapes,
        })
    }

    /// Read the shape tree of an existing drawing part.
    ///
    /// The store stays empty until [`load_pictures`](Self::load_pictures).
    pub fn open(package: &OpcPackage, partname: PackURI) -> Result<Self> {
        let shapes = ShapeTree::from_xml(package.get_part(&partname)?.blob())?;
        debug!(part = %partname, pictures = shapes.len(), "opened drawing part");
        Ok(Self {
            partname,
            store: ImageStore::new(),
            shapes,
        })
    }

    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn shapes(&self) -> &ShapeTree {
        &self.shapes
    }

    /// Borrow everything a picture operation needs.
    pub fn context<'a>(
        &'a mut self,
        package: &'a mut OpcPackage,
        codec: &'a dyn ImageCodec,
        config: &'a DrawingConfig,
    ) -> Result<DrawingContext<'a>> {
        config.validate()?;
        DrawingContext::new(
            package,
            self.partname.clone(),
            &mut self.store,
            &mut self.shapes,
            codec,
            config,
        )
    }

    /// Bind every picture in the shape tree and index its image.
    ///
    /// All or nothing: if one picture fails, the store and the shape tree
    /// are restored to their state before the call.
    pub fn load_pictures(
        &mut self,
        package: &mut OpcPackage,
        codec: &dyn ImageCodec,
        config: &DrawingConfig,
    ) -> Result<Vec<PictureResource>> {
        let ids: Vec<u32> = self.shapes.iter().map(|anchor| anchor.id()).collect();
        let snapshot = (self.store.clone(), self.shapes.clone());

        let loaded = {
            let mut ctx = self.context(package, codec, config)?;
            ids.into_iter()
                .map(|id| PictureResource::from_existing(&mut ctx, id))
                .collect::<Result<Vec<_>>>()
        };
        if let Err(e) = &loaded {
            debug!(part = %self.partname, error = %e, "loading pictures failed, state restored");
            (self.store, self.shapes) = snapshot;
        }
        loaded
    }
}
