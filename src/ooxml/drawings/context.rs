//! Everything a picture operation touches, borrowed for its duration.
//!
//! A [`DrawingContext`] bundles the package, the drawing part it works on,
//! that part's image store and shape tree, the codec and the settings. The
//! context owns the package-facing half of each picture operation: binding
//! image bytes to a media part and relationship, releasing them, and wiring
//! hyperlink relationships.

use tracing::debug;

use crate::images::codec::ImageCodec;
use crate::images::hash::ContentHash;
use crate::ooxml::drawings::config::DrawingConfig;
use crate::ooxml::drawings::error::{PictureError, Result};
use crate::ooxml::drawings::hyperlink::{HyperlinkTarget, is_absolute_uri};
use crate::ooxml::drawings::shape_tree::ShapeTree;
use crate::ooxml::drawings::store::{ImageStore, Release};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::{BlobPart, OpcError, OpcPackage, PackURI, Relationships};

/// How a new media part is named.
#[derive(Debug, Clone, Copy)]
pub(crate) enum MediaName<'n> {
    /// Configured template with the next free sequence number.
    Sequential { extension: &'n str },
    /// File name kept, prefixed with a number when already taken.
    File { name: &'n str },
}

pub struct DrawingContext<'a> {
    package: &'a mut OpcPackage,
    drawing_uri: PackURI,
    store: &'a mut ImageStore,
    shapes: &'a mut ShapeTree,
    codec: &'a dyn ImageCodec,
    config: &'a DrawingConfig,
}

impl<'a> DrawingContext<'a> {
    /// Bundle the state of one drawing part.
    ///
    /// Fails when the package has no part at `drawing_uri`.
    pub fn new(
        package: &'a mut OpcPackage,
        drawing_uri: PackURI,
        store: &'a mut ImageStore,
        shapes: &'a mut ShapeTree,
        codec: &'a dyn ImageCodec,
        config: &'a DrawingConfig,
    ) -> Result<Self> {
        if !package.contains_part(&drawing_uri) {
            return Err(OpcError::PartNotFound(drawing_uri.to_string()).into());
        }
        Ok(Self {
            package,
            drawing_uri,
            store,
            shapes,
            codec,
            config,
        })
    }

    pub fn package(&self) -> &OpcPackage {
        self.package
    }

    pub fn drawing_uri(&self) -> &PackURI {
        &self.drawing_uri
    }

    pub fn store(&self) -> &ImageStore {
        self.store
    }

    pub fn shapes(&self) -> &ShapeTree {
        self.shapes
    }

    pub fn codec(&self) -> &dyn ImageCodec {
        self.codec
    }

    pub fn config(&self) -> &DrawingConfig {
        self.config
    }

    pub(crate) fn shapes_mut(&mut self) -> &mut ShapeTree {
        self.shapes
    }

    pub(crate) fn store_mut(&mut self) -> &mut ImageStore {
        self.store
    }

    #[cfg(test)]
    pub(crate) fn package_mut(&mut self) -> &mut OpcPackage {
        self.package
    }

    /// Relationships of the drawing part.
    pub fn drawing_rels(&self) -> Result<&Relationships> {
        Ok(self.package.get_part(&self.drawing_uri)?.rels())
    }

    fn drawing_rels_mut(&mut self) -> Result<&mut Relationships> {
        Ok(self.package.get_part_mut(&self.drawing_uri)?.rels_mut())
    }

    /// Write the shape tree back into the drawing part.
    pub fn flush(&mut self) -> Result<()> {
        let xml = self.shapes.to_xml()?;
        self.package
            .get_part_mut(&self.drawing_uri)?
            .set_blob(xml.into_bytes());
        Ok(())
    }

    /// Follow an image relationship to the media part it targets.
    ///
    /// Returns the part URI and a copy of its bytes.
    pub(crate) fn resolve_image(&self, r_id: &str) -> Result<(PackURI, Vec<u8>)> {
        let rels = self.drawing_rels()?;
        let rel = rels
            .get(r_id)
            .ok_or_else(|| PictureError::unresolved(r_id, OpcError::RelationshipNotFound(r_id.to_string())))?;
        if rel.is_external() {
            return Err(PictureError::unresolved(
                r_id,
                format!("image relationship points outside the package: {}", rel.target_ref()),
            ));
        }
        let uri = rel
            .target_partname()
            .map_err(|e| PictureError::unresolved(r_id, e))?;
        let part = self
            .package
            .get_part(&uri)
            .map_err(|e| PictureError::unresolved(r_id, e))?;
        let bytes = part.blob().to_vec();
        Ok((uri, bytes))
    }

    /// Read back the link behind a picture's `a:hlinkClick`.
    ///
    /// Links read from a document always carry a tooltip, empty when the
    /// attribute is absent.
    pub(crate) fn resolve_hyperlink(&self, r_id: &str, tooltip: Option<&str>) -> Result<HyperlinkTarget> {
        let rel = self
            .drawing_rels()?
            .get(r_id)
            .ok_or_else(|| PictureError::unresolved(r_id, "no such hyperlink relationship"))?;
        let address = rel.target_ref().to_string();
        Ok(HyperlinkTarget::Internal {
            relative: !is_absolute_uri(&address),
            address,
            tooltip: tooltip.unwrap_or_default().to_string(),
        })
    }

    /// Create the hyperlink relationship for `link`; always a new id.
    pub(crate) fn create_hyperlink(&mut self, link: &HyperlinkTarget) -> Result<String> {
        let r_id = self
            .drawing_rels_mut()?
            .add_new(rt::HYPERLINK, link.address(), true);
        debug!(r_id = %r_id, target = link.address(), "created hyperlink relationship");
        Ok(r_id)
    }

    /// Drop a hyperlink relationship no picture uses any more.
    pub(crate) fn release_hyperlink(&mut self, r_id: &str) -> Result<()> {
        if self.shapes.relationship_uses(r_id) == 0 {
            self.drawing_rels_mut()?.remove(r_id);
            debug!(r_id, "removed hyperlink relationship");
        }
        Ok(())
    }

    /// Bind encoded image bytes to an image relationship of the drawing.
    ///
    /// A hash already in the store reuses its relationship. A hash another
    /// drawing already stored reuses that media part through a new
    /// relationship. Otherwise a media part and the relationship to it are
    /// created together; if either step fails the package is left as it was.
    pub(crate) fn bind_image(
        &mut self,
        hash: &ContentHash,
        bytes: Vec<u8>,
        content_type: &str,
        name: MediaName<'_>,
    ) -> Result<String> {
        if let Some(r_id) = self.store.lookup(hash).map(str::to_string) {
            self.store.register(hash.clone(), &r_id)?;
            debug!(hash = %hash, r_id = %r_id, "image already stored, reusing relationship");
            return Ok(r_id);
        }

        let (partname, created) = match self.package.media_part(hash) {
            Some(shared) => (shared.clone(), false),
            None => {
                let partname = self.media_partname(name)?;
                self.package.add_part(Box::new(BlobPart::new(
                    partname.clone(),
                    content_type.to_string(),
                    bytes,
                )));
                (partname, true)
            },
        };

        let target_ref = partname.relative_ref(self.drawing_uri.base_uri());
        let r_id = match self.drawing_rels_mut() {
            Ok(rels) => rels.add_new(rt::IMAGE, &target_ref, false),
            Err(e) => {
                if created {
                    self.package.remove_part(&partname);
                }
                return Err(e);
            },
        };

        if let Err(e) = self.store.register(hash.clone(), &r_id) {
            self.drop_relationship(&r_id);
            if created {
                self.package.remove_part(&partname);
            }
            return Err(e);
        }

        if created {
            self.package.index_media(hash.clone(), partname.clone());
            debug!(hash = %hash, r_id = %r_id, part = %partname, "stored new media part");
        } else {
            debug!(hash = %hash, r_id = %r_id, part = %partname, "media part shared with another drawing");
        }
        Ok(r_id)
    }

    /// Give up one picture's use of the image bound through `r_id`.
    ///
    /// The relationship goes once no picture in the shape tree embeds it;
    /// the media part goes once nothing in the package targets it. Failures
    /// are detected before the store is touched.
    pub(crate) fn release_image(&mut self, hash: &ContentHash, r_id: &str) -> Result<()> {
        let target = match self.drawing_rels()?.get(r_id) {
            Some(rel) if !rel.is_external() => Some(rel.target_partname()?),
            _ => None,
        };

        match self.store.unregister(hash, r_id) {
            Release::Retained(refs) => {
                debug!(r_id, refs, "image still in use");
                return Ok(());
            },
            Release::Last | Release::NotIndexed => {},
        }
        if self.shapes.embeds_relationship(r_id) {
            return Ok(());
        }

        if self.drawing_rels_mut()?.remove(r_id).is_none() {
            return Ok(());
        }
        debug!(r_id, "removed image relationship");

        if let Some(partname) = target
            && !self.package.is_relationship_target(&partname)
        {
            self.package.remove_part(&partname);
            debug!(part = %partname, "removed unreferenced media part");
        }
        Ok(())
    }

    fn drop_relationship(&mut self, r_id: &str) {
        if let Ok(rels) = self.drawing_rels_mut() {
            rels.remove(r_id);
        }
    }

    fn media_partname(&self, name: MediaName<'_>) -> Result<PackURI> {
        let folder = self.config.media_folder.trim_end_matches('/');
        match name {
            MediaName::Sequential { extension } => Ok(self
                .package
                .next_partname(&self.config.media_partname_template(extension))?),
            MediaName::File { name } => {
                let direct = PackURI::new(format!("{}/{}", folder, name)).map_err(OpcError::InvalidPackUri)?;
                if !self.package.contains_part(&direct) {
                    return Ok(direct);
                }
                Ok(self
                    .package
                    .next_partname_with(|n| format!("{}/{}{}", folder, n, name))?)
            },
        }
    }
}
