//! Pictures placed on a drawing part.
//!
//! A [`PictureResource`] ties together the stored image (a media part plus the
//! drawing relationship to it), the decoded pixels, and the picture anchor in
//! the drawing's shape tree. Identical image content is stored once per
//! package: every insertion hashes the encoded bytes and goes through the
//! drawing's [`ImageStore`](crate::ooxml::drawings::ImageStore), then through
//! the package's media index when the drawing has not seen the hash yet.
//!
//! Operations take a [`DrawingContext`] and either complete or leave the
//! package, store and shape tree as they were.

use std::path::Path;

use tracing::{debug, warn};

use crate::images::codec::{CodecFormat, RawImage};
use crate::images::content_type::{
    content_type_for_extension, content_type_for_path, explicit_codec_format, extension_for_content_type,
};
use crate::images::hash::ContentHash;
use crate::ooxml::drawings::anchor::{AnchorFragmentBuilder, CellMarker, PictureAnchor, emu_to_px};
use crate::ooxml::drawings::context::{DrawingContext, MediaName};
use crate::ooxml::drawings::error::{PictureError, Result};
use crate::ooxml::drawings::hyperlink::HyperlinkTarget;

#[derive(Debug, Clone)]
pub struct PictureResource {
    shape_id: u32,
    image_bytes: Vec<u8>,
    raw_image: Option<RawImage>,
    content_type: String,
    hash: ContentHash,
    native_size: (u32, u32),
    width: u32,
    height: u32,
    relationship_id: String,
    hyperlink: Option<HyperlinkTarget>,
    hyperlink_relationship_id: Option<String>,
}

impl PictureResource {
    /// Bind the picture anchor `shape_id` read from an existing drawing part.
    ///
    /// The stored part is left untouched. Its bytes are decoded for the
    /// native size and re-encoded as JPEG only to derive the hash, so visually
    /// identical parts dedup against later insertions. A zero anchor extent
    /// is replaced by the native size; any other extent is kept.
    pub fn from_existing(ctx: &mut DrawingContext<'_>, shape_id: u32) -> Result<Self> {
        let anchor = ctx
            .shapes()
            .get(shape_id)
            .ok_or(PictureError::ShapeNotFound(shape_id))?;
        let pic = anchor.pic();
        let relationship_id = pic.embed().to_string();
        let hlink_click = pic.hlink_click().cloned();
        let extent = pic.extent();

        let (partname, image_bytes) = ctx.resolve_image(&relationship_id)?;
        let content_type = content_type_for_extension(partname.ext());
        let raw = ctx.codec().decode(&image_bytes)?;
        let normalized = ctx
            .codec()
            .encode(&raw, CodecFormat::Jpeg, ctx.config().normalize_quality)?;
        let hash = ContentHash::of(&normalized);

        let (hyperlink, hyperlink_relationship_id) = match hlink_click {
            Some(click) => (
                Some(ctx.resolve_hyperlink(click.r_id(), click.tooltip())?),
                Some(click.r_id().to_string()),
            ),
            None => (None, None),
        };

        if !ctx.store_mut().adopt(hash.clone(), &relationship_id) {
            warn!(
                hash = %hash,
                r_id = %relationship_id,
                part = %partname,
                "image content already indexed under another relationship"
            );
        }

        let native_size = (raw.width(), raw.height());
        let (width, height) = if extent == (0, 0) {
            if let Some(anchor) = ctx.shapes_mut().get_mut(shape_id) {
                anchor.set_pixel_size(native_size.0, native_size.1);
            }
            native_size
        } else {
            (emu_to_px(extent.0), emu_to_px(extent.1))
        };

        debug!(shape_id, r_id = %relationship_id, part = %partname, "loaded picture");
        Ok(Self {
            shape_id,
            image_bytes,
            raw_image: Some(raw),
            content_type: content_type.to_string(),
            hash,
            native_size,
            width,
            height,
            relationship_id,
            hyperlink,
            hyperlink_relationship_id,
        })
    }

    /// Insert a decoded image as a new picture, stored as PNG.
    pub fn from_image(
        ctx: &mut DrawingContext<'_>,
        image: RawImage,
        hyperlink: Option<HyperlinkTarget>,
    ) -> Result<Self> {
        ensure_pixels(&image)?;
        let format = CodecFormat::Png;
        let bytes = ctx
            .codec()
            .encode(&image, format, ctx.config().storage_quality)?;
        Self::insert(
            ctx,
            image,
            bytes,
            format.content_type(),
            MediaName::Sequential {
                extension: format.extension(),
            },
            hyperlink,
        )
    }

    /// Insert the image file at `path` as a new picture.
    ///
    /// The content type is inferred from the file extension. Types the codec
    /// writes natively are stored in that format; anything else is stored in
    /// the codec's default format for the decoded pixels. The media part keeps
    /// the file name when its extension matches the stored content type.
    pub fn from_file(
        ctx: &mut DrawingContext<'_>,
        path: impl AsRef<Path>,
        hyperlink: Option<HyperlinkTarget>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file_bytes = std::fs::read(path)?;
        let inferred = content_type_for_path(path);
        let image = ctx.codec().decode(&file_bytes)?;
        ensure_pixels(&image)?;

        let format = explicit_codec_format(inferred).unwrap_or_else(|| ctx.codec().default_format(&image));
        let bytes = ctx
            .codec()
            .encode(&image, format, ctx.config().storage_quality)?;
        let content_type = format.content_type();

        let file_name = media_file_name(path, content_type);
        let name = match file_name.as_deref() {
            Some(name) => MediaName::File { name },
            None => MediaName::Sequential {
                extension: format.extension(),
            },
        };
        Self::insert(ctx, image, bytes, content_type, name, hyperlink)
    }

    fn insert(
        ctx: &mut DrawingContext<'_>,
        image: RawImage,
        bytes: Vec<u8>,
        content_type: &str,
        name: MediaName<'_>,
        hyperlink: Option<HyperlinkTarget>,
    ) -> Result<Self> {
        let hash = ContentHash::of(&bytes);
        let native_size = (image.width(), image.height());

        let relationship_id = ctx.bind_image(&hash, bytes.clone(), content_type, name)?;
        let (shape_id, hyperlink_relationship_id) =
            match Self::attach(ctx, &relationship_id, hyperlink.as_ref(), native_size) {
                Ok(attached) => attached,
                Err(e) => {
                    if let Err(rollback) = ctx.release_image(&hash, &relationship_id) {
                        warn!(error = %rollback, r_id = %relationship_id, "image rollback failed");
                    }
                    return Err(e);
                },
            };

        debug!(shape_id, r_id = %relationship_id, hash = %hash, "inserted picture");
        Ok(Self {
            shape_id,
            image_bytes: bytes,
            raw_image: Some(image),
            content_type: content_type.to_string(),
            hash,
            native_size,
            width: native_size.0,
            height: native_size.1,
            relationship_id,
            hyperlink,
            hyperlink_relationship_id,
        })
    }

    /// Create the hyperlink relationship and the anchor for a bound image.
    fn attach(
        ctx: &mut DrawingContext<'_>,
        embed: &str,
        hyperlink: Option<&HyperlinkTarget>,
        (width, height): (u32, u32),
    ) -> Result<(u32, Option<String>)> {
        let shape_id = ctx.shapes().next_shape_id();
        let mut builder = AnchorFragmentBuilder::new(shape_id).name(ctx.config().shape_name(shape_id));

        let hyperlink_relationship_id = match hyperlink {
            Some(link) => {
                let r_id = ctx.create_hyperlink(link)?;
                builder = builder.hyperlink_click(r_id.clone(), link.tooltip().map(str::to_string));
                Some(r_id)
            },
            None => None,
        };

        let pic = match builder.build(embed) {
            Ok(pic) => pic,
            Err(e) => {
                if let Some(r_id) = &hyperlink_relationship_id {
                    ctx.release_hyperlink(r_id)?;
                }
                return Err(e);
            },
        };

        let mut anchor = PictureAnchor::one_cell(CellMarker::default(), pic);
        anchor.set_pixel_size(width, height);
        ctx.shapes_mut().insert(anchor);
        Ok((shape_id, hyperlink_relationship_id))
    }

    /// Swap the stored image for `image`, stored as PNG.
    ///
    /// The picture's display size becomes the new native size. The previous
    /// image stays stored while other pictures use it.
    pub fn replace_image(&mut self, ctx: &mut DrawingContext<'_>, image: RawImage) -> Result<()> {
        ensure_pixels(&image)?;
        if !ctx.shapes().contains(self.shape_id) {
            return Err(PictureError::ShapeNotFound(self.shape_id));
        }

        let format = CodecFormat::Png;
        let bytes = ctx
            .codec()
            .encode(&image, format, ctx.config().storage_quality)?;
        let hash = ContentHash::of(&bytes);
        let relationship_id = ctx.bind_image(
            &hash,
            bytes.clone(),
            format.content_type(),
            MediaName::Sequential {
                extension: format.extension(),
            },
        )?;

        let (width, height) = (image.width(), image.height());
        match ctx.shapes_mut().get_mut(self.shape_id) {
            Some(anchor) => {
                anchor.pic_mut().set_embed(&relationship_id);
                anchor.set_pixel_size(width, height);
            },
            None => {
                ctx.release_image(&hash, &relationship_id)?;
                return Err(PictureError::ShapeNotFound(self.shape_id));
            },
        }

        let previous_id = std::mem::replace(&mut self.relationship_id, relationship_id);
        let previous_hash = std::mem::replace(&mut self.hash, hash);
        self.image_bytes = bytes;
        self.raw_image = Some(image);
        self.content_type = format.content_type().to_string();
        self.native_size = (width, height);
        self.width = width;
        self.height = height;

        debug!(
            shape_id = self.shape_id,
            from = %previous_id,
            to = %self.relationship_id,
            "replaced picture image"
        );
        ctx.release_image(&previous_hash, &previous_id)
    }

    /// Scale the displayed size to `percent` of the native size.
    ///
    /// Each call starts from the native size, so only the last percentage
    /// counts.
    pub fn resize_by_percent(&mut self, ctx: &mut DrawingContext<'_>, percent: i32) -> Result<()> {
        if percent <= 0 {
            return Err(PictureError::InvalidArgument(format!(
                "resize percentage must be positive, got {}",
                percent
            )));
        }
        let width = scale(self.native_size.0, percent);
        let height = scale(self.native_size.1, percent);

        let anchor = ctx
            .shapes_mut()
            .get_mut(self.shape_id)
            .ok_or(PictureError::ShapeNotFound(self.shape_id))?;
        anchor.set_pixel_size(width, height);
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Remove the picture from the drawing.
    ///
    /// The image relationship and media part go with it once no other
    /// picture uses them. If the image cannot be released the anchor is put
    /// back.
    pub fn delete(self, ctx: &mut DrawingContext<'_>) -> Result<()> {
        let taken = ctx.shapes_mut().take(self.shape_id);
        if taken.is_none() {
            warn!(shape_id = self.shape_id, "picture anchor already gone");
        }
        if let Err(e) = ctx.release_image(&self.hash, &self.relationship_id) {
            if let Some((index, anchor)) = taken {
                ctx.shapes_mut().restore(index, anchor);
            }
            return Err(e);
        }
        if let Some(r_id) = &self.hyperlink_relationship_id {
            ctx.release_hyperlink(r_id)?;
        }
        debug!(shape_id = self.shape_id, r_id = %self.relationship_id, "deleted picture");
        Ok(())
    }

    /// Drop the decoded pixels. The stored image is not affected.
    pub fn dispose(&mut self) {
        self.raw_image = None;
    }

    pub fn shape_id(&self) -> u32 {
        self.shape_id
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Displayed width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Displayed height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel size of the bound image.
    pub fn native_size(&self) -> (u32, u32) {
        self.native_size
    }

    pub fn relationship_id(&self) -> &str {
        &self.relationship_id
    }

    pub fn hyperlink(&self) -> Option<&HyperlinkTarget> {
        self.hyperlink.as_ref()
    }

    pub fn hyperlink_relationship_id(&self) -> Option<&str> {
        self.hyperlink_relationship_id.as_deref()
    }

    /// Bytes of the stored image.
    pub fn image_bytes(&self) -> &[u8] {
        &self.image_bytes
    }

    /// Decoded pixels, until [`dispose`](Self::dispose) is called.
    pub fn raw_image(&self) -> Option<&RawImage> {
        self.raw_image.as_ref()
    }
}

fn ensure_pixels(image: &RawImage) -> Result<()> {
    if image.is_empty() {
        return Err(PictureError::InvalidArgument(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

#[inline]
fn scale(native: u32, percent: i32) -> u32 {
    let scaled = (native as u64 * percent as u64 + 50) / 100;
    scaled.min(u32::MAX as u64) as u32
}

/// Media part name for a picture read from `path`.
///
/// Keeps the file name when its extension resolves to `content_type`,
/// otherwise swaps in the extension of the stored format.
fn media_file_name(path: &Path, content_type: &str) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if !ext.is_empty() && content_type_for_extension(ext) == content_type {
        return Some(file_name.to_string());
    }
    let stem = path.file_stem()?.to_str()?;
    Some(format!("{}.{}", stem, extension_for_content_type(content_type)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::codec::tests::{solid_rgb, solid_rgba};
    use crate::images::codec::{CodecError, ImageCodec, RasterCodec};
    use crate::ooxml::drawings::config::DrawingConfig;
    use crate::ooxml::drawings::shape_tree::ShapeTree;
    use crate::ooxml::drawings::store::ImageStore;
    use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
    use crate::ooxml::opc::{OpcPackage, PackURI};
    use proptest::prelude::*;
    use std::io::Write;

    const DRAWING: &str = "/xl/drawings/drawing1.xml";

    struct Fixture {
        package: OpcPackage,
        store: ImageStore,
        shapes: ShapeTree,
        config: DrawingConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let mut package = OpcPackage::new();
            package
                .load_part(PackURI::new(DRAWING).unwrap(), ct::OFC_DRAWING, b"<xdr:wsDr/>".to_vec())
                .unwrap();
            Self {
                package,
                store: ImageStore::new(),
                shapes: ShapeTree::new(),
                config: DrawingConfig::default(),
            }
        }

        fn ctx(&mut self) -> DrawingContext<'_> {
            self.ctx_with(&RasterCodec)
        }

        fn ctx_with<'a>(&'a mut self, codec: &'a dyn ImageCodec) -> DrawingContext<'a> {
            DrawingContext::new(
                &mut self.package,
                PackURI::new(DRAWING).unwrap(),
                &mut self.store,
                &mut self.shapes,
                codec,
                &self.config,
            )
            .unwrap()
        }
    }

    /// Codec that decodes normally but refuses to encode.
    struct BrokenEncoder;

    impl ImageCodec for BrokenEncoder {
        fn decode(&self, bytes: &[u8]) -> crate::images::codec::Result<RawImage> {
            RasterCodec.decode(bytes)
        }

        fn encode(&self, _image: &RawImage, format: CodecFormat, _quality: u8) -> crate::images::codec::Result<Vec<u8>> {
            Err(CodecError::Encode {
                format,
                reason: "encoder unavailable".to_string(),
            })
        }
    }

    fn media_parts(ctx: &DrawingContext<'_>) -> usize {
        ctx.package()
            .iter_parts()
            .filter(|part| part.partname().as_str().starts_with("/xl/media/"))
            .count()
    }

    #[test]
    fn test_insert_replace_scenario() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();

        let mut first = PictureResource::from_image(&mut ctx, solid_rgb(10, 10, [200, 10, 10]), None).unwrap();
        assert_eq!((first.width(), first.height()), (10, 10));
        assert_eq!(first.content_type(), "image/png");
        assert_eq!(ctx.store().lookup(first.hash()), Some(first.relationship_id()));
        assert_eq!(media_parts(&ctx), 1);

        let second = PictureResource::from_image(&mut ctx, solid_rgb(10, 10, [200, 10, 10]), None).unwrap();
        assert_eq!(second.relationship_id(), first.relationship_id());
        assert_eq!(second.hash(), first.hash());
        assert_eq!(ctx.store().len(), 1);
        assert_eq!(media_parts(&ctx), 1);
        assert_ne!(second.shape_id(), first.shape_id());

        let old_rel = first.relationship_id().to_string();
        first
            .replace_image(&mut ctx, solid_rgb(20, 20, [10, 200, 10]))
            .unwrap();
        assert_eq!((first.width(), first.height()), (20, 20));
        assert_ne!(first.relationship_id(), old_rel);

        let anchor = ctx.shapes().get(first.shape_id()).unwrap();
        assert_eq!(anchor.pic().embed(), first.relationship_id());
        assert_eq!(anchor.pixel_size(), (20, 20));

        // the second picture still uses the first image
        assert!(ctx.drawing_rels().unwrap().get(&old_rel).is_some());
        assert_eq!(ctx.store().lookup(second.hash()), Some(old_rel.as_str()));
        assert_eq!(media_parts(&ctx), 2);
    }

    #[test]
    fn test_delete_counts_references() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();

        let a = PictureResource::from_image(&mut ctx, solid_rgb(4, 4, [1, 2, 3]), None).unwrap();
        let b = PictureResource::from_image(&mut ctx, solid_rgb(4, 4, [1, 2, 3]), None).unwrap();
        let r_id = a.relationship_id().to_string();
        let hash = a.hash().clone();

        let a_id = a.shape_id();
        a.delete(&mut ctx).unwrap();
        assert!(!ctx.shapes().contains(a_id));
        assert_eq!(ctx.store().ref_count(&hash), 1);
        assert!(ctx.drawing_rels().unwrap().get(&r_id).is_some());
        assert_eq!(media_parts(&ctx), 1);

        b.delete(&mut ctx).unwrap();
        assert!(ctx.shapes().is_empty());
        assert!(ctx.store().is_empty());
        assert!(ctx.drawing_rels().unwrap().get(&r_id).is_none());
        assert_eq!(media_parts(&ctx), 0);
    }

    #[test]
    fn test_delete_keeps_anchor_when_release_fails() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let picture = PictureResource::from_image(&mut ctx, solid_rgb(4, 4, [1, 2, 3]), None).unwrap();
        let shape_id = picture.shape_id();

        let drawing = ctx.drawing_uri().clone();
        ctx.package_mut().remove_part(&drawing);

        assert!(picture.delete(&mut ctx).is_err());
        assert!(ctx.shapes().contains(shape_id));
        assert_eq!(ctx.store().len(), 1);
    }

    #[test]
    fn test_file_and_buffer_share_one_relationship() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swatch.png");
        let png = RasterCodec.encode(&solid_rgb(6, 4, [90, 80, 70]), CodecFormat::Png, 100).unwrap();
        std::fs::write(&path, &png).unwrap();

        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let from_file = PictureResource::from_file(&mut ctx, &path, None).unwrap();
        let from_buffer = PictureResource::from_image(&mut ctx, solid_rgb(6, 4, [90, 80, 70]), None).unwrap();

        assert_eq!(from_file.hash(), from_buffer.hash());
        assert_eq!(from_file.relationship_id(), from_buffer.relationship_id());
        assert_eq!(ctx.drawing_rels().unwrap().len(), 1);
        assert_eq!(ctx.store().ref_count(from_file.hash()), 2);
        assert_eq!(media_parts(&ctx), 1);
    }

    #[test]
    fn test_same_image_in_two_drawings() {
        let mut fx = Fixture::new();
        let second = PackURI::new("/xl/drawings/drawing2.xml").unwrap();
        fx.package
            .load_part(second.clone(), ct::OFC_DRAWING, b"<xdr:wsDr/>".to_vec())
            .unwrap();

        let first = PictureResource::from_image(&mut fx.ctx(), solid_rgb(10, 10, [1, 2, 3]), None).unwrap();

        let mut store = ImageStore::new();
        let mut shapes = ShapeTree::new();
        let mut other =
            DrawingContext::new(&mut fx.package, second, &mut store, &mut shapes, &RasterCodec, &fx.config).unwrap();
        let copy = PictureResource::from_image(&mut other, solid_rgb(10, 10, [1, 2, 3]), None).unwrap();

        assert_eq!(media_parts(&other), 1);
        let media = other
            .drawing_rels()
            .unwrap()
            .get(copy.relationship_id())
            .unwrap()
            .target_partname()
            .unwrap();
        assert_eq!(media.as_str(), "/xl/media/image1.png");

        copy.delete(&mut other).unwrap();
        assert!(other.package().contains_part(&media));
        drop(other);

        let mut ctx = fx.ctx();
        first.delete(&mut ctx).unwrap();
        assert_eq!(media_parts(&ctx), 0);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();

        let mut picture = PictureResource::from_image(&mut ctx, solid_rgb(3, 3, [0, 0, 0]), None).unwrap();
        assert!(picture.raw_image().is_some());
        picture.dispose();
        picture.dispose();
        assert!(picture.raw_image().is_none());
        assert!(!picture.image_bytes().is_empty());
        assert_eq!(media_parts(&ctx), 1);
    }

    #[test]
    fn test_resize_from_native_size() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let mut picture = PictureResource::from_image(&mut ctx, solid_rgb(10, 20, [5, 5, 5]), None).unwrap();

        picture.resize_by_percent(&mut ctx, 100).unwrap();
        assert_eq!((picture.width(), picture.height()), (10, 20));

        picture.resize_by_percent(&mut ctx, 50).unwrap();
        assert_eq!((picture.width(), picture.height()), (5, 10));
        picture.resize_by_percent(&mut ctx, 200).unwrap();
        assert_eq!((picture.width(), picture.height()), (20, 40));
        assert_eq!(ctx.shapes().get(picture.shape_id()).unwrap().pixel_size(), (20, 40));

        picture.resize_by_percent(&mut ctx, 15).unwrap();
        // 1.5 and 3.0 round half up
        assert_eq!((picture.width(), picture.height()), (2, 3));
    }

    #[test]
    fn test_resize_rejects_non_positive() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let mut picture = PictureResource::from_image(&mut ctx, solid_rgb(8, 8, [9, 9, 9]), None).unwrap();

        for percent in [0, -1, -100] {
            let err = picture.resize_by_percent(&mut ctx, percent).unwrap_err();
            assert!(matches!(err, PictureError::InvalidArgument(_)));
        }
        assert_eq!((picture.width(), picture.height()), (8, 8));
    }

    #[test]
    fn test_hyperlink_with_tooltip() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();

        let link = HyperlinkTarget::with_tooltip("https://example.com/docs", "Docs");
        let picture = PictureResource::from_image(&mut ctx, solid_rgb(2, 2, [1, 1, 1]), Some(link.clone())).unwrap();

        let h_id = picture.hyperlink_relationship_id().unwrap();
        let rel = ctx.drawing_rels().unwrap().get(h_id).unwrap();
        assert_eq!(rel.reltype(), rt::HYPERLINK);
        assert!(rel.is_external());
        assert_eq!(rel.target_ref(), "https://example.com/docs");
        assert_eq!(picture.hyperlink(), Some(&link));

        let click = ctx
            .shapes()
            .get(picture.shape_id())
            .unwrap()
            .pic()
            .hlink_click()
            .unwrap()
            .clone();
        assert_eq!(click.r_id(), h_id);
        assert_eq!(click.tooltip(), Some("Docs"));

        let h_id = h_id.to_string();
        picture.delete(&mut ctx).unwrap();
        assert!(ctx.drawing_rels().unwrap().get(&h_id).is_none());
    }

    #[test]
    fn test_plain_hyperlink_has_no_tooltip() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();

        let picture = PictureResource::from_image(
            &mut ctx,
            solid_rgb(2, 2, [1, 1, 1]),
            Some(HyperlinkTarget::external("https://example.com")),
        )
        .unwrap();
        let anchor = ctx.shapes().get(picture.shape_id()).unwrap();
        assert_eq!(anchor.pic().hlink_click().unwrap().tooltip(), None);
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let err = PictureResource::from_image(&mut ctx, solid_rgb(0, 0, [0, 0, 0]), None).unwrap_err();
        assert!(matches!(err, PictureError::InvalidArgument(_)));
        assert!(ctx.shapes().is_empty());
        assert_eq!(media_parts(&ctx), 0);
    }

    #[test]
    fn test_encode_failure_changes_nothing() {
        let mut fx = Fixture::new();
        let mut picture = {
            let mut ctx = fx.ctx();
            PictureResource::from_image(&mut ctx, solid_rgb(6, 6, [7, 7, 7]), None).unwrap()
        };
        let before = (picture.relationship_id().to_string(), picture.hash().clone());

        let broken = BrokenEncoder;
        let mut ctx = fx.ctx_with(&broken);
        let err = picture
            .replace_image(&mut ctx, solid_rgb(12, 12, [1, 1, 1]))
            .unwrap_err();
        assert!(matches!(err, PictureError::Encode(_)));
        assert_eq!(picture.relationship_id(), before.0);
        assert_eq!(picture.hash(), &before.1);
        assert_eq!((picture.width(), picture.height()), (6, 6));
        assert_eq!(ctx.shapes().get(picture.shape_id()).unwrap().pic().embed(), before.0);
        assert_eq!(media_parts(&ctx), 1);

        let err = PictureResource::from_image(&mut ctx, solid_rgb(3, 3, [3, 3, 3]), None).unwrap_err();
        assert!(matches!(err, PictureError::Encode(_)));
        assert_eq!(ctx.shapes().len(), 1);
    }

    #[test]
    fn test_from_file_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".xyz").tempfile().unwrap();
        let png = RasterCodec.encode(&solid_rgb(5, 7, [1, 2, 3]), CodecFormat::Png, 100).unwrap();
        file.write_all(&png).unwrap();

        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let picture = PictureResource::from_file(&mut ctx, file.path(), None).unwrap();

        assert_eq!(picture.content_type(), "image/jpeg");
        assert_eq!((picture.width(), picture.height()), (5, 7));
        assert!(picture.image_bytes().starts_with(&[0xFF, 0xD8]));

        let rel = ctx.drawing_rels().unwrap().get(picture.relationship_id()).unwrap();
        let media = rel.target_partname().unwrap();
        assert_eq!(media.ext(), "xyz");
        assert_eq!(ctx.package().get_part(&media).unwrap().content_type(), "image/jpeg");
    }

    #[test]
    fn test_from_file_keeps_native_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badge.png");
        let png = RasterCodec
            .encode(&solid_rgba(4, 4, [1, 2, 3, 128]), CodecFormat::Png, 100)
            .unwrap();
        std::fs::write(&path, &png).unwrap();

        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let first = PictureResource::from_file(&mut ctx, &path, None).unwrap();
        let second = PictureResource::from_file(&mut ctx, &path, None).unwrap();

        assert_eq!(first.content_type(), "image/png");
        assert_eq!(first.relationship_id(), second.relationship_id());
        let rel = ctx.drawing_rels().unwrap().get(first.relationship_id()).unwrap();
        assert_eq!(rel.target_ref(), "../media/badge.png");
        assert_eq!(media_parts(&ctx), 1);
    }

    #[test]
    fn test_from_file_renames_for_stored_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tif");
        let png = RasterCodec.encode(&solid_rgb(3, 3, [9, 8, 7]), CodecFormat::Png, 100).unwrap();
        std::fs::write(&path, &png).unwrap();

        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let picture = PictureResource::from_file(&mut ctx, &path, None).unwrap();

        assert_eq!(picture.content_type(), "image/jpeg");
        let rel = ctx.drawing_rels().unwrap().get(picture.relationship_id()).unwrap();
        assert_eq!(rel.target_ref(), "../media/scan.jpeg");
    }

    #[test]
    fn test_from_file_failures_are_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("broken.png");
        std::fs::write(&garbage, b"definitely not a png").unwrap();

        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();

        let err = PictureResource::from_file(&mut ctx, &garbage, None).unwrap_err();
        assert!(matches!(err, PictureError::Decode(_)));

        let err = PictureResource::from_file(&mut ctx, dir.path().join("missing.png"), None).unwrap_err();
        assert!(matches!(err, PictureError::Io(_)));

        assert!(ctx.shapes().is_empty());
        assert!(ctx.store().is_empty());
        assert!(ctx.drawing_rels().unwrap().is_empty());
        assert_eq!(ctx.package().part_count(), 1);
    }

    fn existing_drawing(fx: &mut Fixture, hlink: &str, extent: (i64, i64)) {
        let png = RasterCodec.encode(&solid_rgb(12, 6, [40, 50, 60]), CodecFormat::Png, 100).unwrap();
        fx.package
            .load_part(PackURI::new("/xl/media/image1.png").unwrap(), ct::PNG, png)
            .unwrap();

        let drawing = PackURI::new(DRAWING).unwrap();
        let rels = fx.package.get_part_mut(&drawing).unwrap().rels_mut();
        rels.add_relationship(rt::IMAGE.to_string(), "../media/image1.png".to_string(), "rId1".to_string(), false);
        rels.add_relationship(rt::HYPERLINK.to_string(), hlink.to_string(), "rId2".to_string(), true);

        let mut pic = AnchorFragmentBuilder::new(2)
            .name("Picture 1")
            .hyperlink_click("rId2", Some("Open".to_string()))
            .build("rId1")
            .unwrap();
        pic.set_extent(extent.0, extent.1);
        fx.shapes.insert(PictureAnchor::one_cell(CellMarker::new(1, 1), pic));
    }

    #[test]
    fn test_from_existing_absolute_hyperlink() {
        let mut fx = Fixture::new();
        existing_drawing(&mut fx, "https://example.com/", (0, 0));
        let mut ctx = fx.ctx();

        let picture = PictureResource::from_existing(&mut ctx, 2).unwrap();
        assert_eq!(picture.relationship_id(), "rId1");
        assert_eq!(picture.content_type(), "image/png");
        assert_eq!(picture.native_size(), (12, 6));
        assert_eq!((picture.width(), picture.height()), (12, 6));
        assert_eq!(ctx.shapes().get(2).unwrap().pixel_size(), (12, 6));

        let link = picture.hyperlink().unwrap();
        assert!(!link.is_relative());
        assert_eq!(link.address(), "https://example.com/");
        assert_eq!(link.tooltip(), Some("Open"));
        assert_eq!(picture.hyperlink_relationship_id(), Some("rId2"));

        // hash comes from the JPEG normalisation, not the stored PNG bytes
        assert_ne!(picture.hash(), &ContentHash::of(picture.image_bytes()));
        assert_eq!(ctx.store().lookup(picture.hash()), Some("rId1"));
        assert_eq!(ctx.drawing_rels().unwrap().len(), 2);
    }

    #[test]
    fn test_from_existing_relative_hyperlink_keeps_extent() {
        let mut fx = Fixture::new();
        existing_drawing(&mut fx, "../docs/readme.html", (95_250 * 3, 95_250 * 2));
        let mut ctx = fx.ctx();

        let picture = PictureResource::from_existing(&mut ctx, 2).unwrap();
        assert!(picture.hyperlink().unwrap().is_relative());
        assert_eq!((picture.width(), picture.height()), (30, 20));
        assert_eq!(picture.native_size(), (12, 6));
    }

    #[test]
    fn test_from_existing_errors() {
        let mut fx = Fixture::new();
        existing_drawing(&mut fx, "https://example.com/", (0, 0));
        fx.package.remove_part(&PackURI::new("/xl/media/image1.png").unwrap());
        let mut ctx = fx.ctx();

        assert!(matches!(
            PictureResource::from_existing(&mut ctx, 9),
            Err(PictureError::ShapeNotFound(9))
        ));
        match PictureResource::from_existing(&mut ctx, 2) {
            Err(PictureError::RelationshipResolution { r_id, .. }) => assert_eq!(r_id, "rId1"),
            other => panic!("unexpected result {:?}", other.map(|p| p.shape_id())),
        }
        assert!(ctx.store().is_empty());
    }

    #[test]
    fn test_existing_then_insert_dedups() {
        let mut fx = Fixture::new();
        existing_drawing(&mut fx, "https://example.com/", (0, 0));
        let mut ctx = fx.ctx();
        let loaded = PictureResource::from_existing(&mut ctx, 2).unwrap();
        assert_eq!(ctx.store().ref_count(loaded.hash()), 1);

        let inserted = PictureResource::from_image(&mut ctx, solid_rgb(12, 6, [40, 50, 60]), None).unwrap();
        // inserted pictures hash their PNG bytes, so they do not collide with the normalised hash
        assert_ne!(inserted.relationship_id(), "rId1");

        loaded.delete(&mut ctx).unwrap();
        assert!(!ctx.package().contains_part(&PackURI::new("/xl/media/image1.png").unwrap()));
        assert!(ctx.drawing_rels().unwrap().get("rId2").is_none());
    }

    #[test]
    fn test_resize_loaded_two_cell_picture() {
        let mut fx = Fixture::new();
        let png = RasterCodec.encode(&solid_rgb(40, 20, [1, 1, 1]), CodecFormat::Png, 100).unwrap();
        fx.package
            .load_part(PackURI::new("/xl/media/image1.png").unwrap(), ct::PNG, png)
            .unwrap();
        fx.package
            .get_part_mut(&PackURI::new(DRAWING).unwrap())
            .unwrap()
            .rels_mut()
            .add_relationship(rt::IMAGE.to_string(), "../media/image1.png".to_string(), "rId1".to_string(), false);
        fx.shapes = ShapeTree::from_xml(
            concat!(
                r#"<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                r#"<xdr:twoCellAnchor editAs="oneCell">"#,
                r#"<xdr:from><xdr:col>2</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>3</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>"#,
                r#"<xdr:to><xdr:col>9</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>9</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>"#,
                r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="2" name="Picture 1"/><xdr:cNvPicPr/></xdr:nvPicPr>"#,
                r#"<xdr:blipFill><a:blip r:embed="rId1"/></xdr:blipFill>"#,
                r#"<xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="381000" cy="190500"/></a:xfrm></xdr:spPr>"#,
                r#"</xdr:pic><xdr:clientData/></xdr:twoCellAnchor></xdr:wsDr>"#
            )
            .as_bytes(),
        )
        .unwrap();

        let mut ctx = fx.ctx();
        let mut picture = PictureResource::from_existing(&mut ctx, 2).unwrap();
        picture.resize_by_percent(&mut ctx, 50).unwrap();
        ctx.flush().unwrap();

        let part = ctx.package().get_part(ctx.drawing_uri()).unwrap();
        let xml = std::str::from_utf8(part.blob()).unwrap();
        assert!(xml.contains(
            r#"<xdr:oneCellAnchor><xdr:from><xdr:col>2</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>3</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from><xdr:ext cx="190500" cy="95250"/>"#
        ));
        assert!(!xml.contains("xdr:to"));
        assert!(!xml.contains("twoCellAnchor"));
    }

    #[test]
    fn test_media_file_name() {
        assert_eq!(media_file_name(Path::new("/tmp/a.PNG"), "image/png").as_deref(), Some("a.PNG"));
        assert_eq!(media_file_name(Path::new("/tmp/a.jpg"), "image/jpeg").as_deref(), Some("a.jpg"));
        assert_eq!(media_file_name(Path::new("/tmp/a.gif"), "image/png").as_deref(), Some("a.png"));
        assert_eq!(media_file_name(Path::new("/tmp/noext"), "image/bmp").as_deref(), Some("noext.bmp"));
    }

    proptest! {
        #[test]
        fn prop_resize_composes_from_native(w in 1u32..2000, h in 1u32..2000, p1 in 1i32..400, p2 in 1i32..400) {
            let mut fx = Fixture::new();
            let mut ctx = fx.ctx();
            let mut picture = PictureResource::from_image(&mut ctx, solid_rgb(1, 1, [0, 0, 0]), None).unwrap();
            picture.native_size = (w, h);

            picture.resize_by_percent(&mut ctx, p1).unwrap();
            picture.resize_by_percent(&mut ctx, p2).unwrap();
            let composed = (picture.width(), picture.height());

            picture.resize_by_percent(&mut ctx, p2).unwrap();
            prop_assert_eq!(composed, (picture.width(), picture.height()));

            picture.resize_by_percent(&mut ctx, 100).unwrap();
            prop_assert_eq!((picture.width(), picture.height()), (w, h));
        }
    }
}
