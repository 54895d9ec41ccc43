//! Picture anchor markup.
//!
//! A picture shape is an `xdr:pic` subtree wrapped in a cell anchor. The
//! subtree is assembled by [`AnchorFragmentBuilder`], which only hands out a
//! [`PicFragment`] once the embed relationship id is known; a fragment with
//! an empty `r:embed` never exists.
//!
//! Anchors read from a document keep their source markup. Writing one back
//! copies that markup and rewrites only the embed reference and the size.

use std::fmt;
use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use crate::ooxml::drawings::blip::{write_a_blip_embed, write_a_stretch_fill_rect};
use crate::ooxml::drawings::error::{PictureError, Result};
use crate::ooxml::drawings::xfrm::{write_a_prst_geom_rect, write_a_xfrm_off_ext};
use crate::ooxml::opc::constants::namespace;

/// EMUs per pixel at 96 DPI (914400 / 96).
pub const EMU_PER_PIXEL: i64 = 9525;

#[inline]
pub fn px_to_emu(px: u32) -> i64 {
    px as i64 * EMU_PER_PIXEL
}

#[inline]
pub fn emu_to_px(emu: i64) -> u32 {
    u32::try_from(emu.max(0) / EMU_PER_PIXEL).unwrap_or(u32::MAX)
}

/// `a:hlinkClick` reference inside `xdr:cNvPr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlinkClick {
    r_id: String,
    tooltip: Option<String>,
}

impl HlinkClick {
    pub fn new(r_id: impl Into<String>, tooltip: Option<String>) -> Self {
        Self {
            r_id: r_id.into(),
            tooltip,
        }
    }

    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }
}

/// The `xdr:pic` subtree of a picture shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PicFragment {
    id: u32,
    name: String,
    descr: String,
    hlink_click: Option<HlinkClick>,
    embed: String,
    cx: i64,
    cy: i64,
}

impl PicFragment {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.descr
    }

    pub fn hlink_click(&self) -> Option<&HlinkClick> {
        self.hlink_click.as_ref()
    }

    /// Relationship id in `a:blip/@r:embed`.
    pub fn embed(&self) -> &str {
        &self.embed
    }

    /// Transform extent in EMUs.
    pub fn extent(&self) -> (i64, i64) {
        (self.cx, self.cy)
    }

    pub(crate) fn set_embed(&mut self, r_id: &str) {
        self.embed.clear();
        self.embed.push_str(r_id);
    }

    pub(crate) fn set_extent(&mut self, cx: i64, cy: i64) {
        self.cx = cx;
        self.cy = cy;
    }

    pub fn write_xml(&self, xml: &mut String) -> fmt::Result {
        xml.push_str("<xdr:pic><xdr:nvPicPr>");
        write!(
            xml,
            r#"<xdr:cNvPr id="{}" name="{}" descr="{}""#,
            self.id,
            escape(&self.name),
            escape(&self.descr)
        )?;
        match &self.hlink_click {
            None => xml.push_str("/>"),
            Some(click) => {
                xml.push('>');
                write!(
                    xml,
                    r#"<a:hlinkClick xmlns:r="{}" r:id="{}""#,
                    namespace::OFC_RELATIONSHIPS,
                    click.r_id
                )?;
                if let Some(tooltip) = &click.tooltip {
                    write!(xml, r#" tooltip="{}""#, escape(tooltip))?;
                }
                xml.push_str("/></xdr:cNvPr>");
            },
        }
        xml.push_str(r#"<xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr>"#);

        xml.push_str("<xdr:blipFill>");
        write_a_blip_embed(xml, &self.embed)?;
        write_a_stretch_fill_rect(xml);
        xml.push_str("</xdr:blipFill>");

        xml.push_str("<xdr:spPr>");
        write_a_xfrm_off_ext(xml, 0, 0, self.cx, self.cy)?;
        write_a_prst_geom_rect(xml);
        xml.push_str("</xdr:spPr></xdr:pic>");
        Ok(())
    }
}

/// Collects everything in a picture shape except the embed reference.
#[derive(Debug, Clone)]
pub struct AnchorFragmentBuilder {
    id: u32,
    name: String,
    descr: String,
    hlink_click: Option<HlinkClick>,
}

impl AnchorFragmentBuilder {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: String::new(),
            descr: String::new(),
            hlink_click: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, descr: impl Into<String>) -> Self {
        self.descr = descr.into();
        self
    }

    pub fn hyperlink_click(mut self, r_id: impl Into<String>, tooltip: Option<String>) -> Self {
        self.hlink_click = Some(HlinkClick::new(r_id, tooltip));
        self
    }

    /// Finish the fragment with its embed relationship id.
    ///
    /// The transform extent starts at zero; geometry is applied afterwards.
    pub fn build(self, embed: &str) -> Result<PicFragment> {
        if embed.is_empty() {
            return Err(PictureError::InvalidArgument(
                "picture embed relationship id is empty".to_string(),
            ));
        }
        Ok(PicFragment {
            id: self.id,
            name: self.name,
            descr: self.descr,
            hlink_click: self.hlink_click,
            embed: embed.to_string(),
            cx: 0,
            cy: 0,
        })
    }
}

/// Cell position of an anchor corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellMarker {
    pub col: u32,
    pub col_off: i64,
    pub row: u32,
    pub row_off: i64,
}

impl CellMarker {
    pub fn new(col: u32, row: u32) -> Self {
        Self {
            col,
            row,
            ..Self::default()
        }
    }

    fn write_xml(&self, xml: &mut String, tag: &str) -> fmt::Result {
        write!(
            xml,
            "<xdr:{tag}><xdr:col>{}</xdr:col><xdr:colOff>{}</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>{}</xdr:rowOff></xdr:{tag}>",
            self.col, self.col_off, self.row, self.row_off
        )
    }
}

/// How the anchor ties the picture to the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorKind {
    /// Top-left corner in a cell, size given by `xdr:ext`.
    OneCell,
    /// Both corners in cells, as read from existing documents.
    TwoCell {
        to: CellMarker,
        edit_as: Option<String>,
    },
}

/// A picture anchor node in a drawing's shape tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureAnchor {
    from: CellMarker,
    kind: AnchorKind,
    pic: PicFragment,
    /// Markup the anchor was read from
    source: Option<String>,
}

impl PictureAnchor {
    pub fn one_cell(from: CellMarker, pic: PicFragment) -> Self {
        Self {
            from,
            kind: AnchorKind::OneCell,
            pic,
            source: None,
        }
    }

    pub fn two_cell(from: CellMarker, to: CellMarker, edit_as: Option<String>, pic: PicFragment) -> Self {
        Self {
            from,
            kind: AnchorKind::TwoCell { to, edit_as },
            pic,
            source: None,
        }
    }

    /// Attach the markup this anchor was parsed from.
    pub(crate) fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn id(&self) -> u32 {
        self.pic.id
    }

    pub fn from(&self) -> CellMarker {
        self.from
    }

    pub fn kind(&self) -> &AnchorKind {
        &self.kind
    }

    pub fn pic(&self) -> &PicFragment {
        &self.pic
    }

    pub(crate) fn pic_mut(&mut self) -> &mut PicFragment {
        &mut self.pic
    }

    /// Displayed size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (emu_to_px(self.pic.cx), emu_to_px(self.pic.cy))
    }

    /// Set the displayed size, one image pixel per layout pixel.
    ///
    /// A two-cell anchor becomes a one-cell anchor at the same top-left
    /// corner; its bottom-right marker would otherwise keep the old size.
    pub(crate) fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.pic.set_extent(px_to_emu(width), px_to_emu(height));
        if matches!(self.kind, AnchorKind::TwoCell { .. }) {
            self.kind = AnchorKind::OneCell;
        }
    }

    pub fn write_xml(&self, xml: &mut String) -> Result<()> {
        if let Some(source) = &self.source {
            return self.write_patched(source, xml);
        }
        match &self.kind {
            AnchorKind::OneCell => {
                xml.push_str("<xdr:oneCellAnchor>");
                self.from.write_xml(xml, "from")?;
                write!(xml, r#"<xdr:ext cx="{}" cy="{}"/>"#, self.pic.cx, self.pic.cy)?;
                self.pic.write_xml(xml)?;
                xml.push_str("<xdr:clientData/></xdr:oneCellAnchor>");
            },
            AnchorKind::TwoCell { to, edit_as } => {
                match edit_as {
                    Some(edit_as) => write!(xml, r#"<xdr:twoCellAnchor editAs="{}">"#, escape(edit_as))?,
                    None => xml.push_str("<xdr:twoCellAnchor>"),
                }
                self.from.write_xml(xml, "from")?;
                to.write_xml(xml, "to")?;
                self.pic.write_xml(xml)?;
                xml.push_str("<xdr:clientData/></xdr:twoCellAnchor>");
            },
        }
        Ok(())
    }

    /// Copy the source markup, with the current embed and extent patched in.
    ///
    /// A two-cell source that has become one-cell drops `xdr:to` and gains
    /// an `xdr:ext` right after `xdr:from`.
    fn write_patched(&self, source: &str, xml: &mut String) -> Result<()> {
        let mut reader = Reader::from_str(source);
        let one_cell = matches!(self.kind, AnchorKind::OneCell);
        let (cx, cy) = (self.pic.cx.to_string(), self.pic.cy.to_string());
        let size = [("cx", cx.as_str()), ("cy", cy.as_str())];
        let embed = [("embed", self.pic.embed())];

        let mut depth = 0usize;
        let mut collapse = false;
        let mut skip_depth: Option<usize> = None;
        let mut in_pic = false;
        let mut in_xfrm = false;

        loop {
            let start = reader.buffer_position() as usize;
            let event = reader.read_event()?;
            let end = reader.buffer_position() as usize;
            let raw = source
                .get(start..end)
                .ok_or_else(|| PictureError::Xml("anchor markup split inside a character".to_string()))?;

            match event {
                Event::Eof => break,
                Event::Start(e) => {
                    depth += 1;
                    if skip_depth.is_some() {
                        continue;
                    }
                    match e.local_name().as_ref() {
                        b"twoCellAnchor" if depth == 1 && one_cell => {
                            collapse = true;
                            write!(xml, "<{}>", renamed(e.name().as_ref(), "oneCellAnchor")?)?;
                        },
                        b"to" if depth == 2 && collapse => skip_depth = Some(depth),
                        b"blip" if in_pic => write_patched_tag(xml, &e, &embed, false)?,
                        local => {
                            match local {
                                b"pic" => in_pic = true,
                                b"xfrm" if in_pic => in_xfrm = true,
                                _ => {},
                            }
                            xml.push_str(raw);
                        },
                    }
                },
                Event::Empty(e) => {
                    if skip_depth.is_some() {
                        continue;
                    }
                    match e.local_name().as_ref() {
                        b"ext" if depth == 1 || in_xfrm => write_patched_tag(xml, &e, &size, true)?,
                        b"blip" if in_pic => write_patched_tag(xml, &e, &embed, true)?,
                        b"to" if depth == 1 && collapse => {},
                        _ => xml.push_str(raw),
                    }
                },
                Event::End(e) => {
                    if let Some(level) = skip_depth {
                        if depth == level {
                            skip_depth = None;
                        }
                        depth = depth.saturating_sub(1);
                        continue;
                    }
                    match e.local_name().as_ref() {
                        b"twoCellAnchor" if depth == 1 && collapse => {
                            write!(xml, "</{}>", renamed(e.name().as_ref(), "oneCellAnchor")?)?;
                        },
                        b"from" if depth == 2 && collapse => {
                            xml.push_str(raw);
                            write!(
                                xml,
                                r#"<{} cx="{}" cy="{}"/>"#,
                                renamed(e.name().as_ref(), "ext")?,
                                cx,
                                cy
                            )?;
                        },
                        local => {
                            match local {
                                b"pic" => in_pic = false,
                                b"xfrm" => in_xfrm = false,
                                _ => {},
                            }
                            xml.push_str(raw);
                        },
                    }
                    depth = depth.saturating_sub(1);
                },
                _ => {
                    if skip_depth.is_none() {
                        xml.push_str(raw);
                    }
                },
            }
        }
        Ok(())
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| PictureError::Xml(e.to_string()))
}

/// `qname` with its local part swapped for `local`, prefix kept.
fn renamed(qname: &[u8], local: &str) -> Result<String> {
    Ok(match utf8(qname)?.split_once(':') {
        Some((prefix, _)) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    })
}

/// Write a start tag with some attribute values replaced, others as read.
fn write_patched_tag(
    xml: &mut String,
    e: &BytesStart<'_>,
    values: &[(&str, &str)],
    empty: bool,
) -> Result<()> {
    xml.push('<');
    xml.push_str(utf8(e.name().as_ref())?);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| PictureError::Xml(err.to_string()))?;
        let key = utf8(attr.key.as_ref())?;
        let local = attr.key.local_name();
        match values.iter().find(|(name, _)| name.as_bytes() == local.as_ref()) {
            Some((_, value)) => write!(xml, r#" {}="{}""#, key, escape(*value))?,
            None => write!(xml, r#" {}="{}""#, key, utf8(&attr.value)?.replace('"', "&quot;"))?,
        }
    }
    xml.push_str(if empty { "/>" } else { ">" });
    Ok(())
}
