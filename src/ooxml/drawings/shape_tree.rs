//! The shapes of one drawing part.
//!
//! Picture anchors are modelled: one-cell and two-cell anchors that contain
//! an `xdr:pic` with an embed reference. Every other top-level element of
//! `xdr:wsDr` (charts, shapes, groups, absolute anchors) is kept as read and
//! written back unchanged, in document order.

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::ooxml::drawings::anchor::{AnchorFragmentBuilder, CellMarker, PictureAnchor};
use crate::ooxml::drawings::blip::read_blip_embed_attr;
use crate::ooxml::drawings::error::{PictureError, Result};
use crate::ooxml::opc::constants::namespace;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShapeNode {
    Picture(PictureAnchor),
    /// Any other top-level element, with the shape ids and relationship ids
    /// found inside it.
    Verbatim {
        markup: String,
        shape_ids: Vec<u32>,
        rel_ids: Vec<String>,
    },
}

/// Opening tag of the `xdr:wsDr` root as read, namespace declarations included.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RootTag {
    start: String,
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShapeTree {
    root: Option<RootTag>,
    nodes: Vec<ShapeNode>,
}

impl ShapeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a drawing part.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut tree = ShapeTree::new();
        let mut depth = 0usize;
        let mut node: Option<NodeDraft> = None;

        loop {
            let start = reader.buffer_position() as usize;
            let event = reader.read_event()?;
            let end = reader.buffer_position() as usize;

            match event {
                Event::Start(e) => {
                    depth += 1;
                    match depth {
                        1 => {
                            tree.root = Some(RootTag {
                                start: span(xml, start, end)?.to_string(),
                                name: utf8(e.name().as_ref())?.to_string(),
                            })
                        },
                        2 => node = Some(NodeDraft::open(&e, start)?),
                        _ => {},
                    }
                    if let Some(node) = node.as_mut() {
                        node.open_element(&e)?;
                    }
                },
                Event::Empty(e) => {
                    if depth == 1 {
                        let mut top = NodeDraft::open(&e, start)?;
                        top.open_element(&e)?;
                        tree.nodes.push(top.finish(xml, end)?);
                    } else if let Some(node) = node.as_mut() {
                        node.open_element(&e)?;
                        node.close_element(e.local_name().as_ref());
                    }
                },
                Event::Text(text) => {
                    if let Some(node) = node.as_mut() {
                        let raw: &[u8] = &text;
                        node.set_text(raw)?;
                    }
                },
                Event::End(e) => {
                    if depth == 2 {
                        if let Some(top) = node.take() {
                            tree.nodes.push(top.finish(xml, end)?);
                        }
                    } else if let Some(node) = node.as_mut() {
                        node.close_element(e.local_name().as_ref());
                    }
                    depth = depth.saturating_sub(1);
                },
                Event::Eof => break,
                _ => {},
            }
        }

        Ok(tree)
    }

    /// Serialize as a complete `xdr:wsDr` drawing part.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(512 + self.nodes.len() * 1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        match &self.root {
            Some(root) => xml.push_str(&root.start),
            None => write!(
                xml,
                r#"<xdr:wsDr xmlns:xdr="{}" xmlns:a="{}">"#,
                namespace::DML_SPREADSHEET_DRAWING,
                namespace::DML_MAIN
            )?,
        }
        for node in &self.nodes {
            match node {
                ShapeNode::Picture(anchor) => anchor.write_xml(&mut xml)?,
                ShapeNode::Verbatim { markup, .. } => xml.push_str(markup),
            }
        }
        let root_name = self.root.as_ref().map_or("xdr:wsDr", |root| root.name.as_str());
        write!(xml, "</{}>", root_name)?;
        Ok(xml)
    }

    /// Smallest id above every shape id in the part, pictures or not.
    pub fn next_shape_id(&self) -> u32 {
        self.nodes
            .iter()
            .flat_map(|node| match node {
                ShapeNode::Picture(anchor) => vec![anchor.id()],
                ShapeNode::Verbatim { shape_ids, .. } => shape_ids.clone(),
            })
            .max()
            .unwrap_or(0)
            .saturating_add(1)
    }

    pub fn insert(&mut self, anchor: PictureAnchor) {
        self.nodes.push(ShapeNode::Picture(anchor));
    }

    pub fn get(&self, id: u32) -> Option<&PictureAnchor> {
        self.iter().find(|anchor| anchor.id() == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut PictureAnchor> {
        self.nodes.iter_mut().find_map(|node| match node {
            ShapeNode::Picture(anchor) if anchor.id() == id => Some(anchor),
            _ => None,
        })
    }

    pub fn remove(&mut self, id: u32) -> Option<PictureAnchor> {
        self.take(id).map(|(_, anchor)| anchor)
    }

    /// Remove a picture, returning its position for [`ShapeTree::restore`].
    pub(crate) fn take(&mut self, id: u32) -> Option<(usize, PictureAnchor)> {
        let index = self
            .nodes
            .iter()
            .position(|node| matches!(node, ShapeNode::Picture(anchor) if anchor.id() == id))?;
        match self.nodes.remove(index) {
            ShapeNode::Picture(anchor) => Some((index, anchor)),
            ShapeNode::Verbatim { .. } => None,
        }
    }

    /// Put a picture back where [`ShapeTree::take`] found it.
    pub(crate) fn restore(&mut self, index: usize, anchor: PictureAnchor) {
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, ShapeNode::Picture(anchor));
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    /// Number of shapes that reference `r_id`, as embed or hyperlink.
    pub fn relationship_uses(&self, r_id: &str) -> usize {
        self.nodes
            .iter()
            .filter(|node| match node {
                ShapeNode::Picture(anchor) => {
                    let pic = anchor.pic();
                    pic.embed() == r_id || pic.hlink_click().is_some_and(|click| click.r_id() == r_id)
                },
                ShapeNode::Verbatim { rel_ids, .. } => rel_ids.iter().any(|id| id == r_id),
            })
            .count()
    }

    /// Whether any shape still uses the image behind `r_id`.
    pub fn embeds_relationship(&self, r_id: &str) -> bool {
        self.nodes.iter().any(|node| match node {
            ShapeNode::Picture(anchor) => anchor.pic().embed() == r_id,
            ShapeNode::Verbatim { rel_ids, .. } => rel_ids.iter().any(|id| id == r_id),
        })
    }

    /// Picture anchors in document order.
    pub fn iter(&self) -> impl Iterator<Item = &PictureAnchor> {
        self.nodes.iter().filter_map(|node| match node {
            ShapeNode::Picture(anchor) => Some(anchor),
            ShapeNode::Verbatim { .. } => None,
        })
    }

    /// Number of pictures.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Number of top-level elements kept as read.
    pub fn verbatim_len(&self) -> usize {
        self.nodes.len() - self.len()
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| PictureError::Xml(e.to_string()))
}

fn span(xml: &[u8], start: usize, end: usize) -> Result<&str> {
    let bytes = xml
        .get(start..end)
        .ok_or_else(|| PictureError::Xml(format!("markup span {}..{} out of range", start, end)))?;
    Ok(utf8(bytes)?.trim())
}

/// Top-level element being read.
struct NodeDraft {
    start: usize,
    shape_ids: Vec<u32>,
    rel_ids: Vec<String>,
    anchor: Option<AnchorDraft>,
}

impl NodeDraft {
    fn open(e: &BytesStart<'_>, start: usize) -> Result<Self> {
        let anchor = match e.local_name().as_ref() {
            b"oneCellAnchor" => Some(AnchorDraft::default()),
            b"twoCellAnchor" => Some(AnchorDraft {
                two_cell: true,
                edit_as: attr_value(e, b"editAs")?,
                ..AnchorDraft::default()
            }),
            _ => None,
        };
        Ok(Self {
            start,
            shape_ids: Vec::new(),
            rel_ids: Vec::new(),
            anchor,
        })
    }

    fn open_element(&mut self, e: &BytesStart<'_>) -> Result<()> {
        if e.local_name().as_ref() == b"cNvPr"
            && let Some(id) = attr_value(e, b"id")?.and_then(|id| id.parse().ok())
        {
            self.shape_ids.push(id);
        }
        for attr in e.attributes().flatten() {
            let relationship_ref = attr.key.prefix().is_some()
                && matches!(attr.key.local_name().as_ref(), b"embed" | b"link" | b"id");
            if relationship_ref {
                self.rel_ids.push(String::from_utf8_lossy(&attr.value).into_owned());
            }
        }
        if let Some(anchor) = self.anchor.as_mut() {
            anchor.open_element(e)?;
        }
        Ok(())
    }

    fn close_element(&mut self, name: &[u8]) {
        if let Some(anchor) = self.anchor.as_mut() {
            anchor.close_element(name);
        }
    }

    fn set_text(&mut self, raw: &[u8]) -> Result<()> {
        match self.anchor.as_mut() {
            Some(anchor) => anchor.set_marker_value(raw),
            None => Ok(()),
        }
    }

    fn finish(self, xml: &[u8], end: usize) -> Result<ShapeNode> {
        let markup = span(xml, self.start, end)?;
        if let Some(anchor) = self.anchor.map(AnchorDraft::finish).transpose()?.flatten() {
            return Ok(ShapeNode::Picture(anchor.with_source(markup)));
        }
        Ok(ShapeNode::Verbatim {
            markup: markup.to_string(),
            shape_ids: self.shape_ids,
            rel_ids: self.rel_ids,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerSlot {
    From,
    To,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerField {
    Col,
    ColOff,
    Row,
    RowOff,
}

/// Anchor being read, before we know whether it holds a picture.
#[derive(Debug, Default)]
struct AnchorDraft {
    two_cell: bool,
    edit_as: Option<String>,
    from: CellMarker,
    to: CellMarker,
    slot: Option<MarkerSlot>,
    field: Option<MarkerField>,
    in_pic: bool,
    saw_pic: bool,
    id: u32,
    name: String,
    descr: String,
    hlink: Option<(String, Option<String>)>,
    embed: Option<String>,
    pic_extent: (i64, i64),
    anchor_extent: (i64, i64),
}

impl AnchorDraft {
    fn set_marker_value(&mut self, raw: &[u8]) -> Result<()> {
        let (Some(slot), Some(field)) = (self.slot, self.field) else {
            return Ok(());
        };
        let value = atoi_simd::parse::<i64>(raw.trim_ascii()).map_err(|_| {
            PictureError::Xml(format!(
                "invalid anchor marker value '{}'",
                String::from_utf8_lossy(raw)
            ))
        })?;

        let marker = match slot {
            MarkerSlot::From => &mut self.from,
            MarkerSlot::To => &mut self.to,
        };
        match field {
            MarkerField::Col => marker.col = value.max(0) as u32,
            MarkerField::ColOff => marker.col_off = value,
            MarkerField::Row => marker.row = value.max(0) as u32,
            MarkerField::RowOff => marker.row_off = value,
        }
        Ok(())
    }

    fn finish(self) -> Result<Option<PictureAnchor>> {
        if !self.saw_pic {
            return Ok(None);
        }
        let Some(embed) = self.embed.filter(|embed| !embed.is_empty()) else {
            debug!(shape_id = self.id, "keeping picture without an embed reference as read");
            return Ok(None);
        };

        let mut builder = AnchorFragmentBuilder::new(self.id)
            .name(self.name)
            .description(self.descr);
        if let Some((r_id, tooltip)) = self.hlink {
            builder = builder.hyperlink_click(r_id, tooltip);
        }
        let mut pic = builder.build(&embed)?;

        // One-cell anchors carry their size on the anchor; prefer the transform.
        let (cx, cy) = if self.pic_extent != (0, 0) {
            self.pic_extent
        } else {
            self.anchor_extent
        };
        pic.set_extent(cx, cy);

        Ok(Some(if self.two_cell {
            PictureAnchor::two_cell(self.from, self.to, self.edit_as, pic)
        } else {
            PictureAnchor::one_cell(self.from, pic)
        }))
    }
}

fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == local {
            let value = attr
                .unescape_value()
                .map_err(|e| PictureError::Xml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn extent_attrs(e: &BytesStart<'_>) -> Result<Option<(i64, i64)>> {
    let (Some(cx), Some(cy)) = (attr_value(e, b"cx")?, attr_value(e, b"cy")?) else {
        return Ok(None);
    };
    let parse = |v: &str| {
        atoi_simd::parse::<i64>(v.as_bytes()).map_err(|_| PictureError::Xml(format!("invalid extent '{}'", v)))
    };
    Ok(Some((parse(&cx)?, parse(&cy)?)))
}

impl AnchorDraft {
    fn open_element(&mut self, e: &BytesStart<'_>) -> Result<()> {
        match e.local_name().as_ref() {
            b"from" => self.slot = Some(MarkerSlot::From),
            b"to" => self.slot = Some(MarkerSlot::To),
            b"col" => self.field = Some(MarkerField::Col),
            b"colOff" => self.field = Some(MarkerField::ColOff),
            b"row" => self.field = Some(MarkerField::Row),
            b"rowOff" => self.field = Some(MarkerField::RowOff),
            b"pic" => {
                self.in_pic = true;
                self.saw_pic = true;
            },
            b"cNvPr" if self.in_pic => {
                self.id = attr_value(e, b"id")?
                    .and_then(|id| id.parse().ok())
                    .unwrap_or_default();
                self.name = attr_value(e, b"name")?.unwrap_or_default();
                self.descr = attr_value(e, b"descr")?.unwrap_or_default();
            },
            b"hlinkClick" if self.in_pic => {
                if let Some(r_id) = attr_value(e, b"id")? {
                    self.hlink = Some((r_id, attr_value(e, b"tooltip")?));
                }
            },
            b"blip" if self.in_pic => self.embed = read_blip_embed_attr(e)?,
            b"ext" => {
                if let Some(extent) = extent_attrs(e)? {
                    if self.in_pic {
                        self.pic_extent = extent;
                    } else {
                        self.anchor_extent = extent;
                    }
                }
            },
            _ => {},
        }
        Ok(())
    }

    fn close_element(&mut self, name: &[u8]) {
        match name {
            b"from" | b"to" => self.slot = None,
            b"col" | b"colOff" | b"row" | b"rowOff" => self.field = None,
            b"pic" => self.in_pic = false,
            _ => {},
        }
    }
}
