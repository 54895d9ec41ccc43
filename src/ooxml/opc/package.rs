//! In-memory OPC package.
//!
//! OpcPackage holds the parts of an open document and the package-level
//! relationships. The drawing layer uses it to look up media parts behind
//! relationship ids, to add new media parts and to drop media parts that are
//! no longer referenced.
use std::collections::HashMap;

use crate::images::hash::ContentHash;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory};
use crate::ooxml::opc::rel::Relationships;

/// Safety limit for sequential partname allocation.
const MAX_PARTNAME_INDEX: u32 = 10_000;

pub struct OpcPackage {
    /// Package-level relationships
    rels: Relationships,

    /// All parts in the package, indexed by partname
    parts: HashMap<String, Box<dyn Part>>,

    /// Media parts added through [`OpcPackage::index_media`], by content hash
    media: HashMap<ContentHash, PackURI>,
}

impl OpcPackage {
    /// Create a new empty OPC package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI.to_string()),
            parts: HashMap::new(),
            media: HashMap::new(),
        }
    }

    /// Load a part from raw data, choosing blob or XML storage by content type.
    ///
    /// An existing part with the same partname is replaced.
    pub fn load_part(&mut self, partname: PackURI, content_type: &str, blob: Vec<u8>) -> Result<()> {
        let part = PartFactory::load(partname, content_type.to_string(), blob)?;
        self.add_part(part);
        Ok(())
    }

    /// Get a part by its partname.
    pub fn get_part(&self, partname: &PackURI) -> Result<&dyn Part> {
        self.parts
            .get(partname.as_str())
            .map(|b| &**b as &dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Get a mutable reference to a part by its partname.
    pub fn get_part_mut(&mut self, partname: &PackURI) -> Result<&mut dyn Part> {
        self.parts
            .get_mut(partname.as_str())
            .map(|b| &mut **b as &mut dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Add a new part to the package, replacing any part with the same name.
    ///
    /// Replacing a part drops its entry from the media index.
    pub fn add_part(&mut self, part: Box<dyn Part>) {
        let partname = part.partname().clone();
        if self.parts.insert(partname.to_string(), part).is_some() {
            self.media.retain(|_, uri| *uri != partname);
        }
    }

    /// Remove a part from the package, along with its media index entry.
    pub fn remove_part(&mut self, partname: &PackURI) -> Option<Box<dyn Part>> {
        let part = self.parts.remove(partname.as_str())?;
        self.media.retain(|_, uri| uri != partname);
        Some(part)
    }

    /// Media part holding the bytes with `hash`, if one was indexed and is
    /// still in the package.
    pub fn media_part(&self, hash: &ContentHash) -> Option<&PackURI> {
        self.media
            .get(hash)
            .filter(|uri| self.parts.contains_key(uri.as_str()))
    }

    /// Record that the media part at `partname` holds the bytes with `hash`.
    ///
    /// The first part indexed for a hash keeps it.
    pub fn index_media(&mut self, hash: ContentHash, partname: PackURI) {
        if self.media_part(&hash).is_none() {
            self.media.insert(hash, partname);
        }
    }

    /// Get an iterator over all parts in the package.
    pub fn iter_parts(&self) -> impl Iterator<Item = &dyn Part> {
        self.parts.values().map(|b| &**b as &dyn Part)
    }

    /// Get the number of parts in the package.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Get a reference to the package-level relationships.
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Get a mutable reference to the package-level relationships.
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// Check whether any internal relationship in the package, from any part
    /// or from the package itself, still resolves to `partname`.
    pub fn is_relationship_target(&self, partname: &PackURI) -> bool {
        self.rels.targets_part(partname)
            || self.parts.values().any(|part| part.rels().targets_part(partname))
    }

    /// Find the next available partname for a part template.
    ///
    /// The template carries a `%d` placeholder for the sequence number,
    /// e.g. `/xl/media/image%d.png`.
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        self.next_partname_with(|n| template.replace("%d", &n.to_string()))
    }

    /// Find the first free partname produced by `candidate` for 1, 2, 3...
    pub fn next_partname_with(&self, candidate: impl Fn(u32) -> String) -> Result<PackURI> {
        for n in 1..=MAX_PARTNAME_INDEX {
            let partname = candidate(n);
            if !self.parts.contains_key(&partname) {
                return PackURI::new(partname).map_err(OpcError::InvalidPackUri);
            }
        }
        Err(OpcError::InvalidPackUri(format!(
            "Too many parts, cannot find next partname for {}",
            candidate(0)
        )))
    }

    /// Check if a part exists in the package.
    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname.as_str())
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}
