//! Content-addressed index of a drawing's image relationships.
//!
//! Every image inserted through a drawing is hashed; the store maps each
//! hash to the single relationship that binds the drawing part to the media
//! part holding those bytes, and counts how many pictures use it. The store
//! belongs to one drawing part because relationship ids are scoped to their
//! source part.

use std::collections::HashMap;

use crate::images::hash::ContentHash;
use crate::ooxml::drawings::error::{PictureError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoreEntry {
    rel_id: String,
    refs: usize,
}

/// Outcome of [`ImageStore::unregister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Other pictures still use the relationship.
    Retained(usize),
    /// That was the last picture; the entry is gone.
    Last,
    /// The hash is not bound to this relationship.
    NotIndexed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImageStore {
    entries: HashMap<ContentHash, StoreEntry>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relationship id holding the image with this hash, if any.
    pub fn lookup(&self, hash: &ContentHash) -> Option<&str> {
        self.entries.get(hash).map(|entry| entry.rel_id.as_str())
    }

    /// Bind `hash` to `rel_id` for one more picture.
    ///
    /// Binding an already-bound hash to a different relationship means a
    /// caller skipped [`lookup`](Self::lookup) and fails with
    /// [`PictureError::DuplicateHash`].
    pub fn register(&mut self, hash: ContentHash, rel_id: &str) -> Result<()> {
        match self.entries.get_mut(&hash) {
            Some(entry) if entry.rel_id == rel_id => {
                entry.refs += 1;
                Ok(())
            },
            Some(entry) => Err(PictureError::DuplicateHash {
                hash: hash.to_string(),
                existing: entry.rel_id.clone(),
                requested: rel_id.to_string(),
            }),
            None => {
                self.entries.insert(
                    hash,
                    StoreEntry {
                        rel_id: rel_id.to_string(),
                        refs: 1,
                    },
                );
                Ok(())
            },
        }
    }

    /// Register a picture read from an existing drawing part.
    ///
    /// Returns `false` when the hash is already bound to another
    /// relationship: the document carries two parts with equivalent content.
    /// The earlier binding is kept for later insertions and the stored parts
    /// are left as they are.
    pub fn adopt(&mut self, hash: ContentHash, rel_id: &str) -> bool {
        self.register(hash, rel_id).is_ok()
    }

    /// Drop one picture's use of `hash` through `rel_id`.
    pub fn unregister(&mut self, hash: &ContentHash, rel_id: &str) -> Release {
        let Some(entry) = self.entries.get_mut(hash) else {
            return Release::NotIndexed;
        };
        if entry.rel_id != rel_id {
            return Release::NotIndexed;
        }

        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs == 0 {
            self.entries.remove(hash);
            Release::Last
        } else {
            Release::Retained(entry.refs)
        }
    }

    /// Number of pictures using `hash`.
    pub fn ref_count(&self, hash: &ContentHash) -> usize {
        self.entries.get(hash).map_or(0, |entry| entry.refs)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(hash, relationship id)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&ContentHash, &str)> {
        self.entries
            .iter()
            .map(|(hash, entry)| (hash, entry.rel_id.as_str()))
    }
}
