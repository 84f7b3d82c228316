//! Widget decorations: transient visual markers positioned between
//! document tokens, carried outside the tree and never persisted.

use smol_str::SmolStr;

use crate::placeholder::UploadId;
use crate::transaction::Mapping;

/// A widget anchored at a document position, tagged with the upload it
/// belongs to and carrying the preview source to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoration {
    pub pos: usize,
    pub id: UploadId,
    pub src: SmolStr,
}

/// An ordered set of widget decorations.
///
/// Kept sorted by position so the rendering layer can interleave
/// widgets with document content in one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decoration> {
        self.decorations.iter()
    }

    /// Decorations in `[from, to)`, for the rendering layer.
    pub fn in_range(&self, from: usize, to: usize) -> impl Iterator<Item = &Decoration> {
        self.decorations
            .iter()
            .filter(move |deco| deco.pos >= from && deco.pos < to)
    }

    /// The decoration tagged with `id`, if it still exists.
    pub fn find(&self, id: UploadId) -> Option<&Decoration> {
        self.decorations.iter().find(|deco| deco.id == id)
    }

    /// Carry every decoration through a transaction's position mapping.
    /// Decorations whose anchor was deleted drop out of the set.
    pub fn map_through(&self, mapping: &Mapping) -> DecorationSet {
        let mut decorations: Vec<Decoration> = self
            .decorations
            .iter()
            .filter_map(|deco| {
                let mapped = mapping.map_result(deco.pos);
                (!mapped.deleted).then(|| Decoration {
                    pos: mapped.pos,
                    ..deco.clone()
                })
            })
            .collect();
        decorations.sort_by_key(|deco| deco.pos);
        DecorationSet { decorations }
    }

    /// Insert a decoration, keeping position order.
    pub fn add(&self, deco: Decoration) -> DecorationSet {
        let mut decorations = self.decorations.clone();
        let at = decorations.partition_point(|existing| existing.pos <= deco.pos);
        decorations.insert(at, deco);
        DecorationSet { decorations }
    }

    /// Remove the decoration tagged with `id`, if present.
    pub fn remove(&self, id: UploadId) -> DecorationSet {
        DecorationSet {
            decorations: self
                .decorations
                .iter()
                .filter(|deco| deco.id != id)
                .cloned()
                .collect(),
        }
    }
}
