//! Upload placeholder bookkeeping: opaque upload tokens, the
//! transaction directives that add and remove placeholder widgets, and
//! the reducer that folds them into the decoration set.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use smol_str::SmolStr;

use crate::decoration::{Decoration, DecorationSet};
use crate::state::EditorState;
use crate::transaction::{Mapping, Transaction};

/// Opaque token correlating a pending upload with its placeholder.
///
/// Tokens are allocated from a process-wide counter, so two distinct
/// uploads never compare equal and an id can be carried across await
/// points by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UploadId(u64);

static NEXT_UPLOAD_ID: AtomicU64 = AtomicU64::new(1);

impl UploadId {
    /// Allocate a fresh token.
    pub fn fresh() -> Self {
        UploadId(NEXT_UPLOAD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upload-{}", self.0)
    }
}

/// Placeholder directive carried as transaction metadata. At most one
/// is processed per transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadDirective {
    /// Materialize a placeholder for `id`: a preview widget rendered
    /// one token past `pos`, showing `src`.
    Add {
        id: UploadId,
        pos: usize,
        src: SmolStr,
    },
    /// Drop the placeholder tagged `id`.
    Remove { id: UploadId },
}

/// Offset between a placeholder's insertion anchor and where its
/// widget renders.
const WIDGET_OFFSET: usize = 1;

/// Fold one transaction into the decoration set: carry every existing
/// decoration through the position mapping, then process the
/// transaction's directive, if any.
pub fn apply_transaction(
    previous: &DecorationSet,
    tr: &Transaction,
    mapping: &Mapping,
) -> DecorationSet {
    let mapped = previous.map_through(mapping);
    match tr.upload_meta() {
        Some(UploadDirective::Add { id, pos, src }) => mapped.add(Decoration {
            pos: pos + WIDGET_OFFSET,
            id: *id,
            src: src.clone(),
        }),
        Some(UploadDirective::Remove { id }) => mapped.remove(*id),
        None => mapped,
    }
}

/// Live insertion anchor of the placeholder tagged `id`.
///
/// Returns `None` when the placeholder no longer exists, either
/// because mapping dropped it with a deleted range or because a
/// `Remove` directive already consumed it. The widget itself renders
/// one token past the anchor; this returns the anchor.
pub fn find_placeholder(state: &EditorState, id: UploadId) -> Option<usize> {
    state
        .decorations()
        .find(id)
        .map(|deco| deco.pos.saturating_sub(WIDGET_OFFSET))
}
