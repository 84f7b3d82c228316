//! Editor state and the host seam.
//!
//! [`EditorState`] is an immutable snapshot: applying a transaction
//! yields a new state with the document rebuilt, the selection and
//! upload placeholders mapped through the edit, and the version bumped.
//! [`EditorHost`] abstracts over whoever owns the current state, so
//! commands and the upload pipeline work against plain structs in tests
//! and against reactive wrappers in a UI shell.

use crate::decoration::DecorationSet;
use crate::node::Node;
use crate::placeholder;
use crate::transaction::{Mapping, Transaction, TransformError};

/// Selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the
/// cursor is now. They may be in any order - use `start()` and `end()`
/// for ordered bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Collapsed selection (cursor position).
    pub fn collapsed(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    /// Lower bound.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Upper bound.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Carry both endpoints through a transaction's mapping.
    pub fn map_through(&self, mapping: &Mapping) -> Selection {
        Selection {
            anchor: mapping.map(self.anchor),
            head: mapping.map(self.head),
        }
    }
}

/// Immutable editor snapshot: document, selection, upload placeholders,
/// and a version counter that increments once per applied transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorState {
    doc: Node,
    selection: Selection,
    version: u64,
    uploads: DecorationSet,
}

impl EditorState {
    /// A fresh state over `doc` with a collapsed selection at the start.
    pub fn new(doc: Node) -> Self {
        Self {
            doc,
            selection: Selection::collapsed(0),
            version: 0,
            uploads: DecorationSet::default(),
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Read-only view of the upload placeholder decorations.
    pub fn decorations(&self) -> &DecorationSet {
        &self.uploads
    }

    /// Apply a transaction, producing the next state.
    ///
    /// Steps apply in order against the evolving document; the selection
    /// and every placeholder decoration are mapped through the combined
    /// step maps, and the transaction's upload directive (if any) is
    /// folded into the decoration set last.
    pub fn apply(&self, tr: &Transaction) -> Result<EditorState, TransformError> {
        let mut doc = self.doc.clone();
        let mut mapping = Mapping::default();
        for step in tr.steps() {
            let (next, map) = step.apply(&doc)?;
            doc = next;
            mapping.push(map);
        }
        Ok(EditorState {
            doc,
            selection: self.selection.map_through(&mapping),
            version: self.version + 1,
            uploads: placeholder::apply_transaction(&self.uploads, tr, &mapping),
        })
    }
}

/// The seam between document logic and whoever owns the state.
///
/// `state()` returns `None` when no editor is active, in which case
/// commands refuse to run rather than dispatching into nothing.
pub trait EditorHost {
    /// Current state, if an editor is active.
    fn state(&self) -> Option<&EditorState>;

    /// Apply a transaction to the current state.
    fn dispatch(&mut self, tr: Transaction);
}

/// Plain field-based host. Suitable for tests and headless embedding;
/// reactive shells wrap their own storage in the same trait.
#[derive(Clone, Debug, Default)]
pub struct PlainHost {
    state: Option<EditorState>,
}

impl PlainHost {
    pub fn new(state: EditorState) -> Self {
        Self { state: Some(state) }
    }

    /// A host with no active editor state.
    pub fn inactive() -> Self {
        Self { state: None }
    }
}

impl EditorHost for PlainHost {
    fn state(&self) -> Option<&EditorState> {
        self.state.as_ref()
    }

    fn dispatch(&mut self, tr: Transaction) {
        let Some(current) = self.state.as_ref() else {
            tracing::warn!(target: "tsumugi::doc", "dispatch without active state");
            return;
        };
        match current.apply(&tr) {
            Ok(next) => {
                tracing::trace!(
                    target: "tsumugi::doc",
                    version = next.version(),
                    steps = tr.steps().len(),
                    "applied transaction"
                );
                self.state = Some(next);
            }
            Err(error) => {
                tracing::warn!(
                    target: "tsumugi::doc",
                    %error,
                    version = current.version(),
                    "transaction rejected"
                );
            }
        }
    }
}
