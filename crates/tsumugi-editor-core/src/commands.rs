//! Editor commands and their execution.
//!
//! `EditorCommand` names the semantic operations the editing surface
//! can request; `execute_command` is the central dispatch point that
//! turns one into a transaction against an [`EditorHost`].

use crate::node::{FuriganaAttrs, ImageAttrs, Node};
use crate::state::{EditorHost, Selection};
use crate::transaction::Transaction;

/// A semantic editing operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorCommand {
    /// Replace the selection with plain text.
    InsertText { text: String },
    /// Delete the selected range.
    DeleteSelection,
    /// Replace the selection with a ruby annotation node.
    InsertFurigana { attrs: FuriganaAttrs },
    /// Replace the selection with an image node.
    InsertImage { attrs: ImageAttrs },
}

impl EditorCommand {
    /// Stable name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            EditorCommand::InsertText { .. } => "insert_text",
            EditorCommand::DeleteSelection => "delete_selection",
            EditorCommand::InsertFurigana { .. } => "insert_furigana",
            EditorCommand::InsertImage { .. } => "insert_image",
        }
    }
}

/// Execute a command against a host.
///
/// This is the central dispatch point for editing operations. Returns
/// true if a transaction was dispatched; returns false without
/// dispatching anything when the host has no active state or the
/// command has nothing to do.
pub fn execute_command<H: EditorHost>(host: &mut H, command: &EditorCommand) -> bool {
    let Some(state) = host.state() else {
        tracing::debug!(
            target: "tsumugi::doc",
            command = command.name(),
            "command ignored, no active editor state"
        );
        return false;
    };
    let selection = state.selection();

    match command {
        EditorCommand::InsertText { text } => execute_insert_text(host, selection, text),
        EditorCommand::DeleteSelection => execute_delete_selection(host, selection),
        EditorCommand::InsertFurigana { attrs } => {
            execute_replace_with(host, selection, Node::furigana(attrs.clone()))
        }
        EditorCommand::InsertImage { attrs } => {
            execute_replace_with(host, selection, Node::image(attrs.clone()))
        }
    }
}

fn execute_insert_text<H: EditorHost>(host: &mut H, selection: Selection, text: &str) -> bool {
    if text.is_empty() && selection.is_collapsed() {
        return false;
    }
    let mut tr = Transaction::new();
    if text.is_empty() {
        tr.delete_range(selection.start(), selection.end());
    } else {
        tr.replace_range_with(selection.start(), selection.end(), Node::text(text));
    }
    host.dispatch(tr);
    true
}

fn execute_delete_selection<H: EditorHost>(host: &mut H, selection: Selection) -> bool {
    if selection.is_collapsed() {
        return false;
    }
    let mut tr = Transaction::new();
    tr.delete_range(selection.start(), selection.end());
    host.dispatch(tr);
    true
}

/// Replace the selection `[from, to)` with a single node, as one
/// transaction. A collapsed selection inserts at the cursor.
fn execute_replace_with<H: EditorHost>(host: &mut H, selection: Selection, node: Node) -> bool {
    let mut tr = Transaction::new();
    tr.replace_range_with(selection.start(), selection.end(), node);
    host.dispatch(tr);
    true
}
