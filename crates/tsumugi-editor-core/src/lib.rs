//! tsumugi-editor-core: pure document logic, no async, no I/O.
//!
//! This crate provides:
//! - `Node`/`Mark` - the document tree and its JSON persistence shape
//! - `Transaction`/`ReplaceStep`/`StepMap` - edits and position mapping
//! - `EditorState` + `EditorHost` - immutable snapshots and the host seam
//! - upload placeholder decorations with a pure per-transaction reducer
//! - the closed extension schema (furigana, image) and markup (de)serialization

pub mod commands;
pub mod content;
pub mod decoration;
pub mod html;
pub mod markup;
pub mod node;
pub mod nodes;
pub mod placeholder;
pub mod state;
pub mod transaction;

pub use commands::{EditorCommand, execute_command};
pub use content::default_entry_content;
pub use decoration::{Decoration, DecorationSet};
pub use html::{parse_html, to_html, to_html_with_decorations};
pub use markup::{Element, Markup, MarkupError};
pub use node::{FuriganaAttrs, HeadingAttrs, ImageAttrs, LinkAttrs, Mark, Node, coalesce_inline};
pub use nodes::{EditableNode, Extension, FuriganaNode, ImageNode, Schema};
pub use placeholder::{UploadDirective, UploadId, apply_transaction, find_placeholder};
pub use smol_str::SmolStr;
pub use state::{EditorHost, EditorState, PlainHost, Selection};
pub use transaction::{MapResult, Mapping, ReplaceStep, StepMap, Transaction, TransformError};
