//! Transactions: replace steps, position maps, and their application.
//!
//! Every document mutation is a [`ReplaceStep`] bundled into a
//! [`Transaction`]. Applying a step yields both the new document and a
//! [`StepMap`] describing how positions move across the edit, so
//! anything holding a position (selections, upload placeholders) can be
//! carried forward without touching the tree itself.

use thiserror::Error;

use crate::node::{Node, coalesce_inline, split_text};
use crate::placeholder::UploadDirective;

/// Structural failure while applying a step.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("position {pos} outside document of size {size}")]
    OutOfRange { pos: usize, size: usize },
    #[error("inverted range: {from} > {to}")]
    InvertedRange { from: usize, to: usize },
    #[error("{name} node is not inline content")]
    NotInline { name: &'static str },
}

/// Replace the range `[from, to)` with inline content.
///
/// Ranges may span block boundaries: the blocks at each end are joined
/// around the inserted content and fully covered blocks are dropped.
/// Inline content inserted at a gap between blocks is fitted into a
/// fresh paragraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplaceStep {
    pub from: usize,
    pub to: usize,
    pub content: Vec<Node>,
}

/// How one step moves positions.
///
/// A position strictly inside the replaced range is reported deleted
/// and resolves to the start of the replacement. Positions at either
/// edge survive: the start maps to itself, the end shifts by the size
/// difference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepMap {
    pub from: usize,
    pub old_size: usize,
    pub new_size: usize,
}

/// Result of mapping a single position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    pub deleted: bool,
}

impl StepMap {
    pub fn map_result(&self, pos: usize) -> MapResult {
        if pos <= self.from {
            return MapResult { pos, deleted: false };
        }
        let to = self.from + self.old_size;
        if pos >= to {
            MapResult {
                pos: pos - self.old_size + self.new_size,
                deleted: false,
            }
        } else {
            MapResult {
                pos: self.from,
                deleted: true,
            }
        }
    }

    pub fn map(&self, pos: usize) -> usize {
        self.map_result(pos).pos
    }
}

/// An ordered sequence of step maps, mapping through a whole transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    /// Map a position through every step in order. The position counts
    /// as deleted if any step along the way deleted it.
    pub fn map_result(&self, pos: usize) -> MapResult {
        let mut result = MapResult {
            pos,
            deleted: false,
        };
        for map in &self.maps {
            let step = map.map_result(result.pos);
            result.pos = step.pos;
            result.deleted |= step.deleted;
        }
        result
    }

    pub fn map(&self, pos: usize) -> usize {
        self.map_result(pos).pos
    }
}

/// An ordered bundle of steps plus optional upload metadata, built by
/// a command or the upload pipeline and handed to the host to dispatch.
///
/// Transactions carry steps rather than a precomputed document, so a
/// transaction built before an await point still applies cleanly to
/// whatever the document looks like when it is finally dispatched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    pub(crate) steps: Vec<ReplaceStep>,
    pub(crate) upload: Option<UploadDirective>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps queued so far.
    pub fn steps(&self) -> &[ReplaceStep] {
        &self.steps
    }

    /// Upload directive attached to this transaction, if any.
    pub fn upload_meta(&self) -> Option<&UploadDirective> {
        self.upload.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.upload.is_none()
    }

    /// Queue deletion of `[from, to)`.
    pub fn delete_range(&mut self, from: usize, to: usize) -> &mut Self {
        self.steps.push(ReplaceStep {
            from,
            to,
            content: Vec::new(),
        });
        self
    }

    /// Queue replacement of `[from, to)` with a single inline node.
    pub fn replace_range_with(&mut self, from: usize, to: usize, node: Node) -> &mut Self {
        self.steps.push(ReplaceStep {
            from,
            to,
            content: vec![node],
        });
        self
    }

    /// Queue insertion of an inline node at `pos`.
    pub fn insert(&mut self, pos: usize, node: Node) -> &mut Self {
        self.replace_range_with(pos, pos, node)
    }

    /// Attach an upload directive. At most one per transaction; a later
    /// call replaces an earlier one.
    pub fn set_upload_meta(&mut self, directive: UploadDirective) -> &mut Self {
        self.upload = Some(directive);
        self
    }
}

// === Step application ===

/// A document position, located within the block structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolved {
    /// Between blocks, before the block at this index (or at the very
    /// end when the index equals the block count).
    Gap { index: usize },
    /// Inside a block's inline content at the given offset.
    Inline { block: usize, offset: usize },
}

fn resolve(doc: &Node, pos: usize) -> Result<Resolved, TransformError> {
    let blocks = doc.children();
    let mut start = 0;
    for (index, block) in blocks.iter().enumerate() {
        if pos == start {
            return Ok(Resolved::Gap { index });
        }
        let end = start + block.size();
        if pos < end {
            return Ok(Resolved::Inline {
                block: index,
                offset: pos - start - 1,
            });
        }
        start = end;
    }
    if pos == start {
        return Ok(Resolved::Gap {
            index: blocks.len(),
        });
    }
    Err(TransformError::OutOfRange { pos, size: start })
}

/// Split inline content at a character offset. An interior offset can
/// only land inside a text run; atoms are a single token wide.
fn split_inline(content: &[Node], offset: usize) -> (Vec<Node>, Vec<Node>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut seen = 0;
    for child in content {
        let size = child.size();
        if seen + size <= offset {
            before.push(child.clone());
        } else if seen >= offset {
            after.push(child.clone());
        } else if let Node::Text { text, marks } = child {
            let (head, tail) = split_text(text, marks, offset - seen);
            before.extend(head);
            after.extend(tail);
        }
        seen += size;
    }
    (before, after)
}

/// Rebuild a block with new inline content, keeping its kind and attrs.
fn rebuild_block(block: &Node, content: Vec<Node>) -> Node {
    match block {
        Node::Heading { attrs, .. } => Node::Heading {
            attrs: attrs.clone(),
            content,
        },
        _ => Node::Paragraph { content },
    }
}

impl ReplaceStep {
    /// Apply this step, returning the new document and the position map.
    pub fn apply(&self, doc: &Node) -> Result<(Node, StepMap), TransformError> {
        let ReplaceStep { from, to, content } = self;
        let (from, to) = (*from, *to);
        if from > to {
            return Err(TransformError::InvertedRange { from, to });
        }
        for node in content {
            if !node.is_inline() {
                return Err(TransformError::NotInline { name: node.name() });
            }
        }
        let start = resolve(doc, from)?;
        let end = resolve(doc, to)?;

        let mut blocks: Vec<Node> = doc.children().to_vec();
        let inserted = content.iter().map(Node::size).sum::<usize>();

        let new_size = match (start, end) {
            // No structural change at all.
            (Resolved::Gap { .. }, Resolved::Gap { .. }) if from == to && content.is_empty() => 0,
            // Inline content dropped between blocks gets its own paragraph.
            (Resolved::Gap { index }, Resolved::Gap { index: end_index }) => {
                blocks.drain(index..end_index);
                if content.is_empty() {
                    0
                } else {
                    blocks.insert(index, Node::paragraph(coalesce_inline(content.clone())));
                    inserted + 2
                }
            }
            // Range opens at a gap and ends inside a block: the covered
            // prefix of that block goes, the suffix keeps the block alive.
            (Resolved::Gap { index }, Resolved::Inline { block, offset }) => {
                let (_, suffix) = split_inline(blocks[block].children(), offset);
                let mut merged = content.clone();
                merged.extend(suffix);
                blocks[block] = rebuild_block(&blocks[block], coalesce_inline(merged));
                blocks.drain(index..block);
                inserted + 1
            }
            // Range opens inside a block and ends at a gap: keep the
            // block's prefix, drop everything up to the gap.
            (Resolved::Inline { block, offset }, Resolved::Gap { index }) => {
                let (prefix, _) = split_inline(blocks[block].children(), offset);
                let mut merged = prefix;
                merged.extend(content.clone());
                blocks[block] = rebuild_block(&blocks[block], coalesce_inline(merged));
                blocks.drain(block + 1..index);
                inserted + 1
            }
            (
                Resolved::Inline { block, offset },
                Resolved::Inline {
                    block: end_block,
                    offset: end_offset,
                },
            ) => {
                if block == end_block {
                    let (prefix, _) = split_inline(blocks[block].children(), offset);
                    let (_, suffix) = split_inline(blocks[block].children(), end_offset);
                    let mut merged = prefix;
                    merged.extend(content.clone());
                    merged.extend(suffix);
                    blocks[block] = rebuild_block(&blocks[block], coalesce_inline(merged));
                } else {
                    // Join the two partial blocks around the new content.
                    let (prefix, _) = split_inline(blocks[block].children(), offset);
                    let (_, suffix) = split_inline(blocks[end_block].children(), end_offset);
                    let mut merged = prefix;
                    merged.extend(content.clone());
                    merged.extend(suffix);
                    blocks[block] = rebuild_block(&blocks[block], coalesce_inline(merged));
                    blocks.drain(block + 1..=end_block);
                }
                inserted
            }
        };

        Ok((
            Node::doc(blocks),
            StepMap {
                from,
                old_size: to - from,
                new_size,
            },
        ))
    }
}
