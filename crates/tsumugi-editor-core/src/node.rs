//! Document tree: nodes, marks, and position arithmetic.
//!
//! The document is a two-level tree: a root holding block nodes
//! (paragraphs, headings), each holding inline content (text runs,
//! hard breaks, and atomic leaves like images and furigana). Positions
//! count token boundaries: one per character of text, one per inline
//! leaf, and one for entering or leaving a block.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A document node.
///
/// Serializes in the tagged JSON shape the entry record's `content`
/// field stores (`{"type": "paragraph", "content": [...]}`), so a
/// persisted document round-trips through serde unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// Document root. Children are block nodes.
    Doc {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    /// Plain text block.
    Paragraph {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    /// Section heading block.
    Heading {
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    /// Inline text run with optional marks.
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
    /// Forced line break within a block.
    HardBreak,
    /// Atomic inline image.
    Image { attrs: ImageAttrs },
    /// Atomic inline ruby annotation: a base text with a furigana reading.
    Furigana { attrs: FuriganaAttrs },
}

/// Inline formatting mark attached to a text run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Link { attrs: LinkAttrs },
}

/// Heading attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: u8,
}

impl Default for HeadingAttrs {
    fn default() -> Self {
        Self { level: 1 }
    }
}

/// Link mark attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkAttrs {
    pub href: SmolStr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<SmolStr>,
}

/// Image attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageAttrs {
    pub src: SmolStr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<SmolStr>,
}

/// Furigana attributes. Both default to the empty string, which is a
/// valid (if blank) annotation rather than an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FuriganaAttrs {
    pub base_text: SmolStr,
    pub furigana_text: SmolStr,
}

impl FuriganaAttrs {
    /// Build attrs from anything string-like.
    pub fn new(base_text: impl AsRef<str>, furigana_text: impl AsRef<str>) -> Self {
        Self {
            base_text: SmolStr::new(base_text),
            furigana_text: SmolStr::new(furigana_text),
        }
    }
}

impl Node {
    // === Constructors ===

    pub fn doc(content: Vec<Node>) -> Node {
        Node::Doc { content }
    }

    pub fn paragraph(content: Vec<Node>) -> Node {
        Node::Paragraph { content }
    }

    pub fn heading(level: u8, content: Vec<Node>) -> Node {
        Node::Heading {
            attrs: HeadingAttrs { level },
            content,
        }
    }

    pub fn text(text: impl Into<String>) -> Node {
        Node::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn styled_text(text: impl Into<String>, marks: Vec<Mark>) -> Node {
        Node::Text {
            text: text.into(),
            marks,
        }
    }

    pub fn hard_break() -> Node {
        Node::HardBreak
    }

    pub fn image(attrs: ImageAttrs) -> Node {
        Node::Image { attrs }
    }

    pub fn furigana(attrs: FuriganaAttrs) -> Node {
        Node::Furigana { attrs }
    }

    // === Size arithmetic ===

    /// Token size of this node as seen from its parent.
    ///
    /// Text counts one token per character, atomic inline leaves count
    /// one, and blocks count their content plus one token for each of
    /// the opening and closing boundaries.
    pub fn size(&self) -> usize {
        match self {
            Node::Text { text, .. } => text.chars().count(),
            Node::HardBreak | Node::Image { .. } | Node::Furigana { .. } => 1,
            Node::Doc { .. } | Node::Paragraph { .. } | Node::Heading { .. } => {
                2 + self.content_size()
            }
        }
    }

    /// Combined token size of the children.
    pub fn content_size(&self) -> usize {
        self.children().iter().map(Node::size).sum()
    }

    /// Child nodes. Empty for leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Doc { content } | Node::Paragraph { content } | Node::Heading { content, .. } => {
                content
            }
            _ => &[],
        }
    }

    // === Classification ===

    /// Stable lowercase name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Node::Doc { .. } => "doc",
            Node::Paragraph { .. } => "paragraph",
            Node::Heading { .. } => "heading",
            Node::Text { .. } => "text",
            Node::HardBreak => "hardBreak",
            Node::Image { .. } => "image",
            Node::Furigana { .. } => "furigana",
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Node::Paragraph { .. } | Node::Heading { .. })
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Node::Text { .. } | Node::HardBreak | Node::Image { .. } | Node::Furigana { .. }
        )
    }

    /// Atomic inline leaf: selectable as a unit, no addressable interior.
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            Node::HardBreak | Node::Image { .. } | Node::Furigana { .. }
        )
    }

    /// Concatenated text of this subtree. Atoms contribute nothing.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text { text, .. } => text.clone(),
            _ => self
                .children()
                .iter()
                .map(Node::text_content)
                .collect::<String>(),
        }
    }
}

/// Normalize an inline sequence: drop empty text runs and merge
/// adjacent text runs that carry the same marks.
pub fn coalesce_inline(children: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    for child in children {
        if let Node::Text { text, .. } = &child {
            if text.is_empty() {
                continue;
            }
        }
        match (out.last_mut(), child) {
            (
                Some(Node::Text {
                    text: prev,
                    marks: prev_marks,
                }),
                Node::Text { text, marks },
            ) if *prev_marks == marks => prev.push_str(&text),
            (_, child) => out.push(child),
        }
    }
    out
}

/// Split a text run at a character offset, preserving marks on both halves.
/// Returns the node unchanged on either side when the offset is at an edge.
pub(crate) fn split_text(
    text: &str,
    marks: &[Mark],
    at_chars: usize,
) -> (Option<Node>, Option<Node>) {
    let byte = text
        .char_indices()
        .nth(at_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let (head, tail) = text.split_at(byte);
    let wrap = |slice: &str| {
        (!slice.is_empty()).then(|| Node::Text {
            text: slice.to_owned(),
            marks: marks.to_vec(),
        })
    };
    (wrap(head), wrap(tail))
}
