//! Node extensions: the closed set of atomic inline node kinds that
//! parse from and render to host markup.
//!
//! Each kind implements [`EditableNode`] and is registered in the
//! [`Schema`] as one variant of [`Extension`]. Adding a kind means
//! adding a variant, not injecting behavior at runtime.

mod furigana;
mod image;

pub use furigana::FuriganaNode;
pub use image::ImageNode;

use crate::markup::{Element, Markup};
use crate::node::Node;

/// Capability interface for an extension node kind.
pub trait EditableNode {
    /// Try to build a node from a markup element. `None` when the
    /// element is not this kind.
    fn parse(&self, element: &Element) -> Option<Node>;

    /// Render a node of this kind into markup. `None` when the node is
    /// not this kind.
    fn render(&self, node: &Node) -> Option<Markup>;
}

/// One registered node kind.
#[derive(Clone, Copy, Debug)]
pub enum Extension {
    Furigana(FuriganaNode),
    Image(ImageNode),
}

impl EditableNode for Extension {
    fn parse(&self, element: &Element) -> Option<Node> {
        match self {
            Extension::Furigana(ext) => ext.parse(element),
            Extension::Image(ext) => ext.parse(element),
        }
    }

    fn render(&self, node: &Node) -> Option<Markup> {
        match self {
            Extension::Furigana(ext) => ext.render(node),
            Extension::Image(ext) => ext.render(node),
        }
    }
}

/// The extension kinds active in a document.
#[derive(Clone, Debug)]
pub struct Schema {
    extensions: Vec<Extension>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            extensions: vec![
                Extension::Furigana(FuriganaNode),
                Extension::Image(ImageNode),
            ],
        }
    }
}

impl Schema {
    /// Parse an element with the first extension that accepts it.
    pub fn parse_element(&self, element: &Element) -> Option<Node> {
        self.extensions.iter().find_map(|ext| ext.parse(element))
    }

    /// Render a node with the first extension that owns it.
    pub fn render_node(&self, node: &Node) -> Option<Markup> {
        self.extensions.iter().find_map(|ext| ext.render(node))
    }
}
