//! Embedded image node, parsed from and rendered to `<img>` markup.

use smol_str::SmolStr;

use crate::markup::{Element, Markup};
use crate::node::{ImageAttrs, Node};
use crate::nodes::EditableNode;

/// The image node kind.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageNode;

impl EditableNode for ImageNode {
    fn parse(&self, element: &Element) -> Option<Node> {
        if element.tag != "img" {
            return None;
        }
        Some(Node::image(ImageAttrs {
            src: SmolStr::new(element.attr("src").unwrap_or_default()),
            alt: element.attr("alt").map(SmolStr::new),
            title: element.attr("title").map(SmolStr::new),
        }))
    }

    fn render(&self, node: &Node) -> Option<Markup> {
        let Node::Image { attrs } = node else {
            return None;
        };
        let mut img = Element::new("img").with_attr("src", &attrs.src);
        if let Some(alt) = &attrs.alt {
            img = img.with_attr("alt", alt);
        }
        if let Some(title) = &attrs.title {
            img = img.with_attr("title", title);
        }
        Some(Markup::Element(img))
    }
}
