//! Ruby annotation node: a base text with a furigana reading, parsed
//! from `<ruby>` markup and rendered back deterministically.

use crate::markup::{Element, Markup};
use crate::node::{FuriganaAttrs, Node};
use crate::nodes::EditableNode;

/// The furigana node kind.
///
/// Parsing walks the element's children in order: text children join
/// the base text verbatim, nested elements are flattened to their text
/// content at every depth, and the reading comes from the first direct
/// `rt` child. Rendering produces
/// `<ruby>{base}<rt>{reading}</rt></ruby>`, so a rendered node parses
/// back to itself for any attribute pair, the empty strings included.
#[derive(Clone, Copy, Debug, Default)]
pub struct FuriganaNode;

impl EditableNode for FuriganaNode {
    fn parse(&self, element: &Element) -> Option<Node> {
        if element.tag != "ruby" {
            return None;
        }
        let mut base_text = String::new();
        let mut furigana_text: Option<String> = None;
        for child in &element.children {
            match child {
                Markup::Text(text) => base_text.push_str(text),
                Markup::Element(el) if el.tag == "rt" => {
                    if furigana_text.is_none() {
                        furigana_text = Some(el.text_content());
                    }
                }
                Markup::Element(el) => base_text.push_str(&el.text_content()),
            }
        }
        Some(Node::furigana(FuriganaAttrs::new(
            base_text,
            furigana_text.unwrap_or_default(),
        )))
    }

    fn render(&self, node: &Node) -> Option<Markup> {
        let Node::Furigana { attrs } = node else {
            return None;
        };
        let mut ruby = Element::new("ruby");
        if !attrs.base_text.is_empty() {
            ruby = ruby.with_text(attrs.base_text.clone());
        }
        let mut rt = Element::new("rt");
        if !attrs.furigana_text.is_empty() {
            rt = rt.with_text(attrs.furigana_text.clone());
        }
        Some(Markup::Element(ruby.with_child(Markup::Element(rt))))
    }
}
