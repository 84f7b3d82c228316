//! Whole-document serialization over the host markup boundary.
//!
//! Blocks and marks are rendered natively; atomic inline kinds go
//! through the extension [`Schema`]. The decorated variant interleaves
//! upload placeholder widgets with document content so an in-flight
//! upload is visible at its anchored position, splitting text runs
//! where a widget lands inside one.

use smol_str::{SmolStr, format_smolstr};

use crate::decoration::{Decoration, DecorationSet};
use crate::markup::{self, Element, Markup, MarkupError, parse_markup};
use crate::node::{LinkAttrs, Mark, Node, coalesce_inline};
use crate::nodes::Schema;

/// Render a document to markup.
pub fn to_html(doc: &Node) -> String {
    to_html_with_decorations(doc, &DecorationSet::default())
}

/// Render a document with placeholder widgets interleaved at their
/// anchored positions.
pub fn to_html_with_decorations(doc: &Node, decorations: &DecorationSet) -> String {
    let schema = Schema::default();
    let mut out = String::new();
    let mut pos = 0;
    for block in doc.children() {
        flush_widgets_at(&mut out, decorations, pos);
        write_block(&mut out, block, pos + 1, decorations, &schema);
        pos += block.size();
    }
    flush_widgets_at(&mut out, decorations, pos);
    out
}

fn write_block(
    out: &mut String,
    block: &Node,
    content_start: usize,
    decorations: &DecorationSet,
    schema: &Schema,
) {
    let tag: SmolStr = match block {
        Node::Heading { attrs, .. } => format_smolstr!("h{}", attrs.level.clamp(1, 6)),
        _ => SmolStr::new_static("p"),
    };
    out.push('<');
    out.push_str(&tag);
    out.push('>');
    write_inline(out, block.children(), content_start, decorations, schema);
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn write_inline(
    out: &mut String,
    children: &[Node],
    start: usize,
    decorations: &DecorationSet,
    schema: &Schema,
) {
    let mut pos = start;
    for child in children {
        flush_widgets_at(out, decorations, pos);
        match child {
            Node::Text { text, marks } => {
                let end = pos + text.chars().count();
                let mut seg_pos = pos;
                let mut seg_byte = 0;
                for deco in decorations.in_range(pos + 1, end) {
                    let split_byte = seg_byte + byte_of_char(&text[seg_byte..], deco.pos - seg_pos);
                    write_marked_text(out, &text[seg_byte..split_byte], marks);
                    markup::write_markup(out, &widget_markup(deco));
                    seg_pos = deco.pos;
                    seg_byte = split_byte;
                }
                write_marked_text(out, &text[seg_byte..], marks);
            }
            Node::HardBreak => {
                markup::write_markup(out, &Markup::Element(Element::new("br")));
            }
            other => {
                if let Some(item) = schema.render_node(other) {
                    markup::write_markup(out, &item);
                }
            }
        }
        pos += child.size();
    }
    flush_widgets_at(out, decorations, pos);
}

fn flush_widgets_at(out: &mut String, decorations: &DecorationSet, pos: usize) {
    for deco in decorations.in_range(pos, pos + 1) {
        markup::write_markup(out, &widget_markup(deco));
    }
}

/// The placeholder widget: a dimmed preview image in a marker wrapper.
fn widget_markup(deco: &Decoration) -> Markup {
    Markup::Element(
        Element::new("div")
            .with_attr("class", "img-placeholder")
            .with_child(Markup::Element(
                Element::new("img")
                    .with_attr("class", "opacity-40 rounded-lg border border-stone-200")
                    .with_attr("src", &deco.src),
            )),
    )
}

fn write_marked_text(out: &mut String, text: &str, marks: &[Mark]) {
    if text.is_empty() {
        return;
    }
    let mut item = Markup::Text(text.to_owned());
    for mark in marks.iter().rev() {
        item = Markup::Element(mark_element(mark).with_child(item));
    }
    markup::write_markup(out, &item);
}

fn mark_element(mark: &Mark) -> Element {
    match mark {
        Mark::Bold => Element::new("strong"),
        Mark::Italic => Element::new("em"),
        Mark::Link { attrs } => {
            let mut el = Element::new("a").with_attr("href", &attrs.href);
            if let Some(title) = &attrs.title {
                el = el.with_attr("title", title);
            }
            el
        }
    }
}

fn byte_of_char(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

// === Parsing ===

/// Parse markup into a document. Block elements become blocks; loose
/// inline content between them is fitted into paragraphs.
pub fn parse_html(input: &str) -> Result<Node, MarkupError> {
    let items = parse_markup(input)?;
    let schema = Schema::default();
    let mut blocks = Vec::new();
    let mut pending: Vec<Node> = Vec::new();

    for item in &items {
        match item {
            Markup::Text(text) if text.trim().is_empty() => {}
            Markup::Element(el) if heading_level(&el.tag).is_some() => {
                flush_pending(&mut blocks, &mut pending);
                let level = heading_level(&el.tag).unwrap_or(1);
                blocks.push(Node::heading(level, block_content(el, &schema)));
            }
            Markup::Element(el)
                if matches!(
                    el.tag.as_str(),
                    "p" | "div" | "section" | "article" | "blockquote"
                ) =>
            {
                flush_pending(&mut blocks, &mut pending);
                blocks.push(Node::paragraph(block_content(el, &schema)));
            }
            other => pending.extend(parse_inline(std::slice::from_ref(other), &[], &schema)),
        }
    }
    flush_pending(&mut blocks, &mut pending);
    Ok(Node::doc(blocks))
}

fn flush_pending(blocks: &mut Vec<Node>, pending: &mut Vec<Node>) {
    if !pending.is_empty() {
        blocks.push(Node::paragraph(coalesce_inline(std::mem::take(pending))));
    }
}

fn block_content(el: &Element, schema: &Schema) -> Vec<Node> {
    coalesce_inline(parse_inline(&el.children, &[], schema))
}

fn parse_inline(items: &[Markup], marks: &[Mark], schema: &Schema) -> Vec<Node> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Markup::Text(text) => {
                if !text.is_empty() {
                    out.push(Node::styled_text(text.clone(), marks.to_vec()));
                }
            }
            Markup::Element(el) => {
                if let Some(node) = schema.parse_element(el) {
                    out.push(node);
                    continue;
                }
                match el.tag.as_str() {
                    "br" => out.push(Node::hard_break()),
                    "strong" | "b" => {
                        let marks = with_mark(marks, Mark::Bold);
                        out.extend(parse_inline(&el.children, &marks, schema));
                    }
                    "em" | "i" => {
                        let marks = with_mark(marks, Mark::Italic);
                        out.extend(parse_inline(&el.children, &marks, schema));
                    }
                    "a" => {
                        let link = Mark::Link {
                            attrs: LinkAttrs {
                                href: SmolStr::new(el.attr("href").unwrap_or_default()),
                                title: el.attr("title").map(SmolStr::new),
                            },
                        };
                        let marks = with_mark(marks, link);
                        out.extend(parse_inline(&el.children, &marks, schema));
                    }
                    // Unknown inline wrappers contribute their content.
                    _ => out.extend(parse_inline(&el.children, marks, schema)),
                }
            }
        }
    }
    out
}

fn with_mark(marks: &[Mark], mark: Mark) -> Vec<Mark> {
    let mut marks = marks.to_vec();
    if !marks.contains(&mark) {
        marks.push(mark);
    }
    marks
}

fn heading_level(tag: &str) -> Option<u8> {
    let level: u8 = tag.strip_prefix('h')?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}
