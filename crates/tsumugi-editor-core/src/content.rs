//! Built-in starter content for a fresh entry.

use crate::node::{FuriganaAttrs, LinkAttrs, Mark, Node};

/// The document a newly created entry starts with: a short intro that
/// demonstrates headings, links, and a ruby annotation.
pub fn default_entry_content() -> Node {
    Node::doc(vec![
        Node::heading(2, vec![Node::text("Writing with ruby annotations")]),
        Node::paragraph(vec![
            Node::text("Select a run of text and attach a reading to it, the way "),
            Node::furigana(FuriganaAttrs::new("紬", "つむぎ")),
            Node::text(" carries its own. See "),
            Node::styled_text(
                "the ruby element",
                vec![Mark::Link {
                    attrs: LinkAttrs {
                        href: "https://developer.mozilla.org/en-US/docs/Web/HTML/Element/ruby"
                            .into(),
                        title: None,
                    },
                }],
            ),
            Node::text(" for how readings render. Drop an image anywhere to upload it."),
        ]),
    ])
}
