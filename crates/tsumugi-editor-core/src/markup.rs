//! Host markup boundary: a small element tree with a tokenizing parser
//! and an escaping writer.
//!
//! Node extensions parse from and render into this tree rather than
//! touching strings directly, so tag matching, attribute lookup, and
//! escaping live in one place. The parser is strict: it accepts
//! everything the writer emits plus ordinary pasted markup (single or
//! double quoted attributes, void elements, comments), and reports
//! structural problems as errors instead of guessing.

use smol_str::SmolStr;
use thiserror::Error;

/// One item of parsed markup: a text run or an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Markup {
    Text(String),
    Element(Element),
}

/// An element with ordered attributes and child markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub tag: SmolStr,
    pub attrs: Vec<(SmolStr, SmolStr)>,
    pub children: Vec<Markup>,
}

/// Parse or structure failure in the host markup.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("markup ended inside <{tag}>")]
    UnexpectedEof { tag: SmolStr },
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedClose { expected: SmolStr, found: SmolStr },
    #[error("closing tag </{found}> without an open element")]
    StrayClose { found: SmolStr },
    #[error("malformed tag at byte {at}")]
    MalformedTag { at: usize },
}

/// Elements that never have children or a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

impl Markup {
    /// Concatenated text of this item, descending through elements.
    pub fn text_content(&self) -> String {
        match self {
            Markup::Text(text) => text.clone(),
            Markup::Element(el) => el.text_content(),
        }
    }
}

impl Element {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self {
            tag: SmolStr::new(tag),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute append.
    pub fn with_attr(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.attrs.push((SmolStr::new(name), SmolStr::new(value)));
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Markup) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style text child append.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Markup::Text(text.into()))
    }

    /// First value of the named attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated descendant text, all nested tags flattened away.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .map(Markup::text_content)
            .collect::<String>()
    }

    /// Whether this element takes no children and no closing tag.
    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag.as_str())
    }
}

// === Parsing ===

/// Parse a markup string into a sequence of items.
pub fn parse_markup(input: &str) -> Result<Vec<Markup>, MarkupError> {
    let mut scanner = Scanner { src: input, pos: 0 };
    let mut out = Vec::new();
    scanner.parse_nodes(&mut out, None)?;
    Ok(out)
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|ch| ch.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Parse children until end of input (top level) or the close tag of
    /// `parent`, which is consumed.
    fn parse_nodes(
        &mut self,
        out: &mut Vec<Markup>,
        parent: Option<&str>,
    ) -> Result<(), MarkupError> {
        loop {
            if self.rest().is_empty() {
                return match parent {
                    None => Ok(()),
                    Some(tag) => Err(MarkupError::UnexpectedEof {
                        tag: SmolStr::new(tag),
                    }),
                };
            }
            if self.rest().starts_with("<!--") {
                self.skip_comment();
                continue;
            }
            if self.rest().starts_with("</") {
                let at = self.pos;
                self.pos += 2;
                let found = self.read_tag_name(at)?;
                self.skip_whitespace();
                if !self.eat(">") {
                    return Err(MarkupError::MalformedTag { at });
                }
                return match parent {
                    Some(tag) if tag == found => Ok(()),
                    Some(tag) => Err(MarkupError::MismatchedClose {
                        expected: SmolStr::new(tag),
                        found,
                    }),
                    None => Err(MarkupError::StrayClose { found }),
                };
            }
            if self.rest().starts_with('<')
                && self.rest()[1..].starts_with(|ch: char| ch.is_ascii_alphabetic())
            {
                let element = self.parse_element()?;
                out.push(Markup::Element(element));
                continue;
            }
            out.push(Markup::Text(self.parse_text()));
        }
    }

    fn skip_comment(&mut self) {
        self.pos += 4;
        match self.rest().find("-->") {
            Some(offset) => self.pos += offset + 3,
            None => self.pos = self.src.len(),
        }
    }

    /// Text run up to the next tag opener, entities decoded.
    fn parse_text(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == '<'
                && (self.rest()[1..].starts_with(|c: char| c.is_ascii_alphabetic())
                    || self.rest()[1..].starts_with('/')
                    || self.rest()[1..].starts_with("!--"))
            {
                break;
            }
            self.bump();
        }
        decode_entities(&self.src[start..self.pos])
    }

    fn read_tag_name(&mut self, at: usize) -> Result<SmolStr, MarkupError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '-')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(MarkupError::MalformedTag { at });
        }
        Ok(SmolStr::new(self.src[start..self.pos].to_ascii_lowercase()))
    }

    fn parse_element(&mut self) -> Result<Element, MarkupError> {
        let at = self.pos;
        self.pos += 1;
        let tag = self.read_tag_name(at)?;
        let mut element = Element::new(&tag);

        loop {
            self.skip_whitespace();
            if self.eat("/>") {
                return Ok(element);
            }
            if self.eat(">") {
                break;
            }
            let (name, value) = self.parse_attr(at)?;
            element.attrs.push((name, value));
        }

        if element.is_void() {
            return Ok(element);
        }
        self.parse_nodes(&mut element.children, Some(&tag))?;
        Ok(element)
    }

    fn parse_attr(&mut self, at: usize) -> Result<(SmolStr, SmolStr), MarkupError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == ':')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(MarkupError::MalformedTag { at });
        }
        let name = SmolStr::new(self.src[start..self.pos].to_ascii_lowercase());

        self.skip_whitespace();
        if !self.eat("=") {
            // Bare attribute, e.g. `<input disabled>`.
            return Ok((name, SmolStr::default()));
        }
        self.skip_whitespace();

        let quote = match self.peek() {
            Some(ch @ ('"' | '\'')) => ch,
            _ => return Err(MarkupError::MalformedTag { at }),
        };
        self.bump();
        let value_start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == quote {
                break;
            }
            self.bump();
        }
        let raw = &self.src[value_start..self.pos];
        if self.bump() != Some(quote) {
            return Err(MarkupError::MalformedTag { at });
        }
        Ok((name, SmolStr::new(decode_entities(raw))))
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        // The 12-byte cap may fall inside a multibyte character.
        let window = &rest.as_bytes()[..rest.len().min(12)];
        let Some(semi) = window.iter().position(|&b| b == b';') else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// === Writing ===

/// Render markup items to a string, escaping text and attribute values.
pub fn render_markup(items: &[Markup]) -> String {
    let mut out = String::new();
    for item in items {
        write_markup(&mut out, item);
    }
    out
}

pub(crate) fn write_markup(out: &mut String, item: &Markup) {
    match item {
        Markup::Text(text) => escape_text(out, text),
        Markup::Element(el) => write_element(out, el),
    }
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(out, value);
        out.push('"');
    }
    out.push('>');
    if el.is_void() {
        return;
    }
    for child in &el.children {
        write_markup(out, child);
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

pub(crate) fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(input: &str) -> Element {
        let items = parse_markup(input).unwrap();
        assert_eq!(items.len(), 1, "expected a single element in {input:?}");
        match items.into_iter().next().unwrap() {
            Markup::Element(el) => el,
            Markup::Text(text) => panic!("expected element, got text {text:?}"),
        }
    }

    #[test]
    fn test_parse_ruby_structure() {
        let el = parse_one("<ruby>漢字<rt>かんじ</rt></ruby>");
        assert_eq!(el.tag, "ruby");
        assert_eq!(el.children.len(), 2);
        assert_eq!(el.children[0], Markup::Text("漢字".into()));
        match &el.children[1] {
            Markup::Element(rt) => {
                assert_eq!(rt.tag, "rt");
                assert_eq!(rt.text_content(), "かんじ");
            }
            other => panic!("expected rt element, got {other:?}"),
        }
    }

    #[test]
    fn test_text_content_flattens_nesting() {
        let el = parse_one("<ruby><b>と<i>ても</i></b>深い<rt>よみ</rt></ruby>");
        assert_eq!(el.children[0].text_content(), "とても");
        assert_eq!(el.text_content(), "とても深いよみ");
    }

    #[test]
    fn test_attributes_and_quotes() {
        let el = parse_one(r#"<img src="a.png" alt='an &quot;image&quot;'>"#);
        assert_eq!(el.attr("src"), Some("a.png"));
        assert_eq!(el.attr("alt"), Some("an \"image\""));
        assert_eq!(el.attr("title"), None);

        let err = parse_markup("<img loading=>").unwrap_err();
        assert!(matches!(err, MarkupError::MalformedTag { .. }));
    }

    #[test]
    fn test_void_and_self_closing() {
        let items = parse_markup("a<br>b<br/>c").unwrap();
        assert_eq!(items.len(), 5);
        assert!(matches!(&items[1], Markup::Element(el) if el.tag == "br"));
        assert!(matches!(&items[3], Markup::Element(el) if el.tag == "br"));
    }

    #[test]
    fn test_entity_decoding() {
        let items = parse_markup("a &amp; b &lt;c&gt; &#x3042; &#12356; &bogus; &amp").unwrap();
        assert_eq!(
            items,
            vec![Markup::Text("a & b <c> あ い &bogus; &amp".into())]
        );
    }

    #[test]
    fn test_bare_ampersand_in_multibyte_text() {
        let items = parse_markup("パン&バターです").unwrap();
        assert_eq!(items, vec![Markup::Text("パン&バターです".into())]);

        let items = parse_markup("&ありがとうございます").unwrap();
        assert_eq!(items, vec![Markup::Text("&ありがとうございます".into())]);

        let el = parse_one("<img alt='味噌&醤油のセット'>");
        assert_eq!(el.attr("alt"), Some("味噌&醤油のセット"));
    }

    #[test]
    fn test_comments_skipped() {
        let items = parse_markup("x<!-- note -->y").unwrap();
        assert_eq!(items, vec![Markup::Text("x".into()), Markup::Text("y".into())]);
    }

    #[test]
    fn test_mismatched_close_is_error() {
        let err = parse_markup("<ruby>a</span>").unwrap_err();
        assert_eq!(
            err,
            MarkupError::MismatchedClose {
                expected: "ruby".into(),
                found: "span".into(),
            }
        );

        let err = parse_markup("<ruby>a").unwrap_err();
        assert_eq!(err, MarkupError::UnexpectedEof { tag: "ruby".into() });
    }

    #[test]
    fn test_render_escapes() {
        let el = Element::new("a")
            .with_attr("href", "https://e.com/?a=1&b=\"2\"")
            .with_text("5 < 6 & 7 > 4");
        let rendered = render_markup(&[Markup::Element(el)]);
        assert_eq!(
            rendered,
            r#"<a href="https://e.com/?a=1&amp;b=&quot;2&quot;">5 &lt; 6 &amp; 7 &gt; 4</a>"#
        );
        // What the writer emits, the parser reads back.
        let back = parse_one(&rendered);
        assert_eq!(back.attr("href"), Some("https://e.com/?a=1&b=\"2\""));
        assert_eq!(back.text_content(), "5 < 6 & 7 > 4");
    }
}
