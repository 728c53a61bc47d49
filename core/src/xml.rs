//! Small owned element tree built from `quick-xml` events.
//!
//! Bug documents are tiny, and the mapping addresses parts of comments and
//! messages by position, so a tree is simpler to work with than a streaming
//! state machine.

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum XmlError {
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),
    #[error(transparent)]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("document has no root element")]
    NoRoot,
    #[error("document has more than one root element")]
    MultipleRoots,
    #[error("unexpected end of document inside <{0}>")]
    Unclosed(String),
}

#[derive(Debug, Clone)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub(crate) fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Element children in document order; text nodes are skipped.
    pub(crate) fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub(crate) fn child(&self, index: usize) -> Option<&Element> {
        self.elements().nth(index)
    }

    /// Concatenated text of every descendant.
    pub(crate) fn inner_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// First element named `name` in document order, this element included.
    pub(crate) fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.elements().find_map(|child| child.find(name))
    }

    /// Every element named `name` below this one, in document order, paired
    /// with its parent.
    pub(crate) fn find_all_with_parent<'a>(
        &'a self,
        name: &str,
    ) -> Vec<(&'a Element, &'a Element)> {
        let mut found = Vec::new();
        self.walk_with_parent(name, &mut found);
        found
    }

    fn walk_with_parent<'a>(&'a self, name: &str, found: &mut Vec<(&'a Element, &'a Element)>) {
        for child in self.elements() {
            if child.name == name {
                found.push((self, child));
            }
            child.walk_with_parent(name, found);
        }
    }
}

pub(crate) fn parse(text: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref start) => stack.push(Element::open(start)?),
            Event::Empty(ref start) => {
                let element = Element::open(start)?;
                attach(&mut stack, &mut root, element)?;
            },
            Event::End(_) => {
                // quick-xml already rejects mismatched end tags.
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element)?;
                }
            },
            Event::Text(ref text) => {
                let text = text.unescape()?;
                if !text.trim().is_empty() {
                    push_text(&mut stack, text.into_owned());
                }
            },
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                push_text(&mut stack, text);
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    root.ok_or(XmlError::NoRoot)
}

/// `encoding` pseudo-attribute of the leading XML declaration, if any.
pub(crate) fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    match reader.read_event_into(&mut buf) {
        Ok(Event::Decl(decl)) => {
            let value = decl.encoding()?.ok()?;
            Some(String::from_utf8_lossy(&value).into_owned())
        },
        _ => None,
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(XmlError::MultipleRoots),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: String) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Text(text));
    }
}
