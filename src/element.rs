use crate::LoadError;
use std::io::Read;
use std::str::FromStr;
use xml::reader::{ParserConfig, XmlEvent};

/// A node of a parsed XML document.
///
/// Only elements and their character data are kept; comments, processing
/// instructions and whitespace-only text are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    /// Parse a whole document, returning its root element.
    pub(crate) fn parse(text: &str) -> Result<Self, LoadError> {
        // The declaration must be the very first thing the parser sees
        Self::read(text.trim_start().as_bytes())
    }

    /// Read a whole document from a readable, returning its root element.
    pub(crate) fn read(reader: impl Read) -> Result<Self, LoadError> {
        let events = ParserConfig::new()
            .trim_whitespace(false)
            .whitespace_to_characters(false)
            .cdata_to_characters(true)
            .ignore_comments(true)
            .create_reader(reader);

        // Elements still waiting for their end tag
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;
        for event in events {
            match event? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => stack.push(Element {
                    name: name.local_name,
                    attributes: attributes
                        .into_iter()
                        .map(|attr| (attr.name.local_name, attr.value))
                        .collect(),
                    children: Vec::new(),
                    text: None,
                }),
                XmlEvent::EndElement { .. } => {
                    let Some(done) = stack.pop() else {
                        return Err(LoadError::DocumentMalformed(
                            "unbalanced end tag".to_string(),
                        ));
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => root = Some(done),
                    }
                }
                XmlEvent::Characters(chars) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.get_or_insert_with(String::new).push_str(&chars);
                    }
                }
                XmlEvent::EndDocument => break,
                _ => {}
            }
        }
        root.ok_or_else(|| LoadError::DocumentMalformed("document has no root element".into()))
    }

    /// The tag name.
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// The value of an attribute, if present.
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parse an attribute, falling back to a default when it's absent or unparsable.
    pub(crate) fn attr_or<T: FromStr>(&self, name: &str, default: T) -> T {
        self.attr(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Parse a boolean attribute. Accepts `true`/`false` as well as `1`/`0`.
    pub(crate) fn bool_attr_or(&self, name: &str, default: bool) -> bool {
        match self.attr(name).map(str::trim) {
            Some("1" | "true") => true,
            Some("0" | "false") => false,
            _ => default,
        }
    }

    /// The first child element with this tag name.
    pub(crate) fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Every child element with this tag name, in document order.
    pub(crate) fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Every child element, in document order.
    pub(crate) fn children(&self) -> &[Element] {
        &self.children
    }

    /// The character data directly inside this element, if any.
    pub(crate) fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
