//! Minimal XML element tree for service response documents.
//!
//! Response documents are small, so they are read into a tree of elements
//! with quick-xml and then queried by name. Namespace prefixes are dropped.
//! Leaf text is kept verbatim (no trimming) because message bodies are
//! checksummed byte for byte; whitespace between child elements is discarded.

use crate::error::SqsError;
use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlElement {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First element with the given name anywhere below this one (depth first)
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .find_map(|c| if c.name == name { Some(c) } else { c.find(name) })
    }

    /// Text of the first direct child with the given name
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// Text of a required direct child
    pub fn required_text(&self, name: &str) -> Result<&str, SqsError> {
        self.child_text(name).ok_or_else(|| {
            SqsError::deserialization(format!("<{}> is missing from <{}>", name, self.name))
        })
    }
}

/// Parse a complete document and return its root element
pub(crate) fn parse(xml: &str) -> Result<XmlElement, SqsError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.push(XmlElement::new(name));
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                attach(&mut stack, &mut root, XmlElement::new(name))?;
            }
            Ok(Event::Text(e)) => {
                if let Some(current) = stack.last_mut() {
                    let text = e.unescape().map_err(|e| {
                        SqsError::deserialization(format!("Failed to parse XML: {}", e))
                    })?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    let bytes = e.into_inner();
                    let text = std::str::from_utf8(&bytes).map_err(|e| {
                        SqsError::deserialization(format!("CDATA is not UTF-8: {}", e))
                    })?;
                    current.text.push_str(text);
                }
            }
            Ok(Event::End(_)) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| SqsError::deserialization("Unbalanced closing tag"))?;
                if !element.children.is_empty() {
                    element.text.clear();
                }
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SqsError::deserialization(format!(
                    "XML parsing error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(SqsError::deserialization("Document ended inside an element"));
    }
    root.ok_or_else(|| SqsError::deserialization("Empty response document"))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), SqsError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(SqsError::deserialization("Document has more than one root")),
    }
    Ok(())
}

#[cfg(test)]
#[path = "xml_tests.rs"]
mod tests;
