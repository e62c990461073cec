//! Minimal namespace-aware element tree for KML documents.
//!
//! Boundary files in the wild come in several shapes: KML 2.2 or 2.1
//! namespaces, polygons wrapped in `MultiGeometry`, or no namespace at all.
//! The tree keeps each element's resolved namespace URI so the lookups in
//! [`crate::extract_polygon`] can try each variant in turn.

use quick_xml::NsReader;
use quick_xml::encoding::Decoder;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};

/// The KML 2.2 namespace (OGC).
pub const KML_22_NS: &str = "http://www.opengis.net/kml/2.2";

/// The KML 2.1 namespace (Google Earth).
pub const KML_21_NS: &str = "http://earth.google.com/kml/2.1";

/// A parsed XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Resolved namespace URI, `None` for unnamespaced elements.
    pub namespace: Option<String>,
    /// Local name without any prefix.
    pub local_name: String,
    /// Child elements in document order.
    pub children: Vec<Self>,
    /// Concatenated direct text content (text and CDATA).
    pub text: String,
}

impl Element {
    fn new(namespace: Option<String>, local_name: String) -> Self {
        Self {
            namespace,
            local_name,
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// Whether this element has the given namespace and local name.
    #[must_use]
    pub fn is(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == namespace
    }

    /// Children matching the given name, in document order.
    #[must_use]
    pub fn children_named<'a>(&'a self, namespace: Option<&str>, local_name: &str) -> Vec<&'a Self> {
        self.children
            .iter()
            .filter(|child| child.is(namespace, local_name))
            .collect()
    }

    /// All elements strictly below this one, depth-first in document order.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        let mut stack: Vec<&Self> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            out.push(element);
            stack.extend(element.children.iter().rev());
        }
        out
    }

    /// Descendants matching the given name, in document order.
    #[must_use]
    pub fn descendants_named<'a>(
        &'a self,
        namespace: Option<&str>,
        local_name: &str,
    ) -> Vec<&'a Self> {
        self.descendants()
            .into_iter()
            .filter(|element| element.is(namespace, local_name))
            .collect()
    }
}

/// Why a document could not be turned into an element tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct XmlError {
    /// Description of the problem, including the byte position when known.
    pub message: String,
}

impl XmlError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parses an XML document into its root element.
///
/// Rejects documents that are not well-formed: mismatched or unclosed
/// tags, unbound prefixes, more than one root, stray text outside the root,
/// or no root at all.
///
/// # Errors
///
/// Returns [`XmlError`] describing the first problem found.
pub fn parse_document(text: &str) -> Result<Element, XmlError> {
    build_tree(NsReader::from_str(text))
}

/// Parses raw document bytes into their root element.
///
/// The bytes are decoded per the byte order mark or the `encoding` named
/// in the XML declaration, falling back to UTF-8. Bytes that are invalid in
/// that encoding are an error.
///
/// # Errors
///
/// Returns [`XmlError`] describing the first problem found.
pub fn parse_document_bytes(bytes: &[u8]) -> Result<Element, XmlError> {
    build_tree(NsReader::from_reader(bytes))
}

fn build_tree(mut reader: NsReader<&[u8]>) -> Result<Element, XmlError> {
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position();
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| XmlError::new(format!("{e} at byte {position}")))?;

        match event {
            Event::Start(start) => {
                let namespace = resolve_namespace(&resolved)?;
                let local_name = decode(reader.decoder(), start.local_name().as_ref(), position)?;
                if stack.is_empty() && root.is_some() {
                    return Err(XmlError::new("junk after document element"));
                }
                stack.push(Element::new(namespace, local_name));
            }
            Event::Empty(empty) => {
                let namespace = resolve_namespace(&resolved)?;
                let local_name = decode(reader.decoder(), empty.local_name().as_ref(), position)?;
                attach(Element::new(namespace, local_name), &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::new("closing tag without an opening tag"))?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(content) => {
                let unescaped = content
                    .unescape()
                    .map_err(|e| XmlError::new(format!("{e} at byte {position}")))?;
                append_text(&unescaped, &mut stack)?;
            }
            Event::CData(cdata) => {
                let content = decode(reader.decoder(), &cdata, position)?;
                append_text(&content, &mut stack)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::new(format!(
            "unclosed element <{}>",
            open.local_name
        )));
    }

    root.ok_or_else(|| XmlError::new("no element found"))
}

fn decode(
    decoder: Decoder,
    bytes: &[u8],
    position: impl std::fmt::Display,
) -> Result<String, XmlError> {
    decoder
        .decode(bytes)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| XmlError::new(format!("{e} at byte {position}")))
}

fn resolve_namespace(resolved: &ResolveResult<'_>) -> Result<Option<String>, XmlError> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(String::from_utf8_lossy(uri).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(XmlError::new(format!(
            "unbound prefix {:?}",
            String::from_utf8_lossy(prefix)
        ))),
    }
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(XmlError::new("junk after document element"))
    } else {
        *root = Some(element);
        Ok(())
    }
}

fn append_text(text: &str, stack: &mut [Element]) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(element) => {
            element.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlError::new("text outside the document element")),
    }
}
