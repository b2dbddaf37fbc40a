//! Shared XML plumbing
//!
//! Reading goes through roxmltree (namespace-aware, borrowed tree). Writing
//! builds an owned [`XmlElement`] tree and serializes it with quick-xml so
//! escaping and indentation are handled in one place.

use crate::converters::errors::{ConversionError, ParseError};
use crate::mappings::attribute_name;
use crate::models::{AttrMap, Dialect, ForeignAttr, CMME_NS, MEI_NS, XML_NS};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use roxmltree::{Document, Node};
use std::io::Write;

// ============================================================================
// OWNED OUTPUT TREE
// ============================================================================

/// Element under construction for output
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Set an attribute unless one with the same name is already present
    ///
    /// Returns false when the attribute was skipped.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.attributes.iter().any(|(k, _)| *k == name) {
            log::debug!("<{}>: duplicate attribute '{}' dropped", self.name, name);
            return false;
        }
        self.attributes.push((name, value.into()));
        true
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Write passthrough attributes for `target`, applying the prefix policy
    pub fn set_foreign_attrs(&mut self, attrs: &AttrMap, target: Dialect) {
        for ForeignAttr { origin, name, value } in attrs {
            self.set_attr(attribute_name(name, *origin, target), value.as_str());
        }
    }

    /// Declare `xmlns:cmme` / `xmlns:mei` on this element for every prefix used below it
    pub fn declare_passthrough_namespaces(&mut self) {
        for dialect in [Dialect::Cmme, Dialect::Mei] {
            let prefix = format!("{}:", dialect.prefix());
            let decl = format!("xmlns:{}", dialect.prefix());
            if self.get_attr(&decl).is_none() && self.uses_prefix(&prefix) {
                self.attributes.push((decl, dialect.namespace().to_string()));
            }
        }
    }

    fn uses_prefix(&self, prefix: &str) -> bool {
        self.name.starts_with(prefix)
            || self.attributes.iter().any(|(k, _)| k.starts_with(prefix))
            || self.children.iter().any(|c| c.uses_prefix(prefix))
    }

    /// Serialize with `indent` spaces per level; no XML declaration
    pub fn to_pretty_string(&self, indent: usize) -> Result<String, ConversionError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', indent);
        self.write_into(&mut writer)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| ConversionError::XmlWrite(format!("output is not UTF-8: {}", e)))
    }

    fn write_into<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if self.text.is_none() && self.children.is_empty() {
            return writer.write_event(Event::Empty(start));
        }

        writer.write_event(Event::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))
    }
}

/// Turn a free-form metadata key into a usable element name
pub fn sanitize_element_name(key: &str) -> String {
    let mut out: String = key
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let starts_ok = out
        .chars()
        .next()
        .map_or(false, |c| c.is_alphabetic() || c == '_');
    if !starts_ok {
        out.insert(0, '_');
    }
    out
}

// ============================================================================
// READING HELPERS (roxmltree)
// ============================================================================

pub fn parse_xml(text: &str) -> Result<Document<'_>, ParseError> {
    Document::parse(text).map_err(ParseError::from)
}

/// Local (namespace-free) tag name
pub fn local_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

pub fn is_named(node: Node, name: &str) -> bool {
    node.is_element() && local_name(node) == name
}

pub fn child_elements<'a, 'i>(node: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(|n| n.is_element())
}

/// First child element with the given local name
pub fn get_child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| is_named(*n, name))
}

pub fn children_named<'a, 'i: 'a>(
    node: Node<'a, 'i>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'i>> + 'a {
    node.children().filter(move |n| is_named(*n, name))
}

/// First descendant (excluding `node` itself) with the given local name
pub fn find_descendant<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.descendants().skip(1).find(|n| is_named(*n, name))
}

/// Trimmed text content, if non-empty
pub fn text_of(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Unqualified attribute value
pub fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name)
}

pub fn xml_id<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.attribute((XML_NS, "id"))
}

/// Read an attribute's provenance-qualified name
///
/// Unqualified attributes belong to `own`. Attributes in the `cmme:` or
/// `mei:` passthrough namespaces are restored to their origin dialect with
/// their bare name. `xml:*` and other namespaces keep a prefixed name.
pub fn qualify_attribute(node: Node, attribute: &roxmltree::Attribute, own: Dialect) -> (Dialect, String) {
    let name = attribute.name();
    match attribute.namespace() {
        None => (own, name.to_string()),
        Some(XML_NS) => (own, format!("xml:{}", name)),
        Some(MEI_NS) => (Dialect::Mei, name.to_string()),
        Some(CMME_NS) => (Dialect::Cmme, name.to_string()),
        Some(uri) => match node.lookup_prefix(uri) {
            Some(prefix) => (own, format!("{}:{}", prefix, name)),
            None => (own, name.to_string()),
        },
    }
}

/// Collect every attribute except those listed in `consumed`
///
/// `consumed` holds qualified names as produced by [`qualify_attribute`] for
/// the `own` dialect (e.g. `"pitch"`, `"xml:id"`).
pub fn foreign_attributes(node: Node, own: Dialect, consumed: &[&str]) -> AttrMap {
    let mut out = AttrMap::new();
    for attribute in node.attributes() {
        let (origin, name) = qualify_attribute(node, &attribute, own);
        if origin == own && consumed.contains(&name.as_str()) {
            continue;
        }
        out.push(origin, name, attribute.value());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_print_keeps_text_inline() {
        let el = XmlElement::new("metadata")
            .child(XmlElement::new("title").with_text("Missa & Motet"))
            .child(XmlElement::new("empty").attr("a", "<1>"));
        let xml = el.to_pretty_string(2).unwrap();
        assert_eq!(
            xml,
            "<metadata>\n  <title>Missa &amp; Motet</title>\n  <empty a=\"&lt;1&gt;\"/>\n</metadata>"
        );
    }

    #[test]
    fn test_duplicate_attribute_is_skipped() {
        let mut el = XmlElement::new("note");
        assert!(el.set_attr("accid", "s"));
        assert!(!el.set_attr("accid", "n"));
        assert_eq!(el.get_attr("accid"), Some("s"));
    }

    #[test]
    fn test_declares_used_prefixes_only() {
        let mut root = XmlElement::new("mei")
            .child(XmlElement::new("note").attr("cmme:foo", "bar"));
        root.declare_passthrough_namespaces();
        assert_eq!(root.get_attr("xmlns:cmme"), Some(CMME_NS));
        assert_eq!(root.get_attr("xmlns:mei"), None);
    }

    #[test]
    fn test_sanitize_element_name() {
        assert_eq!(sanitize_element_name("date"), "date");
        assert_eq!(sanitize_element_name("source library"), "source_library");
        assert_eq!(sanitize_element_name("1st"), "_1st");
    }

    #[test]
    fn test_qualified_attribute_provenance() {
        let xml = format!(
            r#"<note xmlns:mei="{}" xmlns:cmme="{}" pitch="C4" mei:accid="n" cmme:foo="x" xml:lang="la"/>"#,
            MEI_NS, CMME_NS
        );
        let doc = parse_xml(&xml).unwrap();
        let attrs = foreign_attributes(doc.root_element(), Dialect::Cmme, &["pitch"]);
        let flat: Vec<_> = attrs
            .iter()
            .map(|a| (a.origin, a.name.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(
            flat,
            vec![
                (Dialect::Mei, "accid", "n"),
                (Dialect::Cmme, "foo", "x"),
                (Dialect::Cmme, "xml:lang", "la"),
            ]
        );
    }
}
