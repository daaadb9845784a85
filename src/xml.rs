use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed xml at byte {position}: {source}")]
    Syntax {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    #[error("unexpected closing tag </{0}>")]
    UnbalancedClose(String),
    #[error("unclosed element <{0}> at end of document")]
    Unclosed(String),
    #[error("document has no root element")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// One element of a parsed document. Names are stored lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

/// Parsed document. Wraps the top-level elements in a synthetic root so that
/// `find_all` on the document searches every element.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Element {
    fn new(name: String, attrs: Vec<(String, String)>) -> Self {
        Element {
            name,
            attrs,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Direct child elements, text nodes skipped.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// All descendant elements in document order, `self` excluded.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children().rev().collect(),
        }
    }

    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        self.descendants().filter(|e| e.name == tag).collect()
    }

    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.descendants().find(|e| e.name == tag)
    }

    /// True when this element or any descendant is named `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.name == tag || self.descendants().any(|e| e.name == tag)
    }

    /// Concatenated text of every descendant text node, untrimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// Lazy pre-order walk over an element's subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let el = self.stack.pop()?;
        self.stack.extend(el.children().rev());
        Some(el)
    }
}

impl Document {
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        self.root.find_all(tag)
    }

    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.root.find(tag)
    }
}

/// Parse markup into an owned element tree.
pub fn parse(xml: &str) -> Result<Document, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = vec![Element::new("#document".to_string(), Vec::new())];

    loop {
        let event = reader.read_event().map_err(|source| XmlError::Syntax {
            position: reader.buffer_position() as u64,
            source,
        })?;
        match event {
            Event::Start(e) => {
                let el = open_element(&e);
                stack.push(el);
            }
            Event::Empty(e) => {
                let el = open_element(&e);
                push_node(&mut stack, Node::Element(el));
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                if stack.len() < 2 {
                    return Err(XmlError::UnbalancedClose(name));
                }
                let el = stack.pop().ok_or_else(|| XmlError::UnbalancedClose(name.clone()))?;
                if el.name != name {
                    return Err(XmlError::UnbalancedClose(name));
                }
                push_node(&mut stack, Node::Element(el));
            }
            Event::Text(e) => {
                let text = match e.unescape() {
                    Ok(t) => t.into_owned(),
                    Err(_) => String::from_utf8_lossy(&e).into_owned(),
                };
                push_node(&mut stack, Node::Text(text));
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_node(&mut stack, Node::Text(text));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack.pop().map(|e| e.name).unwrap_or_default();
        return Err(XmlError::Unclosed(open));
    }
    let root = stack.pop().ok_or(XmlError::Empty)?;
    if root.children().next().is_none() {
        return Err(XmlError::Empty);
    }
    Ok(Document { root })
}

fn open_element(e: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
    let attrs = e
        .attributes()
        .flatten()
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.as_ref()).to_lowercase();
            let value = match a.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
            };
            (key, value)
        })
        .collect();
    Element::new(name, attrs)
}

fn push_node(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_names_keeps_values() {
        let doc = parse(r#"<Fund><FundCode Kind="Open">ABC</FundCode></Fund>"#).unwrap();
        let code = doc.find("fundcode").unwrap();
        assert_eq!(code.attr("kind"), Some("Open"));
        assert_eq!(code.text(), "ABC");
    }

    #[test]
    fn find_all_in_document_order() {
        let doc = parse("<a><b id=\"1\"><b id=\"2\"/></b><c><b id=\"3\"/></c></a>").unwrap();
        let ids: Vec<_> = doc.find_all("b").iter().filter_map(|e| e.attr("id")).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn find_all_excludes_self() {
        let doc = parse("<b><b/></b>").unwrap();
        let outer = doc.find("b").unwrap();
        assert_eq!(outer.find_all("b").len(), 1);
        assert!(outer.contains("b"));
    }

    #[test]
    fn descendants_walk_pre_order() {
        let doc = parse("<a><b><c/></b><d/></a>").unwrap();
        let names: Vec<_> = doc.find("a").unwrap().descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn find_takes_first_in_pre_order() {
        let doc = parse(r#"<a><x><t id="1"/></x><t id="2"/></a>"#).unwrap();
        assert_eq!(doc.find("t").and_then(|t| t.attr("id")), Some("1"));
        assert!(doc.find("missing").is_none());
    }

    #[test]
    fn text_concatenates_descendants() {
        let doc = parse("<p>one <i>two</i> three &amp; <![CDATA[four]]></p>").unwrap();
        assert_eq!(doc.find("p").unwrap().text(), "one two three & four");
    }

    #[test]
    fn unbalanced_close_is_error() {
        assert!(matches!(
            parse("<a><b></a>"),
            Err(XmlError::Syntax { .. }) | Err(XmlError::UnbalancedClose(_))
        ));
    }

    #[test]
    fn truncated_tag_is_error() {
        assert!(parse("<broken").is_err());
    }

    #[test]
    fn empty_input_is_error() {
        assert!(matches!(parse("   "), Err(XmlError::Empty)));
    }
}
