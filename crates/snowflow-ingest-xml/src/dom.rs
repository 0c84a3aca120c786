//! Generic labeled tree over workflow export XML.
//!
//! A workflow export is tag-keyed records in an ordered tree; the extractor
//! only needs element names, attributes, text content and document order.
//! This module decodes raw XML into exactly that shape via quick-xml and
//! provides the descendant-wide lookups the extractor works with.
//!
//! CDATA sections contribute to element text: ServiceNow wraps condition
//! expressions and scripts in CDATA.

use quick_xml::events::attributes::AttrError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use thiserror::Error;

/// The input could not be decoded into a tree at all. Fatal to the whole
/// parse; every other irregularity degrades inside the model instead.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("closing tag without a matching open element")]
    UnexpectedCloseTag,
    #[error("unclosed element at end of document")]
    Truncated,
    #[error("document has no root element")]
    NoRoot,
}

/// One decoded element: name, attributes, accumulated text content and
/// child elements in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: HashMap<String, String>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// All elements with the given name, in document (preorder) order,
    /// anywhere in this subtree, the element itself included.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            if el.name == name {
                found.push(el);
            }
            stack.extend(el.children.iter().rev());
        }
        found
    }

    /// First element with the given name in document order, if any.
    pub fn find_first(&self, name: &str) -> Option<&Element> {
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            if el.name == name {
                return Some(el);
            }
            stack.extend(el.children.iter().rev());
        }
        None
    }

    /// Text content of the first descendant with the given name. Missing
    /// element or empty element yields `""`, never a fault.
    pub fn child_text(&self, name: &str) -> &str {
        self.find_first(name).map(|el| el.text.as_str()).unwrap_or("")
    }

    /// Attribute value of the first descendant with the given name.
    /// Missing element or missing attribute yields `""`.
    pub fn child_attr(&self, name: &str, attr: &str) -> &str {
        self.find_first(name)
            .and_then(|el| el.attributes.get(attr))
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn open_element(
    reader: &Reader<&[u8]>,
    start: &quick_xml::events::BytesStart<'_>,
) -> Result<Element, DecodeError> {
    let mut element = Element::named(reader.decoder().decode(start.name().as_ref())?.into_owned());
    for attr in start.attributes() {
        let attr = attr?;
        element.attributes.insert(
            reader.decoder().decode(attr.key.as_ref())?.into_owned(),
            attr.unescape_value()?.into_owned(),
        );
    }
    Ok(element)
}

/// Decode raw XML into its root [`Element`].
pub fn read_tree(xml: &str) -> Result<Element, DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    // Bottom of the stack is a synthetic holder; the document root ends up
    // as its first child.
    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                stack.push(open_element(&reader, &start)?);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, &start)?;
                stack
                    .last_mut()
                    .expect("holder remains on the stack")
                    .children
                    .push(element);
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(DecodeError::UnexpectedCloseTag);
                }
                let element = stack.pop().expect("stack has at least the holder");
                stack
                    .last_mut()
                    .expect("holder remains on the stack")
                    .children
                    .push(element);
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                let bytes = cdata.into_inner();
                let decoded = reader.decoder().decode(&bytes)?.into_owned();
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&decoded);
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(DecodeError::Truncated);
    }
    let holder = stack.pop().expect("holder");
    holder.children.into_iter().next().ok_or(DecodeError::NoRoot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_nested_elements_attributes_and_text() {
        let root = read_tree(
            r#"<unload date="2024-01-01">
                 <wf_activity>
                   <name>Approve</name>
                   <stage display_value="s1">abc</stage>
                 </wf_activity>
               </unload>"#,
        )
        .unwrap();

        assert_eq!(root.name, "unload");
        assert_eq!(root.attributes["date"], "2024-01-01");
        let activity = &root.children[0];
        assert_eq!(activity.child_text("name"), "Approve");
        assert_eq!(activity.child_attr("stage", "display_value"), "s1");
        assert_eq!(activity.child_text("stage"), "abc");
    }

    #[test]
    fn cdata_contributes_to_text() {
        let root = read_tree(
            "<wf_condition><condition><![CDATA[current.approved == true]]></condition></wf_condition>",
        )
        .unwrap();
        assert_eq!(root.child_text("condition"), "current.approved == true");
    }

    #[test]
    fn missing_child_and_missing_attribute_yield_empty() {
        let root = read_tree("<unload><wf_stage><name/></wf_stage></unload>").unwrap();
        let stage = &root.children[0];
        assert_eq!(stage.child_text("name"), "");
        assert_eq!(stage.child_text("order"), "");
        assert_eq!(stage.child_attr("name", "display_value"), "");
        assert_eq!(stage.child_attr("order", "display_value"), "");
    }

    #[test]
    fn find_all_is_document_order_across_nesting() {
        let root = read_tree(
            "<r><x><n>1</n><wrap><n>2</n></wrap></x><n>3</n></r>",
        )
        .unwrap();
        let texts: Vec<&str> = root.find_all("n").iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["1", "2", "3"]);
    }

    #[test]
    fn find_includes_the_element_itself() {
        let root = read_tree("<wf_workflow_version><sys_id>v1</sys_id></wf_workflow_version>")
            .unwrap();
        assert!(root.find_first("wf_workflow_version").is_some());
    }

    #[test]
    fn entities_are_unescaped() {
        let root = read_tree("<r><name>a &amp; b</name></r>").unwrap();
        assert_eq!(root.child_text("name"), "a & b");
    }

    #[test]
    fn malformed_xml_is_a_decode_error() {
        assert!(read_tree("<a><b></a>").is_err());
        assert!(matches!(read_tree(""), Err(DecodeError::NoRoot)));
        assert!(matches!(read_tree("<a><b>"), Err(DecodeError::Truncated)));
    }
}
