//! XML tree to nested record/list conversion
//!
//! Each element with children is classified by its first two children: equal
//! tags make the whole group a list, anything else makes it a record keyed by
//! child tag. Attributes are merged into the element's record after its
//! children, so an attribute replaces a child with the same name.
//!
//! ```
//! use aptx::{convert::convert, xml::Element, Node};
//!
//! let person = Element::new("person")
//!     .with_attribute("id", "7")
//!     .with_child(Element::new("name").with_text("Joe"));
//!
//! let node = convert(&person);
//! assert_eq!(node.get("name"), Some(&Node::from("Joe")));
//! assert_eq!(node.get("id"), Some(&Node::from("7")));
//! ```

use std::collections::HashSet;

use crate::error::{Error, ErrorKind, Result};
use crate::node::{Node, Record};
use crate::xml::model::{Document, Element};
#[cfg(feature = "serde")]
use crate::xml::parser::Parser;

/// How colliding record keys are resolved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// The value written last replaces earlier ones
    #[default]
    LastWins,
    /// Any key collision, or a list whose siblings disagree on their tag,
    /// is reported as an error
    Strict,
}

/// Conversion options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub merge: MergeStrategy,
}

impl ConvertOptions {
    pub const fn strict() -> Self {
        Self {
            merge: MergeStrategy::Strict,
        }
    }
}

/// Shape of an element's child group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape<'a> {
    Leaf,
    /// First two children share this tag
    List(&'a str),
    Record,
}

fn classify(element: &Element) -> Shape<'_> {
    match element.children.as_slice() {
        [] => Shape::Leaf,
        [first, second, ..] if first.tag == second.tag => Shape::List(&first.tag),
        _ => Shape::Record,
    }
}

/// XML tree converter
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub const fn new() -> Self {
        Self {
            options: ConvertOptions {
                merge: MergeStrategy::LastWins,
            },
        }
    }

    pub const fn with_options(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub const fn options(&self) -> ConvertOptions {
        self.options
    }

    /// Convert an element. Only fails under [`MergeStrategy::Strict`].
    pub fn convert(&self, element: &Element) -> Result<Node> {
        if self.options.merge == MergeStrategy::Strict {
            check_unambiguous(element)?;
        }
        Ok(element_value(element))
    }

    /// Convert a whole document; the root tag itself is not part of the output
    pub fn convert_document(&self, document: &Document) -> Result<Node> {
        self.convert(&document.root)
    }
}

/// Convert an element using [`MergeStrategy::LastWins`]
pub fn convert(element: &Element) -> Node {
    element_value(element)
}

/// Convert a whole document using [`MergeStrategy::LastWins`]
pub fn convert_document(document: &Document) -> Node {
    element_value(&document.root)
}

/// Value of an element on its own, as the top-level result or a list item
fn element_value(element: &Element) -> Node {
    match classify(element) {
        Shape::Leaf if element.has_attributes() => Node::Record(attribute_record(element)),
        Shape::Leaf => element.trimmed_text().map_or(Node::Absent, Node::from),
        Shape::List(tag) if element.has_attributes() => Node::Record(wrapped_list(element, tag)),
        Shape::List(_) => Node::List(list_items(element)),
        Shape::Record => Node::Record(child_record(element)),
    }
}

/// Value stored under an element's tag inside its parent's record
fn record_entry(element: &Element) -> Node {
    match classify(element) {
        Shape::List(tag) => Node::Record(wrapped_list(element, tag)),
        _ => element_value(element),
    }
}

fn list_items(element: &Element) -> Vec<Node> {
    element.children.iter().map(element_value).collect()
}

fn wrapped_list(element: &Element, tag: &str) -> Record {
    let mut record = Record::with_capacity(element.attributes.len() + 1);
    record.insert(tag, Node::List(list_items(element)));
    merge_attributes(&mut record, element);
    record
}

fn child_record(element: &Element) -> Record {
    let mut record = Record::with_capacity(element.children.len() + element.attributes.len());
    for child in &element.children {
        record.insert(child.tag.as_str(), record_entry(child));
    }
    merge_attributes(&mut record, element);
    record
}

fn attribute_record(element: &Element) -> Record {
    let mut record = Record::with_capacity(element.attributes.len());
    merge_attributes(&mut record, element);
    record
}

fn merge_attributes(record: &mut Record, element: &Element) {
    for (name, value) in &element.attributes {
        record.insert(name.as_str(), value.as_str());
    }
}

/// Walk the tree the same way conversion does and report the first place
/// where last-wins merging would silently drop data.
fn check_unambiguous(element: &Element) -> Result<()> {
    match classify(element) {
        Shape::Leaf => Ok(()),
        Shape::List(tag) => {
            for child in &element.children {
                if child.tag != tag {
                    return Err(Error::detached(
                        ErrorKind::MixedList {
                            expected: tag.to_string(),
                            found: child.tag.clone(),
                        },
                        format!(
                            "<{}> mixes <{tag}> and <{}> children",
                            element.tag, child.tag
                        ),
                    ));
                }
                check_unambiguous(child)?;
            }
            check_attributes(element, &HashSet::from([tag]))
        }
        Shape::Record => {
            let mut seen = HashSet::with_capacity(element.children.len());
            for child in &element.children {
                if !seen.insert(child.tag.as_str()) {
                    return Err(key_conflict(element, &child.tag));
                }
                check_unambiguous(child)?;
            }
            check_attributes(element, &seen)
        }
    }
}

fn check_attributes(element: &Element, keys: &HashSet<&str>) -> Result<()> {
    match element
        .attributes
        .keys()
        .find(|name| keys.contains(name.as_str()))
    {
        Some(name) => Err(key_conflict(element, name)),
        None => Ok(()),
    }
}

fn key_conflict(element: &Element, key: &str) -> Error {
    Error::detached(
        ErrorKind::KeyConflict {
            key: key.to_string(),
        },
        format!("<{}> has more than one value for key \"{key}\"", element.tag),
    )
}

/// Serialize a converted tree as compact JSON
#[cfg(feature = "serde")]
pub fn to_json(node: &Node) -> Result<String> {
    Ok(serde_json::to_string(node)?)
}

/// Serialize a converted tree as JSON indented by four spaces
#[cfg(feature = "serde")]
pub fn to_json_pretty(node: &Node) -> Result<String> {
    let mut out = Vec::new();
    write_json_pretty(node, &mut out)?;
    String::from_utf8(out).map_err(|err| Error::detached(ErrorKind::Serialize, err.to_string()))
}

/// Write a converted tree as JSON indented by four spaces
#[cfg(feature = "serde")]
pub fn write_json_pretty<W: std::io::Write>(node: &Node, writer: W) -> Result<()> {
    use serde::Serialize;

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    node.serialize(&mut serializer)?;
    Ok(())
}

/// Parse `xml_path`, convert it and write indented JSON to `json_path`
#[cfg(feature = "serde")]
pub fn convert_file(
    xml_path: &std::path::Path,
    json_path: &std::path::Path,
    options: ConvertOptions,
) -> Result<Node> {
    use std::io::Write;

    let bytes = std::fs::read(xml_path)?;
    let document = Parser::new(&bytes).parse()?;
    let node = Converter::with_options(options).convert_document(&document)?;

    let mut writer = std::io::BufWriter::new(std::fs::File::create(json_path)?);
    write_json_pretty(&node, &mut writer)?;
    writer.flush()?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(tag: &str, text: &str) -> Element {
        Element::new(tag).with_text(text)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&Element::new("a")), Shape::Leaf);
        assert_eq!(
            classify(&Element::new("a").with_child(Element::new("b"))),
            Shape::Record
        );
        assert_eq!(
            classify(&Element::new("a").with_children([Element::new("b"), Element::new("b")])),
            Shape::List("b")
        );
        assert_eq!(
            classify(&Element::new("a").with_children([Element::new("b"), Element::new("c")])),
            Shape::Record
        );
    }

    #[test]
    fn test_leaf_attributes_drop_text() {
        let element = Element::new("p").with_attribute("x", "1").with_text("ignored");
        let expected: Record = [("x", "1")].into_iter().collect();
        assert_eq!(convert(&element), Node::Record(expected));
    }

    #[test]
    fn test_leaf_text_is_trimmed() {
        assert_eq!(convert(&leaf("label", "\n  Orbit 1 \t")), Node::from("Orbit 1"));
        assert_eq!(convert(&leaf("label", " \n ")), Node::Absent);
        assert_eq!(convert(&Element::new("label")), Node::Absent);
    }

    #[test]
    fn test_empty_leaf_in_record_is_absent() {
        let element = Element::new("r").with_children([leaf("a", "1"), Element::new("b")]);
        let node = convert(&element);
        assert_eq!(node.get("a"), Some(&Node::from("1")));
        assert_eq!(node.get("b"), Some(&Node::Absent));
    }

    #[test]
    fn test_nested_list_wrapped_under_first_child_tag() {
        let element = Element::new("proposal").with_child(
            Element::new("targets").with_children([leaf("target", "M31"), leaf("target", "M33")]),
        );
        let node = convert(&element);
        let targets = node.get("targets").and_then(|t| t.get("target"));
        assert_eq!(
            targets,
            Some(&Node::List(vec![Node::from("M31"), Node::from("M33")]))
        );
    }

    #[test]
    fn test_list_item_lists_are_bare() {
        let element = Element::new("grid").with_children([
            Element::new("row").with_children([leaf("c", "1"), leaf("c", "2")]),
            Element::new("row").with_children([leaf("c", "3"), leaf("c", "4")]),
        ]);
        let expected = Node::List(vec![
            Node::List(vec![Node::from("1"), Node::from("2")]),
            Node::List(vec![Node::from("3"), Node::from("4")]),
        ]);
        assert_eq!(convert(&element), expected);
    }

    #[test]
    fn test_list_with_attributes() {
        let element = Element::new("items")
            .with_attribute("count", "2")
            .with_children([leaf("item", "a"), leaf("item", "b")]);
        let node = convert(&element);
        assert_eq!(node.get("count"), Some(&Node::from("2")));
        assert_eq!(
            node.get("item"),
            Some(&Node::List(vec![Node::from("a"), Node::from("b")]))
        );
    }

    #[test]
    fn test_attribute_wins_over_child() {
        let element = Element::new("r")
            .with_attribute("name", "attr")
            .with_child(leaf("name", "child"));
        assert_eq!(convert(&element).get("name"), Some(&Node::from("attr")));
    }

    #[test]
    fn test_strict_rejects_attribute_collision() {
        let element = Element::new("r")
            .with_attribute("name", "attr")
            .with_child(leaf("name", "child"));
        let err = Converter::with_options(ConvertOptions::strict())
            .convert(&element)
            .err();
        assert_eq!(
            err.as_ref().map(Error::kind),
            Some(&ErrorKind::KeyConflict {
                key: "name".to_string()
            })
        );
    }

    #[test]
    fn test_strict_accepts_unambiguous_tree() -> Result<()> {
        let element = Element::new("r")
            .with_attribute("id", "1")
            .with_children([leaf("a", "1"), leaf("b", "2")]);
        let strict = Converter::with_options(ConvertOptions::strict()).convert(&element)?;
        assert_eq!(strict, Converter::new().convert(&element)?);
        Ok(())
    }
}
