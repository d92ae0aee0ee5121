//! Output tree produced by XML conversion

use indexmap::map::{IntoIter, Iter, Keys, Values};
use indexmap::IndexMap;
use std::fmt;
use std::ops::Index;

/// A converted XML value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Node {
    /// No text, no attributes, no children
    #[default]
    Absent,
    /// Trimmed, non-empty text
    Scalar(String),
    /// Ordered run of same-tag siblings
    List(Vec<Node>),
    /// Child tags and attribute names mapped to their values
    Record(Record),
}

/// Variant discriminant of a [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Absent,
    Scalar,
    List,
    Record,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Scalar => "scalar",
            Self::List => "list",
            Self::Record => "record",
        };
        f.write_str(name)
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Absent => NodeKind::Absent,
            Self::Scalar(_) => NodeKind::Scalar,
            Self::List(_) => NodeKind::List,
            Self::Record(_) => NodeKind::Record,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Returns the text if this is a scalar, None otherwise
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items if this is a list, None otherwise
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the record if this is a record, None otherwise
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Look up a key when this node is a record
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_record().and_then(|record| record.get(key))
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_owned())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Self::List(items)
    }
}

impl From<Record> for Node {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

/// An order-preserving record of string keys to nodes
///
/// Inserting an existing key replaces its value and keeps the key's original
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record(IndexMap<String, Node>);

impl Record {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Inserts a key-value pair, returning the replaced value if any
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.0.insert(key.into(), value.into())
    }

    pub fn keys(&self) -> Keys<'_, String, Node> {
        self.0.keys()
    }

    pub fn values(&self) -> Values<'_, String, Node> {
        self.0.values()
    }

    pub fn iter(&self) -> Iter<'_, String, Node> {
        self.0.iter()
    }
}

impl Index<&str> for Record {
    type Output = Node;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, key: &str) -> &Self::Output {
        &self.0[key]
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Node);
    type IntoIter = Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Record {
    type Item = (String, Node);
    type IntoIter = IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(feature = "serde")]
mod ser {
    use serde::ser::{Serialize, SerializeMap, Serializer};

    use super::{Node, Record};

    impl Serialize for Node {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match self {
                Self::Absent => serializer.serialize_unit(),
                Self::Scalar(text) => serializer.serialize_str(text),
                Self::List(items) => items.serialize(serializer),
                Self::Record(record) => record.serialize(serializer),
            }
        }
    }

    impl Serialize for Record {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let node = Node::from("x");
        assert_eq!(node.kind(), NodeKind::Scalar);
        assert_eq!(node.as_scalar(), Some("x"));
        assert!(node.as_list().is_none());
        assert!(node.as_record().is_none());

        let list = Node::from(vec![Node::from("a"), Node::Absent]);
        assert!(list.is_list());
        assert_eq!(list.as_list().map(<[Node]>::len), Some(2));

        assert!(Node::default().is_absent());
        assert_eq!(NodeKind::Record.to_string(), "record");
    }

    #[test]
    fn test_record_last_write_wins_keeps_position() {
        let mut record = Record::new();
        assert_eq!(record.insert("a", "1"), None);
        record.insert("b", "2");
        assert_eq!(record.insert("a", "3"), Some(Node::from("1")));

        let keys: Vec<_> = record.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(record["a"], Node::from("3"));
    }

    #[test]
    fn test_record_from_iter() {
        let record: Record = [("x", "1"), ("y", "2")].into_iter().collect();
        let node = Node::from(record);
        assert_eq!(node.get("y"), Some(&Node::from("2")));
        assert_eq!(node.get("z"), None);
    }
}
