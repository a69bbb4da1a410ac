//! Linear document data: open/close elements interleaved with content
//!
//! JSON shape:
//!
//! ```text
//! [{"type": "paragraph"}, "a", ["b", ["h123"]], {"type": "/paragraph"}]
//! ```

use crate::linear::LinearItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node attribute holding the dirty state (`mt`, `edited`, `approved`)
pub const DIRTY_ATTRIBUTE: &str = "ll-dirty";

/// Node attribute holding the serialized diff3 chunks of a conflicting update
pub const DIFF3_ATTRIBUTE: &str = "ll-diff3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Paragraph,
    Heading,
    Preformatted,
    List,
    ListItem,
    Section,
}

impl NodeType {
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Paragraph => "paragraph",
            NodeType::Heading => "heading",
            NodeType::Preformatted => "preformatted",
            NodeType::List => "list",
            NodeType::ListItem => "listItem",
            NodeType::Section => "section",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "paragraph" => Some(NodeType::Paragraph),
            "heading" => Some(NodeType::Heading),
            "preformatted" => Some(NodeType::Preformatted),
            "list" => Some(NodeType::List),
            "listItem" => Some(NodeType::ListItem),
            "section" => Some(NodeType::Section),
            _ => None,
        }
    }

    /// Content branch nodes hold text; other nodes hold only elements
    pub fn is_content_branch(self) -> bool {
        matches!(self, NodeType::Paragraph | NodeType::Heading | NodeType::Preformatted)
    }
}

/// An opening element and its attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub node_type: NodeType,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Element {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: serde_json::Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }
}

/// One item of document data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawItem", into = "RawItem")]
pub enum DataItem {
    Open(Element),
    Close(NodeType),
    Content(LinearItem),
}

impl DataItem {
    pub fn open(node_type: NodeType) -> Self {
        DataItem::Open(Element::new(node_type))
    }

    pub fn is_content(&self) -> bool {
        matches!(self, DataItem::Content(_))
    }

    pub fn as_content(&self) -> Option<&LinearItem> {
        match self {
            DataItem::Content(item) => Some(item),
            _ => None,
        }
    }
}

impl From<LinearItem> for DataItem {
    fn from(item: LinearItem) -> Self {
        DataItem::Content(item)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawItem {
    Content(LinearItem),
    Element(RawElement),
}

#[derive(Serialize, Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawItem> for DataItem {
    type Error = String;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let element = match raw {
            RawItem::Content(item) => return Ok(DataItem::Content(item)),
            RawItem::Element(element) => element,
        };
        let (closing, name) = match element.node_type.strip_prefix('/') {
            Some(name) => (true, name),
            None => (false, element.node_type.as_str()),
        };
        let node_type = NodeType::from_name(name).ok_or_else(|| format!("Unknown node type: {}", name))?;
        Ok(if closing {
            DataItem::Close(node_type)
        } else {
            DataItem::Open(Element {
                node_type,
                attributes: element.attributes,
            })
        })
    }
}

impl From<DataItem> for RawItem {
    fn from(item: DataItem) -> Self {
        match item {
            DataItem::Content(item) => RawItem::Content(item),
            DataItem::Open(element) => RawItem::Element(RawElement {
                node_type: element.node_type.name().to_string(),
                attributes: element.attributes,
            }),
            DataItem::Close(node_type) => RawItem::Element(RawElement {
                node_type: format!("/{}", node_type.name()),
                attributes: BTreeMap::new(),
            }),
        }
    }
}

/// Keep only the structural (element) items
pub fn strip_content(items: &[DataItem]) -> Vec<DataItem> {
    items.iter().filter(|item| !item.is_content()).cloned().collect()
}

/// Wrap linear data as document content items
pub fn content_items(data: &[LinearItem]) -> Vec<DataItem> {
    data.iter().cloned().map(DataItem::Content).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_shape() {
        let data = vec![
            DataItem::Open(Element::new(NodeType::Paragraph).with_attribute(DIRTY_ATTRIBUTE, json!("mt"))),
            DataItem::Content(LinearItem::Plain('a')),
            DataItem::Content(LinearItem::new('b', vec!["h1".to_string()])),
            DataItem::Close(NodeType::Paragraph),
        ];
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(
            value,
            json!([
                { "type": "paragraph", "attributes": { "ll-dirty": "mt" } },
                "a",
                ["b", ["h1"]],
                { "type": "/paragraph" }
            ])
        );
        let back: Vec<DataItem> = serde_json::from_value(value).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<Vec<DataItem>, _> = serde_json::from_value(json!([{ "type": "table" }]));
        assert!(result.is_err());
    }

    #[test]
    fn test_strip_content() {
        let data = vec![
            DataItem::open(NodeType::ListItem),
            DataItem::open(NodeType::Paragraph),
            DataItem::Content(LinearItem::Plain('x')),
            DataItem::Close(NodeType::Paragraph),
            DataItem::Close(NodeType::ListItem),
        ];
        assert_eq!(
            strip_content(&data),
            vec![
                DataItem::open(NodeType::ListItem),
                DataItem::open(NodeType::Paragraph),
                DataItem::Close(NodeType::Paragraph),
                DataItem::Close(NodeType::ListItem),
            ]
        );
    }
}
