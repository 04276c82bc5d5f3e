use super::Identifier;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque record returned by the remote service for one identifier.
///
/// The fetch core never looks inside a document; the accessors here exist
/// for presentation at the edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(serde_json::Value);

impl Document {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Looks up a top-level field when the document is a JSON object.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.as_object().and_then(|obj| obj.get(key))
    }

    /// The document's `name` field, if it carries one.
    pub fn name(&self) -> Option<&str> {
        self.field("name").and_then(|v| v.as_str())
    }
}

impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Mapping from identifier to document with unique keys.
///
/// Insertion order is preserved so a collection assembled chunk by chunk
/// iterates in request order. Merging is a union where the incoming value
/// wins for keys present on both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentCollection(IndexMap<Identifier, Document>);

impl DocumentCollection {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    pub fn insert(&mut self, id: Identifier, document: Document) -> Option<Document> {
        self.0.insert(id, document)
    }

    /// Union-merges `other` into `self`, overwriting existing keys.
    pub fn merge(&mut self, other: DocumentCollection) {
        self.0.reserve(other.len());
        for (id, document) in other.0 {
            self.0.insert(id, document);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.0.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.0.keys()
    }

    /// Snapshot of the keys as a set, used as the "known" side of a diff.
    pub fn identifier_set(&self) -> HashSet<Identifier> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &Document)> {
        self.0.iter()
    }
}

impl FromIterator<(Identifier, Document)> for DocumentCollection {
    fn from_iter<I: IntoIterator<Item = (Identifier, Document)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for DocumentCollection {
    type Item = (Identifier, Document);
    type IntoIter = indexmap::map::IntoIter<Identifier, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<(Identifier, Document)> for DocumentCollection {
    fn extend<I: IntoIterator<Item = (Identifier, Document)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn merge_is_union_with_overwrite() {
        let mut left: DocumentCollection = [
            (id("a"), Document::new(json!({"v": 1}))),
            (id("b"), Document::new(json!({"v": 1}))),
        ]
        .into_iter()
        .collect();
        let right: DocumentCollection = [
            (id("b"), Document::new(json!({"v": 2}))),
            (id("c"), Document::new(json!({"v": 2}))),
        ]
        .into_iter()
        .collect();

        left.merge(right);

        assert_eq!(left.len(), 3);
        assert_eq!(left.get("a").unwrap().field("v"), Some(&json!(1)));
        assert_eq!(left.get("b").unwrap().field("v"), Some(&json!(2)));
        assert!(left.contains("c"));
    }

    #[test]
    fn merge_preserves_first_insertion_order() {
        let mut left: DocumentCollection =
            [(id("x"), Document::new(json!(null)))].into_iter().collect();
        left.merge(
            [
                (id("y"), Document::new(json!(null))),
                (id("x"), Document::new(json!(1))),
            ]
            .into_iter()
            .collect(),
        );
        let keys: Vec<&str> = left.identifiers().map(Identifier::as_str).collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn deserializes_from_json_object() {
        let parsed: DocumentCollection =
            serde_json::from_value(json!({"abc": {"name": "Island"}})).unwrap();
        assert_eq!(parsed.get("abc").and_then(Document::name), Some("Island"));
    }

    #[test]
    fn document_field_on_non_object_is_none() {
        let doc = Document::new(json!([1, 2, 3]));
        assert!(doc.field("name").is_none());
        assert!(doc.name().is_none());
    }
}
