use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Node;
use crate::types::Money;

/// Ordered children of a pie, unique by name.
///
/// Serialized as a JSON object keyed by child name. Insertion order is kept
/// for display; inserting an existing name replaces that entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Children(Vec<Node>);

impl Children {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Node> {
        self.0.iter_mut()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.0.iter().find(|n| n.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.0.iter_mut().find(|n| n.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert `node`, replacing any sibling with the same name.
    ///
    /// Returns the replaced node.
    pub fn insert(&mut self, node: Node) -> Option<Node> {
        match self.0.iter().position(|n| n.name() == node.name()) {
            Some(i) => Some(std::mem::replace(&mut self.0[i], node)),
            None => {
                self.0.push(node);
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        let i = self.0.iter().position(|n| n.name() == name)?;
        Some(self.0.remove(i))
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|n| n.name()).collect()
    }

    /// Sum of the children's current values.
    pub fn total_value(&self) -> Money {
        self.0.iter().map(|n| n.value()).sum()
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Children {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Node> for Children {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        let mut children = Children::new();
        for node in iter {
            children.insert(node);
        }
        children
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

impl Serialize for Children {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for node in &self.0 {
            map.serialize_entry(node.name(), node)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Children {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ChildrenVisitor)
    }
}

struct ChildrenVisitor;

impl<'de> Visitor<'de> for ChildrenVisitor {
    type Value = Children;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of child name to pie or ticker node")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Children, A::Error> {
        let mut children = Children::new();
        // the map key is authoritative for the child's name
        while let Some((name, mut node)) = access.next_entry::<String, Node>()? {
            node.set_name(name);
            children.insert(node);
        }
        Ok(children)
    }
}
