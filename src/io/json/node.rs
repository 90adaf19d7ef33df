use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;

/// One group of a JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Node {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, Node>,
}

impl Node {
    pub fn at(&self, path: &[String]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, component| node.children.get(component))
    }

    pub fn at_mut(&mut self, path: &[String]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, component| node.children.get_mut(component))
    }

    /// Walk to `path`, creating missing groups on the way
    pub fn create(&mut self, path: &[String]) -> &mut Node {
        path.iter().fold(self, |node, component| {
            node.children.entry(component.clone()).or_default()
        })
    }
}

/// Split a group path into components, dropping empty and `.` segments
pub(crate) fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .map(str::to_string)
        .collect()
}

pub(crate) fn display_path(path: &[String]) -> String {
    format!("/{}", path.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/data/"), vec!["data"]);
        assert_eq!(split_path("meshes/E/./x"), vec!["meshes", "E", "x"]);
        assert!(split_path("/").is_empty());
    }

    #[test]
    fn test_create_and_lookup() {
        let mut root = Node::default();
        let path = split_path("/data/100");
        root.create(&path)
            .attributes
            .insert("time".into(), Attribute::from(1.5f64));

        assert!(root.at(&split_path("/data")).is_some());
        assert!(root.at(&split_path("/data/200")).is_none());
        let node = root.at_mut(&path).unwrap();
        assert_eq!(node.attributes["time"], Attribute::from(1.5f64));
        assert_eq!(display_path(&path), "/data/100");
    }
}
