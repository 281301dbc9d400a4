use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Id of the node every profile tree hangs off.
pub const ROOT_ID: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Bookmark,
    Folder,
}

/// A bookmark or folder tile.
///
/// `style` is whatever the tile editor stored (colors, font, image); the
/// undo engine only copies it around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub style: Map<String, Value>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<BookmarkNode>,
}

impl BookmarkNode {
    pub fn bookmark(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeType::Bookmark,
            title: title.into(),
            url: url.into(),
            style: Map::new(),
            parent_id: None,
            children: Vec::new(),
        }
    }

    pub fn folder(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeType::Folder,
            title: title.into(),
            url: String::new(),
            style: Map::new(),
            parent_id: None,
            children: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeType::Folder
    }

    /// A node without an id is treated as "no item at all".
    pub fn is_empty(&self) -> bool {
        self.id.trim().is_empty()
    }

    /// Copy the user-editable fields (title, url, style) from `other`.
    pub fn overwrite_fields(&mut self, other: &BookmarkNode) {
        self.title = other.title.clone();
        self.url = other.url.clone();
        self.style = other.style.clone();
    }

    /// Title for list views, falling back to the url and then the id.
    pub fn display_title(&self) -> &str {
        if !self.title.is_empty() {
            &self.title
        } else if !self.url.is_empty() {
            &self.url
        } else {
            &self.id
        }
    }
}

/// Depth-first lookup of `id` anywhere below (and including) `node`.
pub fn find_by_key<'a>(node: &'a BookmarkNode, id: &str) -> Option<&'a BookmarkNode> {
    if node.id == id {
        return Some(node);
    }
    node.children.iter().find_map(|child| find_by_key(child, id))
}

pub fn find_by_key_mut<'a>(node: &'a mut BookmarkNode, id: &str) -> Option<&'a mut BookmarkNode> {
    if node.id == id {
        return Some(node);
    }
    for child in node.children.iter_mut() {
        if let Some(found) = find_by_key_mut(child, id) {
            return Some(found);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkTree {
    pub root: BookmarkNode,
}

impl Default for BookmarkTree {
    fn default() -> Self {
        Self {
            root: BookmarkNode::folder(ROOT_ID, "Bookmarks"),
        }
    }
}

impl BookmarkTree {
    pub fn find(&self, id: &str) -> Option<&BookmarkNode> {
        find_by_key(&self.root, id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut BookmarkNode> {
        find_by_key_mut(&mut self.root, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Whether `parent_id` exists and directly holds a child with `child_id`.
    pub fn has_child(&self, parent_id: &str, child_id: &str) -> bool {
        self.find(parent_id)
            .is_some_and(|p| p.children.iter().any(|c| c.id == child_id))
    }

    /// Append `node` to the children of `parent_id`, rewriting its `parent_id`.
    /// Returns the node back if the parent does not exist.
    pub fn push_child(&mut self, parent_id: &str, mut node: BookmarkNode) -> Result<(), BookmarkNode> {
        match self.find_mut(parent_id) {
            Some(parent) => {
                node.parent_id = Some(parent_id.to_string());
                parent.children.push(node);
                Ok(())
            }
            None => Err(node),
        }
    }

    /// Remove the direct child `child_id` of `parent_id`.
    pub fn remove_child(&mut self, parent_id: &str, child_id: &str) -> Option<BookmarkNode> {
        let parent = self.find_mut(parent_id)?;
        let pos = parent.children.iter().position(|c| c.id == child_id)?;
        Some(parent.children.remove(pos))
    }

    /// Titles from the root down to `id`, e.g. `["Bookmarks", "Work", "Docs"]`.
    pub fn path_titles(&self, id: &str) -> Vec<String> {
        let mut titles = Vec::new();
        let mut cursor = self.find(id);
        while let Some(node) = cursor {
            titles.push(node.title.clone());
            cursor = node.parent_id.as_deref().and_then(|p| self.find(p));
        }
        titles.reverse();
        titles
    }

    /// Whether `ancestor_id` is `id` itself or one of its ancestors.
    pub fn is_ancestor(&self, ancestor_id: &str, id: &str) -> bool {
        self.find(ancestor_id)
            .is_some_and(|a| find_by_key(a, id).is_some())
    }
}
