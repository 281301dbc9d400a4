//! Tree edits made by the user. Each one mutates the tree in place and
//! returns the action record describing it, ready for `log::add_action`.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::action::{ActionKind, ActionRecord};
use crate::bookmark::{BookmarkNode, BookmarkTree, ROOT_ID};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("no node with id {0}")]
    NotFound(String),
    #[error("{0} is not a folder")]
    NotAFolder(String),
    #[error("the root folder cannot be changed this way")]
    Root,
    #[error("cannot move {node} into itself or one of its subfolders")]
    IntoSelf { node: String },
}

pub fn new_node_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn parent_of(tree: &BookmarkTree, id: &str) -> Result<String, MutationError> {
    if id == ROOT_ID {
        return Err(MutationError::Root);
    }
    tree.find(id)
        .ok_or_else(|| MutationError::NotFound(id.to_string()))?
        .parent_id
        .clone()
        .ok_or_else(|| MutationError::NotFound(id.to_string()))
}

fn ensure_folder(tree: &BookmarkTree, id: &str) -> Result<(), MutationError> {
    match tree.find(id) {
        Some(node) if node.is_folder() => Ok(()),
        Some(_) => Err(MutationError::NotAFolder(id.to_string())),
        None => Err(MutationError::NotFound(id.to_string())),
    }
}

pub fn create_node(
    tree: &mut BookmarkTree,
    parent_id: &str,
    node: BookmarkNode,
) -> Result<ActionRecord, MutationError> {
    ensure_folder(tree, parent_id)?;
    let mut item = node;
    item.parent_id = Some(parent_id.to_string());
    tree.push_child(parent_id, item.clone())
        .map_err(|_| MutationError::NotFound(parent_id.to_string()))?;
    Ok(ActionRecord::new(ActionKind::Created, item))
}

pub fn edit_node(
    tree: &mut BookmarkTree,
    id: &str,
    title: Option<String>,
    url: Option<String>,
    style: Option<Map<String, Value>>,
) -> Result<ActionRecord, MutationError> {
    if id == ROOT_ID {
        return Err(MutationError::Root);
    }
    let node = tree
        .find_mut(id)
        .ok_or_else(|| MutationError::NotFound(id.to_string()))?;
    let original = node.clone();
    if let Some(title) = title {
        node.title = title;
    }
    if let Some(url) = url {
        node.url = url;
    }
    if let Some(style) = style {
        node.style = style;
    }
    let mut record = ActionRecord::new(ActionKind::Edited, node.clone());
    record.original_item = Some(original);
    Ok(record)
}

pub fn delete_node(tree: &mut BookmarkTree, id: &str) -> Result<ActionRecord, MutationError> {
    let parent_id = parent_of(tree, id)?;
    let removed = tree
        .remove_child(&parent_id, id)
        .ok_or_else(|| MutationError::NotFound(id.to_string()))?;
    Ok(ActionRecord::new(ActionKind::Deleted, removed))
}

/// Deep copy with fresh ids, parented like the original.
pub fn copy_with_fresh_ids(node: &BookmarkNode, parent_id: &str) -> BookmarkNode {
    let id = new_node_id();
    let children = node.children.iter().map(|c| copy_with_fresh_ids(c, &id)).collect();
    BookmarkNode {
        id,
        parent_id: Some(parent_id.to_string()),
        children,
        ..node.clone()
    }
}

pub fn duplicate_node(tree: &mut BookmarkTree, id: &str) -> Result<ActionRecord, MutationError> {
    let parent_id = parent_of(tree, id)?;
    let original = tree
        .find(id)
        .ok_or_else(|| MutationError::NotFound(id.to_string()))?;
    let copy = copy_with_fresh_ids(original, &parent_id);
    tree.push_child(&parent_id, copy.clone())
        .map_err(|_| MutationError::NotFound(parent_id.clone()))?;
    Ok(ActionRecord::new(ActionKind::Duplicated, copy))
}

/// Move `id` under `dest_id`. The record's `old_object_parent_id` is the
/// parent before the move and `item.parent_id` the destination.
pub fn move_node(tree: &mut BookmarkTree, id: &str, dest_id: &str) -> Result<ActionRecord, MutationError> {
    let old_parent = parent_of(tree, id)?;
    ensure_folder(tree, dest_id)?;
    if tree.is_ancestor(id, dest_id) {
        return Err(MutationError::IntoSelf { node: id.to_string() });
    }
    let node = tree
        .remove_child(&old_parent, id)
        .ok_or_else(|| MutationError::NotFound(id.to_string()))?;
    let mut item = node;
    item.parent_id = Some(dest_id.to_string());
    tree.push_child(dest_id, item.clone())
        .map_err(|_| MutationError::NotFound(dest_id.to_string()))?;

    let mut record = ActionRecord::new(ActionKind::Moved, item);
    record.old_object_parent_id = Some(old_parent);
    Ok(record)
}
