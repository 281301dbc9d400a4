//! Applying history to the bookmark tree, and the session object the
//! history panel works through.

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::action::{ActionKind, ActionRecord};
use crate::bookmark::{BookmarkNode, BookmarkTree};
use crate::config::UndoManagerConfig;
use crate::log::{ActionLog, LogError};
use crate::profile::Profile;
use crate::resolver::{handle_undo_redo, sort_actions, Direction, GroupMode, ResolveError};
use crate::store::{Store, StoreError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("action {action}: folder {parent} is not in the tree")]
    MissingParent { action: String, parent: String },
    #[error("action {action}: {node} is not where the history expects it")]
    MissingNode { action: String, node: String },
    #[error("action {action}: {node} is already in the tree")]
    AlreadyPresent { action: String, node: String },
    #[error("action {0} has no original item to restore")]
    MissingOriginal(String),
    #[error("action {0} has no previous folder recorded")]
    MissingOldParent(String),
    #[error("cannot {direction} action {action} now")]
    NotEligible { action: String, direction: Direction },
    #[error("history of {0} no longer matches the bookmarks; reopen the history panel")]
    Quarantined(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl ApplyError {
    /// Errors meaning the tree and the log disagree.
    pub fn is_inconsistency(&self) -> bool {
        matches!(
            self,
            ApplyError::MissingParent { .. }
                | ApplyError::MissingNode { .. }
                | ApplyError::AlreadyPresent { .. }
                | ApplyError::MissingOriginal(_)
                | ApplyError::MissingOldParent(_)
        )
    }
}

/// Requests from the history engine to the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Re-read the tree and redraw the current folder.
    RefreshCurrentFolder,
    /// Short-lived message for the user.
    Toast(String),
}

// ---------------------------------------------------------------------------
// Tree application
// ---------------------------------------------------------------------------

fn item_parent(record: &ActionRecord) -> Result<&str, ApplyError> {
    record
        .item
        .parent_id
        .as_deref()
        .ok_or_else(|| ApplyError::MissingParent {
            action: record.id.clone(),
            parent: "<none>".to_string(),
        })
}

fn insert(tree: &mut BookmarkTree, record: &ActionRecord, parent: &str, node: BookmarkNode) -> Result<(), ApplyError> {
    if tree.contains(&node.id) {
        return Err(ApplyError::AlreadyPresent {
            action: record.id.clone(),
            node: node.id,
        });
    }
    tree.push_child(parent, node).map_err(|_| ApplyError::MissingParent {
        action: record.id.clone(),
        parent: parent.to_string(),
    })
}

fn detach(tree: &mut BookmarkTree, record: &ActionRecord, parent: &str) -> Result<BookmarkNode, ApplyError> {
    if !tree.contains(parent) {
        return Err(ApplyError::MissingParent {
            action: record.id.clone(),
            parent: parent.to_string(),
        });
    }
    tree.remove_child(parent, &record.item.id)
        .ok_or_else(|| ApplyError::MissingNode {
            action: record.id.clone(),
            node: record.item.id.clone(),
        })
}

fn overwrite(tree: &mut BookmarkTree, record: &ActionRecord, from: &BookmarkNode) -> Result<(), ApplyError> {
    let node = tree
        .find_mut(&record.item.id)
        .ok_or_else(|| ApplyError::MissingNode {
            action: record.id.clone(),
            node: record.item.id.clone(),
        })?;
    node.overwrite_fields(from);
    Ok(())
}

/// Take the node out of `from` and put it into `to`. Both ends are checked
/// before anything moves.
fn relocate(tree: &mut BookmarkTree, record: &ActionRecord, from: &str, to: &str) -> Result<(), ApplyError> {
    if !tree.contains(to) {
        return Err(ApplyError::MissingParent {
            action: record.id.clone(),
            parent: to.to_string(),
        });
    }
    if !tree.has_child(from, &record.item.id) {
        return Err(if tree.contains(from) {
            ApplyError::MissingNode {
                action: record.id.clone(),
                node: record.item.id.clone(),
            }
        } else {
            ApplyError::MissingParent {
                action: record.id.clone(),
                parent: from.to_string(),
            }
        });
    }
    let node = detach(tree, record, from)?;
    tree.push_child(to, node).map_err(|_| ApplyError::MissingParent {
        action: record.id.clone(),
        parent: to.to_string(),
    })
}

/// Reverse (`Undo`) or replay (`Redo`) one record against the tree.
///
/// Lookups happen before any change, so a failed application leaves the
/// tree as it was.
pub fn apply(tree: &mut BookmarkTree, record: &ActionRecord, direction: Direction) -> Result<(), ApplyError> {
    use ActionKind::*;
    use Direction::*;

    match (record.kind, direction) {
        (Created | Duplicated, Redo) | (Deleted, Undo) => {
            let parent = item_parent(record)?;
            insert(tree, record, parent, record.item.clone())
        }
        (Created | Duplicated, Undo) | (Deleted, Redo) => {
            let parent = item_parent(record)?;
            detach(tree, record, parent).map(|_| ())
        }
        (Edited, Redo) => overwrite(tree, record, &record.item),
        (Edited, Undo) => {
            let original = record
                .original_item
                .as_ref()
                .ok_or_else(|| ApplyError::MissingOriginal(record.id.clone()))?;
            overwrite(tree, record, original)
        }
        (Moved, _) => {
            let current = item_parent(record)?;
            let previous = record
                .old_object_parent_id
                .as_deref()
                .ok_or_else(|| ApplyError::MissingOldParent(record.id.clone()))?;
            match direction {
                Undo => relocate(tree, record, current, previous),
                Redo => relocate(tree, record, previous, current),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One open history panel: the log loaded fresh from the store, kept in
/// memory while the panel is up, pruned and committed when it closes.
///
/// The log stays newest first; `view` holds the action ids in the order the
/// panel lists them.
pub struct UndoManager<S: Store> {
    store: S,
    log: ActionLog,
    mode: GroupMode,
    view: Vec<String>,
    /// Items whose chain failed to apply; no further undo/redo on them.
    quarantined: HashSet<String>,
    signals: UnboundedSender<Signal>,
}

impl<S: Store> UndoManager<S> {
    pub async fn open(
        store: S,
        config: &UndoManagerConfig,
        mode: GroupMode,
        signals: UnboundedSender<Signal>,
    ) -> Result<Self, LogError> {
        let log = ActionLog::load(&store, config.max_length).await?;
        let mut manager = Self {
            store,
            log,
            mode,
            view: Vec::new(),
            quarantined: HashSet::new(),
            signals,
        };
        manager.resort();
        tracing::debug!(actions = manager.log.len(), ?mode, "history panel opened");
        Ok(manager)
    }

    fn resort(&mut self) {
        let sorted = sort_actions(self.log.actions(), self.mode);
        self.view = sorted.iter().map(|r| r.id.clone()).collect();
        self.log.replace(sorted);
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Records in panel order. Entries deleted since the last sort are skipped.
    pub fn actions(&self) -> Vec<&ActionRecord> {
        let by_id: HashMap<&str, &ActionRecord> = self
            .log
            .actions()
            .iter()
            .map(|r| (r.id.as_str(), r))
            .collect();
        self.view
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .collect()
    }

    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GroupMode) {
        self.mode = mode;
        self.resort();
    }

    pub fn is_quarantined(&self, item_id: &str) -> bool {
        self.quarantined.contains(item_id)
    }

    pub fn can_undo(&self, id: &str) -> bool {
        self.eligible(id, Direction::Undo)
    }

    pub fn can_redo(&self, id: &str) -> bool {
        self.eligible(id, Direction::Redo)
    }

    fn eligible(&self, id: &str, direction: Direction) -> bool {
        self.log.get(id).is_some_and(|r| {
            let allowed = match direction {
                Direction::Undo => self
                    .log
                    .frontier(r.item_id())
                    .is_some_and(|f| f.id == id),
                Direction::Redo => !r.disabled_redo(),
            };
            allowed && !self.is_quarantined(r.item_id())
        })
    }

    fn toast(&self, msg: impl Into<String>) {
        let _ = self.signals.send(Signal::Toast(msg.into()));
    }

    pub async fn undo_action<P: Store>(&mut self, profile: &mut Profile<P>, id: &str) -> Result<(), ApplyError> {
        self.step(profile, id, Direction::Undo).await
    }

    pub async fn redo_action<P: Store>(&mut self, profile: &mut Profile<P>, id: &str) -> Result<(), ApplyError> {
        self.step(profile, id, Direction::Redo).await
    }

    async fn step<P: Store>(
        &mut self,
        profile: &mut Profile<P>,
        id: &str,
        direction: Direction,
    ) -> Result<(), ApplyError> {
        let record = self
            .log
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownAction(id.to_string()))?;
        if self.is_quarantined(record.item_id()) {
            return Err(ApplyError::Quarantined(record.item.id.clone()));
        }
        if !self.eligible(id, direction) {
            return Err(ApplyError::NotEligible {
                action: id.to_string(),
                direction,
            });
        }

        if let Err(e) = apply(&mut profile.tree, &record, direction) {
            if e.is_inconsistency() {
                self.quarantined.insert(record.item.id.clone());
            }
            tracing::warn!(action = id, %direction, error = %e, "could not apply history");
            self.toast(format!("Cannot {}: {}", direction, e));
            return Err(e);
        }
        tracing::info!(action = id, kind = %record.kind, item = %record.item.id, %direction, "applied history");

        let updated = handle_undo_redo(id, direction, self.log.actions())?;
        self.log.replace(updated);

        if let Err(e) = self.log.commit(&self.store).await {
            tracing::error!(error = %e, "failed to save history");
            self.toast("Could not save history");
        }
        if let Err(e) = profile.save().await {
            tracing::error!(error = %e, "failed to save bookmarks");
            self.toast("Could not save bookmarks");
        }
        let _ = self.signals.send(Signal::RefreshCurrentFolder);
        Ok(())
    }

    pub async fn delete_action(&mut self, id: &str) -> Result<(), LogError> {
        let removed = self.log.delete_action_by_id(id)?;
        tracing::debug!(action = id, kind = %removed.kind, "deleted history entry");
        self.log.commit(&self.store).await?;
        Ok(())
    }

    /// Drop every entry about `item_id`, lifting any quarantine on it.
    pub async fn forget_item(&mut self, item_id: &str) -> Result<usize, LogError> {
        let removed = self.log.remove_item(item_id);
        self.quarantined.remove(item_id);
        self.log.commit(&self.store).await?;
        tracing::debug!(item = item_id, removed, "forgot item history");
        Ok(removed)
    }

    pub async fn clear(&mut self) -> Result<(), LogError> {
        self.log.clear();
        self.quarantined.clear();
        self.log.commit(&self.store).await?;
        Ok(())
    }

    /// Drop entries marked for deletion and persist. Returns how many went.
    pub async fn close(mut self) -> Result<usize, StoreError> {
        let pruned = self.log.prune_marked();
        self.log.commit(&self.store).await?;
        tracing::debug!(pruned, remaining = self.log.len(), "history panel closed");
        Ok(pruned)
    }
}
