use serde_json::Value;
use thiserror::Error;

use crate::action::ActionRecord;
use crate::config::UndoManagerConfig;
use crate::resolver::ItemIndex;
use crate::store::{Store, StoreError, UNDO_ACTIONS_KEY};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("action record is empty")]
    EmptyRecord,
    #[error("unknown action type {0:?}")]
    UnknownKind(String),
    #[error("action record has no item")]
    EmptyItem,
    #[error("malformed action record: {0}")]
    Malformed(String),
    #[error("log capacity must be at least 1")]
    ZeroCapacity,
    #[error("no action with id {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Evict from the tail until there is room, then insert `item` at the head.
///
/// A zero capacity can never make room and is rejected before anything is
/// touched.
pub fn modify_array<T>(array: &mut Vec<T>, item: T, max_length: usize) -> Result<(), LogError> {
    if max_length == 0 {
        return Err(LogError::ZeroCapacity);
    }
    while array.len() >= max_length {
        array.pop();
    }
    array.insert(0, item);
    Ok(())
}

/// The bounded, newest-first action history, with an index of each item's
/// chain kept in step with every change.
#[derive(Debug, Clone)]
pub struct ActionLog {
    actions: Vec<ActionRecord>,
    index: ItemIndex,
    max_length: usize,
}

impl ActionLog {
    pub fn new(max_length: usize) -> Result<Self, LogError> {
        Self::from_actions(Vec::new(), max_length)
    }

    pub fn from_actions(mut actions: Vec<ActionRecord>, max_length: usize) -> Result<Self, LogError> {
        if max_length == 0 {
            return Err(LogError::ZeroCapacity);
        }
        newest_first(&mut actions);
        // A capacity lowered in config applies to what is already stored.
        actions.truncate(max_length);
        let index = ItemIndex::build(&actions);
        Ok(Self {
            actions,
            index,
            max_length,
        })
    }

    /// Read the persisted log, or an empty one if nothing is stored yet.
    ///
    /// Stored records that no longer parse are dropped with a warning; the
    /// rest of the log still loads.
    pub async fn load<S: Store>(store: &S, max_length: usize) -> Result<Self, LogError> {
        let raw: Vec<Value> = store.get(UNDO_ACTIONS_KEY).await?.unwrap_or_default();
        let actions = raw
            .iter()
            .filter_map(|value| match ActionRecord::parse(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping stored action record");
                    None
                }
            })
            .collect();
        Self::from_actions(actions, max_length)
    }

    pub async fn commit<S: Store>(&self, store: &S) -> Result<(), StoreError> {
        store.save(UNDO_ACTIONS_KEY, &self.actions).await
    }

    pub fn actions(&self) -> &[ActionRecord] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ActionRecord> {
        self.actions.iter().find(|r| r.id == id)
    }

    /// The item's actions, newest first.
    pub fn timeline(&self, item_id: &str) -> Vec<&ActionRecord> {
        self.index
            .timeline(item_id)
            .iter()
            .map(|&pos| &self.actions[pos])
            .collect()
    }

    /// The action that would be undone next for `item_id`, if any.
    pub fn frontier(&self, item_id: &str) -> Option<&ActionRecord> {
        self.timeline(item_id)
            .into_iter()
            .find(|r| !r.disabled_undo())
    }

    fn reindex(&mut self) {
        self.index = ItemIndex::build(&self.actions);
    }

    /// Validate and insert at the head, evicting the oldest entries if full.
    pub fn push_front(&mut self, record: ActionRecord) -> Result<(), LogError> {
        record.validate()?;
        modify_array(&mut self.actions, record, self.max_length)?;
        self.reindex();
        Ok(())
    }

    /// Swap in a recomputed list (same records, new states). The log stays
    /// newest first whatever order `actions` arrives in, so eviction always
    /// takes the oldest record.
    pub fn replace(&mut self, mut actions: Vec<ActionRecord>) {
        newest_first(&mut actions);
        self.actions = actions;
        self.reindex();
    }

    pub fn delete_action_by_id(&mut self, id: &str) -> Result<ActionRecord, LogError> {
        let pos = self
            .actions
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| LogError::NotFound(id.to_string()))?;
        let removed = self.actions.remove(pos);
        self.reindex();
        Ok(removed)
    }

    /// Drop every record marked for deletion. Returns how many went.
    pub fn prune_marked(&mut self) -> usize {
        let before = self.actions.len();
        self.actions.retain(|r| !r.pending_delete());
        self.reindex();
        before - self.actions.len()
    }

    /// Drop every record about `item_id`. Returns how many went.
    pub fn remove_item(&mut self, item_id: &str) -> usize {
        let before = self.actions.len();
        self.actions.retain(|r| r.item_id() != item_id);
        self.reindex();
        before - self.actions.len()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.reindex();
    }
}

/// Stable sort by timestamp, newest first.
fn newest_first(actions: &mut [ActionRecord]) {
    actions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Record a new action: load the stored log, insert at the head, persist.
///
/// Returns `Ok(false)` without touching the store when the undo feature is
/// switched off.
pub async fn add_action<S: Store>(
    store: &S,
    config: &UndoManagerConfig,
    record: ActionRecord,
) -> Result<bool, LogError> {
    if !config.status {
        return Ok(false);
    }
    if let Err(e) = record.validate() {
        tracing::warn!(action = %record.id, error = %e, "rejected action record");
        return Err(e);
    }
    let mut log = ActionLog::load(store, config.max_length).await?;
    tracing::debug!(action = %record.id, kind = %record.kind, item = %record.item.id, "recording action");
    log.push_front(record)?;
    log.commit(store).await?;
    Ok(true)
}

/// Drop every stored action about `item_id`.
pub async fn remove_all_action_by_key<S: Store>(
    store: &S,
    config: &UndoManagerConfig,
    item_id: &str,
) -> Result<usize, LogError> {
    let mut log = ActionLog::load(store, config.max_length).await?;
    let removed = log.remove_item(item_id);
    if removed > 0 {
        log.commit(store).await?;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, ActionState};
    use crate::bookmark::BookmarkNode;
    use crate::store::MemoryStore;

    fn rec(id: &str, item: &str, ts: i64) -> ActionRecord {
        ActionRecord {
            id: id.to_string(),
            kind: ActionKind::Created,
            timestamp: ts,
            item: BookmarkNode::bookmark(item, item, "").with_parent("root"),
            original_item: None,
            old_object_parent_id: None,
            state: ActionState::Active,
        }
    }

    fn cfg(max_length: usize) -> UndoManagerConfig {
        UndoManagerConfig {
            status: true,
            max_length,
        }
    }

    #[test]
    fn modify_array_bounds_length() {
        let mut v = vec![3, 2, 1];
        modify_array(&mut v, 4, 3).unwrap();
        assert_eq!(v, vec![4, 3, 2]);

        let mut v: Vec<i32> = Vec::new();
        for i in 0..10 {
            modify_array(&mut v, i, 4).unwrap();
            assert!(v.len() <= 4);
        }
        assert_eq!(v, vec![9, 8, 7, 6]);
    }

    #[test]
    fn modify_array_shrinks_oversized_input() {
        let mut v = vec![5, 4, 3, 2, 1];
        modify_array(&mut v, 6, 2).unwrap();
        assert_eq!(v, vec![6, 5]);
    }

    #[test]
    fn modify_array_rejects_zero_capacity() {
        let mut v = vec![1];
        assert!(matches!(modify_array(&mut v, 2, 0), Err(LogError::ZeroCapacity)));
        assert_eq!(v, vec![1]);
    }

    #[test]
    fn push_front_rejects_empty_item() {
        let mut log = ActionLog::new(5).unwrap();
        let mut bad = rec("a1", "X", 1);
        bad.item.id.clear();
        assert!(matches!(log.push_front(bad), Err(LogError::EmptyItem)));
        assert!(log.is_empty());
    }

    #[test]
    fn frontier_follows_index() {
        let mut log = ActionLog::new(10).unwrap();
        log.push_front(rec("a1", "X", 100)).unwrap();
        log.push_front(rec("b1", "Y", 150)).unwrap();
        log.push_front(rec("a2", "X", 200)).unwrap();
        let timeline: Vec<_> = log.timeline("X").iter().map(|r| r.id.clone()).collect();
        assert_eq!(timeline, vec!["a2", "a1"]);
        assert_eq!(log.frontier("X").unwrap().id, "a2");

        log.delete_action_by_id("a2").unwrap();
        assert_eq!(log.frontier("X").unwrap().id, "a1");
        assert!(matches!(log.delete_action_by_id("a2"), Err(LogError::NotFound(_))));
    }

    #[test]
    fn prune_marked_drops_pending_deletes() {
        let mut log = ActionLog::new(10).unwrap();
        for (id, state) in [
            ("a", ActionState::Active),
            ("b", ActionState::Reverted),
            ("c", ActionState::Superseded),
            ("d", ActionState::Dormant),
        ] {
            let mut r = rec(id, id, 1);
            r.state = state;
            log.push_front(r).unwrap();
        }
        assert_eq!(log.prune_marked(), 2);
        let ids: Vec<_> = log.actions().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a"]);
    }

    #[test]
    fn from_actions_truncates_to_capacity() {
        let actions = vec![rec("c", "X", 3), rec("b", "X", 2), rec("a", "X", 1)];
        let log = ActionLog::from_actions(actions, 2).unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.get("a").is_none());
    }

    #[tokio::test]
    async fn add_action_persists_newest_first() {
        let store = MemoryStore::new();
        assert!(add_action(&store, &cfg(10), rec("a1", "X", 100)).await.unwrap());
        assert!(add_action(&store, &cfg(10), rec("a2", "Y", 200)).await.unwrap());
        let log = ActionLog::load(&store, 10).await.unwrap();
        let ids: Vec<_> = log.actions().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a1"]);
    }

    #[tokio::test]
    async fn add_action_evicts_oldest_when_full() {
        let store = MemoryStore::new();
        for (i, id) in ["a1", "a2", "a3", "a4"].iter().enumerate() {
            add_action(&store, &cfg(3), rec(id, "X", i as i64)).await.unwrap();
        }
        let log = ActionLog::load(&store, 3).await.unwrap();
        let ids: Vec<_> = log.actions().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a4", "a3", "a2"]);
    }

    #[tokio::test]
    async fn add_action_noop_when_disabled() {
        let store = MemoryStore::new();
        let config = UndoManagerConfig {
            status: false,
            max_length: 10,
        };
        assert!(!add_action(&store, &config, rec("a1", "X", 1)).await.unwrap());
        assert!(!store.has(UNDO_ACTIONS_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn add_action_rejects_empty_item_and_keeps_log() {
        let store = MemoryStore::new();
        add_action(&store, &cfg(10), rec("a1", "X", 1)).await.unwrap();

        let mut bad = rec("a2", "X", 2);
        bad.item.id.clear();
        let err = add_action(&store, &cfg(10), bad).await.unwrap_err();
        assert!(matches!(err, LogError::EmptyItem));

        let log = ActionLog::load(&store, 10).await.unwrap();
        let ids: Vec<_> = log.actions().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a1"]);
    }

    #[tokio::test]
    async fn load_skips_stored_record_of_unknown_kind() {
        let store = MemoryStore::new();
        let stored = serde_json::json!([
            {
                "id": "a2",
                "type": "renamed",
                "timestamp": 2,
                "item": { "id": "X", "type": "bookmark" }
            },
            {
                "id": "a1",
                "type": "created",
                "timestamp": 1,
                "item": { "id": "X", "type": "bookmark", "parentId": "root" }
            }
        ]);
        store.save(UNDO_ACTIONS_KEY, &stored).await.unwrap();

        let log = ActionLog::load(&store, 10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.actions()[0].id, "a1");

        // The next add writes back only the records that parsed.
        add_action(&store, &cfg(10), rec("a3", "Y", 3)).await.unwrap();
        let log = ActionLog::load(&store, 10).await.unwrap();
        let ids: Vec<_> = log.actions().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a3", "a1"]);
    }

    #[tokio::test]
    async fn load_fails_on_non_list_value() {
        let store = MemoryStore::new();
        store.save(UNDO_ACTIONS_KEY, "not a list").await.unwrap();
        assert!(matches!(
            ActionLog::load(&store, 10).await,
            Err(LogError::Store(StoreError::Json { .. }))
        ));
    }

    #[test]
    fn from_actions_orders_newest_first_before_truncating() {
        // Grouped order: X's chain, then Y.
        let actions = vec![rec("a2", "X", 200), rec("a1", "X", 100), rec("b1", "Y", 150)];
        let log = ActionLog::from_actions(actions, 2).unwrap();
        let ids: Vec<_> = log.actions().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "b1"]);
    }

    #[test]
    fn replace_keeps_log_newest_first() {
        let mut log = ActionLog::new(10).unwrap();
        log.replace(vec![rec("a2", "X", 200), rec("a1", "X", 100), rec("b1", "Y", 150)]);
        let ids: Vec<_> = log.actions().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "b1", "a1"]);
        assert_eq!(log.frontier("X").unwrap().id, "a2");
    }

    #[tokio::test]
    async fn add_action_surfaces_store_failure() {
        let store = MemoryStore::new();
        store.set_reject_writes(true);
        let err = add_action(&store, &cfg(10), rec("a1", "X", 1)).await.unwrap_err();
        assert!(matches!(err, LogError::Store(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn remove_all_action_by_key_only_that_item() {
        let store = MemoryStore::new();
        add_action(&store, &cfg(10), rec("a1", "X", 1)).await.unwrap();
        add_action(&store, &cfg(10), rec("b1", "Y", 2)).await.unwrap();
        add_action(&store, &cfg(10), rec("a2", "X", 3)).await.unwrap();
        assert_eq!(remove_all_action_by_key(&store, &cfg(10), "X").await.unwrap(), 2);
        let log = ActionLog::load(&store, 10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.actions()[0].id, "b1");
    }
}
