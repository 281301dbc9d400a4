//! Undo/redo eligibility.
//!
//! The log is one flat list ordered by time, but every bookmark/folder has
//! its own linear undo chain inside it. [`ItemIndex`] recovers those chains;
//! [`sort_actions`] and [`handle_undo_redo`] assign each record its
//! [`ActionState`] from its position in the chain.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::action::{ActionRecord, ActionState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no action with id {0}")]
    UnknownAction(String),
}

/// Display order for the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    /// Global newest-first order.
    #[default]
    Timestamp,
    /// Each item's actions contiguous, items ordered by their newest action.
    Bookmark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Undo => f.write_str("undo"),
            Direction::Redo => f.write_str("redo"),
        }
    }
}

/// Per-item timelines over a slice of records.
///
/// Positions point into the slice the index was built from; each timeline
/// is newest first, ties broken by slice order.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    timelines: HashMap<String, Vec<usize>>,
    /// Item ids in order of their newest action.
    order: Vec<String>,
}

impl ItemIndex {
    pub fn build(list: &[ActionRecord]) -> Self {
        let mut by_time: Vec<usize> = (0..list.len()).collect();
        by_time.sort_by(|&a, &b| list[b].timestamp.cmp(&list[a].timestamp));

        let mut index = ItemIndex::default();
        for pos in by_time {
            let item_id = list[pos].item_id();
            match index.timelines.get_mut(item_id) {
                Some(timeline) => timeline.push(pos),
                None => {
                    index.order.push(item_id.to_string());
                    index.timelines.insert(item_id.to_string(), vec![pos]);
                }
            }
        }
        index
    }

    pub fn timeline(&self, item_id: &str) -> &[usize] {
        self.timelines.get(item_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

/// Newest-first copy of `list` with fresh chain states, in `mode` order.
///
/// A chain whose records are all settled (`Active`/`Dormant`) gets its
/// newest record `Active` and the rest `Dormant`. A chain already carrying
/// undo/redo results from this session keeps its states so re-grouping the
/// view never re-enables an action that has been undone.
pub fn sort_actions(list: &[ActionRecord], mode: GroupMode) -> Vec<ActionRecord> {
    let index = ItemIndex::build(list);
    let mut states: Vec<ActionState> = list.iter().map(|r| r.state).collect();

    for item_id in index.items() {
        let timeline = index.timeline(item_id);
        if !timeline.iter().all(|&pos| list[pos].state.is_settled()) {
            continue;
        }
        for (n, &pos) in timeline.iter().enumerate() {
            states[pos] = if n == 0 {
                ActionState::Active
            } else {
                ActionState::Dormant
            };
        }
    }

    let order: Vec<usize> = match mode {
        GroupMode::Timestamp => {
            let mut by_time: Vec<usize> = (0..list.len()).collect();
            by_time.sort_by(|&a, &b| list[b].timestamp.cmp(&list[a].timestamp));
            by_time
        }
        GroupMode::Bookmark => index
            .items()
            .flat_map(|item_id| index.timeline(item_id).iter().copied())
            .collect(),
    };

    tracing::debug!(records = list.len(), items = index.len(), ?mode, "sorted actions");

    order
        .into_iter()
        .map(|pos| ActionRecord {
            state: states[pos],
            ..list[pos].clone()
        })
        .collect()
}

/// State of timeline position `pos` after `direction` was applied at `k`.
fn state_after(direction: Direction, k: usize, pos: usize) -> ActionState {
    match direction {
        Direction::Undo => {
            if pos == k {
                ActionState::Reverted
            } else if pos + 1 == k {
                ActionState::Superseded
            } else if pos == k + 1 {
                ActionState::Active
            } else if pos > k {
                ActionState::Dormant
            } else {
                ActionState::Superseded
            }
        }
        Direction::Redo => {
            if pos == k {
                ActionState::Active
            } else if pos + 1 == k {
                ActionState::Reverted
            } else {
                ActionState::Dormant
            }
        }
    }
}

/// Recompute the chain of the item touched by `action_id` after an undo or
/// redo of that action. Records of other items are returned unchanged, in
/// their original order.
pub fn handle_undo_redo(
    action_id: &str,
    direction: Direction,
    list: &[ActionRecord],
) -> Result<Vec<ActionRecord>, ResolveError> {
    let acted = list
        .iter()
        .position(|r| r.id == action_id)
        .ok_or_else(|| ResolveError::UnknownAction(action_id.to_string()))?;
    let item_id = list[acted].item_id();

    let index = ItemIndex::build(list);
    let timeline = index.timeline(item_id);
    let k = timeline
        .iter()
        .position(|&pos| pos == acted)
        .ok_or_else(|| ResolveError::UnknownAction(action_id.to_string()))?;

    let mut updated = list.to_vec();
    for (n, &pos) in timeline.iter().enumerate() {
        updated[pos].state = state_after(direction, k, n);
    }

    tracing::debug!(
        action = action_id,
        item = item_id,
        %direction,
        position = k,
        chain = timeline.len(),
        "recomputed undo chain"
    );
    Ok(updated)
}
