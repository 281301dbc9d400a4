use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::bookmark::{BookmarkNode, NodeType};
use crate::log::LogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Created,
    Edited,
    Deleted,
    Duplicated,
    Moved,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Created,
        ActionKind::Edited,
        ActionKind::Deleted,
        ActionKind::Duplicated,
        ActionKind::Moved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Created => "created",
            ActionKind::Edited => "edited",
            ActionKind::Deleted => "deleted",
            ActionKind::Duplicated => "duplicated",
            ActionKind::Moved => "moved",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| LogError::UnknownKind(s.to_string()))
    }
}

/// Where an action sits in its item's undo chain.
///
/// | state        | undo | redo | pending delete |
/// |--------------|------|------|----------------|
/// | `Active`     | yes  | no   | no             |
/// | `Reverted`   | no   | yes  | yes            |
/// | `Superseded` | no   | no   | yes            |
/// | `Dormant`    | no   | no   | no             |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionState {
    #[default]
    Active,
    Reverted,
    Superseded,
    Dormant,
}

impl ActionState {
    pub fn disabled_undo(self) -> bool {
        self != ActionState::Active
    }

    pub fn disabled_redo(self) -> bool {
        self != ActionState::Reverted
    }

    pub fn pending_delete(self) -> bool {
        matches!(self, ActionState::Reverted | ActionState::Superseded)
    }

    /// States the resolver may recompute from scratch: nothing in the chain
    /// has been undone or redone since the log was last pruned.
    pub fn is_settled(self) -> bool {
        matches!(self, ActionState::Active | ActionState::Dormant)
    }
}

/// One logged mutation with enough data to apply or reverse it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub item: BookmarkNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_item: Option<BookmarkNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_object_parent_id: Option<String>,
    #[serde(default)]
    pub state: ActionState,
}

impl ActionRecord {
    pub fn new(kind: ActionKind, item: BookmarkNode) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            timestamp: Utc::now().timestamp_millis(),
            item,
            original_item: None,
            old_object_parent_id: None,
            state: ActionState::Active,
        }
    }

    /// Build a record from loosely-typed JSON (e.g. a host or sync payload),
    /// rejecting empty objects, unknown kinds and empty items.
    pub fn parse(value: &Value) -> Result<Self, LogError> {
        let obj = match value.as_object() {
            Some(obj) if !obj.is_empty() => obj,
            _ => return Err(LogError::EmptyRecord),
        };
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| LogError::UnknownKind(String::new()))?;
        kind.parse::<ActionKind>()?;
        match obj.get("item") {
            Some(Value::Object(item)) if !item.is_empty() => {}
            _ => return Err(LogError::EmptyItem),
        }
        let record: ActionRecord =
            serde_json::from_value(value.clone()).map_err(|e| LogError::Malformed(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<(), LogError> {
        if self.id.trim().is_empty() {
            return Err(LogError::EmptyRecord);
        }
        if self.item.is_empty() {
            return Err(LogError::EmptyItem);
        }
        Ok(())
    }

    pub fn item_id(&self) -> &str {
        &self.item.id
    }

    pub fn disabled_undo(&self) -> bool {
        self.state.disabled_undo()
    }

    pub fn disabled_redo(&self) -> bool {
        self.state.disabled_redo()
    }

    pub fn pending_delete(&self) -> bool {
        self.state.pending_delete()
    }

    pub fn is_folder(&self) -> bool {
        self.item.kind == NodeType::Folder
    }

    /// Compact time for the history list: `HH:MM` today, weekday this week,
    /// `Mon DD` this year, full date otherwise.
    pub fn time_display(&self) -> String {
        let Some(utc) = DateTime::<Utc>::from_timestamp_millis(self.timestamp) else {
            return "?".to_string();
        };
        let date = utc.with_timezone(&Local);
        let now = Local::now();
        if now.date_naive() == date.date_naive() {
            date.format("%H:%M").to_string()
        } else if (now - date).num_days() < 7 {
            date.format("%a %H:%M").to_string()
        } else if now.format("%Y").to_string() == date.format("%Y").to_string() {
            date.format("%b %d").to_string()
        } else {
            date.format("%Y-%m-%d").to_string()
        }
    }
}
