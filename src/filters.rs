use serde::Deserialize;

use crate::action::{ActionKind, ActionRecord};
use crate::resolver::GroupMode;

/// Which history entries the panel lists. Never changes the log itself.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ActionFilters {
    pub created: bool,
    pub edited: bool,
    pub deleted: bool,
    pub moved: bool,
    pub duplicated: bool,
    pub show_bookmarks: bool,
    pub show_folders: bool,
    /// List each item's actions together instead of strictly by time.
    pub group_same_id: bool,
}

impl Default for ActionFilters {
    fn default() -> Self {
        Self {
            created: true,
            edited: true,
            deleted: true,
            moved: true,
            duplicated: true,
            show_bookmarks: true,
            show_folders: true,
            group_same_id: false,
        }
    }
}

impl ActionFilters {
    pub fn shows_kind(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Created => self.created,
            ActionKind::Edited => self.edited,
            ActionKind::Deleted => self.deleted,
            ActionKind::Moved => self.moved,
            ActionKind::Duplicated => self.duplicated,
        }
    }

    pub fn toggle_kind(&mut self, kind: ActionKind) {
        let flag = match kind {
            ActionKind::Created => &mut self.created,
            ActionKind::Edited => &mut self.edited,
            ActionKind::Deleted => &mut self.deleted,
            ActionKind::Moved => &mut self.moved,
            ActionKind::Duplicated => &mut self.duplicated,
        };
        *flag = !*flag;
    }

    pub fn matches(&self, record: &ActionRecord) -> bool {
        let type_ok = if record.is_folder() {
            self.show_folders
        } else {
            self.show_bookmarks
        };
        type_ok && self.shows_kind(record.kind)
    }

    pub fn mode(&self) -> GroupMode {
        if self.group_same_id {
            GroupMode::Bookmark
        } else {
            GroupMode::Timestamp
        }
    }

    /// Records that pass, in the order given.
    pub fn visible<'a>(&self, list: impl IntoIterator<Item = &'a ActionRecord>) -> Vec<&'a ActionRecord> {
        list.into_iter().filter(|r| self.matches(r)).collect()
    }

    /// Short summary of what is hidden, e.g. `"-deleted -folders"`.
    pub fn description(&self) -> Option<String> {
        let mut parts: Vec<String> = ActionKind::ALL
            .into_iter()
            .filter(|k| !self.shows_kind(*k))
            .map(|k| format!("-{}", k))
            .collect();
        if !self.show_bookmarks {
            parts.push("-bookmarks".into());
        }
        if !self.show_folders {
            parts.push("-folders".into());
        }
        if self.group_same_id {
            parts.push("grouped".into());
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::BookmarkNode;

    fn rec(kind: ActionKind, item: BookmarkNode) -> ActionRecord {
        ActionRecord::new(kind, item)
    }

    #[test]
    fn defaults_show_everything() {
        let f = ActionFilters::default();
        for kind in ActionKind::ALL {
            assert!(f.shows_kind(kind));
        }
        assert_eq!(f.mode(), GroupMode::Timestamp);
        assert!(f.description().is_none());
    }

    #[test]
    fn kind_and_type_filters_combine() {
        let mut f = ActionFilters::default();
        let bm = rec(ActionKind::Deleted, BookmarkNode::bookmark("b", "B", ""));
        let folder = rec(ActionKind::Created, BookmarkNode::folder("f", "F"));
        assert!(f.matches(&bm));
        assert!(f.matches(&folder));

        f.toggle_kind(ActionKind::Deleted);
        assert!(!f.matches(&bm));
        assert!(f.matches(&folder));

        f.show_folders = false;
        assert!(!f.matches(&folder));
        assert_eq!(f.description().as_deref(), Some("-deleted -folders"));
    }

    #[test]
    fn visible_keeps_order_and_log_intact() {
        let mut f = ActionFilters::default();
        f.edited = false;
        let list = vec![
            rec(ActionKind::Edited, BookmarkNode::bookmark("a", "A", "")),
            rec(ActionKind::Moved, BookmarkNode::bookmark("b", "B", "")),
            rec(ActionKind::Created, BookmarkNode::bookmark("c", "C", "")),
        ];
        let visible: Vec<_> = f.visible(&list).iter().map(|r| r.item.id.as_str()).collect();
        assert_eq!(visible, vec!["b", "c"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn grouping_selects_mode() {
        let f = ActionFilters {
            group_same_id: true,
            ..Default::default()
        };
        assert_eq!(f.mode(), GroupMode::Bookmark);
    }
}
