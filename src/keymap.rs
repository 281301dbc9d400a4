use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::action::ActionKind;

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    Prompt,
    History,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Navigation
    MoveDown,
    MoveUp,
    JumpTop,
    JumpBottom,
    OpenFolder,
    ParentFolder,

    // Bookmark edits
    NewBookmark,
    NewFolder,
    Rename,
    EditUrl,
    Delete,
    Duplicate,
    Cut,
    Paste,
    ForgetHistory,
    Share,
    ImportShared,

    // History panel
    OpenHistory,
    CloseHistory,
    HistoryUndo,
    HistoryRedo,
    HistoryDelete,
    HistoryForget,
    HistoryClear,
    ToggleKind(ActionKind),
    ToggleBookmarks,
    ToggleFolders,
    ToggleGrouping,

    // Help
    ShowHelp,
    CloseHelp,

    // Text input
    InputChar(char),
    InputBackspace,
    InputSubmit,
    InputCancel,

    // System
    Quit,
    Noop,
}

/// Tracks multi-key sequences (`g g` jumps to the top).
pub struct KeyMapper {
    pending: Option<KeyCode>,
}

impl KeyMapper {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Process a key event and return an action, considering current input mode.
    pub fn handle(&mut self, key: KeyEvent, mode: &InputMode) -> Action {
        match mode {
            InputMode::Normal => self.handle_normal(key),
            InputMode::Prompt => self.handle_input(key),
            InputMode::History => self.handle_history(key),
            InputMode::Help => self.handle_help(key),
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) -> Action {
        if let Some(first) = self.pending.take() {
            return match (first, key.code) {
                (KeyCode::Char('g'), KeyCode::Char('g')) => Action::JumpTop,
                _ => Action::Noop,
            };
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => Action::MoveDown,
            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => Action::MoveUp,
            (KeyCode::Char('g'), KeyModifiers::NONE) => {
                self.pending = Some(KeyCode::Char('g'));
                Action::Noop
            }
            (KeyCode::Char('G'), _) => Action::JumpBottom,
            (KeyCode::Enter, _) | (KeyCode::Char('l'), KeyModifiers::NONE) | (KeyCode::Right, _) => {
                Action::OpenFolder
            }
            (KeyCode::Backspace, _) | (KeyCode::Char('h'), KeyModifiers::NONE) | (KeyCode::Left, _) => {
                Action::ParentFolder
            }

            (KeyCode::Char('a'), KeyModifiers::NONE) => Action::NewBookmark,
            (KeyCode::Char('A'), _) => Action::NewFolder,
            (KeyCode::Char('r'), KeyModifiers::NONE) => Action::Rename,
            (KeyCode::Char('e'), KeyModifiers::NONE) => Action::EditUrl,
            (KeyCode::Char('d'), KeyModifiers::NONE) => Action::Delete,
            (KeyCode::Char('c'), KeyModifiers::NONE) => Action::Duplicate,
            (KeyCode::Char('x'), KeyModifiers::NONE) => Action::Cut,
            (KeyCode::Char('p'), KeyModifiers::NONE) => Action::Paste,
            (KeyCode::Char('F'), _) => Action::ForgetHistory,
            (KeyCode::Char('s'), KeyModifiers::NONE) => Action::Share,
            (KeyCode::Char('S'), _) => Action::ImportShared,

            (KeyCode::Char('u'), KeyModifiers::NONE) => Action::OpenHistory,
            (KeyCode::Char('?'), _) => Action::ShowHelp,

            (KeyCode::Char('q'), KeyModifiers::NONE) => Action::Quit,
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
            _ => Action::Noop,
        }
    }

    fn handle_history(&mut self, key: KeyEvent) -> Action {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('q'), KeyModifiers::NONE) | (KeyCode::Char('u'), KeyModifiers::NONE) => {
                Action::CloseHistory
            }
            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => Action::MoveDown,
            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => Action::MoveUp,
            (KeyCode::Char('z'), KeyModifiers::NONE) => Action::HistoryUndo,
            (KeyCode::Char('y'), KeyModifiers::NONE) => Action::HistoryRedo,
            (KeyCode::Char('x'), KeyModifiers::NONE) => Action::HistoryDelete,
            (KeyCode::Char('X'), _) => Action::HistoryForget,
            (KeyCode::Char('D'), _) => Action::HistoryClear,
            (KeyCode::Char('1'), _) => Action::ToggleKind(ActionKind::Created),
            (KeyCode::Char('2'), _) => Action::ToggleKind(ActionKind::Edited),
            (KeyCode::Char('3'), _) => Action::ToggleKind(ActionKind::Deleted),
            (KeyCode::Char('4'), _) => Action::ToggleKind(ActionKind::Moved),
            (KeyCode::Char('5'), _) => Action::ToggleKind(ActionKind::Duplicated),
            (KeyCode::Char('b'), KeyModifiers::NONE) => Action::ToggleBookmarks,
            (KeyCode::Char('f'), KeyModifiers::NONE) => Action::ToggleFolders,
            (KeyCode::Char('g'), KeyModifiers::NONE) => Action::ToggleGrouping,
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
            _ => Action::Noop,
        }
    }

    fn handle_help(&mut self, key: KeyEvent) -> Action {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => Action::MoveDown,
            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => Action::MoveUp,
            (KeyCode::Esc, _) | (KeyCode::Char('q'), _) | (KeyCode::Char('?'), _) => Action::CloseHelp,
            _ => Action::Noop,
        }
    }

    fn handle_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => Action::InputCancel,
            KeyCode::Enter => Action::InputSubmit,
            KeyCode::Backspace => Action::InputBackspace,
            KeyCode::Char(c) => {
                // Allow Ctrl+C to quit even in input mode
                if c == 'c' && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Action::Quit;
                }
                Action::InputChar(c)
            }
            _ => Action::Noop,
        }
    }

    /// Cancel any pending sequence (e.g., on timeout).
    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_display(&self) -> Option<&str> {
        match self.pending {
            Some(KeyCode::Char('g')) => Some("g"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn gg_sequence_jumps_top() {
        let mut km = KeyMapper::new();
        assert_eq!(km.handle(key(KeyCode::Char('g')), &InputMode::Normal), Action::Noop);
        assert!(km.has_pending());
        assert_eq!(km.pending_display(), Some("g"));
        assert_eq!(km.handle(key(KeyCode::Char('g')), &InputMode::Normal), Action::JumpTop);
        assert!(!km.has_pending());
    }

    #[test]
    fn same_key_differs_by_mode() {
        let mut km = KeyMapper::new();
        assert_eq!(km.handle(key(KeyCode::Char('u')), &InputMode::Normal), Action::OpenHistory);
        assert_eq!(km.handle(key(KeyCode::Char('u')), &InputMode::History), Action::CloseHistory);
        assert_eq!(km.handle(key(KeyCode::Char('u')), &InputMode::Prompt), Action::InputChar('u'));
    }

    #[test]
    fn history_filter_keys() {
        let mut km = KeyMapper::new();
        assert_eq!(
            km.handle(key(KeyCode::Char('3')), &InputMode::History),
            Action::ToggleKind(ActionKind::Deleted)
        );
        assert_eq!(km.handle(key(KeyCode::Char('z')), &InputMode::History), Action::HistoryUndo);
        assert_eq!(km.handle(key(KeyCode::Char('y')), &InputMode::History), Action::HistoryRedo);
        assert_eq!(km.handle(key(KeyCode::Char('X')), &InputMode::History), Action::HistoryForget);
        assert_eq!(km.handle(key(KeyCode::Char('F')), &InputMode::Normal), Action::ForgetHistory);
    }

    #[test]
    fn share_keys_are_case_sensitive() {
        let mut km = KeyMapper::new();
        assert_eq!(km.handle(key(KeyCode::Char('s')), &InputMode::Normal), Action::Share);
        let shift_s = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT);
        assert_eq!(km.handle(shift_s, &InputMode::Normal), Action::ImportShared);
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let mut km = KeyMapper::new();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for mode in [InputMode::Normal, InputMode::Prompt, InputMode::History, InputMode::Help] {
            assert_eq!(km.handle(ctrl_c, &mode), Action::Quit);
        }
    }

    #[test]
    fn cancel_pending_clears_sequence() {
        let mut km = KeyMapper::new();
        km.handle(key(KeyCode::Char('g')), &InputMode::Normal);
        km.cancel_pending();
        assert_eq!(km.handle(key(KeyCode::Char('g')), &InputMode::Normal), Action::Noop);
    }
}
