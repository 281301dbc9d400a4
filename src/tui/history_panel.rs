use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Widget},
};

use super::bookmark_grid::{truncate_str, BookmarkGrid};
use crate::action::{ActionKind, ActionRecord};

/// Compute a centered rectangle of the given width and height within `area`.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(x, y, w, h)
}

/// One line of the history list, already resolved against the session.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub kind: ActionKind,
    pub title: String,
    pub folder: bool,
    pub time: String,
    pub can_undo: bool,
    pub can_redo: bool,
    pub pending_delete: bool,
    pub blocked: bool,
}

impl HistoryRow {
    pub fn from_record(record: &ActionRecord, blocked: bool) -> Self {
        Self {
            kind: record.kind,
            title: record.item.display_title().to_string(),
            folder: record.is_folder(),
            time: record.time_display(),
            can_undo: !record.disabled_undo() && !blocked,
            can_redo: !record.disabled_redo() && !blocked,
            pending_delete: record.pending_delete(),
            blocked,
        }
    }

    /// Two-column marker: `u` undo available, `r` redo available, `!` blocked.
    pub fn marker(&self) -> &'static str {
        if self.blocked {
            "! "
        } else if self.can_undo {
            "u "
        } else if self.can_redo {
            "r "
        } else {
            "  "
        }
    }
}

fn kind_color(kind: ActionKind) -> Color {
    match kind {
        ActionKind::Created => Color::Green,
        ActionKind::Edited => Color::Cyan,
        ActionKind::Deleted => Color::Red,
        ActionKind::Duplicated => Color::Magenta,
        ActionKind::Moved => Color::Yellow,
    }
}

pub struct HistoryPanel<'a> {
    pub rows: &'a [HistoryRow],
    pub selected: usize,
    pub offset: usize,
    pub total: usize,
    pub filter_desc: Option<&'a str>,
}

impl<'a> Widget for HistoryPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup_width = area.width.saturating_sub(8).clamp(20, 90);
        let popup_height = area.height.saturating_sub(4).max(6);
        let popup = centered_rect(popup_width, popup_height, area);

        Clear.render(popup, buf);

        let title = match self.filter_desc {
            Some(desc) => format!(" History {}/{} [{}] ", self.rows.len(), self.total, desc),
            None => format!(" History ({}) ", self.total),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(title)
            .title_style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );
        block.render(popup, buf);

        let inner = Rect::new(
            popup.x + 1,
            popup.y + 1,
            popup.width.saturating_sub(2),
            popup.height.saturating_sub(3),
        );
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        // Footer hints on the last inner line
        let footer_y = popup.y + popup.height.saturating_sub(2);
        buf.set_string(
            inner.x,
            footer_y,
            truncate_str(
                " z:undo y:redo x:delete X:forget D:clear 1-5:kinds b/f:types g:group q:close",
                inner.width as usize,
            ),
            Style::default().fg(Color::DarkGray),
        );

        if self.rows.is_empty() {
            buf.set_string(
                inner.x + 1,
                inner.y + inner.height / 2,
                "No history",
                Style::default().fg(Color::DarkGray),
            );
            return;
        }

        let height = inner.height as usize;
        let (start, end) =
            BookmarkGrid::visible_range(self.selected, self.offset, height, self.rows.len());
        let w = inner.width as usize;

        for (i, row) in self.rows[start..end].iter().enumerate() {
            let y = inner.y + i as u16;
            let is_selected = start + i == self.selected;
            let mut base = if is_selected {
                Style::default().bg(Color::Indexed(236)).fg(Color::White)
            } else {
                Style::default()
            };
            if row.pending_delete {
                base = base.add_modifier(Modifier::DIM);
            }
            buf.set_style(Rect::new(inner.x, y, inner.width, 1), base);

            let marker_style = if row.blocked {
                base.fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                base.fg(Color::Green).add_modifier(Modifier::BOLD)
            };
            buf.set_string(inner.x, y, row.marker(), marker_style);

            let kind = format!("{:<10}", row.kind.as_str());
            buf.set_string(inner.x + 2, y, &kind, base.fg(kind_color(row.kind)));

            let time_x = if w > row.time.len() + 1 {
                inner.x + inner.width - row.time.len() as u16 - 1
            } else {
                inner.x + inner.width - 1
            };
            buf.set_string(time_x, y, &row.time, base.fg(Color::DarkGray));

            let title_x = inner.x + 13;
            if title_x + 1 < time_x {
                let width = (time_x - title_x - 1) as usize;
                let prefix = if row.folder { "▸ " } else { "" };
                let title = truncate_str(&format!("{}{}", prefix, row.title), width);
                buf.set_string(title_x, y, &title, base);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionState;
    use crate::bookmark::BookmarkNode;

    #[test]
    fn centered_rect_fits_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let r = centered_rect(60, 20, area);
        assert_eq!(r, Rect::new(20, 10, 60, 20));
        let small = centered_rect(60, 20, Rect::new(0, 0, 30, 10));
        assert_eq!((small.width, small.height), (30, 10));
    }

    #[test]
    fn row_reflects_state() {
        let mut record = ActionRecord::new(ActionKind::Edited, BookmarkNode::bookmark("X", "Docs", ""));
        let row = HistoryRow::from_record(&record, false);
        assert!(row.can_undo && !row.can_redo);
        assert_eq!(row.marker(), "u ");

        record.state = ActionState::Reverted;
        let row = HistoryRow::from_record(&record, false);
        assert!(!row.can_undo && row.can_redo && row.pending_delete);
        assert_eq!(row.marker(), "r ");

        let row = HistoryRow::from_record(&record, true);
        assert!(!row.can_redo);
        assert_eq!(row.marker(), "! ");
    }

    #[test]
    fn render_lists_titles() {
        let record = ActionRecord::new(ActionKind::Created, BookmarkNode::bookmark("X", "Docs", ""));
        let rows = vec![HistoryRow::from_record(&record, false)];
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        HistoryPanel {
            rows: &rows,
            selected: 0,
            offset: 0,
            total: 1,
            filter_desc: None,
        }
        .render(area, &mut buf);

        let text: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("History (1)"));
        assert!(text.contains("created"));
        assert!(text.contains("Docs"));
    }
}
