use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Widget},
};

use super::history_panel::centered_rect;

struct HelpSection {
    title: &'static str,
    keys: &'static [(&'static str, &'static str)],
}

const SECTIONS: &[HelpSection] = &[
    HelpSection {
        title: "Navigation",
        keys: &[
            ("j / Down", "Move down"),
            ("k / Up", "Move up"),
            ("gg", "Jump to top"),
            ("G", "Jump to bottom"),
            ("Enter / l", "Open folder"),
            ("Bksp / h", "Parent folder"),
        ],
    },
    HelpSection {
        title: "Bookmarks",
        keys: &[
            ("a", "New bookmark"),
            ("A", "New folder"),
            ("r", "Rename"),
            ("e", "Edit URL"),
            ("d", "Delete"),
            ("c", "Duplicate"),
            ("x", "Cut"),
            ("p", "Paste into this folder"),
            ("s", "Share with another profile"),
            ("S", "Import shared bookmark"),
            ("F", "Forget history of selected"),
        ],
    },
    HelpSection {
        title: "History",
        keys: &[
            ("u", "Open / close history"),
            ("z", "Undo selected"),
            ("y", "Redo selected"),
            ("x", "Delete entry"),
            ("X", "Forget every entry for the item"),
            ("D", "Clear all history"),
            ("1-5", "Toggle created/edited/deleted/moved/duplicated"),
            ("b / f", "Toggle bookmarks / folders"),
            ("g", "Group by item"),
        ],
    },
    HelpSection {
        title: "Other",
        keys: &[("?", "This help"), ("q", "Quit")],
    },
];

pub struct HelpOverlay {
    pub scroll: u16,
}

impl Widget for HelpOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup_width: u16 = 64;
        let popup_height: u16 = area.height.clamp(10, 30);
        let popup = centered_rect(popup_width, popup_height, area);

        Clear.render(popup, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Keyboard Shortcuts ")
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
            popup.height.saturating_sub(2),
        );
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let header = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let key_style = Style::default().fg(Color::Cyan);
        let desc_style = Style::default().fg(Color::White);
        let key_col_width = 12;

        // (key, description) or a header/blank line with its own style
        let mut lines: Vec<(Option<&str>, String, Style)> = Vec::new();
        for (si, section) in SECTIONS.iter().enumerate() {
            if si > 0 {
                lines.push((None, String::new(), Style::default()));
            }
            lines.push((None, format!(" {}", section.title), header));
            for (key, desc) in section.keys {
                lines.push((Some(*key), desc.to_string(), desc_style));
            }
        }
        lines.push((None, String::new(), Style::default()));
        lines.push((
            None,
            " j/k:scroll  ?/q/Esc:close".to_string(),
            Style::default().fg(Color::DarkGray),
        ));

        let max_scroll = lines.len().saturating_sub(inner.height as usize);
        let scroll = (self.scroll as usize).min(max_scroll);

        for (i, (key, text, style)) in lines.iter().skip(scroll).enumerate() {
            if i as u16 >= inner.height {
                break;
            }
            let y = inner.y + i as u16;
            match key {
                Some(key) => {
                    let padded = format!("  {:width$}", key, width = key_col_width);
                    buf.set_string(inner.x, y, &padded, key_style);
                    buf.set_string(inner.x + padded.len() as u16, y, text, *style);
                }
                None => {
                    buf.set_string(inner.x, y, text, *style);
                }
            }
        }
    }
}
