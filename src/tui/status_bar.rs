use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

pub struct TopBar<'a> {
    pub path: &'a str,
    pub folder_count: usize,
    pub bookmark_count: usize,
    pub undo_enabled: bool,
}

impl<'a> Widget for TopBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().bg(Color::DarkGray).fg(Color::White);
        buf.set_style(area, style);

        let left = format!(" {} ", self.path);
        let right = format!(
            " {} folders, {} bookmarks{} ",
            self.folder_count,
            self.bookmark_count,
            if self.undo_enabled { "" } else { " | history off" }
        );

        let left_spans = Line::from(vec![Span::styled(
            &left,
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )]);
        buf.set_line(area.x, area.y, &left_spans, area.width);

        let right_len = right.len() as u16;
        if area.width > right_len + left.len() as u16 {
            let rx = area.x + area.width - right_len;
            buf.set_string(rx, area.y, &right, style);
        }
    }
}

pub struct BottomBar<'a> {
    pub hints: &'a str,
    pub pending_key: Option<&'a str>,
    /// Prompt label and current input, shown instead of the hints.
    pub prompt: Option<(&'a str, &'a str)>,
    pub status: Option<&'a str>,
}

impl<'a> Widget for BottomBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().bg(Color::DarkGray).fg(Color::White);
        buf.set_style(area, style);

        if let Some((label, input)) = self.prompt {
            let text = format!(" {}: {}█", label, input);
            buf.set_string(area.x, area.y, &text, style.fg(Color::Yellow));
            return;
        }

        if let Some(status) = self.status {
            let text = format!(" {}", status);
            buf.set_string(area.x, area.y, &text, style.add_modifier(Modifier::BOLD));
            return;
        }

        let text = if let Some(pending) = self.pending_key {
            format!(" {}… | {}", pending, self.hints)
        } else {
            format!(" {}", self.hints)
        };
        buf.set_string(area.x, area.y, &text, style);
    }
}
