use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use unicode_width::UnicodeWidthChar;

use crate::bookmark::BookmarkNode;

pub struct BookmarkGrid<'a> {
    pub nodes: &'a [BookmarkNode],
    pub selected: usize,
    pub offset: usize,
    /// Id of the node waiting to be pasted elsewhere.
    pub cut: Option<&'a str>,
}

impl<'a> BookmarkGrid<'a> {
    /// Calculate the visible range for scrolling.
    pub fn visible_range(
        selected: usize,
        offset: usize,
        height: usize,
        total: usize,
    ) -> (usize, usize) {
        let mut off = offset;
        if selected < off {
            off = selected;
        }
        if selected >= off + height {
            off = selected - height + 1;
        }
        let end = (off + height).min(total);
        (off, end)
    }
}

impl<'a> Widget for BookmarkGrid<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.nodes.is_empty() {
            let style = Style::default().fg(Color::DarkGray);
            buf.set_string(
                area.x + 2,
                area.y + area.height / 2,
                "Empty folder (a: add bookmark, A: add folder)",
                style,
            );
            return;
        }

        let height = area.height as usize;
        let (start, end) =
            Self::visible_range(self.selected, self.offset, height, self.nodes.len());

        for (i, node) in self.nodes[start..end].iter().enumerate() {
            let y = area.y + i as u16;
            let idx = start + i;
            let is_selected = idx == self.selected;
            let is_cut = self.cut == Some(node.id.as_str());

            let base_style = if is_selected {
                Style::default().bg(Color::Indexed(236)).fg(Color::White)
            } else {
                Style::default()
            };
            buf.set_style(Rect::new(area.x, y, area.width, 1), base_style);

            let w = area.width as usize;

            let (icon, icon_style) = if is_cut {
                ("✂ ", base_style.fg(Color::Red).add_modifier(Modifier::BOLD))
            } else if node.is_folder() {
                ("▸ ", base_style.fg(Color::Yellow))
            } else {
                ("  ", base_style)
            };
            buf.set_string(area.x, y, icon, icon_style);

            let title_width = 32.min(w.saturating_sub(2));
            let title = truncate_str(node.display_title(), title_width);
            let title_style = if node.is_folder() {
                base_style.add_modifier(Modifier::BOLD)
            } else {
                base_style
            };
            buf.set_string(area.x + 2, y, &title, title_style);

            let detail = if node.is_folder() {
                format!("{} items", node.children.len())
            } else {
                node.url.clone()
            };
            let detail_start = area.x + 2 + title_width as u16 + 1;
            let detail_end = area.x + area.width;
            if detail_start < detail_end {
                let detail_width = (detail_end - detail_start) as usize;
                let detail = truncate_str(&detail, detail_width);
                buf.set_string(detail_start, y, &detail, base_style.fg(Color::DarkGray));
            }
        }
    }
}

/// Truncate a string to fit within `max_width` terminal columns, marking the cut with `~`.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return s.to_string();
    }
    if max_width <= 1 {
        return "~".to_string();
    }
    let mut result = String::new();
    let mut used = 0;
    for c in s.chars() {
        let cw = c.width().unwrap_or(0);
        if used + cw > max_width - 1 {
            break;
        }
        result.push(c);
        used += cw;
    }
    result.push('~');
    result
}
