use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::format::truncate_unicode;
use crate::sampler::tracker::RankedEntry;
use crate::ui::theme::Theme;

#[derive(Debug, Clone)]
pub struct SelectionInfo {
    pub pid: u32,
    pub process_count: usize,
    pub command: String,
    pub tooltip: String,
}

impl SelectionInfo {
    pub fn from_entry(entry: &RankedEntry) -> Self {
        SelectionInfo {
            pid: entry.pid,
            process_count: entry.process_count,
            command: entry
                .cmdline
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| entry.name.clone()),
            tooltip: entry.tooltip.clone(),
        }
    }
}

pub fn render(frame: &mut Frame, area: Rect, selected: Option<SelectionInfo>, theme: &Theme) {
    let style = Style::default()
        .bg(theme.statusbar_bg)
        .fg(theme.text_primary);
    let width = area.width as usize;
    let line = match selected {
        Some(selection) => format_selection_line(&selection, width),
        None => " ".repeat(width),
    };

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(line, style))).style(style),
        area,
    );
}

/// Pid and command on the left, tooltip pinned to the right edge. The
/// command gives way first when space runs out.
fn format_selection_line(selection: &SelectionInfo, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let mut tooltip = selection.tooltip.clone();
    if tooltip.width() > width {
        tooltip = truncate_unicode(&tooltip, width);
        let pad = width.saturating_sub(tooltip.width());
        return format!("{}{}", " ".repeat(pad), tooltip);
    }

    let mut left = format!(" PID {}", selection.pid);
    if selection.process_count > 1 {
        left.push_str(&format!(" \u{00d7}{}", selection.process_count));
    }
    left.push_str("  ");
    left.push_str(&selection.command);

    let tooltip_width = tooltip.width();
    let left_capacity = width.saturating_sub(tooltip_width + 1);
    let left = truncate_unicode(&left, left_capacity);
    let gap = width.saturating_sub(left.width() + tooltip_width);
    format!("{left}{}{tooltip}", " ".repeat(gap))
}
