use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::ui::theme::Theme;

/// Centered overlay listing every key and what it does, followed by a short
/// note on how the ranking works.
pub fn render(frame: &mut Frame, area: Rect, entries: &[(String, &str)], window: usize, theme: &Theme) {
    let notes = [
        format!("Rows rank by the sum of the last {window} samples."),
        "Exited processes fade out as their history fills with zeros.".to_string(),
    ];
    let width = 64u16.min(area.width.saturating_sub(4));
    // entries, blank separator, notes, borders
    let height = (entries.len() + 1 + notes.len() + 2) as u16;
    let overlay = centered_rect(width, height.min(area.height.saturating_sub(2)), area);

    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            " Keys ",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(overlay);

    let mut lines: Vec<Line> = entries
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(
                    format!(" {key:>8} "),
                    Style::default()
                        .fg(theme.pill_key_fg)
                        .bg(theme.pill_key_bg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {desc}"), Style::default().fg(theme.pill_desc_fg)),
            ])
        })
        .collect();
    lines.push(Line::default());
    lines.extend(notes.into_iter().map(|note| {
        Line::from(Span::styled(
            format!(" {note}"),
            Style::default().fg(theme.text_secondary),
        ))
    }));

    frame.render_widget(block, overlay);
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(theme.surface_bg)),
        inner,
    );
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [vert] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [horiz] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(vert);
    horiz
}
