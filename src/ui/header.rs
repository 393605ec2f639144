use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Tabs};

use crate::format::{format_bytes, format_rate};
use crate::sampler::CycleReport;
use crate::sampler::dimension::Dimension;
use crate::sampler::group::GroupBy;
use crate::ui::theme::Theme;

/// Summary figures shown above the tabs.
#[derive(Debug, Clone, Default)]
pub struct HeaderInfo {
    pub cycle: u64,
    pub group_by: GroupBy,
    pub process_count: usize,
    pub memory_used: u64,
    pub memory_total: u64,
    pub net_rate: f64,
}

impl HeaderInfo {
    pub fn from_report(report: Option<&CycleReport>, group_by: GroupBy) -> Self {
        match report {
            Some(r) => HeaderInfo {
                cycle: r.cycle,
                group_by: r.group_by,
                process_count: r.process_count,
                memory_used: r.globals.memory_used,
                memory_total: r.globals.memory_total,
                net_rate: r.net_rate,
            },
            None => HeaderInfo {
                group_by,
                ..Default::default()
            },
        }
    }
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    info: &HeaderInfo,
    tabs: &[Dimension],
    active: Dimension,
    theme: &Theme,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    render_summary(frame, chunks[0], info, theme);
    render_tabs(frame, chunks[1], tabs, active, theme);
}

fn render_summary(frame: &mut Frame, area: Rect, info: &HeaderInfo, theme: &Theme) {
    let secondary = Style::default().fg(theme.text_secondary);
    let spans = vec![
        Span::styled(
            " healthy ",
            Style::default()
                .fg(theme.header_accent_fg)
                .bg(theme.header_accent_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format!("Cycle {}", info.cycle), secondary),
        Span::raw("  "),
        Span::styled(format!("Group: {}", info.group_by.label()), secondary),
        Span::raw("  "),
        Span::styled(format!("Procs: {}", info.process_count), secondary),
        Span::raw("  "),
        Span::styled(
            format!(
                "Mem: {}/{}",
                format_bytes(info.memory_used),
                format_bytes(info.memory_total)
            ),
            secondary,
        ),
        Span::raw("  "),
        Span::styled(format!("Net: {}", format_rate(info.net_rate)), secondary),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, tabs: &[Dimension], active: Dimension, theme: &Theme) {
    let titles: Vec<Line> = tabs
        .iter()
        .enumerate()
        .map(|(i, d)| Line::from(format!("{} {}", i + 1, d.label())))
        .collect();
    let selected = tabs.iter().position(|&d| d == active).unwrap_or(0);

    let widget = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(theme.text_secondary))
        .highlight_style(
            Style::default()
                .fg(theme.tab_active_fg)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider(Span::styled("\u{2502}", Style::default().fg(theme.overlay_border)));
    frame.render_widget(widget, area);
}
