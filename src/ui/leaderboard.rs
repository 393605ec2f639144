use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::format::truncate_unicode;
use crate::sampler::dimension::Dimension;
use crate::sampler::tracker::RankedEntry;
use crate::ui::theme::Theme;

const NAME_WIDTH: usize = 24;
const VALUE_WIDTH: usize = 7;
const EXITED_SUFFIX: &str = " (exited)";

const GLYPHS: [char; 9] = [
    ' ', '\u{2581}', '\u{2582}', '\u{2583}', '\u{2584}', '\u{2585}', '\u{2586}', '\u{2587}',
    '\u{2588}',
];

/// One graph cell: the glyph and the sample's fraction of the scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphCell {
    pub glyph: char,
    pub ratio: f64,
}

/// Maps the newest `width` samples onto block glyphs, right-aligned so the
/// latest sample is always in the last column.
pub fn graph_cells(history: &[f64], scale: f64, width: usize) -> Vec<GraphCell> {
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let tail = &history[history.len().saturating_sub(width)..];
    let pad = width - tail.len();

    let blank = GraphCell {
        glyph: ' ',
        ratio: 0.0,
    };
    let mut cells = vec![blank; pad];
    cells.extend(tail.iter().map(|&value| {
        let ratio = (value / scale).clamp(0.0, 1.0);
        let mut level = (ratio * 8.0).round() as usize;
        if level == 0 && value > 0.0 {
            level = 1;
        }
        GraphCell {
            glyph: GLYPHS[level],
            ratio,
        }
    }));
    cells
}

pub fn history_glyphs(history: &[f64], scale: f64, width: usize) -> String {
    graph_cells(history, scale, width)
        .into_iter()
        .map(|c| c.glyph)
        .collect()
}

fn display_name(entry: &RankedEntry) -> String {
    if entry.alive {
        truncate_unicode(&entry.name, NAME_WIDTH)
    } else {
        let room = NAME_WIDTH.saturating_sub(EXITED_SUFFIX.width());
        format!("{}{EXITED_SUFFIX}", truncate_unicode(&entry.name, room))
    }
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    dimension: Dimension,
    window: usize,
    entries: &[RankedEntry],
    selected: usize,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            format!(" {} \u{00b7} last {window} samples ", dimension.label()),
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if entries.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                " waiting for the first sample\u{2026}",
                Style::default().fg(theme.text_secondary),
            )),
            inner,
        );
        return;
    }

    let rows = inner.height as usize;
    let offset = selected.saturating_sub(rows.saturating_sub(1));
    let graph_width = (inner.width as usize).saturating_sub(NAME_WIDTH + VALUE_WIDTH + 2);

    let lines: Vec<Line> = entries
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
        .map(|(i, entry)| {
            let mut name_style = if entry.alive {
                Style::default().fg(theme.text_primary)
            } else {
                Style::default().fg(theme.text_exited)
            };
            let mut row_bg = Style::default();
            if i == selected {
                name_style = name_style.add_modifier(Modifier::BOLD);
                row_bg = row_bg.bg(theme.selection_bg);
            }

            let name = display_name(entry);
            let name_pad = NAME_WIDTH.saturating_sub(name.width());
            let mut spans = vec![
                Span::styled(format!("{name}{}", " ".repeat(name_pad)), name_style),
                Span::raw(" "),
            ];
            spans.extend(
                graph_cells(&entry.history, entry.scale, graph_width)
                    .into_iter()
                    .map(|cell| {
                        Span::styled(
                            cell.glyph.to_string(),
                            Style::default().fg(theme.heat(cell.ratio)),
                        )
                    }),
            );
            spans.push(Span::styled(
                format!(" {:>width$}", entry.value_label, width = VALUE_WIDTH),
                Style::default().fg(theme.text_secondary),
            ));
            Line::from(spans).style(row_bg)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
