pub mod header;
pub mod help;
pub mod leaderboard;
pub mod selection_bar;
pub mod statusbar;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::App;
use crate::ui::header::HeaderInfo;
use crate::ui::selection_bar::SelectionInfo;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let info = HeaderInfo::from_report(app.report.as_ref(), app.group_by);
    header::render(frame, chunks[0], &info, &app.tabs, app.tab, &app.theme);

    leaderboard::render(
        frame,
        chunks[1],
        app.tab,
        app.window,
        app.entries(),
        app.selected_index,
        &app.theme,
    );

    let selected = app.selected_entry().map(SelectionInfo::from_entry);
    selection_bar::render(frame, chunks[2], selected, &app.theme);

    statusbar::render(
        frame,
        chunks[3],
        app.input_mode,
        app.status_message.as_ref(),
        &app.keybinds,
        &app.theme,
    );

    // Help overlay, rendered last to appear on top
    if app.show_help() {
        let area = frame.area();
        help::render(
            frame,
            area,
            &app.help_entries(),
            app.window,
            &app.theme,
        );
    }
}
