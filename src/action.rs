#[derive(Debug, Clone, PartialEq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Navigate(Direction),
    NextTab,
    PrevTab,
    SelectTab(usize),
    Kill(u32),
    ForceKill(u32),
    ToggleHelp,
    None,
}
